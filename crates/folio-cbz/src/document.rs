//! Comic archive document: page index plus ComicInfo metadata.

use crate::comic_info::{ComicInfo, ComicPageInfo, Manga, ReadingDirection, COMIC_INFO_PART};
use crate::error::{CbzError, Result};
use crate::image::{image_size, is_image_file, ImageFormat};
use crate::natural::natural_cmp;
use folio_archive::{Archive, ArchiveFormat, ByteStream};
use folio_core::{Matrix, Rect};
use folio_render::{Command, Device, ImageRef, PageSource};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Page size used when neither ComicInfo nor the image header gives one.
pub const DEFAULT_PAGE_WIDTH: u32 = 612;
pub const DEFAULT_PAGE_HEIGHT: u32 = 792;

/// Container flavor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CbzFormat {
    /// ZIP
    #[default]
    Cbz,
    /// RAR
    Cbr,
    /// 7z
    Cb7,
    /// TAR
    Cbt,
}

impl CbzFormat {
    #[must_use = "returns the format name"]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Cbz => "CBZ",
            Self::Cbr => "CBR",
            Self::Cb7 => "CB7",
            Self::Cbt => "CBT",
        }
    }

    #[must_use = "returns the comic format"]
    pub const fn from_archive(format: ArchiveFormat) -> Self {
        match format {
            ArchiveFormat::Rar => Self::Cbr,
            ArchiveFormat::SevenZ => Self::Cb7,
            ArchiveFormat::Tar => Self::Cbt,
            ArchiveFormat::Zip | ArchiveFormat::Memory => Self::Cbz,
        }
    }
}

impl fmt::Display for CbzFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One entry in the page index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CbzPage {
    pub name: String,
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
    pub double: bool,
}

/// A comic book archive.
///
/// # Examples
///
/// ```rust
/// use folio_cbz::CbzDocument;
///
/// let mut doc = CbzDocument::new();
/// doc.add_entry("page10.jpg").unwrap();
/// doc.add_entry("page2.jpg").unwrap();
/// doc.add_entry("page1.jpg").unwrap();
/// doc.sort_pages().unwrap();
/// assert_eq!(doc.page_filename(0).unwrap(), "page1.jpg");
/// assert_eq!(doc.page_filename(2).unwrap(), "page10.jpg");
/// ```
#[derive(Debug, Clone, Default)]
pub struct CbzDocument {
    archive: Archive,
    format: CbzFormat,
    pages: Vec<CbzPage>,
    info: ComicInfo,
}

impl CbzDocument {
    /// Empty in-memory comic.
    #[must_use = "creates a new document"]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a comic from disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not a supported
    /// container, or its `ComicInfo.xml` is malformed.
    pub fn open(path: &Path) -> Result<Self> {
        Self::from_archive(Archive::open(path)?)
    }

    /// Open a comic from a byte stream.
    ///
    /// # Errors
    ///
    /// See [`CbzDocument::open`].
    pub fn open_stream(stream: &mut ByteStream) -> Result<Self> {
        Self::from_archive(Archive::from_stream(stream, folio_archive::MAX_PART_SIZE)?)
    }

    /// Build the page index over an already-loaded archive.
    ///
    /// Image entries (by extension) become pages in natural order; entries
    /// under `__MACOSX/` and hidden files are ignored. Sizes come from
    /// `ComicInfo.xml` when it has them and from image headers otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if `ComicInfo.xml` is present but malformed.
    pub fn from_archive(archive: Archive) -> Result<Self> {
        let format = CbzFormat::from_archive(archive.format());
        if format == CbzFormat::Cbr {
            return Err(CbzError::Unsupported("RAR containers".to_string()));
        }

        let info = match find_comic_info(&archive) {
            Some(path) => {
                let data = archive.part_data(&path).unwrap_or_default();
                ComicInfo::parse(&String::from_utf8_lossy(data))?
            }
            None => ComicInfo::default(),
        };

        let mut names: Vec<String> = archive
            .paths()
            .filter(|p| is_page_entry(p))
            .map(str::to_string)
            .collect();
        names.sort_by(|a, b| natural_cmp(a, b));

        let mut doc = Self {
            archive,
            format,
            pages: Vec::with_capacity(names.len()),
            info,
        };
        for name in names {
            let page = doc.describe(name);
            doc.pages.push(page);
        }
        doc.apply_page_info();

        log::debug!(
            "Opened {} with {} pages (title: {:?})",
            doc.format,
            doc.pages.len(),
            doc.info.title
        );
        Ok(doc)
    }

    fn describe(&self, name: String) -> CbzPage {
        let data = self.archive.part_data(&name);
        let (width, height) = data
            .and_then(image_size)
            .unwrap_or((DEFAULT_PAGE_WIDTH, DEFAULT_PAGE_HEIGHT));
        CbzPage {
            format: ImageFormat::detect(&name, data),
            name,
            width,
            height,
            double: false,
        }
    }

    /// Overlay `<Pages>` entries (by page number) onto the index.
    fn apply_page_info(&mut self) {
        for entry in &self.info.pages {
            let Some(page) = self.pages.get_mut(entry.image) else {
                log::warn!("ComicInfo page {} has no matching image", entry.image);
                continue;
            };
            page.double = entry.double_page;
            if let (Some(w), Some(h)) = (entry.width, entry.height) {
                if w > 0 && h > 0 {
                    page.width = w;
                    page.height = h;
                }
            }
        }
    }

    #[must_use = "returns the container format"]
    pub const fn format(&self) -> CbzFormat {
        self.format
    }

    #[must_use = "returns the underlying archive"]
    pub const fn archive(&self) -> &Archive {
        &self.archive
    }

    #[must_use = "returns the page count"]
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    #[must_use = "returns the page index"]
    pub fn pages(&self) -> &[CbzPage] {
        &self.pages
    }

    fn page(&self, index: usize) -> Result<&CbzPage> {
        self.pages.get(index).ok_or(CbzError::PageOutOfRange {
            index,
            count: self.pages.len(),
        })
    }

    fn page_mut(&mut self, index: usize) -> Result<&mut CbzPage> {
        let count = self.pages.len();
        self.pages
            .get_mut(index)
            .ok_or(CbzError::PageOutOfRange { index, count })
    }

    /// Append a page entry. The name need not exist in the archive yet.
    ///
    /// # Errors
    ///
    /// Rejects names containing NUL.
    pub fn add_entry(&mut self, name: &str) -> Result<()> {
        check_text("entry name", name)?;
        let page = self.describe(name.to_string());
        self.pages.push(page);
        Ok(())
    }

    /// Store image bytes as a part and append a page entry for them.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is invalid or already present.
    pub fn add_page(&mut self, name: &str, data: Vec<u8>) -> Result<()> {
        check_text("entry name", name)?;
        let mime = ImageFormat::detect(name, Some(&data)).mime_type();
        self.archive.add_part(name, data, mime)?;
        self.add_entry(name)
    }

    /// Recompute page order by natural sort of entry names.
    ///
    /// # Errors
    ///
    /// Fails with a format error, leaving the order untouched, if any entry
    /// name is empty.
    pub fn sort_pages(&mut self) -> Result<()> {
        if let Some(i) = self.pages.iter().position(|p| p.name.is_empty()) {
            return Err(CbzError::EmptyEntryName(i));
        }
        self.pages.sort_by(|a, b| natural_cmp(&a.name, &b.name));
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`CbzError::PageOutOfRange`] for a bad index.
    pub fn page_filename(&self, index: usize) -> Result<String> {
        Ok(self.page(index)?.name.clone())
    }

    /// # Errors
    ///
    /// Returns [`CbzError::PageOutOfRange`] for a bad index.
    pub fn page_format(&self, index: usize) -> Result<ImageFormat> {
        Ok(self.page(index)?.format)
    }

    /// Page size in pixels.
    ///
    /// # Errors
    ///
    /// Returns [`CbzError::PageOutOfRange`] for a bad index.
    pub fn page_size(&self, index: usize) -> Result<(u32, u32)> {
        let page = self.page(index)?;
        Ok((page.width, page.height))
    }

    /// # Errors
    ///
    /// Rejects a bad index or a zero dimension.
    pub fn set_page_size(&mut self, index: usize, width: u32, height: u32) -> Result<()> {
        if width == 0 || height == 0 {
            return Err(CbzError::invalid("page size", format!("{width}x{height}")));
        }
        let page = self.page_mut(index)?;
        page.width = width;
        page.height = height;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`CbzError::PageOutOfRange`] for a bad index.
    pub fn is_double(&self, index: usize) -> Result<bool> {
        Ok(self.page(index)?.double)
    }

    /// # Errors
    ///
    /// Returns [`CbzError::PageOutOfRange`] for a bad index.
    pub fn set_double(&mut self, index: usize, double: bool) -> Result<()> {
        self.page_mut(index)?.double = double;
        Ok(())
    }

    // ========================================================================
    // ComicInfo
    // ========================================================================

    #[must_use = "returns the metadata"]
    pub const fn comic_info(&self) -> &ComicInfo {
        &self.info
    }

    #[must_use = "returns the title"]
    pub fn title(&self) -> Option<&str> {
        self.info.title.as_deref()
    }

    #[must_use = "returns the series"]
    pub fn series(&self) -> Option<&str> {
        self.info.series.as_deref()
    }

    #[must_use = "returns the issue number"]
    pub fn number(&self) -> Option<&str> {
        self.info.number.as_deref()
    }

    #[must_use = "returns the writer"]
    pub fn writer(&self) -> Option<&str> {
        self.info.writer.as_deref()
    }

    #[must_use = "returns the publisher"]
    pub fn publisher(&self) -> Option<&str> {
        self.info.publisher.as_deref()
    }

    #[must_use = "returns the summary"]
    pub fn summary(&self) -> Option<&str> {
        self.info.summary.as_deref()
    }

    #[must_use = "returns the year"]
    pub const fn year(&self) -> Option<i32> {
        self.info.year
    }

    #[must_use = "returns the manga flag"]
    pub const fn manga(&self) -> Manga {
        self.info.manga
    }

    #[must_use = "returns the reading direction"]
    pub const fn reading_direction(&self) -> ReadingDirection {
        self.info.manga.reading_direction()
    }

    /// # Errors
    ///
    /// Rejects text containing NUL.
    pub fn set_title(&mut self, title: &str) -> Result<()> {
        check_text("title", title)?;
        self.info.title = Some(title.to_string());
        Ok(())
    }

    /// # Errors
    ///
    /// Rejects text containing NUL.
    pub fn set_series(&mut self, series: &str) -> Result<()> {
        check_text("series", series)?;
        self.info.series = Some(series.to_string());
        Ok(())
    }

    /// # Errors
    ///
    /// Rejects text containing NUL.
    pub fn set_number(&mut self, number: &str) -> Result<()> {
        check_text("number", number)?;
        self.info.number = Some(number.to_string());
        Ok(())
    }

    /// # Errors
    ///
    /// Rejects text containing NUL.
    pub fn set_writer(&mut self, writer: &str) -> Result<()> {
        check_text("writer", writer)?;
        self.info.writer = Some(writer.to_string());
        Ok(())
    }

    /// # Errors
    ///
    /// Rejects text containing NUL.
    pub fn set_publisher(&mut self, publisher: &str) -> Result<()> {
        check_text("publisher", publisher)?;
        self.info.publisher = Some(publisher.to_string());
        Ok(())
    }

    /// # Errors
    ///
    /// Rejects text containing NUL.
    pub fn set_summary(&mut self, summary: &str) -> Result<()> {
        check_text("summary", summary)?;
        self.info.summary = Some(summary.to_string());
        Ok(())
    }

    /// # Errors
    ///
    /// Rejects years outside `1..=9999`.
    pub fn set_year(&mut self, year: i32) -> Result<()> {
        if !(1..=9999).contains(&year) {
            return Err(CbzError::invalid("year", year.to_string()));
        }
        self.info.year = Some(year);
        Ok(())
    }

    pub fn set_manga(&mut self, manga: Manga) {
        self.info.manga = manga;
    }

    /// Current metadata and page flags as `ComicInfo.xml`.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn comic_info_xml(&self) -> Result<String> {
        let mut info = self.info.clone();
        info.pages = self
            .pages
            .iter()
            .enumerate()
            .map(|(image, page)| {
                let kind = self.info.page(image).and_then(|p| p.kind.clone());
                ComicPageInfo {
                    image,
                    double_page: page.double,
                    width: Some(page.width),
                    height: Some(page.height),
                    kind,
                }
            })
            .collect();
        info.to_xml()
    }
}

impl PageSource for CbzDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    #[allow(clippy::cast_precision_loss)]
    fn page_bounds(&self, page: usize) -> folio_core::Result<Rect> {
        let p = self.page(page)?;
        Ok(Rect::from_size(p.width as f32, p.height as f32))
    }

    /// One image command filling the page. Entries whose image part is
    /// missing draw nothing.
    fn run_page(&self, page: usize, device: &mut dyn Device, ctm: &Matrix) -> folio_core::Result<()> {
        let bounds = self.page_bounds(page)?;
        let p = self.page(page)?;
        let Some(data) = self.archive.part_data(&p.name) else {
            log::warn!("Page {page} ({}) has no image data", p.name);
            return Ok(());
        };
        let image = ImageRef::new(&p.name, p.format.mime_type(), Arc::from(data))
            .with_size(p.width, p.height);
        let placement = Matrix::scale(bounds.width(), bounds.height()).concat(ctm);
        device.draw(&Command::FillImage { image, alpha: 1.0 }, &placement)?;
        Ok(())
    }
}

fn check_text(field: &'static str, value: &str) -> Result<()> {
    if value.contains('\0') {
        return Err(CbzError::invalid(field, "contains NUL"));
    }
    Ok(())
}

fn is_page_entry(path: &str) -> bool {
    if path.starts_with("__MACOSX/") {
        return false;
    }
    if folio_archive::path::file_name(path).starts_with('.') {
        return false;
    }
    is_image_file(path)
}

fn find_comic_info(archive: &Archive) -> Option<String> {
    if archive.has_part(COMIC_INFO_PART) {
        return Some(COMIC_INFO_PART.to_string());
    }
    archive
        .paths()
        .find(|p| {
            !p.starts_with("__MACOSX/")
                && folio_archive::path::file_name(p).eq_ignore_ascii_case(COMIC_INFO_PART)
        })
        .map(str::to_string)
}
