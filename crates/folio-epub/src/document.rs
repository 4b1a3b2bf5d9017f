//! EPUB document: package model, navigation and reflowed pages.

use crate::error::{EpubError, Result};
use crate::layout::{extract_blocks, paginate, EpubLayout, LayoutPage};
use crate::media::MediaType;
use crate::package::{
    parse_container, parse_package, Direction, EpubVersion, ManifestItem, Package, SpineItem,
    CONTAINER_PART,
};
use crate::toc::{parse_nav, parse_ncx, TocEntry};
use folio_archive::opc::part_text;
use folio_archive::{resolve, Archive, ByteStream, MAX_PART_SIZE};
use folio_core::{Matrix, Rect};
use folio_render::{Color, Command, Device, PageSource, TextSpan};
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

/// Package path used by [`EpubDocument::new`].
pub const DEFAULT_PACKAGE_PATH: &str = "OEBPS/content.opf";

/// Font name recorded on reflowed text.
const BODY_FONT: &str = "serif";

// Language-Tag shape: primary subtag, then `-`-separated subtags
static RE_LANGUAGE_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[A-Za-z]{2,8}|[xXiI])(?:-[A-Za-z0-9]{1,8})*$").expect("valid language tag pattern")
});

/// An EPUB 2 or 3 publication.
#[derive(Debug, Clone)]
pub struct EpubDocument {
    archive: Archive,
    package: Package,
    toc: Vec<TocEntry>,
    layout: EpubLayout,
    pages: Vec<LayoutPage>,
}

impl Default for EpubDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl EpubDocument {
    /// Empty EPUB 3 publication with its package at [`DEFAULT_PACKAGE_PATH`].
    #[must_use = "creates an empty document"]
    pub fn new() -> Self {
        let mut doc = Self {
            archive: Archive::new(),
            package: Package {
                path: DEFAULT_PACKAGE_PATH.to_string(),
                ..Package::default()
            },
            toc: Vec::new(),
            layout: EpubLayout::default(),
            pages: Vec::new(),
        };
        doc.repaginate();
        doc
    }

    /// Open an EPUB file.
    ///
    /// # Errors
    ///
    /// Returns an error if the container cannot be read or the package is invalid.
    pub fn open(path: &Path) -> Result<Self> {
        log::debug!("Opening EPUB {}", path.display());
        Self::from_archive(Archive::open(path)?)
    }

    /// Open an EPUB from a byte stream.
    ///
    /// # Errors
    ///
    /// Returns an error if the container cannot be read or the package is invalid.
    pub fn open_stream(stream: &mut ByteStream) -> Result<Self> {
        Self::from_archive(Archive::from_stream(stream, MAX_PART_SIZE)?)
    }

    /// Build the document model on an already loaded archive.
    ///
    /// The package is located through `META-INF/container.xml`, falling back
    /// to the first `.opf` part. Every spine entry must name a manifest item
    /// whose part exists.
    ///
    /// # Errors
    ///
    /// - [`EpubError::MissingPackage`] if no package document can be found
    /// - [`EpubError::MissingFile`] if the rootfile is absent
    /// - [`EpubError::UnresolvedSpine`] for a dangling spine entry
    /// - [`EpubError::Xml`] for malformed container, package or nav XML
    pub fn from_archive(archive: Archive) -> Result<Self> {
        let opf_path = match archive.part_data(CONTAINER_PART) {
            Some(data) => parse_container(part_text(CONTAINER_PART, data)?)?,
            None => {
                log::warn!("No {CONTAINER_PART}, searching for a package document");
                archive
                    .paths()
                    .find(|p| folio_archive::path::extension(p) == "opf")
                    .map(str::to_string)
                    .ok_or(EpubError::MissingPackage)?
            }
        };
        let opf_path = folio_archive::normalize_path(&opf_path)?;
        let data = archive
            .part_data(&opf_path)
            .ok_or_else(|| EpubError::MissingFile(opf_path.clone()))?;
        let package = parse_package(part_text(&opf_path, data)?, &opf_path)?;

        for item in &package.spine {
            check_spine_target(&archive, &package, &item.idref)?;
        }
        let toc = load_toc(&archive, &package)?;

        let mut doc = Self {
            archive,
            package,
            toc,
            layout: EpubLayout::default(),
            pages: Vec::new(),
        };
        doc.repaginate();
        log::debug!(
            "EPUB {} opened: {} manifest items, {} spine entries, {} pages",
            doc.package.path,
            doc.package.manifest.len(),
            doc.package.spine.len(),
            doc.pages.len()
        );
        Ok(doc)
    }

    #[must_use = "returns the underlying archive"]
    pub fn archive(&self) -> &Archive {
        &self.archive
    }

    #[must_use = "returns the package model"]
    pub fn package(&self) -> &Package {
        &self.package
    }

    // ========================================================================
    // Version and direction
    // ========================================================================

    /// Major version, 2 or 3.
    #[must_use = "returns the EPUB version"]
    pub fn version(&self) -> u8 {
        self.package.version.number()
    }

    /// # Errors
    ///
    /// Returns [`EpubError::InvalidValue`] for anything but 2 or 3.
    pub fn set_version(&mut self, version: u8) -> Result<()> {
        self.package.version = EpubVersion::from_number(version)
            .ok_or_else(|| EpubError::invalid("version", format!("{version} is not 2 or 3")))?;
        Ok(())
    }

    #[must_use = "returns the page progression direction"]
    pub fn direction(&self) -> Direction {
        self.package.direction
    }

    pub fn set_direction(&mut self, direction: Direction) {
        self.package.direction = direction;
    }

    // ========================================================================
    // Metadata
    // ========================================================================

    #[must_use = "returns the title"]
    pub fn title(&self) -> Option<&str> {
        self.package.metadata.title.as_deref()
    }

    /// # Errors
    ///
    /// Returns [`EpubError::InvalidValue`] if the title contains NUL.
    pub fn set_title(&mut self, title: &str) -> Result<()> {
        check_text("title", title)?;
        self.package.metadata.title = Some(title.to_string());
        Ok(())
    }

    #[must_use = "returns the number of creators"]
    pub fn creator_count(&self) -> usize {
        self.package.metadata.creators.len()
    }

    /// # Errors
    ///
    /// Returns [`EpubError::OutOfRange`] past the last creator.
    pub fn creator(&self, index: usize) -> Result<&str> {
        let creators = &self.package.metadata.creators;
        creators
            .get(index)
            .map(String::as_str)
            .ok_or(EpubError::OutOfRange {
                what: "creator",
                index,
                len: creators.len(),
            })
    }

    #[must_use = "returns the creators"]
    pub fn creators(&self) -> &[String] {
        &self.package.metadata.creators
    }

    /// # Errors
    ///
    /// Returns [`EpubError::InvalidValue`] if the name contains NUL.
    pub fn add_creator(&mut self, name: &str) -> Result<()> {
        check_text("creator", name)?;
        self.package.metadata.creators.push(name.to_string());
        Ok(())
    }

    #[must_use = "returns the language tag"]
    pub fn language(&self) -> Option<&str> {
        self.package.metadata.language.as_deref()
    }

    /// Set the language. The tag must have BCP 47 shape (`en`, `pt-BR`,
    /// `zh-Hant-TW`); registry membership is not checked.
    ///
    /// # Errors
    ///
    /// Returns [`EpubError::InvalidValue`] for a malformed tag.
    pub fn set_language(&mut self, tag: &str) -> Result<()> {
        if !RE_LANGUAGE_TAG.is_match(tag) {
            return Err(EpubError::invalid("language", format!("'{tag}' is not a language tag")));
        }
        self.package.metadata.language = Some(tag.to_string());
        Ok(())
    }

    #[must_use = "returns the identifier"]
    pub fn identifier(&self) -> Option<&str> {
        self.package.metadata.identifier.as_deref()
    }

    /// # Errors
    ///
    /// Returns [`EpubError::InvalidValue`] if the identifier contains NUL.
    pub fn set_identifier(&mut self, identifier: &str) -> Result<()> {
        check_text("identifier", identifier)?;
        self.package.metadata.identifier = Some(identifier.to_string());
        Ok(())
    }

    #[must_use = "returns the publisher"]
    pub fn publisher(&self) -> Option<&str> {
        self.package.metadata.publisher.as_deref()
    }

    #[must_use = "returns the publication date"]
    pub fn date(&self) -> Option<&str> {
        self.package.metadata.date.as_deref()
    }

    #[must_use = "returns the description"]
    pub fn description(&self) -> Option<&str> {
        self.package.metadata.description.as_deref()
    }

    // ========================================================================
    // Manifest
    // ========================================================================

    #[must_use = "returns the number of manifest items"]
    pub fn manifest_count(&self) -> usize {
        self.package.manifest.len()
    }

    #[must_use = "returns the manifest"]
    pub fn manifest(&self) -> &[ManifestItem] {
        &self.package.manifest
    }

    #[must_use = "returns the manifest item"]
    pub fn manifest_item(&self, id: &str) -> Option<&ManifestItem> {
        self.package.item(id)
    }

    /// Add a manifest item. `href` is relative to the package document.
    ///
    /// The target part does not have to exist yet.
    ///
    /// # Errors
    ///
    /// - [`EpubError::DuplicateId`] if `id` is already in the manifest
    /// - [`EpubError::InvalidValue`] for an empty id or href, or NUL
    /// - [`EpubError::Archive`] if the href escapes the container
    pub fn add_manifest_item(&mut self, id: &str, href: &str, media_type: &str) -> Result<()> {
        if id.is_empty() {
            return Err(EpubError::invalid("id", "empty"));
        }
        if href.is_empty() {
            return Err(EpubError::invalid("href", "empty"));
        }
        check_text("id", id)?;
        check_text("href", href)?;
        check_text("media type", media_type)?;
        if self.package.item(id).is_some() {
            return Err(EpubError::DuplicateId(id.to_string()));
        }
        let item = self.package.make_item(id, href, media_type, Vec::new())?;
        self.package.manifest.push(item);
        Ok(())
    }

    /// Archive path of a manifest item (the declared href for external items).
    #[must_use = "returns the item path"]
    pub fn manifest_href(&self, id: &str) -> Option<&str> {
        self.package
            .item(id)
            .map(|i| if i.is_external() { i.href.as_str() } else { i.path.as_str() })
    }

    #[must_use = "returns the item media type"]
    pub fn manifest_media_type(&self, id: &str) -> Option<&str> {
        self.package.item(id).map(|i| i.media_type.as_str())
    }

    // ========================================================================
    // Spine
    // ========================================================================

    #[must_use = "returns the number of spine entries"]
    pub fn spine_count(&self) -> usize {
        self.package.spine.len()
    }

    #[must_use = "returns the spine"]
    pub fn spine(&self) -> &[SpineItem] {
        &self.package.spine
    }

    /// Append a spine entry and reflow.
    ///
    /// # Errors
    ///
    /// Returns [`EpubError::UnresolvedSpine`] unless `idref` names a manifest
    /// item whose part exists.
    pub fn add_spine_item(&mut self, idref: &str, linear: bool) -> Result<()> {
        check_spine_target(&self.archive, &self.package, idref)?;
        self.package.spine.push(SpineItem {
            idref: idref.to_string(),
            linear,
        });
        self.repaginate();
        Ok(())
    }

    fn spine_entry(&self, index: usize) -> Result<&SpineItem> {
        self.package.spine.get(index).ok_or(EpubError::OutOfRange {
            what: "spine",
            index,
            len: self.package.spine.len(),
        })
    }

    /// # Errors
    ///
    /// Returns [`EpubError::OutOfRange`] past the end of the spine.
    pub fn spine_idref(&self, index: usize) -> Result<&str> {
        Ok(&self.spine_entry(index)?.idref)
    }

    /// # Errors
    ///
    /// Returns [`EpubError::OutOfRange`] past the end of the spine.
    pub fn spine_is_linear(&self, index: usize) -> Result<bool> {
        Ok(self.spine_entry(index)?.linear)
    }

    /// Idrefs of the linear spine entries in reading order.
    #[must_use = "returns the reading order"]
    pub fn linear_reading_order(&self) -> Vec<&str> {
        self.package
            .spine
            .iter()
            .filter(|s| s.linear)
            .map(|s| s.idref.as_str())
            .collect()
    }

    /// Manifest item of a spine entry, linear or not.
    #[must_use = "returns the manifest item"]
    pub fn spine_item(&self, idref: &str) -> Option<&ManifestItem> {
        self.package
            .spine
            .iter()
            .find(|s| s.idref == idref)
            .and_then(|s| self.package.item(&s.idref))
    }

    // ========================================================================
    // Table of contents
    // ========================================================================

    #[must_use = "returns the number of TOC entries"]
    pub fn toc_count(&self) -> usize {
        self.toc.len()
    }

    #[must_use = "returns the TOC"]
    pub fn toc(&self) -> &[TocEntry] {
        &self.toc
    }

    /// Append a TOC entry. `content` is relative to the package document.
    ///
    /// # Errors
    ///
    /// Returns [`EpubError::InvalidValue`] for an empty content or NUL, and
    /// [`EpubError::Archive`] if the content escapes the container.
    pub fn add_toc_entry(&mut self, id: &str, label: &str, content: &str) -> Result<()> {
        check_text("id", id)?;
        check_text("label", label)?;
        check_text("content", content)?;
        if content.is_empty() {
            return Err(EpubError::invalid("content", "empty"));
        }
        let href = if folio_archive::path::is_external(content) {
            content.to_string()
        } else {
            resolve(&self.package.path, content)?
        };
        self.toc.push(TocEntry {
            id: id.to_string(),
            label: label.to_string(),
            href,
        });
        Ok(())
    }

    fn toc_entry(&self, index: usize) -> Result<&TocEntry> {
        self.toc.get(index).ok_or(EpubError::OutOfRange {
            what: "toc",
            index,
            len: self.toc.len(),
        })
    }

    /// # Errors
    ///
    /// Returns [`EpubError::OutOfRange`] past the last entry.
    pub fn toc_label(&self, index: usize) -> Result<&str> {
        Ok(&self.toc_entry(index)?.label)
    }

    /// Target of a TOC entry as an archive path, fragment kept.
    ///
    /// # Errors
    ///
    /// Returns [`EpubError::OutOfRange`] past the last entry.
    pub fn toc_content(&self, index: usize) -> Result<&str> {
        Ok(&self.toc_entry(index)?.href)
    }

    // ========================================================================
    // Files
    // ========================================================================

    #[must_use = "returns whether the part exists"]
    pub fn has_file(&self, path: &str) -> bool {
        self.archive.has_part(path)
    }

    /// Bytes of a part. `None` means absent; a zero-length part is `Some(&[])`.
    #[must_use = "returns the part data"]
    pub fn file_data(&self, path: &str) -> Option<&[u8]> {
        self.archive.part_data(path)
    }

    /// Store a new part; the content type is guessed from the extension.
    ///
    /// # Errors
    ///
    /// Returns an archive error for an invalid or duplicate path.
    pub fn add_file(&mut self, path: &str, data: Vec<u8>) -> Result<()> {
        self.archive.add_part(path, data, "")?;
        Ok(())
    }

    // ========================================================================
    // Layout
    // ========================================================================

    #[must_use = "returns the reflow layout"]
    pub fn layout(&self) -> EpubLayout {
        self.layout
    }

    /// Change the page box and reflow.
    ///
    /// # Errors
    ///
    /// Returns [`EpubError::InvalidValue`] unless the box is finite and
    /// larger than its margins.
    pub fn set_layout(&mut self, layout: EpubLayout) -> Result<()> {
        if !layout.is_valid() {
            return Err(EpubError::invalid(
                "layout",
                format!("{}x{} with em {}", layout.width, layout.height, layout.em),
            ));
        }
        self.layout = layout;
        self.repaginate();
        Ok(())
    }

    #[must_use = "returns the number of reflowed pages"]
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Every page has the layout's size.
    ///
    /// # Errors
    ///
    /// Returns [`EpubError::OutOfRange`] past the last page.
    pub fn page_size(&self, page: usize) -> Result<(f32, f32)> {
        self.page(page)?;
        Ok((self.layout.width, self.layout.height))
    }

    /// # Errors
    ///
    /// Returns [`EpubError::OutOfRange`] past the last page.
    pub fn page(&self, page: usize) -> Result<&LayoutPage> {
        self.pages.get(page).ok_or(EpubError::OutOfRange {
            what: "page",
            index: page,
            len: self.pages.len(),
        })
    }

    /// Reflow every linear spine entry. Chapters start on a new page;
    /// non-XHTML and unreadable chapters produce one blank page.
    fn repaginate(&mut self) {
        let mut pages = Vec::new();
        for (index, entry) in self.package.spine.iter().enumerate() {
            if !entry.linear {
                continue;
            }
            let blocks = self
                .package
                .item(&entry.idref)
                .filter(|item| item.kind() == MediaType::Xhtml)
                .and_then(|item| {
                    let data = self.archive.part_data(&item.path)?;
                    match part_text(&item.path, data) {
                        Ok(text) => Some(extract_blocks(text)),
                        Err(e) => {
                            log::warn!("Cannot reflow spine item '{}': {e}", entry.idref);
                            None
                        }
                    }
                })
                .unwrap_or_default();
            pages.extend(paginate(&blocks, &self.layout, index));
        }
        self.pages = pages;
    }
}

impl PageSource for EpubDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_bounds(&self, page: usize) -> folio_core::Result<Rect> {
        let (w, h) = self.page_size(page)?;
        Ok(Rect::from_size(w, h))
    }

    /// One text command per laid-out line.
    fn run_page(&self, page: usize, device: &mut dyn Device, ctm: &Matrix) -> folio_core::Result<()> {
        for line in &self.page(page)?.lines {
            let span = TextSpan::new(line.text.as_str(), BODY_FONT, line.size, line.origin);
            device.draw(
                &Command::FillText {
                    span,
                    color: Color::BLACK,
                },
                ctm,
            )?;
        }
        Ok(())
    }
}

fn check_text(field: &'static str, value: &str) -> Result<()> {
    if value.contains('\0') {
        return Err(EpubError::invalid(field, "contains NUL"));
    }
    Ok(())
}

fn check_spine_target(archive: &Archive, package: &Package, idref: &str) -> Result<()> {
    let item = package
        .item(idref)
        .ok_or_else(|| EpubError::unresolved(idref, "no manifest item"))?;
    if item.is_external() {
        return Err(EpubError::unresolved(idref, format!("external resource {}", item.href)));
    }
    if !archive.has_part(&item.path) {
        return Err(EpubError::unresolved(idref, format!("missing part {}", item.path)));
    }
    Ok(())
}

/// Navigation document first (EPUB 3), then the NCX (spine `toc` attribute
/// or NCX media type). A missing navigation part is not fatal.
fn load_toc(archive: &Archive, package: &Package) -> Result<Vec<TocEntry>> {
    if let Some(nav) = package.manifest.iter().find(|i| i.has_property("nav")) {
        match archive.part_data(&nav.path) {
            Some(data) => {
                let entries = parse_nav(part_text(&nav.path, data)?, &nav.path)?;
                if !entries.is_empty() {
                    return Ok(entries);
                }
            }
            None => log::warn!("Navigation document {} is missing", nav.path),
        }
    }

    let ncx = package
        .toc_id
        .as_deref()
        .and_then(|id| package.item(id))
        .or_else(|| package.manifest.iter().find(|i| i.kind() == MediaType::Ncx));
    let Some(ncx) = ncx else {
        return Ok(Vec::new());
    };
    match archive.part_data(&ncx.path) {
        Some(data) => Ok(parse_ncx(part_text(&ncx.path, data)?, &ncx.path)),
        None => {
            log::warn!("NCX {} is missing", ncx.path);
            Ok(Vec::new())
        }
    }
}
