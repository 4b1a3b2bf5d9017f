//! The document variant over all supported families.

use crate::format::DocumentFormat;
use crate::options::OpenOptions;
use folio_archive::{split_fragment, Archive, ByteStream};
use folio_cbz::CbzDocument;
use folio_core::{FolioError, Matrix, Rect, Result};
use folio_epub::EpubDocument;
use folio_office::{ContentNode, OfficeDocument};
use folio_render::{Device, PageSource};
use folio_xps::XpsDocument;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// An opened document of any family, owning its archive.
#[derive(Debug, Clone)]
pub enum Document {
    Cbz(CbzDocument),
    Epub(EpubDocument),
    Xps(XpsDocument),
    Office(OfficeDocument),
}

/// Summary of a document for listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentInfo {
    pub format: DocumentFormat,
    pub title: Option<String>,
    pub creator: Option<String>,
    pub page_count: usize,
    pub pages: Vec<PageInfo>,
}

/// Page box in points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageInfo {
    pub index: usize,
    pub width: f32,
    pub height: f32,
}

/// One navigation entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutlineEntry {
    /// Nesting level, 1 for top-level entries
    pub level: u8,
    pub title: String,
    /// Archive path or external URI the entry points at
    pub target: Option<String>,
    /// First page of the target, when it maps onto one
    pub page: Option<usize>,
}

impl Document {
    /// Open a document file.
    ///
    /// The format comes from `options`, then from the container contents,
    /// then from the file extension.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, the container is not
    /// recognized, or the family model rejects it.
    pub fn open(path: &Path, options: &OpenOptions) -> Result<Self> {
        log::debug!("Opening {}", path.display());
        let bytes = std::fs::read(path)?;
        let archive = Archive::from_bytes_with_limit(&bytes, options.max_part_size)?;
        let hint = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(DocumentFormat::from_extension);
        Self::build(archive, options, hint)
    }

    /// Open a document from a byte stream.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream cannot be read, the container is not
    /// recognized, or the family model rejects it.
    pub fn open_stream(stream: &mut ByteStream, options: &OpenOptions) -> Result<Self> {
        let archive = Archive::from_stream(stream, options.max_part_size)?;
        Self::build(archive, options, None)
    }

    /// Open a document on an already loaded archive, taking ownership of it.
    ///
    /// # Errors
    ///
    /// Returns an error if the format cannot be determined or the family
    /// model rejects the archive.
    pub fn from_archive(archive: Archive, options: &OpenOptions) -> Result<Self> {
        Self::build(archive, options, None)
    }

    fn build(archive: Archive, options: &OpenOptions, hint: Option<DocumentFormat>) -> Result<Self> {
        let format = options
            .format
            .or_else(|| DocumentFormat::detect(&archive))
            .or(hint)
            .ok_or_else(|| FolioError::format("unrecognized document container"))?;
        log::debug!("Opening {} parts as {format}", archive.len());

        let doc = match format {
            DocumentFormat::Cbz => Self::Cbz(CbzDocument::from_archive(archive)?),
            DocumentFormat::Epub => {
                let mut epub = EpubDocument::from_archive(archive)?;
                if let Some(layout) = options.layout {
                    epub.set_layout(layout)?;
                }
                Self::Epub(epub)
            }
            DocumentFormat::Xps => Self::Xps(XpsDocument::from_archive(archive)?),
            DocumentFormat::Docx
            | DocumentFormat::Xlsx
            | DocumentFormat::Pptx
            | DocumentFormat::Odt
            | DocumentFormat::Ods
            | DocumentFormat::Odp => {
                let office = OfficeDocument::from_archive(archive)?;
                let found = DocumentFormat::from(office.office_type());
                if found != format {
                    return Err(FolioError::format(format!(
                        "container holds {found}, not {format}"
                    )));
                }
                Self::Office(office)
            }
        };
        log::debug!("Opened {format} with {} pages", doc.page_count());
        Ok(doc)
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    #[must_use = "returns the document format"]
    pub fn format(&self) -> DocumentFormat {
        match self {
            Self::Cbz(_) => DocumentFormat::Cbz,
            Self::Epub(_) => DocumentFormat::Epub,
            Self::Xps(_) => DocumentFormat::Xps,
            Self::Office(doc) => doc.office_type().into(),
        }
    }

    #[must_use = "returns the underlying archive"]
    pub fn archive(&self) -> &Archive {
        match self {
            Self::Cbz(doc) => doc.archive(),
            Self::Epub(doc) => doc.archive(),
            Self::Xps(doc) => doc.archive(),
            Self::Office(doc) => doc.archive(),
        }
    }

    #[must_use = "returns the title"]
    pub fn title(&self) -> Option<&str> {
        match self {
            Self::Cbz(doc) => doc.title(),
            Self::Epub(doc) => doc.title(),
            Self::Xps(doc) => doc.title(),
            Self::Office(doc) => doc.title(),
        }
    }

    /// Principal author: comic writer, first EPUB creator, XPS author or
    /// office creator.
    #[must_use = "returns the creator"]
    pub fn creator(&self) -> Option<&str> {
        match self {
            Self::Cbz(doc) => doc.writer(),
            Self::Epub(doc) => doc.creators().first().map(String::as_str),
            Self::Xps(doc) => doc.author(),
            Self::Office(doc) => doc.creator(),
        }
    }

    #[must_use]
    pub const fn as_cbz(&self) -> Option<&CbzDocument> {
        match self {
            Self::Cbz(doc) => Some(doc),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_cbz_mut(&mut self) -> Option<&mut CbzDocument> {
        match self {
            Self::Cbz(doc) => Some(doc),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_epub(&self) -> Option<&EpubDocument> {
        match self {
            Self::Epub(doc) => Some(doc),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_epub_mut(&mut self) -> Option<&mut EpubDocument> {
        match self {
            Self::Epub(doc) => Some(doc),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_xps(&self) -> Option<&XpsDocument> {
        match self {
            Self::Xps(doc) => Some(doc),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_xps_mut(&mut self) -> Option<&mut XpsDocument> {
        match self {
            Self::Xps(doc) => Some(doc),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_office(&self) -> Option<&OfficeDocument> {
        match self {
            Self::Office(doc) => Some(doc),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_office_mut(&mut self) -> Option<&mut OfficeDocument> {
        match self {
            Self::Office(doc) => Some(doc),
            _ => None,
        }
    }

    // ========================================================================
    // Summaries
    // ========================================================================

    /// # Errors
    ///
    /// Returns an error if a page box cannot be computed.
    pub fn info(&self) -> Result<DocumentInfo> {
        let pages = (0..self.page_count())
            .map(|index| {
                let bounds = self.page_bounds(index)?;
                Ok(PageInfo {
                    index,
                    width: bounds.width(),
                    height: bounds.height(),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(DocumentInfo {
            format: self.format(),
            title: self.title().map(str::to_string),
            creator: self.creator().map(str::to_string),
            page_count: pages.len(),
            pages,
        })
    }

    /// Navigation entries in document order.
    ///
    /// EPUB gives its table of contents, XPS one entry per fixed document,
    /// word processors their headings, presentations their slide titles and
    /// spreadsheets their sheet names. Comics have no outline.
    #[must_use = "returns the outline"]
    pub fn outline(&self) -> Vec<OutlineEntry> {
        match self {
            Self::Cbz(_) => Vec::new(),
            Self::Epub(doc) => epub_outline(doc),
            Self::Xps(doc) => xps_outline(doc),
            Self::Office(doc) => office_outline(doc),
        }
    }
}

fn epub_outline(doc: &EpubDocument) -> Vec<OutlineEntry> {
    doc.toc()
        .iter()
        .map(|entry| {
            let (path, _) = split_fragment(&entry.href);
            let page = doc
                .spine()
                .iter()
                .position(|s| doc.manifest_item(&s.idref).is_some_and(|m| m.path == path))
                .and_then(|spine| {
                    (0..doc.page_count())
                        .find(|&p| doc.page(p).is_ok_and(|page| page.spine_index == spine))
                });
            OutlineEntry {
                level: 1,
                title: entry.label.clone(),
                target: Some(entry.href.clone()),
                page,
            }
        })
        .collect()
}

fn xps_outline(doc: &XpsDocument) -> Vec<OutlineEntry> {
    let mut first_page = 0;
    let mut entries = Vec::with_capacity(doc.count_documents());
    for index in 0..doc.count_documents() {
        let (Ok(name), Ok(count)) = (doc.document_name(index), doc.count_pages_in_document(index))
        else {
            continue;
        };
        entries.push(OutlineEntry {
            level: 1,
            title: format!("Document {}", index + 1),
            target: Some(name.to_string()),
            page: (count > 0).then_some(first_page),
        });
        first_page += count;
    }
    entries
}

fn office_outline(doc: &OfficeDocument) -> Vec<OutlineEntry> {
    let office = doc.office_type();
    if office.is_spreadsheet() {
        return (0..doc.sheet_count())
            .filter_map(|i| doc.sheet_name(i).ok().map(|name| top_entry(name, i)))
            .collect();
    }
    if office.is_presentation() {
        return (0..doc.slide_count())
            .filter_map(|i| {
                doc.slide_title(i)
                    .ok()
                    .flatten()
                    .map(|title| top_entry(title, i))
            })
            .collect();
    }
    doc.nodes()
        .iter()
        .filter_map(|node| match node {
            ContentNode::Heading { level, text } => Some(OutlineEntry {
                level: *level,
                title: text.clone(),
                target: None,
                page: None,
            }),
            _ => None,
        })
        .collect()
}

fn top_entry(title: &str, page: usize) -> OutlineEntry {
    OutlineEntry {
        level: 1,
        title: title.to_string(),
        target: None,
        page: Some(page),
    }
}

impl PageSource for Document {
    fn page_count(&self) -> usize {
        match self {
            Self::Cbz(doc) => PageSource::page_count(doc),
            Self::Epub(doc) => PageSource::page_count(doc),
            Self::Xps(doc) => PageSource::page_count(doc),
            Self::Office(doc) => PageSource::page_count(doc),
        }
    }

    fn page_bounds(&self, page: usize) -> Result<Rect> {
        match self {
            Self::Cbz(doc) => doc.page_bounds(page),
            Self::Epub(doc) => doc.page_bounds(page),
            Self::Xps(doc) => doc.page_bounds(page),
            Self::Office(doc) => doc.page_bounds(page),
        }
    }

    fn run_page(&self, page: usize, device: &mut dyn Device, ctm: &Matrix) -> Result<()> {
        match self {
            Self::Cbz(doc) => doc.run_page(page, device, ctm),
            Self::Epub(doc) => doc.run_page(page, device, ctm),
            Self::Xps(doc) => doc.run_page(page, device, ctm),
            Self::Office(doc) => doc.run_page(page, device, ctm),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_office_outline_from_headings() {
        let mut office = OfficeDocument::new(folio_office::OfficeType::Docx);
        office.add_heading("Intro", 1).unwrap();
        office.add_paragraph("Body").unwrap();
        office.add_heading("Scope", 2).unwrap();
        let doc = Document::Office(office);
        assert_eq!(doc.format(), DocumentFormat::Docx);
        let outline = doc.outline();
        assert_eq!(outline.len(), 2);
        assert_eq!(outline[1].level, 2);
        assert_eq!(outline[1].title, "Scope");
    }

    #[test]
    fn test_sheet_outline() {
        let mut office = OfficeDocument::new(folio_office::OfficeType::Xlsx);
        office.add_sheet("Q1").unwrap();
        office.add_sheet("Q2").unwrap();
        let doc = Document::Office(office);
        let titles: Vec<_> = doc.outline().into_iter().map(|e| (e.title, e.page)).collect();
        assert_eq!(titles, [("Q1".to_string(), Some(0)), ("Q2".to_string(), Some(1))]);
    }

    #[test]
    fn test_empty_comic_info() {
        let doc = Document::Cbz(CbzDocument::new());
        let info = doc.info().unwrap();
        assert_eq!(info.format, DocumentFormat::Cbz);
        assert_eq!(info.page_count, 0);
        assert!(info.title.is_none());
        assert!(doc.outline().is_empty());
        assert!(doc.as_cbz().is_some());
        assert!(doc.as_epub().is_none());
    }

    #[test]
    fn test_forced_format_mismatch() {
        let mut archive = Archive::new();
        archive
            .add_part(
                "mimetype",
                b"application/vnd.oasis.opendocument.spreadsheet".to_vec(),
                "",
            )
            .unwrap();
        archive
            .add_part("content.xml", b"<office:document-content xmlns:office=\"urn:oasis:names:tc:opendocument:xmlns:office:1.0\"/>".to_vec(), "")
            .unwrap();
        let opts = OpenOptions::default().with_format(DocumentFormat::Odt);
        assert!(Document::from_archive(archive, &opts).is_err());
    }

    #[test]
    fn test_unrecognized_container() {
        let mut archive = Archive::new();
        archive.add_part("notes.txt", b"hi".to_vec(), "").unwrap();
        let err = Document::from_archive(archive, &OpenOptions::default()).unwrap_err();
        assert_eq!(err.kind(), folio_core::ErrorKind::Format);
    }
}
