//! Office document: parsed content, sheets and slides behind one API.

use crate::content::{ContentNode, Slide};
use crate::error::{OfficeError, Result};
use crate::kind::OfficeType;
use crate::layout::{layout_sheet, layout_slide, paginate, LayoutPage};
use crate::package::{optional_text, part_rels, rel_by_type, OfficeMetadata, CORE_PART, ODF_META_PART};
use crate::sheet::{check_position, CellValue, Sheet};
use crate::{docx, odf, pptx, xlsx};
use chrono::NaiveDateTime;
use folio_archive::{Archive, ByteStream, MAX_PART_SIZE};
use folio_core::{Matrix, Rect};
use folio_render::{Device, PageSource};
use std::path::Path;

/// Default page size of word processor documents and sheets (US Letter).
pub const DEFAULT_PAGE_SIZE: (f32, f32) = (612.0, 792.0);

/// Default slide size (10 × 7.5 in).
pub const DEFAULT_SLIDE_SIZE: (f32, f32) = (720.0, 540.0);

/// Longest sheet name accepted.
pub const MAX_SHEET_NAME_LEN: usize = 31;

const SHEET_NAME_FORBIDDEN: &[char] = &['[', ']', ':', '*', '?', '/', '\\'];

/// An office document of one of the six supported types.
#[derive(Debug, Clone)]
pub struct OfficeDocument {
    office_type: OfficeType,
    archive: Archive,
    metadata: OfficeMetadata,
    page_size: (f32, f32),
    content: Vec<ContentNode>,
    sheets: Vec<Sheet>,
    slides: Vec<Slide>,
    /// Pagination of `content`; word processor types only
    pages: Vec<LayoutPage>,
}

impl OfficeDocument {
    /// Create an empty document of the given type.
    #[must_use = "creates a new document"]
    pub fn new(office_type: OfficeType) -> Self {
        let page_size = if office_type.is_presentation() {
            DEFAULT_SLIDE_SIZE
        } else {
            DEFAULT_PAGE_SIZE
        };
        let mut doc = Self {
            office_type,
            archive: Archive::new(),
            metadata: OfficeMetadata::default(),
            page_size,
            content: Vec::new(),
            sheets: Vec::new(),
            slides: Vec::new(),
            pages: Vec::new(),
        };
        doc.repaginate();
        doc
    }

    /// Open an office file from disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not a supported
    /// office container, or its main parts are malformed.
    pub fn open(path: &Path) -> Result<Self> {
        log::debug!("Opening office document {}", path.display());
        Self::from_archive(Archive::open(path)?)
    }

    /// Open an office document from a byte stream.
    ///
    /// # Errors
    ///
    /// Same as [`OfficeDocument::open`].
    pub fn open_stream(stream: &mut ByteStream) -> Result<Self> {
        Self::from_archive(Archive::from_stream(stream, MAX_PART_SIZE)?)
    }

    /// Build a document from a loaded container, detecting its type.
    ///
    /// # Errors
    ///
    /// Returns [`OfficeError::UnknownType`] if the container is not one of
    /// the supported types, or a parse error from the main parts.
    pub fn from_archive(archive: Archive) -> Result<Self> {
        let office_type = OfficeType::detect(&archive).ok_or(OfficeError::UnknownType)?;
        log::debug!("Detected {} document", office_type.type_name());
        let mut doc = Self::new(office_type);

        match office_type {
            OfficeType::Docx => {
                let parsed = docx::parse(&archive)?;
                doc.content = parsed.nodes;
                if let Some(size) = parsed.page_size {
                    doc.page_size = size;
                }
            }
            OfficeType::Xlsx => doc.sheets = xlsx::parse(&archive)?,
            OfficeType::Pptx => {
                let parsed = pptx::parse(&archive)?;
                doc.slides = parsed.slides;
                if let Some(size) = parsed.slide_size {
                    doc.page_size = size;
                }
            }
            OfficeType::Odt | OfficeType::Ods | OfficeType::Odp => {
                let parsed = odf::parse(&archive, office_type)?;
                doc.content = parsed.nodes;
                doc.sheets = parsed.sheets;
                doc.slides = parsed.slides;
                // Spreadsheet page layouts describe print pages, not sheets
                if office_type != OfficeType::Ods {
                    if let Some(size) = parsed.page_size {
                        doc.page_size = size;
                    }
                }
            }
        }
        doc.metadata = load_metadata(&archive, office_type)?;
        doc.archive = archive;
        doc.repaginate();
        log::debug!(
            "Opened {}: {} nodes, {} sheets, {} slides, {} pages",
            office_type,
            doc.content.len(),
            doc.sheets.len(),
            doc.slides.len(),
            doc.page_count()
        );
        Ok(doc)
    }

    #[inline]
    #[must_use = "returns the document type"]
    pub const fn office_type(&self) -> OfficeType {
        self.office_type
    }

    /// Source container; empty for documents created with [`OfficeDocument::new`].
    #[must_use = "returns the container"]
    pub const fn archive(&self) -> &Archive {
        &self.archive
    }

    /// Pages: laid-out pages for word processor types, one per sheet or
    /// slide otherwise.
    #[must_use = "returns the page count"]
    pub fn page_count(&self) -> usize {
        if self.office_type.is_spreadsheet() {
            self.sheets.len()
        } else if self.office_type.is_presentation() {
            self.slides.len()
        } else {
            self.pages.len()
        }
    }

    /// Page size in points, shared by all pages.
    #[must_use = "returns the page size"]
    pub const fn page_size(&self) -> (f32, f32) {
        self.page_size
    }

    /// Change the page size; word processor content is paginated again.
    ///
    /// # Errors
    ///
    /// Returns [`OfficeError::InvalidValue`] unless both dimensions are
    /// finite and positive.
    pub fn set_page_size(&mut self, width: f32, height: f32) -> Result<()> {
        for (field, v) in [("page width", width), ("page height", height)] {
            if !v.is_finite() || v <= 0.0 {
                return Err(OfficeError::invalid(field, format!("{v} is not a positive size")));
            }
        }
        self.page_size = (width, height);
        self.repaginate();
        Ok(())
    }

    fn repaginate(&mut self) {
        if self.office_type.is_text() {
            let (w, h) = self.page_size;
            self.pages = paginate(&self.content, w, h);
        }
    }

    // ========================================================================
    // Metadata
    // ========================================================================

    #[must_use = "returns the metadata"]
    pub const fn metadata(&self) -> &OfficeMetadata {
        &self.metadata
    }

    #[must_use = "returns the title"]
    pub fn title(&self) -> Option<&str> {
        self.metadata.title.as_deref()
    }

    /// # Errors
    ///
    /// Returns [`OfficeError::InvalidValue`] if `title` contains NUL.
    pub fn set_title(&mut self, title: &str) -> Result<()> {
        check_text("title", title)?;
        self.metadata.title = Some(title.to_string());
        Ok(())
    }

    #[must_use = "returns the creator"]
    pub fn creator(&self) -> Option<&str> {
        self.metadata.creator.as_deref()
    }

    /// # Errors
    ///
    /// Returns [`OfficeError::InvalidValue`] if `creator` contains NUL.
    pub fn set_creator(&mut self, creator: &str) -> Result<()> {
        check_text("creator", creator)?;
        self.metadata.creator = Some(creator.to_string());
        Ok(())
    }

    // ========================================================================
    // Content tree
    // ========================================================================

    /// Append a paragraph and return its index.
    ///
    /// # Errors
    ///
    /// Returns [`OfficeError::Unsupported`] for spreadsheet and presentation
    /// types and [`OfficeError::InvalidValue`] if `text` contains NUL.
    pub fn add_paragraph(&mut self, text: &str) -> Result<usize> {
        self.require_text("add_paragraph")?;
        check_text("paragraph", text)?;
        self.push_node(ContentNode::paragraph(text))
    }

    /// Append a heading of `level` 1..=9 and return its index.
    ///
    /// # Errors
    ///
    /// Returns [`OfficeError::Unsupported`] for spreadsheet and presentation
    /// types and [`OfficeError::InvalidValue`] for a bad level or NUL text.
    pub fn add_heading(&mut self, text: &str, level: u8) -> Result<usize> {
        self.require_text("add_heading")?;
        if !(1..=9).contains(&level) {
            return Err(OfficeError::invalid("heading level", format!("{level} not in 1..=9")));
        }
        check_text("heading", text)?;
        self.push_node(ContentNode::Heading {
            level,
            text: text.to_string(),
        })
    }

    /// Append a page break and return its index.
    ///
    /// # Errors
    ///
    /// Returns [`OfficeError::Unsupported`] for non-text types.
    pub fn add_page_break(&mut self) -> Result<usize> {
        self.require_text("add_page_break")?;
        self.push_node(ContentNode::PageBreak)
    }

    fn push_node(&mut self, node: ContentNode) -> Result<usize> {
        self.content.push(node);
        self.repaginate();
        Ok(self.content.len() - 1)
    }

    fn require_text(&self, operation: &str) -> Result<()> {
        if self.office_type.is_text() {
            Ok(())
        } else {
            Err(OfficeError::Unsupported(format!(
                "{operation} on a {} document",
                self.office_type.type_name()
            )))
        }
    }

    #[must_use = "returns the number of content nodes"]
    pub fn content_count(&self) -> usize {
        self.content.len()
    }

    /// # Errors
    ///
    /// Returns [`OfficeError::OutOfRange`] past the last node.
    pub fn content(&self, index: usize) -> Result<&ContentNode> {
        self.content.get(index).ok_or(OfficeError::OutOfRange {
            what: "content node",
            index,
            len: self.content.len(),
        })
    }

    #[must_use = "returns the content nodes"]
    pub fn nodes(&self) -> &[ContentNode] {
        &self.content
    }

    /// Text of one page, one line per laid-out line.
    ///
    /// # Errors
    ///
    /// Returns [`OfficeError::OutOfRange`] past the last page.
    pub fn page_text(&self, page: usize) -> Result<String> {
        Ok(self.layout_page(page)?.text())
    }

    fn layout_page(&self, page: usize) -> Result<LayoutPage> {
        let (w, h) = self.page_size;
        let out_of_range = || OfficeError::OutOfRange {
            what: "page",
            index: page,
            len: self.page_count(),
        };
        if self.office_type.is_spreadsheet() {
            let sheet = self.sheets.get(page).ok_or_else(out_of_range)?;
            Ok(layout_sheet(sheet, w, h))
        } else if self.office_type.is_presentation() {
            let slide = self.slides.get(page).ok_or_else(out_of_range)?;
            Ok(layout_slide(slide, w, h))
        } else {
            self.pages.get(page).cloned().ok_or_else(out_of_range)
        }
    }

    // ========================================================================
    // Sheets
    // ========================================================================

    /// Append an empty sheet and return its index.
    ///
    /// # Errors
    ///
    /// Returns [`OfficeError::Unsupported`] for non-spreadsheet types,
    /// [`OfficeError::InvalidValue`] for an empty, overlong or malformed
    /// name, and [`OfficeError::DuplicateSheet`] if a sheet with the same
    /// name (ignoring case) exists.
    pub fn add_sheet(&mut self, name: &str) -> Result<usize> {
        if !self.office_type.is_spreadsheet() {
            return Err(OfficeError::Unsupported(format!(
                "add_sheet on a {} document",
                self.office_type.type_name()
            )));
        }
        if name.trim().is_empty() {
            return Err(OfficeError::invalid("sheet name", "empty"));
        }
        if name.chars().count() > MAX_SHEET_NAME_LEN {
            return Err(OfficeError::invalid(
                "sheet name",
                format!("longer than {MAX_SHEET_NAME_LEN} characters"),
            ));
        }
        if name.contains('\0') || name.contains(SHEET_NAME_FORBIDDEN) {
            return Err(OfficeError::invalid("sheet name", format!("'{name}' has a forbidden character")));
        }
        if self.sheets.iter().any(|s| s.name.eq_ignore_ascii_case(name)) {
            return Err(OfficeError::DuplicateSheet(name.to_string()));
        }
        self.sheets.push(Sheet::new(name));
        Ok(self.sheets.len() - 1)
    }

    #[must_use = "returns the number of sheets"]
    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    /// # Errors
    ///
    /// Returns [`OfficeError::OutOfRange`] past the last sheet.
    pub fn sheet(&self, index: usize) -> Result<&Sheet> {
        self.sheets.get(index).ok_or(OfficeError::OutOfRange {
            what: "sheet",
            index,
            len: self.sheets.len(),
        })
    }

    fn sheet_mut(&mut self, index: usize) -> Result<&mut Sheet> {
        let len = self.sheets.len();
        self.sheets.get_mut(index).ok_or(OfficeError::OutOfRange {
            what: "sheet",
            index,
            len,
        })
    }

    /// # Errors
    ///
    /// Returns [`OfficeError::OutOfRange`] past the last sheet.
    pub fn sheet_name(&self, index: usize) -> Result<&str> {
        Ok(&self.sheet(index)?.name)
    }

    /// Store a value in a cell.
    ///
    /// # Errors
    ///
    /// Returns [`OfficeError::OutOfRange`] for a missing sheet and
    /// [`OfficeError::InvalidValue`] for a position past the sheet limits.
    pub fn set_cell(&mut self, sheet: usize, row: u32, col: u32, value: CellValue) -> Result<()> {
        check_position(row, col)?;
        self.sheet_mut(sheet)?.set(row, col, value);
        Ok(())
    }

    /// # Errors
    ///
    /// As [`OfficeDocument::set_cell`], plus [`OfficeError::InvalidValue`]
    /// if `value` contains NUL.
    pub fn set_cell_string(&mut self, sheet: usize, row: u32, col: u32, value: &str) -> Result<()> {
        check_text("cell string", value)?;
        self.set_cell(sheet, row, col, CellValue::String(value.to_string()))
    }

    /// # Errors
    ///
    /// As [`OfficeDocument::set_cell`], plus [`OfficeError::InvalidValue`]
    /// for a non-finite number.
    pub fn set_cell_number(&mut self, sheet: usize, row: u32, col: u32, value: f64) -> Result<()> {
        if !value.is_finite() {
            return Err(OfficeError::invalid("cell number", format!("{value} is not finite")));
        }
        self.set_cell(sheet, row, col, CellValue::Number(value))
    }

    /// # Errors
    ///
    /// As [`OfficeDocument::set_cell`].
    pub fn set_cell_bool(&mut self, sheet: usize, row: u32, col: u32, value: bool) -> Result<()> {
        self.set_cell(sheet, row, col, CellValue::Boolean(value))
    }

    /// Store a formula. A leading `=` is optional.
    ///
    /// # Errors
    ///
    /// As [`OfficeDocument::set_cell`], plus [`OfficeError::InvalidValue`]
    /// for an empty formula or one containing NUL.
    pub fn set_cell_formula(&mut self, sheet: usize, row: u32, col: u32, formula: &str) -> Result<()> {
        let formula = formula.strip_prefix('=').unwrap_or(formula).trim();
        if formula.is_empty() {
            return Err(OfficeError::invalid("formula", "empty"));
        }
        check_text("formula", formula)?;
        self.set_cell(
            sheet,
            row,
            col,
            CellValue::Formula {
                formula: formula.to_string(),
                cached: None,
            },
        )
    }

    /// # Errors
    ///
    /// As [`OfficeDocument::set_cell`].
    pub fn set_cell_date(&mut self, sheet: usize, row: u32, col: u32, value: NaiveDateTime) -> Result<()> {
        self.set_cell(sheet, row, col, CellValue::Date(value))
    }

    /// Value of a cell; unset cells are [`CellValue::Empty`].
    ///
    /// # Errors
    ///
    /// Returns [`OfficeError::OutOfRange`] for a missing sheet and
    /// [`OfficeError::InvalidValue`] for a position past the sheet limits.
    pub fn cell(&self, sheet: usize, row: u32, col: u32) -> Result<&CellValue> {
        check_position(row, col)?;
        Ok(self.sheet(sheet)?.get(row, col))
    }

    /// Displayed text of a cell.
    ///
    /// # Errors
    ///
    /// As [`OfficeDocument::cell`].
    pub fn cell_string(&self, sheet: usize, row: u32, col: u32) -> Result<String> {
        Ok(self.cell(sheet, row, col)?.display())
    }

    // ========================================================================
    // Slides
    // ========================================================================

    /// Append an empty slide and return its index.
    ///
    /// # Errors
    ///
    /// Returns [`OfficeError::Unsupported`] for non-presentation types.
    pub fn add_slide(&mut self) -> Result<usize> {
        if !self.office_type.is_presentation() {
            return Err(OfficeError::Unsupported(format!(
                "add_slide on a {} document",
                self.office_type.type_name()
            )));
        }
        self.slides.push(Slide::default());
        Ok(self.slides.len() - 1)
    }

    #[must_use = "returns the number of slides"]
    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }

    /// # Errors
    ///
    /// Returns [`OfficeError::OutOfRange`] past the last slide.
    pub fn slide(&self, index: usize) -> Result<&Slide> {
        self.slides.get(index).ok_or(OfficeError::OutOfRange {
            what: "slide",
            index,
            len: self.slides.len(),
        })
    }

    /// # Errors
    ///
    /// Returns [`OfficeError::OutOfRange`] past the last slide and
    /// [`OfficeError::InvalidValue`] if `title` contains NUL.
    pub fn set_slide_title(&mut self, index: usize, title: &str) -> Result<()> {
        check_text("slide title", title)?;
        let len = self.slides.len();
        let slide = self.slides.get_mut(index).ok_or(OfficeError::OutOfRange {
            what: "slide",
            index,
            len,
        })?;
        slide.title = Some(title.to_string());
        Ok(())
    }

    /// Title of a slide, `None` if it has none.
    ///
    /// # Errors
    ///
    /// Returns [`OfficeError::OutOfRange`] past the last slide.
    pub fn slide_title(&self, index: usize) -> Result<Option<&str>> {
        Ok(self.slide(index)?.title.as_deref())
    }
}

impl PageSource for OfficeDocument {
    fn page_count(&self) -> usize {
        Self::page_count(self)
    }

    fn page_bounds(&self, page: usize) -> folio_core::Result<Rect> {
        if page >= Self::page_count(self) {
            return Err(OfficeError::OutOfRange {
                what: "page",
                index: page,
                len: Self::page_count(self),
            }
            .into());
        }
        let (w, h) = self.page_size;
        Ok(Rect::from_size(w, h))
    }

    fn run_page(&self, page: usize, device: &mut dyn Device, ctm: &Matrix) -> folio_core::Result<()> {
        log::trace!("Rendering {} page {page}", self.office_type);
        self.layout_page(page)?.draw(device, ctm)
    }
}

fn check_text(field: &'static str, value: &str) -> Result<()> {
    if value.contains('\0') {
        return Err(OfficeError::invalid(field, "contains NUL"));
    }
    Ok(())
}

/// Core properties (OOXML) or `meta.xml` (ODF). A malformed part is
/// reported and ignored.
fn load_metadata(archive: &Archive, office_type: OfficeType) -> Result<OfficeMetadata> {
    let part = if office_type.is_odf() {
        ODF_META_PART.to_string()
    } else {
        rel_by_type(&part_rels(archive, "")?, "core-properties")
            .map_or_else(|| CORE_PART.to_string(), |r| r.target.clone())
    };
    let Some(xml) = optional_text(archive, &part) else {
        return Ok(OfficeMetadata::default());
    };
    Ok(OfficeMetadata::parse(xml).unwrap_or_else(|e| {
        log::warn!("Ignoring malformed metadata part {part}: {e}");
        OfficeMetadata::default()
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_new_documents() {
        let doc = OfficeDocument::new(OfficeType::Docx);
        assert_eq!(doc.page_count(), 1);
        assert_eq!(doc.page_size(), DEFAULT_PAGE_SIZE);
        assert_eq!(doc.title(), None);

        let doc = OfficeDocument::new(OfficeType::Odp);
        assert_eq!(doc.page_count(), 0);
        assert_eq!(doc.page_size(), DEFAULT_SLIDE_SIZE);

        assert_eq!(OfficeDocument::new(OfficeType::Xlsx).page_count(), 0);
    }

    #[test]
    fn test_content_api() {
        let mut doc = OfficeDocument::new(OfficeType::Odt);
        assert_eq!(doc.add_heading("Intro", 1).unwrap(), 0);
        assert_eq!(doc.add_paragraph("Body text").unwrap(), 1);
        assert!(doc.add_heading("Bad", 0).is_err());
        assert!(doc.add_heading("Bad", 10).is_err());
        assert!(doc.add_paragraph("nul\0").is_err());
        assert_eq!(doc.content_count(), 2);
        assert_eq!(doc.content(1).unwrap().text(), "Body text");
        assert!(matches!(doc.content(2), Err(OfficeError::OutOfRange { .. })));
        assert_eq!(doc.page_text(0).unwrap(), "Intro\nBody text");

        let mut sheet = OfficeDocument::new(OfficeType::Xlsx);
        assert!(matches!(sheet.add_paragraph("x"), Err(OfficeError::Unsupported(_))));
    }

    #[test]
    fn test_page_size_validation() {
        let mut doc = OfficeDocument::new(OfficeType::Docx);
        assert!(doc.set_page_size(0.0, 100.0).is_err());
        assert!(doc.set_page_size(100.0, f32::INFINITY).is_err());
        assert_eq!(doc.page_size(), DEFAULT_PAGE_SIZE);
        doc.set_page_size(300.0, 400.0).unwrap();
        assert_eq!(doc.page_size(), (300.0, 400.0));
    }

    #[test]
    fn test_sheet_api() {
        let mut doc = OfficeDocument::new(OfficeType::Ods);
        assert_eq!(doc.add_sheet("Data").unwrap(), 0);
        assert!(matches!(doc.add_sheet("data"), Err(OfficeError::DuplicateSheet(_))));
        assert!(doc.add_sheet("").is_err());
        assert!(doc.add_sheet("a/b").is_err());
        assert_eq!(doc.sheet_name(0).unwrap(), "Data");

        doc.set_cell_string(0, 0, 0, "Name").unwrap();
        doc.set_cell_number(0, 0, 1, 1.5).unwrap();
        doc.set_cell_bool(0, 1, 0, false).unwrap();
        doc.set_cell_formula(0, 1, 1, "=B1*2").unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        doc.set_cell_date(0, 2, 0, date).unwrap();

        assert_eq!(doc.cell_string(0, 0, 1).unwrap(), "1.5");
        assert_eq!(doc.cell_string(0, 1, 0).unwrap(), "FALSE");
        assert_eq!(doc.cell_string(0, 1, 1).unwrap(), "=B1*2");
        assert_eq!(doc.cell_string(0, 2, 0).unwrap(), "2024-03-01");
        assert_eq!(doc.cell(0, 9, 9).unwrap(), &CellValue::Empty);

        assert!(matches!(doc.cell(1, 0, 0), Err(OfficeError::OutOfRange { .. })));
        assert!(matches!(
            doc.set_cell_number(0, 1_048_576, 0, 1.0),
            Err(OfficeError::InvalidValue { .. })
        ));
        assert!(doc.set_cell_number(0, 0, 16_384, 1.0).is_err());
        assert!(doc.set_cell_number(0, 0, 0, f64::NAN).is_err());
        assert!(doc.set_cell_formula(0, 0, 0, "=").is_err());
        assert_eq!(doc.page_count(), 1);
    }

    #[test]
    fn test_slide_api() {
        let mut doc = OfficeDocument::new(OfficeType::Pptx);
        assert_eq!(doc.add_slide().unwrap(), 0);
        assert_eq!(doc.add_slide().unwrap(), 1);
        doc.set_slide_title(1, "Summary").unwrap();
        assert_eq!(doc.slide_title(0).unwrap(), None);
        assert_eq!(doc.slide_title(1).unwrap(), Some("Summary"));
        assert!(doc.set_slide_title(2, "x").is_err());
        assert_eq!(doc.page_count(), 2);
        assert_eq!(doc.page_text(1).unwrap(), "Summary");

        let mut text = OfficeDocument::new(OfficeType::Docx);
        assert!(matches!(text.add_slide(), Err(OfficeError::Unsupported(_))));
        assert!(matches!(text.add_sheet("S"), Err(OfficeError::Unsupported(_))));
    }

    #[test]
    fn test_metadata_setters() {
        let mut doc = OfficeDocument::new(OfficeType::Docx);
        doc.set_title("Report").unwrap();
        assert!(doc.set_title("bad\0").is_err());
        assert_eq!(doc.title(), Some("Report"));
        doc.set_creator("").unwrap();
        assert_eq!(doc.creator(), Some(""));
    }

    #[test]
    fn test_unknown_container() {
        let mut archive = Archive::new();
        archive.add_part("readme.txt", b"hi".to_vec(), "").unwrap();
        assert!(matches!(
            OfficeDocument::from_archive(archive),
            Err(OfficeError::UnknownType)
        ));
    }
}
