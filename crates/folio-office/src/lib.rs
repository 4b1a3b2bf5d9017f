//! # folio-office
//!
//! Office Open XML and `OpenDocument` documents for folio.
//!
//! Word processor files are read into a content tree (paragraphs, headings,
//! tables, pictures, charts, hyperlinks, page breaks) and flowed into pages;
//! spreadsheets become sheets of typed cells with one page per sheet;
//! presentations become slides with one page per slide. All three render
//! through [`folio_render::PageSource`].
//!
//! ## Supported Formats
//!
//! | Type | Extension | Main part |
//! |------|-----------|-----------|
//! | Word | `.docx` | `word/document.xml` |
//! | Excel | `.xlsx` | `xl/workbook.xml` |
//! | PowerPoint | `.pptx` | `ppt/presentation.xml` |
//! | `OpenDocument` Text | `.odt` | `content.xml` |
//! | `OpenDocument` Spreadsheet | `.ods` | `content.xml` |
//! | `OpenDocument` Presentation | `.odp` | `content.xml` |
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use folio_office::{OfficeDocument, OfficeType};
//! use std::path::Path;
//!
//! let doc = OfficeDocument::open(Path::new("budget.xlsx"))?;
//! assert_eq!(doc.office_type(), OfficeType::Xlsx);
//! for i in 0..doc.sheet_count() {
//!     println!("{}: A1 = {}", doc.sheet_name(i)?, doc.cell_string(i, 0, 0)?);
//! }
//!
//! let mut memo = OfficeDocument::new(OfficeType::Docx);
//! memo.add_heading("Minutes", 1)?;
//! memo.add_paragraph("Attendees: all")?;
//! assert_eq!(memo.page_count(), 1);
//! # Ok::<(), folio_office::OfficeError>(())
//! ```

pub mod content;
pub mod document;
mod docx;
pub mod error;
pub mod kind;
pub mod layout;
mod odf;
pub mod package;
mod pptx;
pub mod sheet;
mod xlsx;

pub use content::{Alignment, ContentKind, ContentNode, Run, Slide};
pub use document::{OfficeDocument, DEFAULT_PAGE_SIZE, DEFAULT_SLIDE_SIZE};
pub use error::{OfficeError, Result};
pub use kind::OfficeType;
pub use layout::{LayoutItem, LayoutPage};
pub use package::OfficeMetadata;
pub use sheet::{column_name, parse_cell_ref, CellValue, Sheet, MAX_COLS, MAX_ROWS};
