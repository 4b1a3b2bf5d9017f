//! # folio-xps
//!
//! XPS (XML Paper Specification) fixed-layout documents for folio.
//!
//! Supports XPS and Open XPS (OXPS) packages: the package relationship
//! graph is walked from `_rels/.rels` to the FixedDocumentSequence, its
//! FixedDocuments and their FixedPages, and pages are rendered through
//! [`folio_render::PageSource`].
//!
//! ## Supported Formats
//!
//! | Format | Extension | Description |
//! |--------|-----------|-------------|
//! | XPS | `.xps` | XML Paper Specification (Microsoft) |
//! | OXPS | `.oxps` | Open XPS (ECMA-388) |
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use folio_xps::XpsDocument;
//! use std::path::Path;
//!
//! let doc = XpsDocument::open(Path::new("report.xps"))?;
//!
//! if let Some(title) = doc.title() {
//!     println!("Title: {title}");
//! }
//! for n in 0..doc.count_pages() {
//!     let (w, h) = doc.page_size(n)?;
//!     println!("Page {}: {w}x{h} units, {}", n + 1, doc.page_name(n)?);
//!     for text in doc.page_text(n)? {
//!         println!("  [{:.0},{:.0}] {}", text.x, text.y, text.content);
//!     }
//! }
//! # Ok::<(), folio_xps::XpsError>(())
//! ```
//!
//! ## Package layout
//!
//! A package is an OPC zip. Parts are found through relationships, not by
//! name, so the paths below are only the usual ones:
//!
//! * `_rels/.rels` points at the sequence (`*.fdseq`) and `docProps/core.xml`
//! * the sequence lists FixedDocuments (`*.fdoc`) by `DocumentReference`
//! * each FixedDocument lists its pages (`*.fpage`) by `PageContent`, with
//!   optional `Width`/`Height` and `LinkTarget` names
//! * pages reference fonts (`.odttf`) and images relative to themselves
//!
//! Sizes are in 1/96 inch. A US Letter page is 816 by 1056. [`XpsDocument::page_size`]
//! reports these units and rendering converts them to points.
//!
//! ## Limitations
//!
//! - Glyph indices and advances are ignored; `UnicodeString` is drawn as a
//!   single text span
//! - Arcs, gradient and visual brushes and resource dictionary references
//!   are skipped with a warning

pub mod content;
pub mod document;
pub mod error;
pub mod geometry;
pub mod metadata;
pub mod page;
pub mod parser;

pub use content::{XpsContentType, XpsRelationship};
pub use document::{resolve_url, XpsDocument};
pub use error::{Result, XpsError};
pub use geometry::{parse_path_data, Geometry};
pub use metadata::XpsMetadata;
pub use page::{parse_color, XpsPage, XpsTextElement};
pub use parser::FixedDocumentRef;

pub const XPS_UNITS_PER_INCH: f32 = 96.0;

/// Points per XPS unit (72 / 96).
pub const XPS_POINTS_PER_UNIT: f32 = 72.0 / XPS_UNITS_PER_INCH;

/// Letter width, used when neither the `PageContent` entry nor the FixedPage declares one.
pub const XPS_DEFAULT_PAGE_WIDTH: f32 = 816.0;

pub const XPS_DEFAULT_PAGE_HEIGHT: f32 = 1056.0;
