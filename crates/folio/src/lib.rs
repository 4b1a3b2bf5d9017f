//! Archive-backed document engine
//!
//! `folio` opens comic archives, e-books, XPS packages and office documents
//! through one [`Document`] type and renders their pages through recorded
//! display lists. A [`Context`] holds documents, pages, display lists,
//! devices, cookies and annotation overlays behind generational handles.
//!
//! | Family | Formats | Crate |
//! |--------|---------|-------|
//! | Comic | CBZ, CBT, CB7 | `folio-cbz` |
//! | E-book | EPUB 2/3 | `folio-epub` |
//! | Fixed layout | XPS, OpenXPS | `folio-xps` |
//! | Office | DOCX, XLSX, PPTX, ODT, ODS, ODP | `folio-office` |
//!
//! # Usage
//!
//! ```no_run
//! use folio::{Context, OpenOptions};
//! use folio_core::{IRect, Matrix};
//! use std::path::Path;
//!
//! let mut ctx = Context::new();
//! let doc = ctx.open_document(Path::new("book.epub"), &OpenOptions::default())?;
//! let page = ctx.load_page(doc, 0)?;
//! let bounds = ctx.page_bounds(page)?;
//!
//! let svg = ctx.new_svg_device("text=text")?;
//! ctx.run_page(page, svg, &Matrix::IDENTITY, None)?;
//! ctx.close_device(svg)?;
//! let bytes = ctx.take_svg_output(svg)?;
//! println!("{} bytes of SVG for a {}x{} page", bytes.len(), bounds.width(), bounds.height());
//!
//! let draw = ctx.new_draw_device(IRect::new(0, 0, 600, 800))?;
//! let cookie = ctx.new_cookie();
//! ctx.run_page(page, draw, &Matrix::IDENTITY, Some(cookie))?;
//! println!("{}% done", ctx.cookie(cookie)?.progress_percent());
//! # Ok::<(), folio_core::FolioError>(())
//! ```

pub mod context;
pub mod document;
pub mod format;
pub mod options;

pub use context::{
    AnnotHandle, AnnotRef, Context, ContextDevice, CookieHandle, DeviceHandle, DisplayListHandle,
    DocumentHandle, Page, PageHandle, WidgetHandle, WidgetRef,
};
pub use document::{Document, DocumentInfo, OutlineEntry, PageInfo};
pub use format::DocumentFormat;
pub use options::OpenOptions;

pub use folio_core::{ErrorKind, FolioError, Result};
