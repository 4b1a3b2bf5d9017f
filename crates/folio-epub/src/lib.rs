//! EPUB publications for folio
//!
//! Parses the OCF container and OPF package of EPUB 2 and 3 files into a
//! typed model on top of a [`folio_archive::Archive`]:
//!
//! - **Metadata**: Dublin Core title, creators, language, identifier,
//!   publisher, date, description
//! - **Manifest**: id → href and media type, hrefs resolved to part paths
//! - **Spine**: reading order with linear / non-linear entries
//! - **TOC**: EPUB 3 navigation document or EPUB 2 NCX, flattened
//!
//! Linear chapters are reflowed into fixed-size pages ([`EpubLayout`]) and
//! exposed through [`folio_render::PageSource`].
//!
//! # Usage
//!
//! ```no_run
//! use folio_epub::EpubDocument;
//! use std::path::Path;
//!
//! let doc = EpubDocument::open(Path::new("book.epub")).unwrap();
//! println!("{:?} by {:?}", doc.title(), doc.creators());
//! for idref in doc.linear_reading_order() {
//!     println!("{idref} -> {:?}", doc.manifest_href(idref));
//! }
//! ```

pub mod document;
pub mod error;
pub mod layout;
pub mod media;
pub mod package;
pub mod toc;

pub use document::{EpubDocument, DEFAULT_PACKAGE_PATH};
pub use error::{EpubError, Result};
pub use layout::{EpubLayout, LayoutLine, LayoutPage, TextBlock};
pub use media::MediaType;
pub use package::{Direction, EpubMetadata, EpubVersion, ManifestItem, Package, SpineItem};
pub use toc::TocEntry;
