//! Comic book archives for folio
//!
//! A comic is an archive of page images, optionally with a ComicRack
//! `ComicInfo.xml`. Pages are ordered by natural sort of their entry names,
//! not by archive order, so `page2.jpg` comes before `page10.jpg`.
//!
//! | Format | Container |
//! |--------|-----------|
//! | CBZ | ZIP |
//! | CBT | TAR |
//! | CB7 | 7z |
//! | CBR | RAR (recognized, not readable) |
//!
//! # Usage
//!
//! ```no_run
//! use folio_cbz::CbzDocument;
//! use std::path::Path;
//!
//! let doc = CbzDocument::open(Path::new("issue-01.cbz")).unwrap();
//! println!("{} pages, series {:?}", doc.page_count(), doc.series());
//! for page in doc.pages() {
//!     println!("{} {}x{} {}", page.name, page.width, page.height, page.format);
//! }
//! ```

pub mod comic_info;
pub mod document;
pub mod error;
pub mod image;
pub mod natural;

pub use comic_info::{ComicInfo, ComicPageInfo, Manga, ReadingDirection};
pub use document::{CbzDocument, CbzFormat, CbzPage};
pub use error::{CbzError, Result};
pub use image::{image_size, is_image_file, ImageFormat};
pub use natural::natural_cmp;
