//! Part store and container loading for folio
//!
//! Every document family in folio sits on an [`Archive`]: a virtual
//! filesystem mapping normalized relative paths to byte payloads and content
//! types. This crate owns that store plus the plumbing around it:
//!
//! - **Path handling**: [`normalize_path`] and RFC 3986-style [`resolve`]
//! - **Container loaders**: ZIP (`zip`), TAR and TAR.GZ (`tar`, `flate2`),
//!   7Z (`sevenz-rust`); RAR is recognized and rejected as unsupported
//! - **Byte streams**: [`ByteStream`] over files, memory or any `Read + Seek`
//! - **OPC helpers**: `[Content_Types].xml` and `.rels` parsing shared by the
//!   XPS and Office families
//!
//! # Usage
//!
//! ## Build an archive in memory
//!
//! ```rust
//! use folio_archive::Archive;
//!
//! let mut archive = Archive::new();
//! archive.add_part("pages/001.png", vec![0x89, b'P', b'N', b'G'], "")?;
//! assert_eq!(archive.get_part("pages/001.png").unwrap().content_type(), "image/png");
//! # Ok::<(), folio_archive::ArchiveError>(())
//! ```
//!
//! ## Load a container from disk
//!
//! ```no_run
//! use folio_archive::Archive;
//! use std::path::Path;
//!
//! let archive = Archive::open(Path::new("comic.cbz")).unwrap();
//! for part in archive.parts() {
//!     println!("{} ({} bytes, {})", part.path(), part.len(), part.content_type());
//! }
//! ```

pub mod archive;
pub mod error;
pub mod loader;
pub mod mime;
pub mod opc;
pub mod path;
pub mod sevenz;
pub mod stream;
pub mod tar;
pub mod zip;

// =============================================================================
// Archive Constants
// =============================================================================

/// Maximum size for a single part (100 MB).
///
/// Larger entries are skipped while loading so a hostile container cannot
/// exhaust memory.
pub const MAX_PART_SIZE: u64 = 100_000_000;

// Re-export commonly used types
pub use archive::{Archive, ArchiveFormat, Part};
pub use error::{ArchiveError, Result};
pub use loader::RawEntry;
pub use mime::guess_content_type;
pub use opc::{ContentTypes, Relationship};
pub use path::{normalize_path, resolve, split_fragment};
pub use stream::{ByteStream, Whence};
