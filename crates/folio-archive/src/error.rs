//! Error types for archive operations

use folio_core::FolioError;
use std::collections::TryReserveError;
use thiserror::Error;

/// Errors that can occur while loading or mutating an [`Archive`](crate::Archive)
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// IO error during archive operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid ZIP archive format
    #[error("Invalid ZIP archive: {0}")]
    InvalidZip(#[from] zip::result::ZipError),

    /// 7Z container could not be read
    #[error("Invalid 7Z archive: {0}")]
    InvalidSevenZ(String),

    /// Malformed XML in a package part (content types, relationships)
    #[error("XML error: {0}")]
    Xml(#[from] roxmltree::Error),

    /// Archive is password-protected
    #[error("Archive is password-protected")]
    PasswordProtected,

    /// Container format recognized but not readable
    #[error("Unsupported archive format: {0}")]
    Unsupported(String),

    /// Bytes do not look like any known container
    #[error("Unrecognized archive format")]
    Unrecognized,

    /// File within archive exceeds size limit
    #[error("File '{name}' is too large ({size} bytes, max {max} bytes)")]
    FileTooLarge {
        /// Name of the file that exceeded the limit
        name: String,
        /// Actual file size in bytes
        size: u64,
        /// Maximum allowed file size in bytes
        max: u64,
    },

    /// Path is empty or contains forbidden characters
    #[error("Invalid part path: '{0}'")]
    InvalidPath(String),

    /// `..` segments climb above the archive root
    #[error("Path escapes archive root: '{0}'")]
    PathEscapesRoot(String),

    /// A part with this normalized path already exists
    #[error("Duplicate part: '{0}'")]
    DuplicatePart(String),

    /// Could not allocate a buffer for part contents
    #[error("Out of memory: {0}")]
    OutOfMemory(#[from] TryReserveError),
}

/// Result type for archive operations
pub type Result<T> = std::result::Result<T, ArchiveError>;

impl From<ArchiveError> for FolioError {
    fn from(err: ArchiveError) -> Self {
        match err {
            ArchiveError::Io(e) => Self::Io(e),
            ArchiveError::OutOfMemory(e) => Self::Memory(e.to_string()),
            e @ (ArchiveError::PasswordProtected | ArchiveError::Unsupported(_)) => {
                Self::Unsupported(e.to_string())
            }
            e @ (ArchiveError::InvalidPath(_)
            | ArchiveError::PathEscapesRoot(_)
            | ArchiveError::DuplicatePart(_)) => Self::Argument(e.to_string()),
            e => Self::Format(e.to_string()),
        }
    }
}
