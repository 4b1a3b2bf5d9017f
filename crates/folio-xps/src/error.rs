//! Error types for XPS parsing

use folio_archive::ArchiveError;
use folio_core::FolioError;
use thiserror::Error;

/// XPS parsing errors
#[derive(Debug, Error)]
pub enum XpsError {
    /// Container error (unreadable ZIP, bad part name, duplicate part)
    #[error(transparent)]
    Archive(#[from] ArchiveError),

    /// XML error in a structure or metadata part
    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// XML error in a FixedPage
    #[error("FixedPage parsing error: {0}")]
    Page(#[from] roxmltree::Error),

    /// Invalid XPS structure (no document sequence, empty references)
    #[error("Invalid XPS structure: {0}")]
    InvalidStructure(String),

    /// Missing required file in XPS archive
    #[error("Missing required file: {0}")]
    MissingFile(String),

    /// Malformed abbreviated path geometry
    #[error("Invalid path data at offset {offset}: {reason}")]
    PathData {
        /// Byte offset into the data string
        offset: usize,
        /// What was expected
        reason: String,
    },

    /// Index past the end of a list
    #[error("{what} {index} out of range ({len} available)")]
    OutOfRange {
        /// List being indexed
        what: &'static str,
        /// Requested index
        index: usize,
        /// List length
        len: usize,
    },

    /// Rejected argument
    #[error("Invalid {field}: {reason}")]
    InvalidValue {
        /// Argument name
        field: &'static str,
        /// Why it was rejected
        reason: String,
    },
}

/// Result type for XPS operations
pub type Result<T> = std::result::Result<T, XpsError>;

impl From<XpsError> for FolioError {
    fn from(err: XpsError) -> Self {
        match err {
            XpsError::Archive(e) => e.into(),
            e @ (XpsError::OutOfRange { .. } | XpsError::InvalidValue { .. }) => {
                Self::Argument(e.to_string())
            }
            e => Self::Format(e.to_string()),
        }
    }
}
