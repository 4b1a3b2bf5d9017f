//! Error types for office document parsing

use folio_archive::ArchiveError;
use folio_core::FolioError;
use thiserror::Error;

/// Errors that can occur when opening or editing office documents
#[derive(Error, Debug)]
pub enum OfficeError {
    /// Container error (unreadable ZIP, bad part name, duplicate part)
    #[error(transparent)]
    Archive(#[from] ArchiveError),

    /// XML parsing error
    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Missing required file in archive
    #[error("Missing required file: {0}")]
    MissingFile(String),

    /// Invalid document structure
    #[error("Invalid document structure: {0}")]
    InvalidStructure(String),

    /// The container is not one of the six supported office types
    #[error("Unrecognized office document")]
    UnknownType,

    /// Operation not available for this document type
    #[error("Unsupported feature: {0}")]
    Unsupported(String),

    /// Index past the end of a list
    #[error("{what} {index} out of range ({len} available)")]
    OutOfRange {
        what: &'static str,
        index: usize,
        len: usize,
    },

    /// Rejected argument
    #[error("Invalid {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    /// A sheet with this name already exists
    #[error("Duplicate sheet name: {0}")]
    DuplicateSheet(String),
}

/// Result type for office operations
pub type Result<T> = std::result::Result<T, OfficeError>;

impl OfficeError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field,
            reason: reason.into(),
        }
    }
}

impl From<OfficeError> for FolioError {
    fn from(err: OfficeError) -> Self {
        match err {
            OfficeError::Archive(e) => e.into(),
            e @ OfficeError::Unsupported(_) => Self::Unsupported(e.to_string()),
            e @ (OfficeError::OutOfRange { .. }
            | OfficeError::InvalidValue { .. }
            | OfficeError::DuplicateSheet(_)) => Self::Argument(e.to_string()),
            e => Self::Format(e.to_string()),
        }
    }
}
