//! Error types for comic archive handling

use folio_archive::ArchiveError;
use folio_core::FolioError;
use thiserror::Error;

/// Errors from opening or editing a comic archive
#[derive(Error, Debug)]
pub enum CbzError {
    /// Container could not be read
    #[error(transparent)]
    Archive(#[from] ArchiveError),

    /// Malformed `ComicInfo.xml`
    #[error("Invalid ComicInfo.xml: {0}")]
    ComicInfo(#[from] roxmltree::Error),

    /// Writing `ComicInfo.xml` failed
    #[error("XML write error: {0}")]
    XmlWrite(#[from] quick_xml::Error),

    /// Natural sort cannot order an empty entry name
    #[error("Empty page entry name at index {0}")]
    EmptyEntryName(usize),

    /// Page index past the end of the page list
    #[error("Page {index} out of range ({count} pages)")]
    PageOutOfRange {
        /// Requested page
        index: usize,
        /// Pages in the document
        count: usize,
    },

    /// Rejected setter argument
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue {
        /// Field being set
        field: &'static str,
        /// Why the value was rejected
        reason: String,
    },

    /// Archive kind that cannot hold a comic
    #[error("Unsupported comic archive: {0}")]
    Unsupported(String),
}

/// Result type for comic archive operations
pub type Result<T> = std::result::Result<T, CbzError>;

impl CbzError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field,
            reason: reason.into(),
        }
    }
}

impl From<CbzError> for FolioError {
    fn from(err: CbzError) -> Self {
        match err {
            CbzError::Archive(e) => e.into(),
            e @ (CbzError::PageOutOfRange { .. } | CbzError::InvalidValue { .. }) => {
                Self::Argument(e.to_string())
            }
            e @ CbzError::Unsupported(_) => Self::Unsupported(e.to_string()),
            e @ CbzError::XmlWrite(_) => Self::Generic(e.to_string()),
            e => Self::Format(e.to_string()),
        }
    }
}
