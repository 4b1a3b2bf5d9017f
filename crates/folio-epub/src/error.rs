//! Error types for EPUB handling

use folio_archive::ArchiveError;
use folio_core::FolioError;
use thiserror::Error;

/// Result type alias for EPUB operations
pub type Result<T> = std::result::Result<T, EpubError>;

/// Errors that can occur while opening or editing an EPUB
#[derive(Debug, Error)]
pub enum EpubError {
    /// Container could not be read
    #[error(transparent)]
    Archive(#[from] ArchiveError),

    /// Malformed container, package or navigation XML
    #[error("Failed to parse XML: {0}")]
    Xml(#[from] roxmltree::Error),

    /// Neither `META-INF/container.xml` nor any `.opf` part was found
    #[error("Missing package document")]
    MissingPackage,

    /// A required part is absent from the archive
    #[error("Missing required file: {0}")]
    MissingFile(String),

    /// Spine entry without a usable manifest item
    #[error("Spine item '{idref}' does not resolve: {reason}")]
    UnresolvedSpine {
        /// The dangling idref
        idref: String,
        /// What failed to resolve
        reason: String,
    },

    /// Manifest id already present
    #[error("Duplicate manifest id: {0}")]
    DuplicateId(String),

    /// Index past the end of a list
    #[error("{what} index {index} out of range ({len} entries)")]
    OutOfRange {
        /// List being indexed
        what: &'static str,
        /// Requested index
        index: usize,
        /// List length
        len: usize,
    },

    /// Rejected setter argument
    #[error("Invalid {field}: {reason}")]
    InvalidValue {
        /// Field being set
        field: &'static str,
        /// Why the value was rejected
        reason: String,
    },
}

impl EpubError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field,
            reason: reason.into(),
        }
    }

    pub(crate) fn unresolved(idref: &str, reason: impl Into<String>) -> Self {
        Self::UnresolvedSpine {
            idref: idref.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<EpubError> for FolioError {
    fn from(err: EpubError) -> Self {
        match err {
            EpubError::Archive(e) => e.into(),
            e @ (EpubError::OutOfRange { .. }
            | EpubError::InvalidValue { .. }
            | EpubError::DuplicateId(_)) => Self::Argument(e.to_string()),
            e => Self::Format(e.to_string()),
        }
    }
}
