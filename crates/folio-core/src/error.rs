//! Error taxonomy shared by every folio crate.
//!
//! Each format crate keeps its own detailed error enum (`ArchiveError`,
//! `EpubError`, ...) and converts into [`FolioError`] at the document
//! boundary, so callers can match on one of six coarse categories.

use std::collections::TryReserveError;
use thiserror::Error;

/// Coarse error categories.
///
/// # Examples
///
/// ```rust
/// use folio_core::{ErrorKind, FolioError};
///
/// let err = FolioError::argument("page index 7 out of range (3 pages)");
/// assert_eq!(err.kind(), ErrorKind::Argument);
/// ```
#[derive(Error, Debug)]
pub enum FolioError {
    /// Anything that does not fit a more specific category.
    #[error("{0}")]
    Generic(String),

    /// Stream or archive access failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed container, manifest inconsistency, unresolvable reference,
    /// or invalid natural-sort input.
    #[error("Format error: {0}")]
    Format(String),

    /// Allocation failure.
    #[error("Out of memory: {0}")]
    Memory(String),

    /// Out-of-range index, invalid handle, or invalid enum value.
    #[error("Invalid argument: {0}")]
    Argument(String),

    /// Recognized but unimplemented feature.
    #[error("Unsupported: {0}")]
    Unsupported(String),
}

/// Discriminant of [`FolioError`], convenient for matching and for boundary
/// layers that report an integer code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    Generic,
    Io,
    Format,
    Memory,
    Argument,
    Unsupported,
}

impl ErrorKind {
    /// Stable integer code, `0` is reserved for "no error".
    #[inline]
    #[must_use = "returns the numeric error code"]
    pub const fn code(self) -> i32 {
        match self {
            Self::Generic => 1,
            Self::Io => 2,
            Self::Format => 3,
            Self::Memory => 4,
            Self::Argument => 5,
            Self::Unsupported => 6,
        }
    }
}

impl FolioError {
    #[inline]
    #[must_use = "returns the error category"]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Generic(_) => ErrorKind::Generic,
            Self::Io(_) => ErrorKind::Io,
            Self::Format(_) => ErrorKind::Format,
            Self::Memory(_) => ErrorKind::Memory,
            Self::Argument(_) => ErrorKind::Argument,
            Self::Unsupported(_) => ErrorKind::Unsupported,
        }
    }

    #[inline]
    pub fn generic(msg: impl Into<String>) -> Self {
        Self::Generic(msg.into())
    }

    #[inline]
    pub fn format(msg: impl Into<String>) -> Self {
        Self::Format(msg.into())
    }

    #[inline]
    pub fn argument(msg: impl Into<String>) -> Self {
        Self::Argument(msg.into())
    }

    #[inline]
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported(msg.into())
    }

    /// Error for an index that is not below `len`.
    #[must_use = "returns the constructed error"]
    pub fn out_of_range(what: &str, index: usize, len: usize) -> Self {
        Self::Argument(format!("{what} index {index} out of range ({len} available)"))
    }

    /// Error for a handle that was dropped or never issued.
    #[must_use = "returns the constructed error"]
    pub fn invalid_handle(what: &str) -> Self {
        Self::Argument(format!("invalid {what} handle"))
    }
}

impl From<TryReserveError> for FolioError {
    fn from(err: TryReserveError) -> Self {
        Self::Memory(err.to_string())
    }
}

/// Result type for folio operations
pub type Result<T> = std::result::Result<T, FolioError>;
