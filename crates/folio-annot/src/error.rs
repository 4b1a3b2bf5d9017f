//! Error types for annotation and widget editing

use folio_core::FolioError;
use thiserror::Error;

/// Errors from the annotation overlay
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnnotError {
    /// Id does not name a live annotation or widget on this overlay
    #[error("No {what} with id {id}")]
    NotFound {
        /// "annotation" or "widget"
        what: &'static str,
        id: u32,
    },

    /// Numeric code outside the known range
    #[error("Unknown {what} code {code}")]
    UnknownCode { what: &'static str, code: i32 },

    /// Appearance needs a non-empty rectangle
    #[error("Cannot build an appearance for an empty rectangle")]
    EmptyRect,

    /// Field is flagged read-only
    #[error("Field '{0}' is read-only")]
    ReadOnly(String),

    /// Value rejected by the field's constraints
    #[error("Invalid value for field '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    /// Choice option index past the end of the option list
    #[error("Option {index} out of range ({count} options)")]
    OptionOutOfRange { index: usize, count: usize },

    /// Operation the field type does not have
    #[error("Unsupported: {0}")]
    Unsupported(String),
}

/// Result type for overlay operations
pub type Result<T> = std::result::Result<T, AnnotError>;

impl AnnotError {
    pub(crate) fn invalid(field: &str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<AnnotError> for FolioError {
    fn from(err: AnnotError) -> Self {
        match err {
            e @ AnnotError::Unsupported(_) => Self::Unsupported(e.to_string()),
            e @ AnnotError::EmptyRect => Self::Generic(e.to_string()),
            e => Self::Argument(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::ErrorKind;

    #[test]
    fn test_folio_error_mapping() {
        let cases = [
            (AnnotError::NotFound { what: "widget", id: 3 }, ErrorKind::Argument),
            (AnnotError::ReadOnly("name".into()), ErrorKind::Argument),
            (AnnotError::invalid("zip", "not a number"), ErrorKind::Argument),
            (AnnotError::Unsupported("push button value".into()), ErrorKind::Unsupported),
            (AnnotError::EmptyRect, ErrorKind::Generic),
        ];
        for (err, kind) in cases {
            assert_eq!(FolioError::from(err).kind(), kind);
        }
    }
}
