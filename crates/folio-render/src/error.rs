//! Error types for the rendering pipeline

use crate::device::DeviceState;
use folio_core::FolioError;
use thiserror::Error;

/// Rendering and device errors
#[derive(Debug, Error)]
pub enum RenderError {
    /// Operation not allowed in the device's current state. The device is
    /// `Failed` afterwards.
    #[error("Device protocol violation: {op} while {state}")]
    Protocol {
        /// Operation that was attempted
        op: &'static str,
        /// State the device was in
        state: DeviceState,
    },

    /// A previous protocol violation or write failure broke the device
    #[error("Device has failed and accepts no further calls")]
    DeviceFailed,

    /// `close` was already called
    #[error("Device is closed")]
    DeviceClosed,

    /// `PopClip` without a matching `ClipPath`
    #[error("Clip stack underflow")]
    ClipUnderflow,

    /// Output sink failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// SVG serialization failure
    #[error("XML write error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Bad device option string
    #[error("Invalid device option: {0}")]
    InvalidOption(String),

    /// Recognized but unimplemented feature
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// Pixel buffer could not be allocated
    #[error("Out of memory: {0}")]
    OutOfMemory(#[from] std::collections::TryReserveError),
}

/// Result type for rendering operations
pub type Result<T> = std::result::Result<T, RenderError>;

impl From<RenderError> for FolioError {
    fn from(err: RenderError) -> Self {
        match err {
            RenderError::Io(e) => Self::Io(e),
            RenderError::OutOfMemory(e) => Self::Memory(e.to_string()),
            e @ RenderError::Unsupported(_) => Self::Unsupported(e.to_string()),
            e @ RenderError::Xml(_) => Self::Generic(e.to_string()),
            e => Self::Argument(e.to_string()),
        }
    }
}
