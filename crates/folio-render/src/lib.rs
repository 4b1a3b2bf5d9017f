//! Recorded rendering pipeline for folio
//!
//! Pages are drawn as a stream of [`Command`]s into a [`Device`]. Recording
//! a page through a [`ListDevice`] yields a [`DisplayList`] that can be
//! replayed any number of times, against any device, with a transform, a
//! scissor rectangle and an optional [`folio_core::Cookie`] for progress and
//! cancellation.
//!
//! ## Devices
//!
//! | Device | Output |
//! |--------|--------|
//! | [`DrawDevice`] | pixel buffer geometry and a trace of transformed commands |
//! | [`ListDevice`] | a [`DisplayList`] |
//! | [`SvgDevice`] | one SVG document per page, written to any `io::Write` |
//!
//! Every device follows the same page protocol (see [`device`]).
//!
//! Document families plug in through [`PageSource`].

pub mod command;
pub mod device;
pub mod draw;
pub mod error;
pub mod list;
pub mod list_device;
pub mod path;
pub mod source;
pub mod svg;
pub mod text;

pub use command::{Command, ImageRef, TextSpan, ASCENT_EM, CHAR_ADVANCE_EM, DESCENT_EM};
pub use device::{Device, DeviceState, PageProtocol};
pub use draw::{DrawDevice, DrawOp, Pixmap};
pub use error::{RenderError, Result};
pub use list::{DisplayItem, DisplayList, RunStatus};
pub use list_device::ListDevice;
pub use path::{Color, LineCap, LineJoin, Path, PathElement, StrokeStyle};
pub use source::PageSource;
pub use svg::{SvgDevice, SvgDeviceOptions, TextFormat};
pub use text::wrap_text;
