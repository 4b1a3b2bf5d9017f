//! Drawing commands recorded in display lists and consumed by devices.

use crate::path::{Color, Path, StrokeStyle};
use folio_core::{Point, Rect};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Width of one character as a fraction of the font size.
///
/// Glyph metrics are out of scope, so text extents use a fixed advance.
pub const CHAR_ADVANCE_EM: f32 = 0.5;

/// Ascent and descent as fractions of the font size.
pub const ASCENT_EM: f32 = 0.8;
pub const DESCENT_EM: f32 = 0.2;

/// A run of text on one baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextSpan {
    pub text: String,
    /// Font family or font part URI
    pub font: String,
    pub size: f32,
    /// Baseline origin in local space
    pub origin: Point,
}

impl TextSpan {
    #[must_use = "creates a text span"]
    pub fn new(text: impl Into<String>, font: impl Into<String>, size: f32, origin: Point) -> Self {
        Self {
            text: text.into(),
            font: font.into(),
            size,
            origin,
        }
    }

    /// Approximate advance width of the span.
    #[must_use = "returns the advance width"]
    #[allow(clippy::cast_precision_loss)]
    pub fn advance(&self) -> f32 {
        self.text.chars().count() as f32 * self.size * CHAR_ADVANCE_EM
    }

    /// Approximate local bounds using the fixed advance.
    #[must_use = "returns the span bounds"]
    pub fn bounds(&self) -> Rect {
        Rect::new(
            self.origin.x,
            self.origin.y - self.size * ASCENT_EM,
            self.origin.x + self.advance(),
            self.origin.y + self.size * DESCENT_EM,
        )
    }
}

/// An image payload drawn into the unit square.
///
/// Image commands map `(0,0)-(1,1)` through their CTM, so the CTM carries
/// the placement and size on the page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRef {
    /// Part path the image was loaded from
    pub source: String,
    pub mime: String,
    /// Intrinsic pixel size, 0 when unknown
    pub width: u32,
    pub height: u32,
    #[serde(skip, default = "no_data")]
    pub data: Arc<[u8]>,
}

fn no_data() -> Arc<[u8]> {
    Arc::from(Vec::new())
}

impl ImageRef {
    #[must_use = "creates an image reference"]
    pub fn new(source: impl Into<String>, mime: impl Into<String>, data: Arc<[u8]>) -> Self {
        Self {
            source: source.into(),
            mime: mime.into(),
            width: 0,
            height: 0,
            data,
        }
    }

    #[must_use = "returns the image with its pixel size"]
    pub const fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }
}

/// One drawing operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Command {
    FillPath {
        path: Path,
        even_odd: bool,
        color: Color,
    },
    StrokePath {
        path: Path,
        stroke: StrokeStyle,
        color: Color,
    },
    /// Push a clip; balanced by a later [`Command::PopClip`]
    ClipPath { path: Path, even_odd: bool },
    PopClip,
    FillText { span: TextSpan, color: Color },
    FillImage { image: ImageRef, alpha: f32 },
}

impl Command {
    /// Short name used in logs and protocol errors.
    #[must_use = "returns the command name"]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::FillPath { .. } => "fill_path",
            Self::StrokePath { .. } => "stroke_path",
            Self::ClipPath { .. } => "clip_path",
            Self::PopClip => "pop_clip",
            Self::FillText { .. } => "fill_text",
            Self::FillImage { .. } => "fill_image",
        }
    }

    /// Whether this command changes clip state rather than marking the page.
    #[inline]
    #[must_use = "returns whether this is a clip command"]
    pub const fn is_clip(&self) -> bool {
        matches!(self, Self::ClipPath { .. } | Self::PopClip)
    }

    /// Bounds in the command's local space, before its CTM.
    #[must_use = "returns the local bounds"]
    pub fn local_bounds(&self) -> Rect {
        match self {
            Self::FillPath { path, .. } | Self::ClipPath { path, .. } => path.bounds(),
            Self::StrokePath { path, stroke, .. } => path.bounds().expand(stroke.line_width / 2.0),
            Self::FillText { span, .. } => span.bounds(),
            Self::FillImage { .. } => Rect::UNIT,
            Self::PopClip => Rect::EMPTY,
        }
    }
}
