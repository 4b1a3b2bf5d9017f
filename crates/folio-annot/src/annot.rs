//! Markup annotations.

use crate::appearance::{self, Builder, TextAlign, AUTO_FONT_SIZE};
use crate::error::{AnnotError, Result};
use crate::kind::{AnnotFlags, AnnotType};
use folio_core::Rect;
use folio_render::{Color, DisplayList, Path};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of an annotation or widget within its overlay.
///
/// Ids are never reused by an overlay, so a deleted id stays invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnnotId(pub(crate) u32);

impl AnnotId {
    #[inline]
    #[must_use = "returns the raw id"]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for AnnotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Border width given to new annotations.
pub const DEFAULT_BORDER_WIDTH: f32 = 1.0;

/// An annotation on a page overlay.
///
/// Every setter marks the annotation dirty; [`Annotation::update`]
/// regenerates the appearance and clears the flag.
#[derive(Debug, Clone)]
pub struct Annotation {
    id: AnnotId,
    kind: AnnotType,
    rect: Rect,
    flags: AnnotFlags,
    contents: Option<String>,
    author: Option<String>,
    opacity: f32,
    color: Option<Color>,
    border_width: f32,
    dirty: bool,
    appearance: Option<DisplayList>,
}

impl Annotation {
    pub(crate) fn new(id: AnnotId, kind: AnnotType, rect: Rect) -> Self {
        Self {
            id,
            kind,
            rect,
            flags: AnnotFlags::PRINT,
            contents: None,
            author: None,
            opacity: 1.0,
            color: None,
            border_width: DEFAULT_BORDER_WIDTH,
            dirty: true,
            appearance: None,
        }
    }

    /// Same annotation under a new id, dirty and without an appearance.
    pub(crate) fn reidentified(&self, id: AnnotId) -> Self {
        Self {
            id,
            dirty: true,
            appearance: None,
            contents: self.contents.clone(),
            author: self.author.clone(),
            ..*self
        }
    }

    #[inline]
    #[must_use = "returns the annotation id"]
    pub const fn id(&self) -> AnnotId {
        self.id
    }

    #[inline]
    #[must_use = "returns the annotation type"]
    pub const fn kind(&self) -> AnnotType {
        self.kind
    }

    #[inline]
    #[must_use = "returns the rectangle"]
    pub const fn rect(&self) -> Rect {
        self.rect
    }

    pub fn set_rect(&mut self, rect: Rect) {
        self.rect = rect;
        self.dirty = true;
    }

    #[inline]
    #[must_use = "returns the flags"]
    pub const fn flags(&self) -> AnnotFlags {
        self.flags
    }

    pub fn set_flags(&mut self, flags: AnnotFlags) {
        self.flags = flags;
        self.dirty = true;
    }

    #[must_use = "returns the contents"]
    pub fn contents(&self) -> Option<&str> {
        self.contents.as_deref()
    }

    pub fn set_contents(&mut self, contents: &str) {
        self.contents = Some(contents.to_string());
        self.dirty = true;
    }

    #[must_use = "returns the author"]
    pub fn author(&self) -> Option<&str> {
        self.author.as_deref()
    }

    pub fn set_author(&mut self, author: &str) {
        self.author = Some(author.to_string());
        self.dirty = true;
    }

    #[inline]
    #[must_use = "returns the opacity"]
    pub const fn opacity(&self) -> f32 {
        self.opacity
    }

    /// Set the opacity, clamped to `0.0..=1.0`.
    ///
    /// # Errors
    ///
    /// Returns [`AnnotError::InvalidValue`] for NaN.
    pub fn set_opacity(&mut self, opacity: f32) -> Result<()> {
        if opacity.is_nan() {
            return Err(AnnotError::invalid("opacity", "NaN"));
        }
        self.opacity = opacity.clamp(0.0, 1.0);
        self.dirty = true;
        Ok(())
    }

    /// Stroke/fill color; `None` means the type's default.
    #[inline]
    #[must_use = "returns the color"]
    pub const fn color(&self) -> Option<Color> {
        self.color
    }

    pub fn set_color(&mut self, color: Option<Color>) {
        self.color = color;
        self.dirty = true;
    }

    #[inline]
    #[must_use = "returns the border width"]
    pub const fn border_width(&self) -> f32 {
        self.border_width
    }

    /// # Errors
    ///
    /// Returns [`AnnotError::InvalidValue`] for negative or non-finite widths.
    pub fn set_border_width(&mut self, width: f32) -> Result<()> {
        if !width.is_finite() || width < 0.0 {
            return Err(AnnotError::invalid("border width", format!("{width}")));
        }
        self.border_width = width;
        self.dirty = true;
        Ok(())
    }

    /// Whether the annotation changed since the last successful update.
    #[inline]
    #[must_use = "returns whether the annotation is dirty"]
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn set_appearance(&mut self, appearance: DisplayList) {
        self.appearance = Some(appearance);
        self.dirty = false;
    }

    /// Cached appearance from the last successful update.
    #[inline]
    #[must_use = "returns the cached appearance"]
    pub const fn appearance(&self) -> Option<&DisplayList> {
        self.appearance.as_ref()
    }

    /// Regenerate the appearance and clear the dirty flag.
    ///
    /// # Errors
    ///
    /// Returns [`AnnotError::EmptyRect`] if the rectangle is empty. The
    /// annotation is left unchanged and still dirty.
    pub fn update(&mut self) -> Result<()> {
        if self.rect.is_empty() {
            return Err(AnnotError::EmptyRect);
        }
        let appearance = self.build_appearance();
        self.set_appearance(appearance);
        log::debug!("Updated {} annotation {}", self.kind, self.id);
        Ok(())
    }

    fn default_color(&self) -> Color {
        match self.kind {
            AnnotType::Highlight => Color::rgb(1.0, 1.0, 0.0),
            AnnotType::Redact | AnnotType::StrikeOut => Color::rgb(1.0, 0.0, 0.0),
            AnnotType::Underline | AnnotType::Squiggly | AnnotType::Link => Color::rgb(0.0, 0.0, 1.0),
            AnnotType::Text => Color::rgb(1.0, 0.85, 0.3),
            _ => Color::BLACK,
        }
    }

    fn build_appearance(&self) -> DisplayList {
        let r = self.rect;
        let mut b = Builder::new(r);
        if !self.flags.is_drawn() {
            return b.finish();
        }
        let color = self.color.unwrap_or_else(|| self.default_color()).with_opacity(self.opacity);
        let w = self.border_width;
        let half = appearance::inset(&r, w / 2.0);

        match self.kind {
            AnnotType::Highlight => b.fill(Path::rect(&r), color),
            AnnotType::Underline => b.stroke(appearance::line(r.x0, r.y1 - w, r.x1, r.y1 - w), w.max(1.0), color),
            AnnotType::StrikeOut => {
                let mid = (r.y0 + r.y1) / 2.0;
                b.stroke(appearance::line(r.x0, mid, r.x1, mid), w.max(1.0), color);
            }
            AnnotType::Squiggly => b.stroke(appearance::squiggle(&r), w.max(1.0), color),
            AnnotType::Line => b.stroke(appearance::line(r.x0, r.y1, r.x1, r.y0), w, color),
            AnnotType::Circle => b.stroke(appearance::ellipse(&half), w, color),
            AnnotType::Text => {
                b.fill(Path::rect(&r), color);
                b.stroke(Path::rect(&half), w, Color::BLACK.with_opacity(self.opacity));
            }
            AnnotType::FreeText => {
                b.stroke(Path::rect(&half), w, color);
                if let Some(text) = self.contents.as_deref() {
                    let inner = appearance::text_box(&r, w);
                    b.clip(&r);
                    b.text(&inner, text, AUTO_FONT_SIZE, TextAlign::Left, color);
                    b.pop_clip();
                }
            }
            AnnotType::Redact => {
                b.stroke(Path::rect(&half), w, color);
                b.stroke(appearance::line(r.x0, r.y0, r.x1, r.y1), w, color);
            }
            AnnotType::Popup | AnnotType::Link => {
                if w > 0.0 {
                    b.stroke(Path::rect(&half), w, color);
                }
            }
            _ => b.stroke(Path::rect(&half), w, color),
        }
        b.finish()
    }
}
