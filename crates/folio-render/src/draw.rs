//! Draw device: pixel buffer geometry plus a trace of transformed commands.
//!
//! No rasterization happens here. The device keeps the destination
//! [`Pixmap`], tracks the clip stack in device space, culls commands that
//! fall outside the current clip, and records what it would have drawn.

use crate::command::Command;
use crate::device::{Device, DeviceState, PageProtocol};
use crate::error::{RenderError, Result};
use folio_core::{IRect, Matrix, Rect};
use serde::{Deserialize, Serialize};

/// Bytes per pixel (RGBA).
pub const PIXMAP_COMPONENTS: usize = 4;

/// Destination pixel buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pixmap {
    bbox: IRect,
    samples: Vec<u8>,
}

impl Pixmap {
    /// Zero-filled RGBA buffer covering `bbox`.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::OutOfMemory`] if the buffer cannot be
    /// allocated, or [`RenderError::Unsupported`] if its size overflows.
    pub fn new(bbox: IRect) -> Result<Self> {
        let len = (bbox.width() as usize)
            .checked_mul(bbox.height() as usize)
            .and_then(|n| n.checked_mul(PIXMAP_COMPONENTS))
            .ok_or_else(|| RenderError::Unsupported(format!("pixmap too large: {bbox:?}")))?;
        let mut samples = Vec::new();
        samples.try_reserve_exact(len)?;
        samples.resize(len, 0);
        Ok(Self { bbox, samples })
    }

    #[inline]
    #[must_use = "returns the pixel bounds"]
    pub const fn bbox(&self) -> IRect {
        self.bbox
    }

    #[inline]
    #[must_use = "returns the width in pixels"]
    pub const fn width(&self) -> u32 {
        self.bbox.width()
    }

    #[inline]
    #[must_use = "returns the height in pixels"]
    pub const fn height(&self) -> u32 {
        self.bbox.height()
    }

    /// Bytes per row.
    #[inline]
    #[must_use = "returns the row stride"]
    pub const fn stride(&self) -> usize {
        self.bbox.width() as usize * PIXMAP_COMPONENTS
    }

    #[must_use = "returns the sample buffer"]
    pub fn samples(&self) -> &[u8] {
        &self.samples
    }

    /// Fill every byte with `value`.
    pub fn clear(&mut self, value: u8) {
        self.samples.fill(value);
    }

    fn area(&self) -> Rect {
        #[allow(clippy::cast_precision_loss)]
        Rect::new(
            self.bbox.x0 as f32,
            self.bbox.y0 as f32,
            self.bbox.x1 as f32,
            self.bbox.y1 as f32,
        )
    }
}

/// One command as the draw device saw it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawOp {
    pub command: Command,
    /// Command CTM combined with the device transform
    pub ctm: Matrix,
    /// Device-space bounds
    pub bbox: Rect,
    /// Effective clip when the command was drawn
    pub clip: Rect,
}

/// Draw device over a [`Pixmap`].
#[derive(Debug)]
pub struct DrawDevice {
    protocol: PageProtocol,
    pixmap: Pixmap,
    transform: Matrix,
    /// Mediabox of the open page in device space, within the pixmap
    page_clip: Option<Rect>,
    clips: Vec<Rect>,
    trace: Vec<DrawOp>,
    culled: usize,
}

impl DrawDevice {
    #[must_use = "creates a new DrawDevice"]
    pub fn new(pixmap: Pixmap) -> Self {
        Self::with_transform(pixmap, Matrix::IDENTITY)
    }

    /// Device whose commands are additionally mapped through `transform`.
    #[must_use = "creates a new DrawDevice"]
    pub fn with_transform(pixmap: Pixmap, transform: Matrix) -> Self {
        Self {
            protocol: PageProtocol::new(),
            pixmap,
            transform,
            page_clip: None,
            clips: Vec::new(),
            trace: Vec::new(),
            culled: 0,
        }
    }

    #[must_use = "returns the pixmap"]
    pub const fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    #[must_use = "returns the pixmap"]
    pub fn into_pixmap(self) -> Pixmap {
        self.pixmap
    }

    /// Commands drawn so far, in order.
    #[must_use = "returns the command trace"]
    pub fn trace(&self) -> &[DrawOp] {
        &self.trace
    }

    /// Commands skipped because they missed the clip.
    #[must_use = "returns the culled command count"]
    pub const fn culled(&self) -> usize {
        self.culled
    }

    /// Current clip depth.
    #[must_use = "returns the clip depth"]
    pub fn clip_depth(&self) -> usize {
        self.clips.len()
    }

    /// Base clip of the open page, or the whole pixmap between pages.
    #[must_use = "returns the page clip"]
    pub fn page_clip(&self) -> Rect {
        self.page_clip.unwrap_or_else(|| self.pixmap.area())
    }

    fn current_clip(&self) -> Rect {
        self.clips.last().copied().unwrap_or_else(|| self.page_clip())
    }
}

impl Device for DrawDevice {
    fn begin_page(&mut self, mediabox: &Rect) -> Result<()> {
        self.protocol.begin()?;
        self.clips.clear();
        self.page_clip = Some(mediabox.transform(&self.transform).intersect(&self.pixmap.area()));
        Ok(())
    }

    fn end_page(&mut self) -> Result<()> {
        self.protocol.end()?;
        if !self.clips.is_empty() {
            log::warn!("Page ended with {} unbalanced clip(s)", self.clips.len());
            self.clips.clear();
        }
        self.page_clip = None;
        Ok(())
    }

    fn draw(&mut self, command: &Command, ctm: &Matrix) -> Result<()> {
        self.protocol.require_open(command.name())?;
        let ctm = ctm.concat(&self.transform);
        let clip = self.current_clip();

        match command {
            Command::PopClip => {
                self.clips.pop().ok_or(RenderError::ClipUnderflow)?;
                self.trace.push(DrawOp {
                    command: Command::PopClip,
                    ctm,
                    bbox: Rect::EMPTY,
                    clip: self.current_clip(),
                });
            }
            Command::ClipPath { .. } => {
                let bbox = command.local_bounds().transform(&ctm);
                let inner = clip.intersect(&bbox);
                self.clips.push(inner);
                self.trace.push(DrawOp {
                    command: command.clone(),
                    ctm,
                    bbox,
                    clip: inner,
                });
            }
            _ => {
                let bbox = command.local_bounds().transform(&ctm);
                let visible = bbox.is_valid()
                    && !clip.is_empty()
                    && bbox.x0 <= clip.x1
                    && bbox.x1 >= clip.x0
                    && bbox.y0 <= clip.y1
                    && bbox.y1 >= clip.y0;
                if visible {
                    self.trace.push(DrawOp {
                        command: command.clone(),
                        ctm,
                        bbox,
                        clip,
                    });
                } else {
                    self.culled += 1;
                }
            }
        }
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.protocol.close()
    }

    fn state(&self) -> DeviceState {
        self.protocol.state()
    }
}
