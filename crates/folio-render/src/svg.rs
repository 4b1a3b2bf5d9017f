//! SVG output device.
//!
//! Every page becomes one complete `<svg>` document written to the sink.
//! Commands keep their transform as a `matrix(...)` attribute, clips nest
//! `<g clip-path>` groups, and images are embedded as base64 data URIs.

use crate::command::{Command, ImageRef, TextSpan};
use crate::device::{Device, DeviceState, PageProtocol};
use crate::error::{RenderError, Result};
use crate::path::{Color, Path, StrokeStyle};
use base64::Engine;
use folio_core::{Matrix, Rect};
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Write;

const SVG_NS: &str = "http://www.w3.org/2000/svg";
const XLINK_NS: &str = "http://www.w3.org/1999/xlink";

/// How text commands are written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextFormat {
    /// `<text>` elements
    #[default]
    Text,
    /// Glyph outlines as paths
    Path,
}

/// Options for [`SvgDevice`].
///
/// # Examples
///
/// ```rust
/// use folio_render::{SvgDeviceOptions, TextFormat};
///
/// let opts = SvgDeviceOptions::parse("text=text,reuse-images=no").unwrap();
/// assert_eq!(opts.text_format, TextFormat::Text);
/// assert!(!opts.reuse_images);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SvgDeviceOptions {
    pub text_format: TextFormat,
    /// Emit each image once per page and reference it with `<use>`
    pub reuse_images: bool,
}

impl Default for SvgDeviceOptions {
    fn default() -> Self {
        Self {
            text_format: TextFormat::Text,
            reuse_images: true,
        }
    }
}

impl SvgDeviceOptions {
    /// Parse a comma-separated `key=value` option string.
    ///
    /// Recognized keys are `text` (`text` or `path`) and `reuse-images`
    /// (`yes` or `no`). An empty string yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::InvalidOption`] for unknown keys or values.
    pub fn parse(s: &str) -> Result<Self> {
        let mut opts = Self::default();
        for item in s.split(',').map(str::trim).filter(|i| !i.is_empty()) {
            let (key, value) = item
                .split_once('=')
                .ok_or_else(|| RenderError::InvalidOption(item.to_string()))?;
            match (key.trim(), value.trim()) {
                ("text", "text") => opts.text_format = TextFormat::Text,
                ("text", "path") => opts.text_format = TextFormat::Path,
                ("reuse-images", "yes") => opts.reuse_images = true,
                ("reuse-images", "no") => opts.reuse_images = false,
                _ => return Err(RenderError::InvalidOption(item.to_string())),
            }
        }
        Ok(opts)
    }
}

/// Writes pages as SVG documents.
pub struct SvgDevice<W: Write> {
    writer: Writer<W>,
    options: SvgDeviceOptions,
    protocol: PageProtocol,
    clip_depth: usize,
    next_id: usize,
    images: HashMap<String, String>,
}

impl<W: Write> std::fmt::Debug for SvgDevice<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SvgDevice")
            .field("options", &self.options)
            .field("state", &self.protocol.state())
            .field("clip_depth", &self.clip_depth)
            .finish_non_exhaustive()
    }
}

impl<W: Write> SvgDevice<W> {
    /// Device writing to `sink`.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Unsupported`] for `text=path`, since glyph
    /// outlines are not available.
    pub fn new(sink: W, options: SvgDeviceOptions) -> Result<Self> {
        if options.text_format == TextFormat::Path {
            return Err(RenderError::Unsupported(
                "SVG text as paths requires glyph outlines".to_string(),
            ));
        }
        Ok(Self {
            writer: Writer::new(sink),
            options,
            protocol: PageProtocol::new(),
            clip_depth: 0,
            next_id: 0,
            images: HashMap::new(),
        })
    }

    #[must_use = "returns the options"]
    pub const fn options(&self) -> SvgDeviceOptions {
        self.options
    }

    /// Recover the sink.
    #[must_use = "returns the sink"]
    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }

    fn fresh_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}{}", self.next_id)
    }

    /// Run `f`, marking the device failed if the sink errors.
    fn output(&mut self, f: impl FnOnce(&mut Self) -> Result<()>) -> Result<()> {
        let res = f(self);
        if res.is_err() {
            self.protocol.fail();
        }
        res
    }

    fn event(&mut self, event: Event<'_>) -> Result<()> {
        self.writer.write_event(event)?;
        Ok(())
    }

    fn newline(&mut self) -> Result<()> {
        self.writer.get_mut().write_all(b"\n")?;
        Ok(())
    }

    fn write_page_start(&mut self, mediabox: &Rect) -> Result<()> {
        let (w, h) = if mediabox.is_empty() {
            (0.0, 0.0)
        } else {
            (mediabox.width(), mediabox.height())
        };
        let (x, y) = if mediabox.is_empty() {
            (0.0, 0.0)
        } else {
            (mediabox.x0, mediabox.y0)
        };
        let mut svg = BytesStart::new("svg");
        svg.push_attribute(("xmlns", SVG_NS));
        svg.push_attribute(("xmlns:xlink", XLINK_NS));
        svg.push_attribute(("version", "1.1"));
        svg.push_attribute(("width", format!("{w}pt").as_str()));
        svg.push_attribute(("height", format!("{h}pt").as_str()));
        svg.push_attribute(("viewBox", format!("{x} {y} {w} {h}").as_str()));
        self.event(Event::Start(svg))?;
        self.newline()
    }

    fn write_path(&mut self, path: &Path, ctm: &Matrix, paint: &[(&str, String)]) -> Result<()> {
        let mut el = BytesStart::new("path");
        el.push_attribute(("transform", svg_matrix(ctm).as_str()));
        el.push_attribute(("d", path.to_svg_data().as_str()));
        for (k, v) in paint {
            el.push_attribute((*k, v.as_str()));
        }
        self.event(Event::Empty(el))?;
        self.newline()
    }

    fn write_clip(&mut self, path: &Path, even_odd: bool, ctm: &Matrix) -> Result<()> {
        let id = self.fresh_id("clip");
        let mut clip = BytesStart::new("clipPath");
        clip.push_attribute(("id", id.as_str()));
        self.event(Event::Start(clip))?;
        let rule = if even_odd { "evenodd" } else { "nonzero" };
        self.write_path(path, ctm, &[("clip-rule", rule.to_string())])?;
        self.event(Event::End(BytesEnd::new("clipPath")))?;
        let mut group = BytesStart::new("g");
        group.push_attribute(("clip-path", format!("url(#{id})").as_str()));
        self.event(Event::Start(group))?;
        self.newline()?;
        self.clip_depth += 1;
        Ok(())
    }

    fn write_text(&mut self, span: &TextSpan, color: Color, ctm: &Matrix) -> Result<()> {
        let mut el = BytesStart::new("text");
        el.push_attribute(("transform", svg_matrix(ctm).as_str()));
        el.push_attribute(("x", span.origin.x.to_string().as_str()));
        el.push_attribute(("y", span.origin.y.to_string().as_str()));
        el.push_attribute(("font-family", span.font.as_str()));
        el.push_attribute(("font-size", span.size.to_string().as_str()));
        el.push_attribute(("fill", color.to_hex().as_str()));
        if color.a < 1.0 {
            el.push_attribute(("fill-opacity", color.a.to_string().as_str()));
        }
        self.event(Event::Start(el))?;
        self.event(Event::Text(BytesText::new(&span.text)))?;
        self.event(Event::End(BytesEnd::new("text")))?;
        self.newline()
    }

    fn image_element(name: &'static str, image: &ImageRef) -> BytesStart<'static> {
        let uri = format!(
            "data:{};base64,{}",
            image.mime,
            base64::engine::general_purpose::STANDARD.encode(&image.data)
        );
        let mut el = BytesStart::new(name);
        el.push_attribute(("width", "1"));
        el.push_attribute(("height", "1"));
        el.push_attribute(("preserveAspectRatio", "none"));
        el.push_attribute(("xlink:href", uri.as_str()));
        el
    }

    fn write_image(&mut self, image: &ImageRef, alpha: f32, ctm: &Matrix) -> Result<()> {
        let transform = svg_matrix(ctm);
        let opacity = (alpha < 1.0).then(|| alpha.clamp(0.0, 1.0).to_string());

        if !self.options.reuse_images {
            let mut el = Self::image_element("image", image);
            el.push_attribute(("transform", transform.as_str()));
            if let Some(op) = &opacity {
                el.push_attribute(("opacity", op.as_str()));
            }
            self.event(Event::Empty(el))?;
            return self.newline();
        }

        let id = if let Some(id) = self.images.get(&image.source) {
            id.clone()
        } else {
            let id = self.fresh_id("image");
            let mut def = Self::image_element("image", image);
            def.push_attribute(("id", id.as_str()));
            self.event(Event::Start(BytesStart::new("defs")))?;
            self.event(Event::Empty(def))?;
            self.event(Event::End(BytesEnd::new("defs")))?;
            self.newline()?;
            self.images.insert(image.source.clone(), id.clone());
            id
        };
        let mut el = BytesStart::new("use");
        el.push_attribute(("xlink:href", format!("#{id}").as_str()));
        el.push_attribute(("transform", transform.as_str()));
        if let Some(op) = &opacity {
            el.push_attribute(("opacity", op.as_str()));
        }
        self.event(Event::Empty(el))?;
        self.newline()
    }

    fn write_command(&mut self, command: &Command, ctm: &Matrix) -> Result<()> {
        match command {
            Command::FillPath {
                path,
                even_odd,
                color,
            } => {
                let mut paint = fill_paint(*color);
                if *even_odd {
                    paint.push(("fill-rule", "evenodd".to_string()));
                }
                self.write_path(path, ctm, &paint)
            }
            Command::StrokePath {
                path,
                stroke,
                color,
            } => self.write_path(path, ctm, &stroke_paint(stroke, *color)),
            Command::ClipPath { path, even_odd } => self.write_clip(path, *even_odd, ctm),
            Command::PopClip => {
                if self.clip_depth == 0 {
                    return Err(RenderError::ClipUnderflow);
                }
                self.clip_depth -= 1;
                self.event(Event::End(BytesEnd::new("g")))?;
                self.newline()
            }
            Command::FillText { span, color } => self.write_text(span, *color, ctm),
            Command::FillImage { image, alpha } => self.write_image(image, *alpha, ctm),
        }
    }
}

fn svg_matrix(m: &Matrix) -> String {
    format!("matrix({} {} {} {} {} {})", m.a, m.b, m.c, m.d, m.e, m.f)
}

fn fill_paint(color: Color) -> Vec<(&'static str, String)> {
    let mut paint = vec![("fill", color.to_hex())];
    if color.a < 1.0 {
        paint.push(("fill-opacity", color.a.to_string()));
    }
    paint
}

fn stroke_paint(stroke: &StrokeStyle, color: Color) -> Vec<(&'static str, String)> {
    let mut paint = vec![
        ("fill", "none".to_string()),
        ("stroke", color.to_hex()),
        ("stroke-width", stroke.line_width.to_string()),
        ("stroke-linecap", stroke.cap.svg_name().to_string()),
        ("stroke-linejoin", stroke.join.svg_name().to_string()),
        ("stroke-miterlimit", stroke.miter_limit.to_string()),
    ];
    if !stroke.dash.is_empty() {
        let dash: Vec<String> = stroke.dash.iter().map(ToString::to_string).collect();
        paint.push(("stroke-dasharray", dash.join(" ")));
    }
    if color.a < 1.0 {
        paint.push(("stroke-opacity", color.a.to_string()));
    }
    paint
}

impl<W: Write> Device for SvgDevice<W> {
    fn begin_page(&mut self, mediabox: &Rect) -> Result<()> {
        self.protocol.begin()?;
        self.clip_depth = 0;
        self.images.clear();
        let mediabox = *mediabox;
        self.output(|dev| dev.write_page_start(&mediabox))
    }

    fn end_page(&mut self) -> Result<()> {
        self.protocol.end()?;
        self.output(|dev| {
            while dev.clip_depth > 0 {
                dev.clip_depth -= 1;
                dev.event(Event::End(BytesEnd::new("g")))?;
            }
            dev.event(Event::End(BytesEnd::new("svg")))?;
            dev.newline()
        })
    }

    fn draw(&mut self, command: &Command, ctm: &Matrix) -> Result<()> {
        self.protocol.require_open(command.name())?;
        match self.write_command(command, ctm) {
            Err(RenderError::ClipUnderflow) => Err(RenderError::ClipUnderflow),
            Err(err) => {
                self.protocol.fail();
                Err(err)
            }
            Ok(()) => Ok(()),
        }
    }

    fn close(&mut self) -> Result<()> {
        self.protocol.close()?;
        self.output(|dev| Ok(dev.writer.get_mut().flush()?))
    }

    fn state(&self) -> DeviceState {
        self.protocol.state()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::Point;
    use std::sync::Arc;

    fn render(options: SvgDeviceOptions, commands: &[Command]) -> String {
        let mut dev = SvgDevice::new(Vec::new(), options).unwrap();
        dev.begin_page(&Rect::from_size(100.0, 50.0)).unwrap();
        for c in commands {
            dev.draw(c, &Matrix::IDENTITY).unwrap();
        }
        dev.end_page().unwrap();
        dev.close().unwrap();
        String::from_utf8(dev.into_inner()).unwrap()
    }

    #[test]
    fn test_parse_options() {
        assert_eq!(SvgDeviceOptions::parse("").unwrap(), SvgDeviceOptions::default());
        let o = SvgDeviceOptions::parse("text=path, reuse-images=no").unwrap();
        assert_eq!(o.text_format, TextFormat::Path);
        assert!(!o.reuse_images);
        assert!(SvgDeviceOptions::parse("resolution=96").is_err());
        assert!(SvgDeviceOptions::parse("text").is_err());
    }

    #[test]
    fn test_text_as_path_unsupported() {
        let opts = SvgDeviceOptions {
            text_format: TextFormat::Path,
            reuse_images: false,
        };
        assert!(matches!(
            SvgDevice::new(Vec::new(), opts),
            Err(RenderError::Unsupported(_))
        ));
    }

    #[test]
    fn test_page_document() {
        let svg = render(
            SvgDeviceOptions::default(),
            &[Command::FillPath {
                path: Path::rect(&Rect::new(0.0, 0.0, 10.0, 10.0)),
                even_odd: true,
                color: Color::rgb(1.0, 0.0, 0.0),
            }],
        );
        assert!(svg.starts_with("<svg xmlns=\"http://www.w3.org/2000/svg\""));
        assert!(svg.contains("viewBox=\"0 0 100 50\""));
        assert!(svg.contains("fill=\"#ff0000\""));
        assert!(svg.contains("fill-rule=\"evenodd\""));
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn test_text_is_escaped() {
        let svg = render(
            SvgDeviceOptions::default(),
            &[Command::FillText {
                span: TextSpan::new("a < b & c", "serif", 12.0, Point::new(1.0, 20.0)),
                color: Color::BLACK,
            }],
        );
        assert!(svg.contains("a &lt; b &amp; c"));
        assert!(svg.contains("font-family=\"serif\""));
    }

    #[test]
    fn test_clip_groups_closed_at_end_page() {
        let svg = render(
            SvgDeviceOptions::default(),
            &[Command::ClipPath {
                path: Path::rect(&Rect::new(0.0, 0.0, 5.0, 5.0)),
                even_odd: false,
            }],
        );
        assert!(svg.contains("<clipPath id=\"clip1\">"));
        assert!(svg.contains("<g clip-path=\"url(#clip1)\">"));
        assert_eq!(svg.matches("<g ").count(), svg.matches("</g>").count());
    }

    #[test]
    fn test_reused_image_emitted_once() {
        let image = ImageRef::new("p.png", "image/png", Arc::from(&b"PNGDATA"[..]));
        let cmd = Command::FillImage { image, alpha: 1.0 };
        let svg = render(SvgDeviceOptions::default(), &[cmd.clone(), cmd.clone()]);
        assert_eq!(svg.matches("data:image/png;base64,").count(), 1);
        assert_eq!(svg.matches("<use ").count(), 2);

        let opts = SvgDeviceOptions {
            reuse_images: false,
            ..SvgDeviceOptions::default()
        };
        let svg = render(opts, &[cmd.clone(), cmd]);
        assert_eq!(svg.matches("data:image/png;base64,UE5HREFUQQ==").count(), 2);
    }

    #[test]
    fn test_pop_clip_underflow_keeps_device_open() {
        let mut dev = SvgDevice::new(Vec::new(), SvgDeviceOptions::default()).unwrap();
        dev.begin_page(&Rect::from_size(10.0, 10.0)).unwrap();
        assert!(matches!(
            dev.draw(&Command::PopClip, &Matrix::IDENTITY),
            Err(RenderError::ClipUnderflow)
        ));
        assert_eq!(dev.state(), DeviceState::PageOpen);
    }
}
