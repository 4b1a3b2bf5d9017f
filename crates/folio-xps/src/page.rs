//! XPS page structures and FixedPage rendering

use crate::geometry::{parse_matrix, parse_path_data, parse_rect, Geometry};
use folio_archive::{resolve, Archive};
use folio_core::Matrix;
use folio_render::{Color, Command, Device, ImageRef, StrokeStyle, TextSpan};
use roxmltree::Node;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// XPS page entry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct XpsPage {
    /// Page number (1-indexed, across all documents)
    pub number: usize,

    /// Part name of the `.fpage`
    pub name: String,

    /// Index of the FixedDocument the page belongs to
    pub document: usize,

    /// Page width (in XPS units, 1/96 inch)
    pub width: f32,

    /// Page height (in XPS units, 1/96 inch)
    pub height: f32,
}

/// Text element on XPS page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct XpsTextElement {
    /// Text content
    pub content: String,

    /// X position of the baseline origin
    pub x: f32,

    /// Y position of the baseline origin
    pub y: f32,

    /// Font size (if available)
    pub font_size: Option<f32>,
}

impl XpsTextElement {
    /// Create new text element
    #[inline]
    #[must_use = "creates text element at position"]
    pub const fn new(content: String, x: f32, y: f32) -> Self {
        Self {
            content,
            x,
            y,
            font_size: None,
        }
    }
}

// ============================================================================
// Attribute helpers
// ============================================================================

fn number(node: Node<'_, '_>, name: &str) -> Option<f32> {
    node.attribute(name)
        .and_then(|v| v.trim().parse::<f32>().ok())
        .filter(|v| v.is_finite())
}

/// `UnicodeString` with the `{}` escape prefix removed.
fn unicode_string<'a>(node: Node<'a, '_>) -> Option<&'a str> {
    let s = node.attribute("UnicodeString")?;
    Some(s.strip_prefix("{}").unwrap_or(s))
}

/// Parse an XPS color: `#RRGGBB`, `#AARRGGBB` or `sc#[a,]r,g,b`.
#[must_use = "returns the parsed color"]
pub fn parse_color(value: &str) -> Option<Color> {
    let value = value.trim();
    if let Some(sc) = value.strip_prefix("sc#") {
        let parts: Vec<f32> = sc
            .split(',')
            .map(|p| p.trim().parse::<f32>())
            .collect::<std::result::Result<_, _>>()
            .ok()?;
        let clamp = |v: f32| v.clamp(0.0, 1.0);
        return match parts.as_slice() {
            [r, g, b] => Some(Color::rgb(clamp(*r), clamp(*g), clamp(*b))),
            [a, r, g, b] => Some(Color::rgba(clamp(*r), clamp(*g), clamp(*b), clamp(*a))),
            _ => None,
        };
    }
    Color::from_hex(value)
}

/// First element child named `Owner.Property`, e.g. `Path.Fill`.
fn property<'a, 'i>(node: Node<'a, 'i>, owner: &str, prop: &str) -> Option<Node<'a, 'i>> {
    node.children().find(|c| {
        c.is_element()
            && c.tag_name()
                .name()
                .split_once('.')
                .is_some_and(|(o, p)| o == owner && p == prop)
    })
}

fn first_element<'a, 'i>(node: Node<'a, 'i>) -> Option<Node<'a, 'i>> {
    node.children().find(Node::is_element)
}

/// Local transform from the `RenderTransform` attribute or a
/// `X.RenderTransform/MatrixTransform` property element.
fn render_transform(node: Node<'_, '_>) -> Matrix {
    let owner = node.tag_name().name();
    let value = node.attribute("RenderTransform").or_else(|| {
        property(node, owner, "RenderTransform")
            .and_then(first_element)
            .filter(|m| m.tag_name().name() == "MatrixTransform")
            .and_then(|m| m.attribute("Matrix"))
    });
    match value.map(parse_matrix) {
        Some(Ok(m)) => m,
        Some(Err(e)) => {
            log::warn!("Ignoring RenderTransform on {owner}: {e}");
            Matrix::IDENTITY
        }
        None => Matrix::IDENTITY,
    }
}

fn geometry_of(node: Node<'_, '_>, attr: &str, prop: &str) -> Option<Geometry> {
    let owner = node.tag_name().name();
    let (data, fill_rule) = match node.attribute(attr) {
        Some(d) => (d, None),
        None => {
            let geom = property(node, owner, prop)
                .and_then(first_element)
                .filter(|g| g.tag_name().name() == "PathGeometry")?;
            (geom.attribute("Figures")?, geom.attribute("FillRule"))
        }
    };
    if data.trim_start().starts_with('{') {
        log::warn!("{owner} geometry resource references are not supported");
        return None;
    }
    match parse_path_data(data) {
        Ok(mut g) => {
            match fill_rule {
                Some("NonZero") => g.even_odd = false,
                Some("EvenOdd") => g.even_odd = true,
                _ => {}
            }
            Some(g)
        }
        Err(e) => {
            log::warn!("Skipping {owner} with bad geometry: {e}");
            None
        }
    }
}

enum Brush {
    Solid(Color),
    Image {
        source: String,
        viewport: (f32, f32, f32, f32),
    },
}

fn brush_of(node: Node<'_, '_>, attr: &str, prop: &str) -> Option<Brush> {
    let owner = node.tag_name().name();
    if let Some(value) = node.attribute(attr) {
        return match parse_color(value) {
            Some(c) => Some(Brush::Solid(c)),
            None => {
                log::warn!("Unsupported {owner}.{attr} value '{value}'");
                None
            }
        };
    }
    let brush = property(node, owner, prop).and_then(first_element)?;
    let opacity = number(brush, "Opacity").unwrap_or(1.0);
    match brush.tag_name().name() {
        "SolidColorBrush" => brush
            .attribute("Color")
            .and_then(parse_color)
            .map(|c| Brush::Solid(c.with_opacity(opacity))),
        "ImageBrush" => {
            let source = brush.attribute("ImageSource")?.to_string();
            let viewport = brush.attribute("Viewport").and_then(|v| parse_rect(v).ok())?;
            Some(Brush::Image { source, viewport })
        }
        other => {
            log::debug!("Skipping unsupported brush {other}");
            None
        }
    }
}

// ============================================================================
// Rendering
// ============================================================================

/// Walks a FixedPage tree and emits drawing commands.
pub(crate) struct PageRenderer<'a> {
    pub archive: &'a Archive,
    /// Part name of the page, base for relative URIs
    pub page_path: &'a str,
}

impl PageRenderer<'_> {
    /// Render the children of the FixedPage root.
    ///
    /// # Errors
    ///
    /// Propagates device errors and XML errors in the page.
    pub fn render(&self, xml: &str, device: &mut dyn Device, ctm: &Matrix) -> folio_core::Result<()> {
        let opts = roxmltree::ParsingOptions {
            allow_dtd: true,
            ..Default::default()
        };
        let doc = roxmltree::Document::parse_with_options(xml, opts)
            .map_err(crate::error::XpsError::from)?;
        for child in doc.root_element().children().filter(Node::is_element) {
            self.element(child, device, ctm, 1.0)?;
        }
        Ok(())
    }

    fn element(
        &self,
        node: Node<'_, '_>,
        device: &mut dyn Device,
        ctm: &Matrix,
        opacity: f32,
    ) -> folio_core::Result<()> {
        match node.tag_name().name() {
            "Canvas" => self.canvas(node, device, ctm, opacity),
            "Path" => self.path(node, device, ctm, opacity),
            "Glyphs" => self.glyphs(node, device, ctm, opacity),
            _ => Ok(()),
        }
    }

    /// Push the element's `Clip`, if any. Returns whether a clip was pushed.
    fn push_clip(
        &self,
        node: Node<'_, '_>,
        device: &mut dyn Device,
        ctm: &Matrix,
    ) -> folio_core::Result<bool> {
        let Some(clip) = geometry_of(node, "Clip", "Clip") else {
            return Ok(false);
        };
        device.draw(
            &Command::ClipPath {
                path: clip.path,
                even_odd: clip.even_odd,
            },
            ctm,
        )?;
        Ok(true)
    }

    fn canvas(
        &self,
        node: Node<'_, '_>,
        device: &mut dyn Device,
        ctm: &Matrix,
        opacity: f32,
    ) -> folio_core::Result<()> {
        let local = render_transform(node).concat(ctm);
        let opacity = opacity * number(node, "Opacity").unwrap_or(1.0);
        let clipped = self.push_clip(node, device, &local)?;
        for child in node.children().filter(Node::is_element) {
            self.element(child, device, &local, opacity)?;
        }
        if clipped {
            device.draw(&Command::PopClip, &local)?;
        }
        Ok(())
    }

    fn path(
        &self,
        node: Node<'_, '_>,
        device: &mut dyn Device,
        ctm: &Matrix,
        opacity: f32,
    ) -> folio_core::Result<()> {
        let Some(geometry) = geometry_of(node, "Data", "Data") else {
            return Ok(());
        };
        let local = render_transform(node).concat(ctm);
        let opacity = opacity * number(node, "Opacity").unwrap_or(1.0);
        let clipped = self.push_clip(node, device, &local)?;

        match brush_of(node, "Fill", "Fill") {
            Some(Brush::Solid(color)) => device.draw(
                &Command::FillPath {
                    path: geometry.path.clone(),
                    even_odd: geometry.even_odd,
                    color: color.with_opacity(opacity),
                },
                &local,
            )?,
            Some(Brush::Image { source, viewport }) => {
                self.image_fill(&geometry, &source, viewport, device, &local, opacity)?;
            }
            None => {}
        }

        if let Some(Brush::Solid(color)) = brush_of(node, "Stroke", "Stroke") {
            let width = number(node, "StrokeThickness").unwrap_or(1.0).max(0.0);
            device.draw(
                &Command::StrokePath {
                    path: geometry.path,
                    stroke: StrokeStyle::with_width(width),
                    color: color.with_opacity(opacity),
                },
                &local,
            )?;
        }

        if clipped {
            device.draw(&Command::PopClip, &local)?;
        }
        Ok(())
    }

    /// Image brush: clip to the geometry, then map the image onto the viewport.
    fn image_fill(
        &self,
        geometry: &Geometry,
        source: &str,
        viewport: (f32, f32, f32, f32),
        device: &mut dyn Device,
        ctm: &Matrix,
        opacity: f32,
    ) -> folio_core::Result<()> {
        let path = match resolve(self.page_path, source) {
            Ok(p) => p,
            Err(e) => {
                log::warn!("Bad ImageSource '{source}': {e}");
                return Ok(());
            }
        };
        let Some(part) = self.archive.get_part(&path) else {
            log::warn!("ImageBrush source {path} is missing");
            return Ok(());
        };
        let image = ImageRef::new(path.as_str(), part.content_type(), Arc::from(part.data()));
        let (x, y, w, h) = viewport;
        let placement = Matrix::new(w, 0.0, 0.0, h, x, y).concat(ctm);

        device.draw(
            &Command::ClipPath {
                path: geometry.path.clone(),
                even_odd: geometry.even_odd,
            },
            ctm,
        )?;
        device.draw(
            &Command::FillImage {
                image,
                alpha: opacity.clamp(0.0, 1.0),
            },
            &placement,
        )?;
        device.draw(&Command::PopClip, ctm)?;
        Ok(())
    }

    fn glyphs(
        &self,
        node: Node<'_, '_>,
        device: &mut dyn Device,
        ctm: &Matrix,
        opacity: f32,
    ) -> folio_core::Result<()> {
        let Some(text) = unicode_string(node).filter(|t| !t.is_empty()) else {
            return Ok(());
        };
        let local = render_transform(node).concat(ctm);
        let opacity = opacity * number(node, "Opacity").unwrap_or(1.0);
        let size = number(node, "FontRenderingEmSize").unwrap_or(0.0);
        let origin = folio_core::Point::new(
            number(node, "OriginX").unwrap_or(0.0),
            number(node, "OriginY").unwrap_or(0.0),
        );
        let font = node
            .attribute("FontUri")
            .and_then(|uri| resolve(self.page_path, uri).ok())
            .unwrap_or_default();
        let color = match brush_of(node, "Fill", "Fill") {
            Some(Brush::Solid(c)) => c,
            _ => Color::BLACK,
        };
        let clipped = self.push_clip(node, device, &local)?;
        device.draw(
            &Command::FillText {
                span: TextSpan::new(text, font, size, origin),
                color: color.with_opacity(opacity),
            },
            &local,
        )?;
        if clipped {
            device.draw(&Command::PopClip, &local)?;
        }
        Ok(())
    }
}

/// Text runs of a FixedPage in document order.
///
/// # Errors
///
/// Returns an error if the page is not well-formed XML.
pub fn extract_text(xml: &str) -> crate::Result<Vec<XpsTextElement>> {
    let opts = roxmltree::ParsingOptions {
        allow_dtd: true,
        ..Default::default()
    };
    let doc = roxmltree::Document::parse_with_options(xml, opts)?;
    Ok(doc
        .descendants()
        .filter(|n| n.tag_name().name() == "Glyphs")
        .filter_map(|n| {
            let text = unicode_string(n).filter(|t| !t.is_empty())?;
            let mut elem = XpsTextElement::new(
                text.to_string(),
                number(n, "OriginX").unwrap_or(0.0),
                number(n, "OriginY").unwrap_or(0.0),
            );
            elem.font_size = number(n, "FontRenderingEmSize");
            Some(elem)
        })
        .collect())
}
