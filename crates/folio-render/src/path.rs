//! Vector paths, stroke styles and colors.

use folio_core::{Matrix, Point, Rect};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// One path construction operator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PathElement {
    MoveTo(Point),
    LineTo(Point),
    /// Cubic Bézier: two control points, then the end point
    CurveTo(Point, Point, Point),
    Close,
}

/// A sequence of subpaths.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Path {
    elements: Vec<PathElement>,
    current: Option<Point>,
    start: Option<Point>,
}

impl Path {
    #[must_use = "creates a new Path"]
    pub const fn new() -> Self {
        Self {
            elements: Vec::new(),
            current: None,
            start: None,
        }
    }

    /// Closed rectangle path.
    #[must_use = "creates a rectangle path"]
    pub fn rect(r: &Rect) -> Self {
        let mut p = Self::new();
        p.move_to(r.x0, r.y0);
        p.line_to(r.x1, r.y0);
        p.line_to(r.x1, r.y1);
        p.line_to(r.x0, r.y1);
        p.close();
        p
    }

    pub fn move_to(&mut self, x: f32, y: f32) {
        let pt = Point::new(x, y);
        self.elements.push(PathElement::MoveTo(pt));
        self.current = Some(pt);
        self.start = Some(pt);
    }

    /// Line to `(x, y)`. Without a current point this starts a subpath.
    pub fn line_to(&mut self, x: f32, y: f32) {
        if self.current.is_none() {
            self.move_to(x, y);
            return;
        }
        let pt = Point::new(x, y);
        self.elements.push(PathElement::LineTo(pt));
        self.current = Some(pt);
    }

    pub fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x3: f32, y3: f32) {
        if self.current.is_none() {
            self.move_to(x1, y1);
        }
        let end = Point::new(x3, y3);
        self.elements.push(PathElement::CurveTo(
            Point::new(x1, y1),
            Point::new(x2, y2),
            end,
        ));
        self.current = Some(end);
    }

    /// Quadratic Bézier, stored as the equivalent cubic.
    pub fn quad_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32) {
        let p0 = self.current.unwrap_or(Point::new(x1, y1));
        let c1x = p0.x + 2.0 / 3.0 * (x1 - p0.x);
        let c1y = p0.y + 2.0 / 3.0 * (y1 - p0.y);
        let c2x = x2 + 2.0 / 3.0 * (x1 - x2);
        let c2y = y2 + 2.0 / 3.0 * (y1 - y2);
        self.curve_to(c1x, c1y, c2x, c2y, x2, y2);
    }

    pub fn close(&mut self) {
        if self.current.is_some() {
            self.elements.push(PathElement::Close);
            self.current = self.start;
        }
    }

    /// Current point, if a subpath is open.
    #[must_use = "returns the current point"]
    pub const fn current_point(&self) -> Option<Point> {
        self.current
    }

    #[must_use = "returns the path elements"]
    pub fn elements(&self) -> &[PathElement] {
        &self.elements
    }

    #[must_use = "returns whether the path is empty"]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Conservative bounds (control points included). Degenerate for
    /// straight horizontal or vertical lines, [`Rect::EMPTY`] for no points.
    #[must_use = "returns the path bounds"]
    pub fn bounds(&self) -> Rect {
        self.points().fold(Rect::EMPTY, |r, p| r.include_point(p))
    }

    fn points(&self) -> impl Iterator<Item = Point> + '_ {
        self.elements.iter().flat_map(|el| {
            let pts: Vec<Point> = match *el {
                PathElement::MoveTo(p) | PathElement::LineTo(p) => vec![p],
                PathElement::CurveTo(a, b, c) => vec![a, b, c],
                PathElement::Close => Vec::new(),
            };
            pts
        })
    }

    /// SVG path data (`M x y L x y C ... Z`).
    #[must_use = "returns the SVG path data"]
    pub fn to_svg_data(&self) -> String {
        let mut d = String::new();
        for el in &self.elements {
            if !d.is_empty() {
                d.push(' ');
            }
            // Writing to a String cannot fail.
            let _ = match *el {
                PathElement::MoveTo(p) => write!(d, "M{} {}", p.x, p.y),
                PathElement::LineTo(p) => write!(d, "L{} {}", p.x, p.y),
                PathElement::CurveTo(a, b, c) => {
                    write!(d, "C{} {} {} {} {} {}", a.x, a.y, b.x, b.y, c.x, c.y)
                }
                PathElement::Close => write!(d, "Z"),
            };
        }
        d
    }

    /// Copy with every point transformed by `m`.
    #[must_use = "returns the transformed path"]
    pub fn transform(&self, m: &Matrix) -> Self {
        let tf = |p: Point| p.transform(m);
        Self {
            elements: self
                .elements
                .iter()
                .map(|el| match *el {
                    PathElement::MoveTo(p) => PathElement::MoveTo(tf(p)),
                    PathElement::LineTo(p) => PathElement::LineTo(tf(p)),
                    PathElement::CurveTo(a, b, c) => PathElement::CurveTo(tf(a), tf(b), tf(c)),
                    PathElement::Close => PathElement::Close,
                })
                .collect(),
            current: self.current.map(tf),
            start: self.start.map(tf),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LineCap {
    #[default]
    Butt,
    Round,
    Square,
}

impl LineCap {
    #[must_use = "returns the SVG keyword"]
    pub const fn svg_name(self) -> &'static str {
        match self {
            Self::Butt => "butt",
            Self::Round => "round",
            Self::Square => "square",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LineJoin {
    #[default]
    Miter,
    Round,
    Bevel,
}

impl LineJoin {
    #[must_use = "returns the SVG keyword"]
    pub const fn svg_name(self) -> &'static str {
        match self {
            Self::Miter => "miter",
            Self::Round => "round",
            Self::Bevel => "bevel",
        }
    }
}

/// Stroke parameters in the path's local space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrokeStyle {
    pub line_width: f32,
    pub cap: LineCap,
    pub join: LineJoin,
    pub miter_limit: f32,
    pub dash: Vec<f32>,
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self {
            line_width: 1.0,
            cap: LineCap::Butt,
            join: LineJoin::Miter,
            miter_limit: 10.0,
            dash: Vec::new(),
        }
    }
}

impl StrokeStyle {
    #[must_use = "creates a stroke style"]
    pub fn with_width(line_width: f32) -> Self {
        Self {
            line_width,
            ..Self::default()
        }
    }
}

/// Non-premultiplied RGBA color, components in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

impl Color {
    pub const BLACK: Self = Self::rgb(0.0, 0.0, 0.0);
    pub const WHITE: Self = Self::rgb(1.0, 1.0, 1.0);
    pub const TRANSPARENT: Self = Self::rgba(0.0, 0.0, 0.0, 0.0);

    #[must_use = "creates a color"]
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    #[must_use = "creates a color"]
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    #[must_use = "creates a color"]
    pub fn from_rgba8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self::rgba(
            f32::from(r) / 255.0,
            f32::from(g) / 255.0,
            f32::from(b) / 255.0,
            f32::from(a) / 255.0,
        )
    }

    /// Parse `#RRGGBB` or `#AARRGGBB` (the XPS/OOXML convention).
    #[must_use = "returns the parsed color"]
    pub fn from_hex(s: &str) -> Option<Self> {
        let hex = s.trim().strip_prefix('#').unwrap_or(s.trim());
        let byte = |i: usize| hex.get(i..i + 2).and_then(|h| u8::from_str_radix(h, 16).ok());
        match hex.len() {
            6 => Some(Self::from_rgba8(byte(0)?, byte(2)?, byte(4)?, 255)),
            8 => Some(Self::from_rgba8(byte(2)?, byte(4)?, byte(6)?, byte(0)?)),
            _ => None,
        }
    }

    /// Same color with alpha multiplied by `opacity` (clamped to `0..=1`).
    #[must_use = "returns the faded color"]
    pub fn with_opacity(self, opacity: f32) -> Self {
        Self {
            a: self.a * opacity.clamp(0.0, 1.0),
            ..self
        }
    }

    /// `#rrggbb` without alpha.
    #[must_use = "returns the hex string"]
    pub fn to_hex(self) -> String {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let c = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        format!("#{:02x}{:02x}{:02x}", c(self.r), c(self.g), c(self.b))
    }
}
