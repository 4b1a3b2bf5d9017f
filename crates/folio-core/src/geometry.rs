//! Geometry kernel: points, rectangles, quads and affine matrices.
//!
//! Matrices follow the row-vector convention used by PDF and XPS:
//!
//! ```text
//!                 | a b 0 |
//! [x' y' 1] = [x y 1] | c d 0 |
//!                 | e f 1 |
//! ```
//!
//! so `p.transform(&a.concat(&b)) == p.transform(&a).transform(&b)`.
//!
//! All coordinates are `f32`. Results are IEEE-754 arithmetic with no
//! cross-platform bit-exactness guarantee.

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Point
// ============================================================================

/// A point in page space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ORIGIN: Self = Self::new(0.0, 0.0);

    #[inline]
    #[must_use = "creates a new Point"]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Apply `m` to this point.
    #[inline]
    #[must_use = "returns the transformed point"]
    pub fn transform(self, m: &Matrix) -> Self {
        Self {
            x: self.x * m.a + self.y * m.c + m.e,
            y: self.x * m.b + self.y * m.d + m.f,
        }
    }

    /// Apply only the linear part of `m` (no translation).
    #[inline]
    #[must_use = "returns the transformed vector"]
    pub fn transform_vector(self, m: &Matrix) -> Self {
        Self {
            x: self.x * m.a + self.y * m.c,
            y: self.x * m.b + self.y * m.d,
        }
    }
}

// ============================================================================
// Rect
// ============================================================================

/// Axis-aligned rectangle `(x0, y0)`-`(x1, y1)`.
///
/// A rectangle is empty when its low corner is not strictly below its high
/// corner on both axes. [`Rect::EMPTY`] is the canonical empty value (inverted
/// infinite bounds), which makes it the identity element of [`Rect::union`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl Default for Rect {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl Rect {
    /// Inverted bounds; empty, and neutral for union.
    pub const EMPTY: Self = Self::new(
        f32::INFINITY,
        f32::INFINITY,
        f32::NEG_INFINITY,
        f32::NEG_INFINITY,
    );

    /// Covers the whole plane; neutral for intersection.
    pub const INFINITE: Self = Self::new(
        f32::NEG_INFINITY,
        f32::NEG_INFINITY,
        f32::INFINITY,
        f32::INFINITY,
    );

    /// `(0,0)`-`(1,1)`, the default page-space bootstrap rectangle.
    pub const UNIT: Self = Self::new(0.0, 0.0, 1.0, 1.0);

    /// Rectangle with the coordinates exactly as given.
    #[inline]
    #[must_use = "creates a new Rect"]
    pub const fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Rectangle spanning two arbitrary corners, in any order.
    #[must_use = "creates a new Rect"]
    pub fn from_corners(p: Point, q: Point) -> Self {
        Self {
            x0: p.x.min(q.x),
            y0: p.y.min(q.y),
            x1: p.x.max(q.x),
            y1: p.y.max(q.y),
        }
    }

    /// `(0,0)`-`(width,height)`.
    #[inline]
    #[must_use = "creates a new Rect"]
    pub const fn from_size(width: f32, height: f32) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    #[inline]
    #[must_use = "returns whether the rectangle is empty"]
    pub fn is_empty(&self) -> bool {
        !(self.x0 < self.x1 && self.y0 < self.y1)
    }

    /// Whether the corners are ordered. Degenerate (zero-area) rectangles
    /// are valid; inverted ones such as [`Rect::EMPTY`] are not.
    #[inline]
    #[must_use = "returns whether the rectangle is valid"]
    pub fn is_valid(&self) -> bool {
        self.x0 <= self.x1 && self.y0 <= self.y1
    }

    #[inline]
    #[must_use = "returns whether the rectangle is infinite"]
    pub fn is_infinite(&self) -> bool {
        self.x0 == f32::NEG_INFINITY
            && self.y0 == f32::NEG_INFINITY
            && self.x1 == f32::INFINITY
            && self.y1 == f32::INFINITY
    }

    /// Width, or `0.0` for an empty rectangle.
    #[inline]
    #[must_use = "returns the width"]
    pub fn width(&self) -> f32 {
        if self.is_empty() {
            0.0
        } else {
            self.x1 - self.x0
        }
    }

    /// Height, or `0.0` for an empty rectangle.
    #[inline]
    #[must_use = "returns the height"]
    pub fn height(&self) -> f32 {
        if self.is_empty() {
            0.0
        } else {
            self.y1 - self.y0
        }
    }

    /// Smallest rectangle containing both. Empty operands are ignored.
    #[must_use = "returns the union"]
    pub fn union(&self, other: &Self) -> Self {
        if other.is_empty() {
            return *self;
        }
        if self.is_empty() {
            return *other;
        }
        Self {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }

    /// Overlap of both rectangles, exactly [`Rect::EMPTY`] when they are
    /// disjoint or either is empty.
    #[must_use = "returns the intersection"]
    pub fn intersect(&self, other: &Self) -> Self {
        if self.is_empty() || other.is_empty() {
            return Self::EMPTY;
        }
        let r = Self {
            x0: self.x0.max(other.x0),
            y0: self.y0.max(other.y0),
            x1: self.x1.min(other.x1),
            y1: self.y1.min(other.y1),
        };
        if r.is_empty() {
            Self::EMPTY
        } else {
            r
        }
    }

    /// Grow to include `p`. An empty rectangle becomes the degenerate point
    /// rectangle at `p`.
    #[must_use = "returns the grown rectangle"]
    pub fn include_point(&self, p: Point) -> Self {
        if !self.is_valid() {
            return Self::new(p.x, p.y, p.x, p.y);
        }
        Self {
            x0: self.x0.min(p.x),
            y0: self.y0.min(p.y),
            x1: self.x1.max(p.x),
            y1: self.y1.max(p.y),
        }
    }

    /// Half-open containment test.
    #[inline]
    #[must_use = "returns whether the point is inside"]
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x0 && p.x < self.x1 && p.y >= self.y0 && p.y < self.y1
    }

    /// Whether the rectangles share any area.
    #[inline]
    #[must_use = "returns whether the rectangles overlap"]
    pub fn overlaps(&self, other: &Self) -> bool {
        !self.intersect(other).is_empty()
    }

    /// Expand every side by `d` (shrink if negative).
    #[must_use = "returns the expanded rectangle"]
    pub fn expand(&self, d: f32) -> Self {
        if !self.is_valid() || self.is_infinite() {
            return *self;
        }
        Self::new(self.x0 - d, self.y0 - d, self.x1 + d, self.y1 + d)
    }

    /// Bounding box of the transformed rectangle. Degenerate rectangles are
    /// transformed too; inverted and infinite ones are returned unchanged.
    #[must_use = "returns the transformed bounds"]
    pub fn transform(&self, m: &Matrix) -> Self {
        if self.is_infinite() || !self.is_valid() {
            return *self;
        }
        Quad::from_rect(self).transform(m).bounds()
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} {} {} {}]", self.x0, self.y0, self.x1, self.y1)
    }
}

/// Integer rectangle, used for pixel buffer geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct IRect {
    pub x0: i32,
    pub y0: i32,
    pub x1: i32,
    pub y1: i32,
}

impl IRect {
    #[inline]
    #[must_use = "creates a new IRect"]
    pub const fn new(x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Smallest integer rectangle covering `r`. Empty and infinite
    /// rectangles map to the zero rectangle.
    #[must_use = "returns the rounded rectangle"]
    pub fn round_out(r: &Rect) -> Self {
        if r.is_empty() || r.is_infinite() {
            return Self::default();
        }
        #[allow(clippy::cast_possible_truncation)]
        let clamp = |v: f32| v.clamp(i32::MIN as f32, i32::MAX as f32) as i32;
        Self {
            x0: clamp(r.x0.floor()),
            y0: clamp(r.y0.floor()),
            x1: clamp(r.x1.ceil()),
            y1: clamp(r.y1.ceil()),
        }
    }

    #[inline]
    #[must_use = "returns the width"]
    pub const fn width(&self) -> u32 {
        if self.x1 > self.x0 {
            self.x1.abs_diff(self.x0)
        } else {
            0
        }
    }

    #[inline]
    #[must_use = "returns the height"]
    pub const fn height(&self) -> u32 {
        if self.y1 > self.y0 {
            self.y1.abs_diff(self.y0)
        } else {
            0
        }
    }

    #[inline]
    #[must_use = "returns whether the rectangle is empty"]
    pub const fn is_empty(&self) -> bool {
        self.x0 >= self.x1 || self.y0 >= self.y1
    }
}

// ============================================================================
// Quad
// ============================================================================

/// Four corners of a possibly rotated rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quad {
    pub ul: Point,
    pub ur: Point,
    pub ll: Point,
    pub lr: Point,
}

impl Quad {
    #[must_use = "creates a new Quad"]
    pub const fn from_rect(r: &Rect) -> Self {
        Self {
            ul: Point::new(r.x0, r.y0),
            ur: Point::new(r.x1, r.y0),
            ll: Point::new(r.x0, r.y1),
            lr: Point::new(r.x1, r.y1),
        }
    }

    #[must_use = "returns the transformed quad"]
    pub fn transform(&self, m: &Matrix) -> Self {
        Self {
            ul: self.ul.transform(m),
            ur: self.ur.transform(m),
            ll: self.ll.transform(m),
            lr: self.lr.transform(m),
        }
    }

    #[must_use = "returns the bounding box"]
    pub fn bounds(&self) -> Rect {
        let xs = [self.ul.x, self.ur.x, self.ll.x, self.lr.x];
        let ys = [self.ul.y, self.ur.y, self.ll.y, self.lr.y];
        Rect {
            x0: xs.iter().copied().fold(f32::INFINITY, f32::min),
            y0: ys.iter().copied().fold(f32::INFINITY, f32::min),
            x1: xs.iter().copied().fold(f32::NEG_INFINITY, f32::max),
            y1: ys.iter().copied().fold(f32::NEG_INFINITY, f32::max),
        }
    }
}

// ============================================================================
// Matrix
// ============================================================================

/// 2D affine transform `[a b c d e f]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub e: f32,
    pub f: f32,
}

impl Default for Matrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Matrix {
    pub const IDENTITY: Self = Self::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);

    #[inline]
    #[must_use = "creates a new Matrix"]
    pub const fn new(a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) -> Self {
        Self { a, b, c, d, e, f }
    }

    #[inline]
    #[must_use = "creates a translation matrix"]
    pub const fn translate(tx: f32, ty: f32) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    #[inline]
    #[must_use = "creates a scale matrix"]
    pub const fn scale(sx: f32, sy: f32) -> Self {
        Self::new(sx, 0.0, 0.0, sy, 0.0, 0.0)
    }

    /// Counter-clockwise rotation (in a y-up space) by `degrees`. Quarter
    /// turns produce exact 0/±1 coefficients.
    #[must_use = "creates a rotation matrix"]
    pub fn rotate(degrees: f32) -> Self {
        let deg = degrees.rem_euclid(360.0);
        let (s, c) = if deg == 0.0 {
            (0.0, 1.0)
        } else if deg == 90.0 {
            (1.0, 0.0)
        } else if deg == 180.0 {
            (0.0, -1.0)
        } else if deg == 270.0 {
            (-1.0, 0.0)
        } else {
            deg.to_radians().sin_cos()
        };
        Self::new(c, s, -s, c, 0.0, 0.0)
    }

    /// `self` followed by `other`.
    #[must_use = "returns the concatenated matrix"]
    pub fn concat(&self, other: &Self) -> Self {
        Self {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }

    /// Translation applied before this matrix.
    #[must_use = "returns the combined matrix"]
    pub fn pre_translate(&self, tx: f32, ty: f32) -> Self {
        Self::translate(tx, ty).concat(self)
    }

    /// Scale applied before this matrix.
    #[must_use = "returns the combined matrix"]
    pub fn pre_scale(&self, sx: f32, sy: f32) -> Self {
        Self::scale(sx, sy).concat(self)
    }

    #[inline]
    #[must_use = "returns the determinant"]
    pub fn determinant(&self) -> f32 {
        self.a * self.d - self.b * self.c
    }

    /// Inverse transform, or `None` for a degenerate matrix.
    #[must_use = "returns the inverse matrix"]
    pub fn invert(&self) -> Option<Self> {
        let det = self.determinant();
        if det == 0.0 || !det.is_finite() {
            return None;
        }
        let rdet = 1.0 / det;
        let a = self.d * rdet;
        let b = -self.b * rdet;
        let c = -self.c * rdet;
        let d = self.a * rdet;
        Some(Self {
            a,
            b,
            c,
            d,
            e: -self.e * a - self.f * c,
            f: -self.e * b - self.f * d,
        })
    }

    /// Average scale factor, used to scale line widths.
    #[must_use = "returns the expansion factor"]
    pub fn expansion(&self) -> f32 {
        self.determinant().abs().sqrt()
    }

    /// Whether the matrix keeps axis-aligned rectangles axis-aligned.
    #[must_use = "returns whether the matrix is rectilinear"]
    pub fn is_rectilinear(&self) -> bool {
        (self.b.abs() < f32::EPSILON && self.c.abs() < f32::EPSILON)
            || (self.a.abs() < f32::EPSILON && self.d.abs() < f32::EPSILON)
    }
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{} {} {} {} {} {}]",
            self.a, self.b, self.c, self.d, self.e, self.f
        )
    }
}
