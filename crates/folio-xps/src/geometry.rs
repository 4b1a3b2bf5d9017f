//! Abbreviated path geometry (`Data="F1 M 0,0 L 10,0 10,10 Z"`).
//!
//! Supported commands: `F0`/`F1` fill rule, `M L H V C Q Z` and their
//! lowercase relative forms. A command letter may be followed by several
//! coordinate groups; after `M` the extra groups are line segments.

use crate::error::{Result, XpsError};
use folio_core::{Matrix, Point};
use folio_render::Path;

/// Parsed geometry with its fill rule.
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    pub path: Path,
    /// `F0` (the default) is even-odd, `F1` is nonzero
    pub even_odd: bool,
}

struct Scanner<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Scanner<'a> {
    const fn new(data: &'a str) -> Self {
        Self {
            bytes: data.as_bytes(),
            pos: 0,
        }
    }

    fn skip_separators(&mut self) {
        while self
            .bytes
            .get(self.pos)
            .is_some_and(|b| b.is_ascii_whitespace() || *b == b',')
        {
            self.pos += 1;
        }
    }

    fn peek(&mut self) -> Option<u8> {
        self.skip_separators();
        self.bytes.get(self.pos).copied()
    }

    fn at_number(&mut self) -> bool {
        self.peek()
            .is_some_and(|b| b.is_ascii_digit() || matches!(b, b'-' | b'+' | b'.'))
    }

    fn error(&self, reason: impl Into<String>) -> XpsError {
        XpsError::PathData {
            offset: self.pos,
            reason: reason.into(),
        }
    }

    fn number(&mut self) -> Result<f32> {
        self.skip_separators();
        let start = self.pos;
        let mut end = start;
        if matches!(self.bytes.get(end), Some(b'-' | b'+')) {
            end += 1;
        }
        while self
            .bytes
            .get(end)
            .is_some_and(|b| b.is_ascii_digit() || *b == b'.')
        {
            end += 1;
        }
        if matches!(self.bytes.get(end), Some(b'e' | b'E')) {
            end += 1;
            if matches!(self.bytes.get(end), Some(b'-' | b'+')) {
                end += 1;
            }
            while self.bytes.get(end).is_some_and(u8::is_ascii_digit) {
                end += 1;
            }
        }
        let text = std::str::from_utf8(&self.bytes[start..end]).unwrap_or_default();
        let value = text
            .parse::<f32>()
            .map_err(|_| self.error(format!("expected a number, found '{text}'")))?;
        if !value.is_finite() {
            return Err(self.error("non-finite number"));
        }
        self.pos = end;
        Ok(value)
    }

    fn point(&mut self) -> Result<Point> {
        let x = self.number()?;
        let y = self.number()?;
        Ok(Point::new(x, y))
    }
}

fn offset(p: Point, base: Point, relative: bool) -> Point {
    if relative {
        Point::new(base.x + p.x, base.y + p.y)
    } else {
        p
    }
}

/// Parse abbreviated geometry syntax.
///
/// # Errors
///
/// Returns [`XpsError::PathData`] for an unknown command or a malformed
/// number. Arcs (`A`) and smooth curves (`S`, `T`) are not supported.
///
/// # Examples
///
/// ```rust
/// use folio_xps::parse_path_data;
///
/// let g = parse_path_data("F1 M 0,0 L 10,0 10,10 z").unwrap();
/// assert!(!g.even_odd);
/// assert_eq!(g.path.elements().len(), 4);
/// ```
pub fn parse_path_data(data: &str) -> Result<Geometry> {
    let mut s = Scanner::new(data);
    let mut path = Path::new();
    let mut even_odd = true;
    let mut current = Point::ORIGIN;
    let mut start = Point::ORIGIN;

    while let Some(cmd) = s.peek() {
        s.pos += 1;
        let relative = cmd.is_ascii_lowercase();
        match cmd {
            b'F' => {
                even_odd = s.number()? == 0.0;
            }
            b'M' | b'm' => {
                current = offset(s.point()?, current, relative);
                start = current;
                path.move_to(current.x, current.y);
                while s.at_number() {
                    current = offset(s.point()?, current, relative);
                    path.line_to(current.x, current.y);
                }
            }
            b'L' | b'l' => loop {
                current = offset(s.point()?, current, relative);
                path.line_to(current.x, current.y);
                if !s.at_number() {
                    break;
                }
            },
            b'H' | b'h' => loop {
                let x = s.number()?;
                current = Point::new(if relative { current.x + x } else { x }, current.y);
                path.line_to(current.x, current.y);
                if !s.at_number() {
                    break;
                }
            },
            b'V' | b'v' => loop {
                let y = s.number()?;
                current = Point::new(current.x, if relative { current.y + y } else { y });
                path.line_to(current.x, current.y);
                if !s.at_number() {
                    break;
                }
            },
            b'C' | b'c' => loop {
                let p1 = offset(s.point()?, current, relative);
                let p2 = offset(s.point()?, current, relative);
                let p3 = offset(s.point()?, current, relative);
                path.curve_to(p1.x, p1.y, p2.x, p2.y, p3.x, p3.y);
                current = p3;
                if !s.at_number() {
                    break;
                }
            },
            b'Q' | b'q' => loop {
                let p1 = offset(s.point()?, current, relative);
                let p2 = offset(s.point()?, current, relative);
                path.quad_to(p1.x, p1.y, p2.x, p2.y);
                current = p2;
                if !s.at_number() {
                    break;
                }
            },
            b'Z' | b'z' => {
                path.close();
                current = start;
            }
            other => {
                s.pos -= 1;
                return Err(s.error(format!("unsupported command '{}'", char::from(other))));
            }
        }
    }
    Ok(Geometry { path, even_odd })
}

/// Parse a `RenderTransform` / `Matrix` value: six numbers
/// `m11,m12,m21,m22,dx,dy`.
///
/// # Errors
///
/// Returns [`XpsError::PathData`] unless exactly six numbers are present.
pub fn parse_matrix(value: &str) -> Result<Matrix> {
    let mut s = Scanner::new(value);
    let mut m = [0.0f32; 6];
    for slot in &mut m {
        *slot = s.number()?;
    }
    if s.peek().is_some() {
        return Err(s.error("trailing data after matrix"));
    }
    Ok(Matrix::new(m[0], m[1], m[2], m[3], m[4], m[5]))
}

/// Parse a `Viewport`/`Viewbox` value `x,y,w,h`.
///
/// # Errors
///
/// Returns [`XpsError::PathData`] unless four numbers are present.
pub fn parse_rect(value: &str) -> Result<(f32, f32, f32, f32)> {
    let mut s = Scanner::new(value);
    Ok((s.number()?, s.number()?, s.number()?, s.number()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_render::PathElement;

    #[test]
    fn test_absolute_and_implicit_lines() {
        let g = parse_path_data("M 0,0 10,0 10,10 Z").unwrap();
        assert!(g.even_odd);
        assert_eq!(
            g.path.elements(),
            &[
                PathElement::MoveTo(Point::new(0.0, 0.0)),
                PathElement::LineTo(Point::new(10.0, 0.0)),
                PathElement::LineTo(Point::new(10.0, 10.0)),
                PathElement::Close,
            ]
        );
    }

    #[test]
    fn test_relative_commands() {
        let g = parse_path_data("m5 5 h10 v10 h-10 z").unwrap();
        let b = g.path.bounds();
        assert_eq!((b.x0, b.y0, b.x1, b.y1), (5.0, 5.0, 15.0, 15.0));
    }

    #[test]
    fn test_curves_and_exponents() {
        let g = parse_path_data("F1M0,0C1,1 2,2 3,3Q4,4 5e1,-5E-1").unwrap();
        assert!(!g.even_odd);
        assert_eq!(g.path.current_point(), Some(Point::new(50.0, -0.5)));
    }

    #[test]
    fn test_errors() {
        assert!(matches!(
            parse_path_data("M 0,0 A 1,1 0 0 1 2,2"),
            Err(XpsError::PathData { offset: 6, .. })
        ));
        assert!(parse_path_data("M 0").is_err());
        assert!(parse_path_data("L x,y").is_err());
    }

    #[test]
    fn test_parse_matrix() {
        let m = parse_matrix("1,0,0,1,20.5,-3").unwrap();
        assert_eq!(m, Matrix::new(1.0, 0.0, 0.0, 1.0, 20.5, -3.0));
        assert!(parse_matrix("1,0,0,1").is_err());
        assert!(parse_matrix("1,0,0,1,0,0,9").is_err());
    }

    /// Property: relative and absolute spellings of a polyline produce the
    /// same end point
    #[test]
    fn proptest_relative_matches_absolute() {
        use proptest::prelude::*;
        proptest!(|(pts in proptest::collection::vec((-500i32..500, -500i32..500), 1..8))| {
            let abs: Vec<String> = pts.iter().map(|(x, y)| format!("{x},{y}")).collect();
            let mut rel = Vec::new();
            let mut prev = (0, 0);
            for &(x, y) in &pts {
                rel.push(format!("{},{}", x - prev.0, y - prev.1));
                prev = (x, y);
            }
            let a = parse_path_data(&format!("M {}", abs.join(" "))).unwrap();
            let r = parse_path_data(&format!("m {}", rel.join(" "))).unwrap();
            prop_assert_eq!(a.path.current_point(), r.path.current_point());
            prop_assert_eq!(a.path.elements().len(), pts.len());
        });
    }
}
