//! Appearance stream construction.
//!
//! Appearances are recorded as display lists in page space, bounded by the
//! annotation rectangle, so regenerating one never touches the page content.

use folio_core::{Matrix, Point, Rect};
use folio_render::{wrap_text, Color, Command, DisplayList, Path, StrokeStyle, TextSpan, ASCENT_EM, CHAR_ADVANCE_EM};

/// Font recorded on appearance text.
pub const APPEARANCE_FONT: &str = "Helvetica";

/// Font size used when a field asks for auto sizing.
pub const AUTO_FONT_SIZE: f32 = 12.0;

/// Padding between a field border and its text.
const PADDING: f32 = 2.0;

// Cubic Bezier handle length for a quarter ellipse
const KAPPA: f32 = 0.552_284_8;

/// Horizontal placement of appearance text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TextAlign {
    Left,
    Center,
    Right,
}

/// Recorder for one appearance.
pub(crate) struct Builder {
    list: DisplayList,
}

impl Builder {
    pub(crate) const fn new(rect: Rect) -> Self {
        Self {
            list: DisplayList::new(rect),
        }
    }

    fn push(&mut self, command: Command) {
        self.list.push(command, Matrix::IDENTITY);
    }

    pub(crate) fn fill(&mut self, path: Path, color: Color) {
        self.push(Command::FillPath {
            path,
            even_odd: false,
            color,
        });
    }

    pub(crate) fn stroke(&mut self, path: Path, width: f32, color: Color) {
        if width > 0.0 {
            self.push(Command::StrokePath {
                path,
                stroke: StrokeStyle::with_width(width),
                color,
            });
        }
    }

    pub(crate) fn clip(&mut self, rect: &Rect) {
        self.push(Command::ClipPath {
            path: Path::rect(rect),
            even_odd: false,
        });
    }

    pub(crate) fn pop_clip(&mut self) {
        self.push(Command::PopClip);
    }

    /// Wrapped text inside `rect`, top-aligned. Lines past the bottom are
    /// dropped.
    pub(crate) fn text(&mut self, rect: &Rect, text: &str, size: f32, align: TextAlign, color: Color) {
        let line_height = size * 1.15;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let max_chars = (rect.width() / (size * CHAR_ADVANCE_EM)).floor().max(1.0) as usize;
        let mut y = rect.y0 + size * ASCENT_EM;
        for segment in text.split('\n') {
            for line in wrap_text(segment, max_chars) {
                if y > rect.y1 {
                    return;
                }
                let span = TextSpan::new(line, APPEARANCE_FONT, size, Point::new(rect.x0, y));
                let slack = (rect.width() - span.advance()).max(0.0);
                let x = match align {
                    TextAlign::Left => rect.x0,
                    TextAlign::Center => rect.x0 + slack / 2.0,
                    TextAlign::Right => rect.x0 + slack,
                };
                self.push(Command::FillText {
                    span: TextSpan {
                        origin: Point::new(x, y),
                        ..span
                    },
                    color,
                });
                y += line_height;
            }
        }
    }

    pub(crate) fn finish(self) -> DisplayList {
        self.list
    }
}

/// `rect` shrunk by `by` on every side, or `rect` itself when too small.
pub(crate) fn inset(rect: &Rect, by: f32) -> Rect {
    let r = Rect::new(rect.x0 + by, rect.y0 + by, rect.x1 - by, rect.y1 - by);
    if r.is_empty() {
        *rect
    } else {
        r
    }
}

/// Rect minus the standard text padding.
pub(crate) fn text_box(rect: &Rect, border: f32) -> Rect {
    inset(rect, border + PADDING)
}

pub(crate) fn line(x0: f32, y0: f32, x1: f32, y1: f32) -> Path {
    let mut path = Path::new();
    path.move_to(x0, y0);
    path.line_to(x1, y1);
    path
}

/// Ellipse inscribed in `r`.
pub(crate) fn ellipse(r: &Rect) -> Path {
    let (cx, cy) = ((r.x0 + r.x1) / 2.0, (r.y0 + r.y1) / 2.0);
    let (rx, ry) = (r.width() / 2.0, r.height() / 2.0);
    let (kx, ky) = (rx * KAPPA, ry * KAPPA);
    let mut path = Path::new();
    path.move_to(cx + rx, cy);
    path.curve_to(cx + rx, cy + ky, cx + kx, cy + ry, cx, cy + ry);
    path.curve_to(cx - kx, cy + ry, cx - rx, cy + ky, cx - rx, cy);
    path.curve_to(cx - rx, cy - ky, cx - kx, cy - ry, cx, cy - ry);
    path.curve_to(cx + kx, cy - ry, cx + rx, cy - ky, cx + rx, cy);
    path.close();
    path
}

/// Zigzag along the bottom edge of `r`.
pub(crate) fn squiggle(r: &Rect) -> Path {
    let step = (r.height() / 4.0).max(1.0);
    let mut path = Path::new();
    let mut x = r.x0;
    let mut up = false;
    path.move_to(x, r.y1);
    while x < r.x1 {
        x = (x + step).min(r.x1);
        path.line_to(x, if up { r.y1 } else { r.y1 - step });
        up = !up;
    }
    path
}

/// Check mark filling `r`.
pub(crate) fn check_mark(r: &Rect) -> Path {
    let mut path = Path::new();
    path.move_to(r.x0 + r.width() * 0.15, r.y0 + r.height() * 0.55);
    path.line_to(r.x0 + r.width() * 0.4, r.y0 + r.height() * 0.8);
    path.line_to(r.x0 + r.width() * 0.85, r.y0 + r.height() * 0.2);
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inset() {
        let r = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert_eq!(inset(&r, 2.0), Rect::new(2.0, 2.0, 8.0, 8.0));
        assert_eq!(inset(&r, 6.0), r);
    }

    #[test]
    fn test_ellipse_bounds() {
        let r = Rect::new(10.0, 20.0, 50.0, 40.0);
        let b = ellipse(&r).bounds();
        assert!((b.x0 - 10.0).abs() < 1e-4 && (b.x1 - 50.0).abs() < 1e-4);
        assert!((b.y0 - 20.0).abs() < 1e-4 && (b.y1 - 40.0).abs() < 1e-4);
    }

    #[test]
    fn test_text_clipped_to_box() {
        let mut b = Builder::new(Rect::new(0.0, 0.0, 60.0, 20.0));
        b.text(
            &Rect::new(0.0, 0.0, 60.0, 20.0),
            "one two three four five six seven",
            10.0,
            TextAlign::Left,
            Color::BLACK,
        );
        let list = b.finish();
        // 12 chars per line, two lines fit in 20pt
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_text_alignment() {
        let rect = Rect::new(0.0, 0.0, 100.0, 20.0);
        let mut b = Builder::new(rect);
        b.text(&rect, "abcd", 10.0, TextAlign::Right, Color::BLACK);
        let list = b.finish();
        let Command::FillText { span, .. } = &list.items()[0].command else {
            panic!("expected text");
        };
        assert!((span.origin.x - 80.0).abs() < 1e-4);
    }
}
