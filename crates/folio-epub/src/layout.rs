//! Reflow of XHTML chapters into fixed-size pages.
//!
//! Text is pulled out of block elements and wrapped with a fixed advance per
//! character, so page breaks depend only on character counts and the layout
//! box. There is no font shaping.

use folio_core::Point;
use folio_render::{wrap_text, ASCENT_EM, CHAR_ADVANCE_EM};
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::{Deserialize, Serialize};

/// Line height as a multiple of the font size.
pub const LINE_SPACING: f32 = 1.2;

/// Page box and base font size for reflow.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpubLayout {
    pub width: f32,
    pub height: f32,
    /// Body font size; also the page margin
    pub em: f32,
}

impl Default for EpubLayout {
    fn default() -> Self {
        Self {
            width: 450.0,
            height: 600.0,
            em: 12.0,
        }
    }
}

impl EpubLayout {
    #[must_use = "returns whether the layout can hold text"]
    pub fn is_valid(&self) -> bool {
        self.width.is_finite()
            && self.height.is_finite()
            && self.em.is_finite()
            && self.em > 0.0
            && self.width > 2.0 * self.em
            && self.height > 2.0 * self.em
    }
}

/// A run of text from one block element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    pub text: String,
    /// Font size relative to the body size
    pub scale: f32,
}

/// One positioned line. `origin` is the baseline start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutLine {
    pub text: String,
    pub size: f32,
    pub origin: Point,
}

/// One laid-out page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayoutPage {
    /// Spine index of the chapter the page belongs to
    pub spine_index: usize,
    pub lines: Vec<LayoutLine>,
}

const SKIPPED: &[&[u8]] = &[b"head", b"script", b"style", b"title"];

const BLOCKS: &[&[u8]] = &[
    b"p", b"div", b"li", b"blockquote", b"pre", b"section", b"article", b"aside", b"header",
    b"footer", b"tr", b"dt", b"dd", b"figcaption", b"td", b"th", b"br", b"hr", b"body", b"table",
    b"ul", b"ol", b"nav",
];

fn heading_scale(name: &[u8]) -> Option<f32> {
    match name {
        b"h1" => Some(2.0),
        b"h2" => Some(1.5),
        b"h3" => Some(1.17),
        b"h4" | b"h5" | b"h6" => Some(1.0),
        _ => None,
    }
}

struct BlockCollector {
    blocks: Vec<TextBlock>,
    current: String,
    scale: f32,
}

impl BlockCollector {
    fn flush(&mut self) {
        let text = self.current.split_whitespace().collect::<Vec<_>>().join(" ");
        if !text.is_empty() {
            self.blocks.push(TextBlock {
                text,
                scale: self.scale,
            });
        }
        self.current.clear();
        self.scale = 1.0;
    }

    fn boundary(&mut self, name: &[u8]) {
        if let Some(scale) = heading_scale(name) {
            self.flush();
            self.scale = scale;
        } else if BLOCKS.contains(&name) {
            self.flush();
        }
    }
}

/// Extract text blocks from an XHTML chapter.
///
/// Content of `head`, `script` and `style` is skipped; block elements end the
/// current block; whitespace collapses. A parse error keeps what was read.
#[must_use = "returns the extracted blocks"]
pub fn extract_blocks(xhtml: &str) -> Vec<TextBlock> {
    let mut reader = Reader::from_str(xhtml);
    reader.check_end_names(false);

    let mut out = BlockCollector {
        blocks: Vec::new(),
        current: String::new(),
        scale: 1.0,
    };
    let mut skip_depth = 0usize;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let name = e.local_name();
                if skip_depth > 0 || SKIPPED.contains(&name.as_ref()) {
                    skip_depth += 1;
                } else {
                    out.boundary(name.as_ref());
                }
            }
            Ok(Event::Empty(e)) => {
                if skip_depth == 0 {
                    out.boundary(e.local_name().as_ref());
                }
            }
            Ok(Event::End(e)) => {
                if skip_depth > 0 {
                    skip_depth -= 1;
                } else {
                    out.boundary(e.local_name().as_ref());
                }
            }
            Ok(Event::Text(e)) if skip_depth == 0 => match e.unescape() {
                Ok(text) => out.current.push_str(&text),
                Err(err) => {
                    // HTML named entities are not XML; keep the raw text
                    log::trace!("Keeping raw text: {err}");
                    out.current.push_str(&String::from_utf8_lossy(&e));
                }
            },
            Ok(Event::CData(e)) if skip_depth == 0 => {
                out.current.push_str(&String::from_utf8_lossy(&e));
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                log::warn!("XHTML parse error at {}: {e}", reader.buffer_position());
                break;
            }
            _ => {}
        }
        buf.clear();
    }
    out.flush();
    out.blocks
}

/// Lay out one chapter's blocks. Always returns at least one page.
#[must_use = "returns the laid-out pages"]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn paginate(blocks: &[TextBlock], layout: &EpubLayout, spine_index: usize) -> Vec<LayoutPage> {
    let margin = layout.em;
    let bottom = layout.height - margin;
    let content_width = (layout.width - 2.0 * margin).max(0.0);

    let mut pages = vec![LayoutPage {
        spine_index,
        lines: Vec::new(),
    }];
    let mut y = margin;

    for block in blocks {
        let size = layout.em * block.scale;
        let line_height = size * LINE_SPACING;
        let max_chars = (content_width / (size * CHAR_ADVANCE_EM)).floor() as usize;
        for text in wrap_text(&block.text, max_chars) {
            let has_lines = pages.last().is_some_and(|p| !p.lines.is_empty());
            if has_lines && y + line_height > bottom {
                pages.push(LayoutPage {
                    spine_index,
                    lines: Vec::new(),
                });
                y = margin;
            }
            let origin = Point::new(margin, y + size * ASCENT_EM);
            if let Some(page) = pages.last_mut() {
                page.lines.push(LayoutLine { text, size, origin });
            }
            y += line_height;
        }
    }
    pages
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_blocks() {
        let xhtml = r#"<?xml version="1.0"?>
<html xmlns="http://www.w3.org/1999/xhtml">
<head><title>Ignored</title><style>p { color: red }</style></head>
<body>
  <h1>Chapter  One</h1>
  <p>First <em>para</em>graph &amp; more.</p>
  <script>var x = 1;</script>
  <div>Second<br/>line</div>
</body></html>"#;
        let blocks = extract_blocks(xhtml);
        let texts: Vec<&str> = blocks.iter().map(|b| b.text.as_str()).collect();
        assert_eq!(
            texts,
            ["Chapter One", "First paragraph & more.", "Second", "line"]
        );
        assert!((blocks[0].scale - 2.0).abs() < f32::EPSILON);
        assert!((blocks[1].scale - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_paginate_empty_chapter_has_one_page() {
        let pages = paginate(&[], &EpubLayout::default(), 3);
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].spine_index, 3);
        assert!(pages[0].lines.is_empty());
    }

    #[test]
    fn test_paginate_breaks_pages() {
        // margin 10: 430 / 5 = 86 chars per line, (600 - 20) / 12 = 48 lines per page
        let layout = EpubLayout {
            width: 450.0,
            height: 600.0,
            em: 10.0,
        };
        let block = TextBlock {
            text: vec!["x".repeat(86); 100].join(" "),
            scale: 1.0,
        };
        let pages = paginate(&[block], &layout, 0);
        assert_eq!(pages.len(), 3);
        assert_eq!(pages[0].lines.len(), 48);
        assert_eq!(pages[2].lines.len(), 4);
        let first = &pages[0].lines[0];
        assert!((first.origin.x - 10.0).abs() < 1e-4);
        assert!((first.origin.y - 18.0).abs() < 1e-4);
    }

    #[test]
    fn test_layout_validity() {
        assert!(EpubLayout::default().is_valid());
        assert!(!EpubLayout { width: 20.0, height: 600.0, em: 12.0 }.is_valid());
        assert!(!EpubLayout { width: 450.0, height: f32::NAN, em: 12.0 }.is_valid());
    }
}
