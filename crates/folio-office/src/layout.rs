//! Fixed-advance layout of office content into pages.
//!
//! Word processor documents flow into as many pages as their content needs;
//! each slide and each sheet fills exactly one page and anything past the
//! bottom edge is dropped.

use crate::content::{ContentNode, Slide};
use crate::sheet::Sheet;
use folio_core::{Matrix, Point, Rect};
use folio_render::{
    wrap_text, Color, Command, Device, Path, StrokeStyle, TextSpan, ASCENT_EM, CHAR_ADVANCE_EM,
};
use serde::{Deserialize, Serialize};

/// Page margin for text documents and sheets.
pub const MARGIN: f32 = 72.0;
/// Slide margin.
pub const SLIDE_MARGIN: f32 = 36.0;
pub const BODY_SIZE: f32 = 11.0;
pub const SLIDE_TITLE_SIZE: f32 = 32.0;
pub const SLIDE_BODY_SIZE: f32 = 18.0;
pub const SHEET_COLUMN_WIDTH: f32 = 72.0;
/// Line height as a multiple of the font size.
pub const LINE_SPACING: f32 = 1.2;
/// Height reserved for a picture, chart or drawing placeholder.
pub const OBJECT_BOX_HEIGHT: f32 = 144.0;

pub const BODY_FONT: &str = "sans-serif";

const LINK_COLOR: Color = Color::rgb(0.02, 0.27, 0.68);
const FRAME_COLOR: Color = Color::rgb(0.6, 0.6, 0.6);

/// One positioned element of a laid-out page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LayoutItem {
    /// A line of text; `origin` is the baseline start
    Text {
        text: String,
        size: f32,
        bold: bool,
        link: bool,
        origin: Point,
    },
    /// Framed placeholder for an embedded object
    Frame { rect: Rect, label: String },
}

/// One laid-out page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayoutPage {
    pub items: Vec<LayoutItem>,
}

impl LayoutPage {
    /// Plain text of the page, one line per text item.
    #[must_use = "returns the page text"]
    pub fn text(&self) -> String {
        self.items
            .iter()
            .filter_map(|item| match item {
                LayoutItem::Text { text, .. } => Some(text.as_str()),
                LayoutItem::Frame { .. } => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Emit the page's drawing commands.
    ///
    /// # Errors
    ///
    /// Returns the device's error.
    pub fn draw(&self, device: &mut dyn Device, ctm: &Matrix) -> folio_core::Result<()> {
        for item in &self.items {
            match item {
                LayoutItem::Text {
                    text,
                    size,
                    bold,
                    link,
                    origin,
                } => {
                    let font = if *bold { "sans-serif-bold" } else { BODY_FONT };
                    let color = if *link { LINK_COLOR } else { Color::BLACK };
                    device.draw(
                        &Command::FillText {
                            span: TextSpan::new(text.as_str(), font, *size, *origin),
                            color,
                        },
                        ctm,
                    )?;
                }
                LayoutItem::Frame { rect, label } => {
                    device.draw(
                        &Command::StrokePath {
                            path: Path::rect(rect),
                            stroke: StrokeStyle::with_width(1.0),
                            color: FRAME_COLOR,
                        },
                        ctm,
                    )?;
                    if !label.is_empty() {
                        let origin = Point::new(rect.x0 + 4.0, rect.y0 + 4.0 + BODY_SIZE * ASCENT_EM);
                        device.draw(
                            &Command::FillText {
                                span: TextSpan::new(label.as_str(), BODY_FONT, BODY_SIZE, origin),
                                color: FRAME_COLOR,
                            },
                            ctm,
                        )?;
                    }
                }
            }
        }
        Ok(())
    }
}

/// Font scale of a heading level.
#[must_use = "returns the heading scale"]
pub fn heading_scale(level: u8) -> f32 {
    match level {
        1 => 1.8,
        2 => 1.5,
        3 => 1.25,
        _ => 1.1,
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn chars_per_line(width: f32, size: f32) -> usize {
    (width / (size * CHAR_ADVANCE_EM)).floor().max(0.0) as usize
}

/// Placeholder label of an object node.
fn object_label(node: &ContentNode) -> Option<String> {
    match node {
        ContentNode::Image { source } => Some(format!("[image: {}]", short_name(source))),
        ContentNode::Chart { source } => Some(format!("[chart: {}]", short_name(source))),
        ContentNode::Drawing { name } if name.is_empty() => Some("[drawing]".to_string()),
        ContentNode::Drawing { name } => Some(format!("[drawing: {name}]")),
        _ => None,
    }
}

fn short_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Flow state of the text paginator.
struct Flow {
    pages: Vec<LayoutPage>,
    y: f32,
    top: f32,
    bottom: f32,
}

impl Flow {
    fn current_is_empty(&self) -> bool {
        self.pages.last().is_some_and(|p| p.items.is_empty())
    }

    fn new_page(&mut self) {
        self.pages.push(LayoutPage::default());
        self.y = self.top;
    }

    /// Start a new page unless `height` still fits or the page is empty.
    fn reserve(&mut self, height: f32) {
        if !self.current_is_empty() && self.y + height > self.bottom {
            self.new_page();
        }
    }

    fn push(&mut self, item: LayoutItem) {
        if let Some(page) = self.pages.last_mut() {
            page.items.push(item);
        }
    }
}

/// Lay out word processor content. Always returns at least one page.
///
/// An explicit page break starts a new page unless the current page is
/// still empty.
#[must_use = "returns the laid-out pages"]
pub fn paginate(nodes: &[ContentNode], width: f32, height: f32) -> Vec<LayoutPage> {
    let margin = MARGIN.min(width / 4.0).min(height / 4.0);
    let content_width = (width - 2.0 * margin).max(0.0);
    let mut flow = Flow {
        pages: vec![LayoutPage::default()],
        y: margin,
        top: margin,
        bottom: height - margin,
    };

    for node in nodes {
        if *node == ContentNode::PageBreak {
            if !flow.current_is_empty() {
                flow.new_page();
            }
            continue;
        }
        if let Some(label) = object_label(node) {
            let box_height = OBJECT_BOX_HEIGHT.min(flow.bottom - flow.top);
            flow.reserve(box_height);
            let rect = Rect::new(margin, flow.y, margin + content_width, flow.y + box_height);
            flow.push(LayoutItem::Frame { rect, label });
            flow.y += box_height + BODY_SIZE * 0.5;
            continue;
        }

        let (lines, size, bold, link) = match node {
            ContentNode::Heading { level, text } => {
                (vec![text.clone()], BODY_SIZE * heading_scale(*level), true, false)
            }
            ContentNode::Paragraph { runs, .. } => {
                let all_bold = !runs.is_empty() && runs.iter().all(|r| r.bold);
                (vec![node.text()], BODY_SIZE, all_bold, false)
            }
            ContentNode::Hyperlink { text, .. } => (vec![text.clone()], BODY_SIZE, false, true),
            ContentNode::Table { rows } => (
                rows.iter().map(|r| r.join(" | ")).collect(),
                BODY_SIZE,
                false,
                false,
            ),
            _ => continue,
        };

        let line_height = size * LINE_SPACING;
        let max_chars = chars_per_line(content_width, size);
        for source in lines {
            for segment in source.split('\n') {
                for text in wrap_text(segment, max_chars) {
                    flow.reserve(line_height);
                    let origin = Point::new(margin, flow.y + size * ASCENT_EM);
                    flow.push(LayoutItem::Text {
                        text,
                        size,
                        bold,
                        link,
                        origin,
                    });
                    flow.y += line_height;
                }
            }
        }
        flow.y += size * 0.5;
    }
    flow.pages
}

/// Lay out one slide: the title at the top, then the body. Content past the
/// bottom edge is dropped.
#[must_use = "returns the laid-out slide"]
pub fn layout_slide(slide: &Slide, width: f32, height: f32) -> LayoutPage {
    let margin = SLIDE_MARGIN.min(width / 4.0).min(height / 4.0);
    let content_width = (width - 2.0 * margin).max(0.0);
    let bottom = height - margin;
    let mut page = LayoutPage::default();
    let mut y = margin;

    let put = |page: &mut LayoutPage, text: String, size: f32, bold: bool, link: bool, y: &mut f32| {
        let line_height = size * LINE_SPACING;
        for segment in text.split('\n') {
            for line in wrap_text(segment, chars_per_line(content_width, size)) {
                if *y + line_height > bottom {
                    return;
                }
                page.items.push(LayoutItem::Text {
                    text: line,
                    size,
                    bold,
                    link,
                    origin: Point::new(margin, *y + size * ASCENT_EM),
                });
                *y += line_height;
            }
        }
    };

    if let Some(title) = &slide.title {
        put(&mut page, title.clone(), SLIDE_TITLE_SIZE, true, false, &mut y);
        y += SLIDE_TITLE_SIZE * 0.5;
    }
    for node in &slide.body {
        if let Some(label) = object_label(node) {
            let box_height = OBJECT_BOX_HEIGHT.min(bottom - y);
            if box_height > 0.0 {
                page.items.push(LayoutItem::Frame {
                    rect: Rect::new(margin, y, margin + content_width, y + box_height),
                    label,
                });
                y += box_height + SLIDE_BODY_SIZE * 0.5;
            }
            continue;
        }
        let link = matches!(node, ContentNode::Hyperlink { .. });
        put(&mut page, node.text(), SLIDE_BODY_SIZE, false, link, &mut y);
        y += SLIDE_BODY_SIZE * 0.3;
    }
    page
}

/// Lay out the used range of a sheet as a grid of fixed-width columns.
/// Cell text is cut to the column width; rows and columns past the page
/// edges are dropped.
#[must_use = "returns the laid-out sheet"]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
pub fn layout_sheet(sheet: &Sheet, width: f32, height: f32) -> LayoutPage {
    let margin = MARGIN.min(width / 4.0).min(height / 4.0);
    let line_height = BODY_SIZE * LINE_SPACING;
    let max_rows = ((height - 2.0 * margin) / line_height).floor().max(0.0) as u32;
    let max_cols = ((width - 2.0 * margin) / SHEET_COLUMN_WIDTH).floor().max(0.0) as u32;
    let cell_chars = chars_per_line(SHEET_COLUMN_WIDTH, BODY_SIZE).saturating_sub(1);

    let mut page = LayoutPage::default();
    for (row, col, value) in sheet.cells() {
        if row >= max_rows || col >= max_cols {
            continue;
        }
        let text: String = value.display().chars().take(cell_chars).collect();
        let text = text.trim_end();
        if text.is_empty() {
            continue;
        }
        let x = margin + col as f32 * SHEET_COLUMN_WIDTH;
        let y = margin + row as f32 * line_height;
        page.items.push(LayoutItem::Text {
            text: text.to_string(),
            size: BODY_SIZE,
            bold: false,
            link: false,
            origin: Point::new(x, y + BODY_SIZE * ASCENT_EM),
        });
    }
    page
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheet::CellValue;

    #[test]
    fn test_paginate_empty_has_one_page() {
        let pages = paginate(&[], 612.0, 792.0);
        assert_eq!(pages.len(), 1);
        assert!(pages[0].items.is_empty());
    }

    #[test]
    fn test_page_breaks() {
        let nodes = vec![
            ContentNode::PageBreak,
            ContentNode::paragraph("one"),
            ContentNode::PageBreak,
            ContentNode::PageBreak,
            ContentNode::paragraph("two"),
        ];
        let pages = paginate(&nodes, 612.0, 792.0);
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].text(), "one");
        assert_eq!(pages[1].text(), "two");
    }

    #[test]
    fn test_paginate_overflow() {
        // 468pt / 5.5pt = 85 chars per line; 648pt / 13.2pt = 49 lines per page
        let text = vec!["x".repeat(85); 60].join(" ");
        let pages = paginate(&[ContentNode::paragraph(text)], 612.0, 792.0);
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].items.len(), 49);
        assert_eq!(pages[1].items.len(), 11);
        let LayoutItem::Text { origin, .. } = &pages[0].items[0] else {
            panic!("expected text");
        };
        assert!((origin.x - 72.0).abs() < 1e-4);
        assert!((origin.y - (72.0 + 11.0 * ASCENT_EM)).abs() < 1e-4);
    }

    #[test]
    fn test_objects_become_frames() {
        let nodes = vec![ContentNode::Image {
            source: "word/media/image1.png".into(),
        }];
        let pages = paginate(&nodes, 612.0, 792.0);
        let LayoutItem::Frame { rect, label } = &pages[0].items[0] else {
            panic!("expected frame");
        };
        assert_eq!(label, "[image: image1.png]");
        assert!((rect.height() - OBJECT_BOX_HEIGHT).abs() < 1e-4);
    }

    #[test]
    fn test_layout_slide_and_sheet() {
        let slide = Slide {
            title: Some("Roadmap".into()),
            body: vec![ContentNode::paragraph("Ship it")],
        };
        let page = layout_slide(&slide, 720.0, 540.0);
        assert_eq!(page.text(), "Roadmap\nShip it");

        let mut sheet = Sheet::new("S");
        sheet.set(0, 0, CellValue::String("a very long cell value".into()));
        sheet.set(1, 1, CellValue::Number(2.0));
        sheet.set(0, 100, CellValue::Number(3.0));
        let page = layout_sheet(&sheet, 612.0, 792.0);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.text(), "a very long\n2");
    }
}
