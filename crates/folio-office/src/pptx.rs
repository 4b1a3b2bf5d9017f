//! PresentationML reader: slide order, slide size and slide content.

use crate::content::{finish_paragraph, Alignment, ContentNode, Run, Slide};
use crate::error::Result;
use crate::package::{
    attr, local_attr, main_part, optional_text, part_rels, required_text, EMU_PER_POINT,
};
use folio_archive::{Archive, Relationship};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;

pub(crate) const DEFAULT_MAIN_PART: &str = "ppt/presentation.xml";

/// Parsed presentation.
#[derive(Debug, Default)]
pub(crate) struct PptxContent {
    pub slides: Vec<Slide>,
    /// `(width, height)` in points from `p:sldSz`
    pub slide_size: Option<(f32, f32)>,
}

/// Parse the presentation and every slide in `p:sldIdLst` order.
///
/// # Errors
///
/// Returns an error if `presentation.xml` is missing or any XML is
/// malformed. Slides whose part is missing are skipped with a warning.
pub(crate) fn parse(archive: &Archive) -> Result<PptxContent> {
    let main = main_part(archive, DEFAULT_MAIN_PART)?;
    let xml = required_text(archive, &main)?;
    let rels = part_rels(archive, &main)?;
    let (slide_ids, slide_size) = parse_presentation(xml)?;

    let mut slides = Vec::with_capacity(slide_ids.len());
    for id in slide_ids {
        let Some(rel) = rels.iter().find(|r| r.id == id && !r.external) else {
            log::warn!("Slide relationship {id} not found in {main}");
            continue;
        };
        let Some(slide_xml) = optional_text(archive, &rel.target) else {
            log::warn!("Slide part {} is missing", rel.target);
            continue;
        };
        let slide_rels = part_rels(archive, &rel.target)?;
        slides.push(parse_slide(slide_xml, &slide_rels)?);
    }
    Ok(PptxContent { slides, slide_size })
}

/// Slide relationship ids in presentation order and the slide size.
fn parse_presentation(xml: &str) -> Result<(Vec<String>, Option<(f32, f32)>)> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut ids = Vec::new();
    let mut size = None;
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) => match e.name().as_ref() {
                b"p:sldId" => {
                    if let Some(id) = attr(&e, b"r:id") {
                        ids.push(id);
                    }
                }
                b"p:sldSz" => {
                    let emu = |key: &[u8]| attr(&e, key).and_then(|v| v.parse::<f32>().ok());
                    if let (Some(cx), Some(cy)) = (emu(b"cx"), emu(b"cy")) {
                        if cx > 0.0 && cy > 0.0 {
                            size = Some((cx / EMU_PER_POINT, cy / EMU_PER_POINT));
                        }
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok((ids, size))
}

/// Parse one slide part. The first title or centered-title placeholder
/// gives the title; other shapes, tables and pictures form the body.
///
/// # Errors
///
/// Returns an error if the XML is malformed.
pub(crate) fn parse_slide(xml: &str, rels: &[Relationship]) -> Result<Slide> {
    let relationships: HashMap<&str, &Relationship> =
        rels.iter().map(|r| (r.id.as_str(), r)).collect();
    let mut state = SlideWalkState::new(&relationships);
    let mut reader = Reader::from_str(xml);
    reader.trim_text(false);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => state.handle_start(&e),
            Event::Empty(e) => state.handle_empty(&e),
            Event::Text(t) if state.in_text => state.push_text(&t.unescape()?),
            Event::End(e) => state.handle_end(e.name().as_ref()),
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(state.slide)
}

#[allow(clippy::struct_excessive_bools)]
struct SlideWalkState<'a> {
    relationships: &'a HashMap<&'a str, &'a Relationship>,
    slide: Slide,

    in_shape: bool,
    in_title_placeholder: bool,
    in_paragraph: bool,
    in_run: bool,
    in_text: bool,
    in_table: bool,
    in_cell: bool,

    paragraphs: Vec<(Vec<Run>, Alignment)>,
    runs: Vec<Run>,
    run: Run,
    alignment: Alignment,

    rows: Vec<Vec<String>>,
    row: Vec<String>,
    cell: String,
}

impl<'a> SlideWalkState<'a> {
    fn new(relationships: &'a HashMap<&'a str, &'a Relationship>) -> Self {
        Self {
            relationships,
            slide: Slide::default(),
            in_shape: false,
            in_title_placeholder: false,
            in_paragraph: false,
            in_run: false,
            in_text: false,
            in_table: false,
            in_cell: false,
            paragraphs: Vec::new(),
            runs: Vec::new(),
            run: Run::default(),
            alignment: Alignment::Left,
            rows: Vec::new(),
            row: Vec::new(),
            cell: String::new(),
        }
    }

    fn target(&self, e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
        attr(e, key)
            .and_then(|id| self.relationships.get(id.as_str()))
            .map(|r| r.target.clone())
    }

    fn handle_start(&mut self, e: &BytesStart<'_>) {
        match e.name().as_ref() {
            b"p:sp" => {
                self.in_shape = true;
                self.in_title_placeholder = false;
                self.paragraphs.clear();
            }
            b"a:tbl" => {
                self.in_table = true;
                self.rows.clear();
            }
            b"a:tr" if self.in_table => self.row.clear(),
            b"a:tc" if self.in_table => {
                self.in_cell = true;
                self.cell.clear();
            }
            b"a:p" if self.in_shape || self.in_cell => {
                self.in_paragraph = true;
                self.runs.clear();
                self.alignment = Alignment::Left;
                self.apply_paragraph_props(e);
            }
            b"a:pPr" if self.in_paragraph => self.apply_paragraph_props(e),
            b"a:r" | b"a:fld" if self.in_paragraph => {
                self.in_run = true;
                self.run = Run::default();
            }
            b"a:rPr" if self.in_run => self.apply_run_props(e),
            b"a:t" if self.in_run => self.in_text = true,
            _ => self.handle_empty(e),
        }
    }

    fn handle_empty(&mut self, e: &BytesStart<'_>) {
        match e.name().as_ref() {
            b"p:ph" if self.in_shape => {
                if matches!(attr(e, b"type").as_deref(), Some("title" | "ctrTitle")) {
                    self.in_title_placeholder = true;
                }
            }
            b"a:pPr" if self.in_paragraph => self.apply_paragraph_props(e),
            b"a:rPr" if self.in_run => self.apply_run_props(e),
            b"a:hlinkClick" if self.in_run => {
                self.run.link = self.target(e, b"r:id");
            }
            b"a:br" if self.in_paragraph => self.runs.push(Run::plain("\n")),
            b"a:blip" if !self.in_shape => {
                if let Some(source) = self.target(e, b"r:embed") {
                    self.slide.body.push(ContentNode::Image { source });
                }
            }
            b"c:chart" => {
                if let Some(source) = self.target(e, b"r:id") {
                    self.slide.body.push(ContentNode::Chart { source });
                }
            }
            _ => {}
        }
    }

    fn handle_end(&mut self, name: &[u8]) {
        match name {
            b"a:t" => self.in_text = false,
            b"a:r" | b"a:fld" if self.in_run => {
                let run = std::mem::take(&mut self.run);
                self.runs.push(run);
                self.in_run = false;
            }
            b"a:p" if self.in_paragraph => {
                let runs = std::mem::take(&mut self.runs);
                if self.in_cell {
                    let text: String = runs.iter().map(|r| r.text.as_str()).collect();
                    let text = text.trim();
                    if !text.is_empty() {
                        if !self.cell.is_empty() {
                            self.cell.push(' ');
                        }
                        self.cell.push_str(text);
                    }
                } else {
                    self.paragraphs.push((runs, self.alignment));
                }
                self.in_paragraph = false;
            }
            b"a:tc" if self.in_cell => {
                let cell = std::mem::take(&mut self.cell);
                self.row.push(cell);
                self.in_cell = false;
            }
            b"a:tr" if self.in_table => {
                let row = std::mem::take(&mut self.row);
                self.rows.push(row);
            }
            b"a:tbl" if self.in_table => {
                let rows = std::mem::take(&mut self.rows);
                if !rows.is_empty() {
                    self.slide.body.push(ContentNode::Table { rows });
                }
                self.in_table = false;
            }
            b"p:sp" if self.in_shape => {
                self.finish_shape();
                self.in_shape = false;
            }
            _ => {}
        }
    }

    fn apply_paragraph_props(&mut self, e: &BytesStart<'_>) {
        if let Some(algn) = local_attr(e, b"algn") {
            self.alignment = match algn.as_str() {
                "ctr" => Alignment::Center,
                "r" => Alignment::Right,
                "just" | "dist" => Alignment::Justify,
                _ => Alignment::Left,
            };
        }
    }

    fn apply_run_props(&mut self, e: &BytesStart<'_>) {
        let on = |key: &[u8]| matches!(attr(e, key).as_deref(), Some("1" | "true"));
        self.run.bold = on(b"b");
        self.run.italic = on(b"i");
    }

    fn push_text(&mut self, text: &str) {
        if self.in_run {
            self.run.text.push_str(text);
        }
    }

    fn finish_shape(&mut self) {
        let paragraphs = std::mem::take(&mut self.paragraphs);
        if self.in_title_placeholder && self.slide.title.is_none() {
            let title = paragraphs
                .iter()
                .map(|(runs, _)| runs.iter().map(|r| r.text.as_str()).collect::<String>())
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect::<Vec<_>>()
                .join(" ");
            if !title.is_empty() {
                self.slide.title = Some(title);
                return;
            }
        }
        for (runs, alignment) in paragraphs {
            self.slide.body.extend(finish_paragraph(runs, alignment));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SLIDE: &str = r#"<p:sld xmlns:p="p" xmlns:a="a" xmlns:r="r"><p:cSld><p:spTree>
        <p:sp><p:nvSpPr><p:nvPr><p:ph type="title"/></p:nvPr></p:nvSpPr>
            <p:txBody><a:p><a:r><a:t>Quarterly</a:t></a:r><a:r><a:t> Review</a:t></a:r></a:p></p:txBody></p:sp>
        <p:sp><p:txBody>
            <a:p><a:pPr algn="ctr"/><a:r><a:rPr b="1"/><a:t>Revenue up</a:t></a:r></a:p>
            <a:p><a:r><a:rPr><a:hlinkClick r:id="rId2"/></a:rPr><a:t>details</a:t></a:r></a:p>
        </p:txBody></p:sp>
        <p:graphicFrame><a:graphic><a:graphicData><a:tbl>
            <a:tr><a:tc><a:txBody><a:p><a:r><a:t>Q1</a:t></a:r></a:p></a:txBody></a:tc>
                  <a:tc><a:txBody><a:p><a:r><a:t>10</a:t></a:r></a:p></a:txBody></a:tc></a:tr>
        </a:tbl></a:graphicData></a:graphic></p:graphicFrame>
        <p:pic><p:blipFill><a:blip r:embed="rId3"/></p:blipFill></p:pic>
    </p:spTree></p:cSld></p:sld>"#;

    #[test]
    fn test_parse_slide() {
        let rels = vec![
            Relationship {
                id: "rId2".into(),
                rel_type: "http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink".into(),
                target: "https://example.com/q".into(),
                external: true,
            },
            Relationship {
                id: "rId3".into(),
                rel_type: "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image".into(),
                target: "ppt/media/image1.png".into(),
                external: false,
            },
        ];
        let slide = parse_slide(SLIDE, &rels).unwrap();
        assert_eq!(slide.title.as_deref(), Some("Quarterly Review"));
        assert_eq!(slide.body.len(), 4);
        let ContentNode::Paragraph { runs, alignment } = &slide.body[0] else {
            panic!("expected paragraph, got {:?}", slide.body[0]);
        };
        assert!(runs[0].bold);
        assert_eq!(*alignment, Alignment::Center);
        assert_eq!(
            slide.body[1],
            ContentNode::Hyperlink {
                text: "details".into(),
                target: "https://example.com/q".into()
            }
        );
        assert_eq!(slide.body[2].text(), "Q1 | 10");
        assert_eq!(
            slide.body[3],
            ContentNode::Image {
                source: "ppt/media/image1.png".into()
            }
        );
    }

    #[test]
    fn test_parse_presentation() {
        let xml = r#"<p:presentation xmlns:p="p" xmlns:r="r">
            <p:sldIdLst><p:sldId id="257" r:id="rId3"/><p:sldId id="256" r:id="rId2"/></p:sldIdLst>
            <p:sldSz cx="9144000" cy="6858000"/></p:presentation>"#;
        let (ids, size) = parse_presentation(xml).unwrap();
        assert_eq!(ids, ["rId3", "rId2"]);
        assert_eq!(size, Some((720.0, 540.0)));
    }
}
