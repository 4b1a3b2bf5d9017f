//! WordprocessingML reader: `word/document.xml` into the content tree.

use crate::content::{finish_paragraph, Alignment, ContentNode, Run};
use crate::error::Result;
use crate::package::{
    attr, main_part, optional_text, part_rels, rel_by_type, required_text, toggle_off,
    type_matches, TWIPS_PER_POINT,
};
use folio_archive::{Archive, Relationship};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;

pub(crate) const DEFAULT_MAIN_PART: &str = "word/document.xml";

/// Parsed body of a DOCX package.
#[derive(Debug, Default)]
pub(crate) struct DocxContent {
    pub nodes: Vec<ContentNode>,
    /// `(width, height)` in points from the last `w:sectPr/w:pgSz`
    pub page_size: Option<(f32, f32)>,
}

/// Parse the main document part of `archive`.
///
/// # Errors
///
/// Returns an error if the main part is missing or any XML is malformed.
pub(crate) fn parse(archive: &Archive) -> Result<DocxContent> {
    let main = main_part(archive, DEFAULT_MAIN_PART)?;
    let xml = required_text(archive, &main)?;
    let rels = part_rels(archive, &main)?;

    let styles_part = rel_by_type(&rels, "styles")
        .map_or_else(|| "word/styles.xml".to_string(), |r| r.target.clone());
    let headings = match optional_text(archive, &styles_part) {
        Some(styles) => parse_heading_styles(styles)?,
        None => HashMap::new(),
    };
    let relationships: HashMap<&str, &Relationship> =
        rels.iter().map(|r| (r.id.as_str(), r)).collect();

    let mut state = WalkBodyState::new(&headings, &relationships);
    let mut reader = Reader::from_str(xml);
    reader.trim_text(false);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => state.handle_start(&e),
            Event::Empty(e) => state.handle_empty(&e),
            Event::Text(t) => {
                if state.in_text {
                    state.push_text(&t.unescape()?);
                }
            }
            Event::End(e) => state.handle_end(e.name().as_ref()),
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    log::debug!("Parsed {} content nodes from {main}", state.nodes.len());
    Ok(DocxContent {
        nodes: state.nodes,
        page_size: state.page_size,
    })
}

/// Heading level of each paragraph style: `w:outlineLvl` + 1, or the
/// number in a `heading N` style name. `Title` counts as level 1.
///
/// # Errors
///
/// Returns an error if the XML is malformed.
pub(crate) fn parse_heading_styles(xml: &str) -> Result<HashMap<String, u8>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut levels = HashMap::new();
    let mut style_id: Option<String> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.name().as_ref() == b"w:style" => {
                style_id = attr(&e, b"w:styleId");
            }
            Event::Start(e) | Event::Empty(e) => {
                let Some(id) = style_id.as_ref() else {
                    buf.clear();
                    continue;
                };
                match e.name().as_ref() {
                    b"w:name" => {
                        if let Some(level) = attr(&e, b"w:val").and_then(|n| level_from_name(&n)) {
                            levels.entry(id.clone()).or_insert(level);
                        }
                    }
                    b"w:outlineLvl" => {
                        if let Some(level) = attr(&e, b"w:val")
                            .and_then(|v| v.parse::<u8>().ok())
                            .filter(|l| *l < 9)
                        {
                            levels.insert(id.clone(), level + 1);
                        }
                    }
                    _ => {}
                }
            }
            Event::End(e) if e.name().as_ref() == b"w:style" => style_id = None,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(levels)
}

fn level_from_name(name: &str) -> Option<u8> {
    let lower = name.to_ascii_lowercase();
    if lower == "title" {
        return Some(1);
    }
    lower
        .strip_prefix("heading")?
        .trim()
        .parse::<u8>()
        .ok()
        .filter(|l| (1..=9).contains(l))
}

// ========================================================================
// WalkBodyState
// ========================================================================

/// Parser state while walking `w:body`.
#[allow(clippy::struct_excessive_bools)]
struct WalkBodyState<'a> {
    headings: &'a HashMap<String, u8>,
    relationships: &'a HashMap<&'a str, &'a Relationship>,

    nodes: Vec<ContentNode>,
    page_size: Option<(f32, f32)>,

    in_body: bool,
    in_paragraph: bool,
    in_paragraph_props: bool,
    in_run: bool,
    in_run_props: bool,
    in_text: bool,
    in_drawing: bool,

    // Current paragraph
    runs: Vec<Run>,
    run: Run,
    alignment: Alignment,
    heading_level: Option<u8>,
    link: Option<String>,
    objects: Vec<ContentNode>,
    drawing_name: String,
    drawing_found: bool,

    // Tables; nested tables fold into the outer cell
    table_depth: usize,
    rows: Vec<Vec<String>>,
    row: Vec<String>,
    cell: String,
}

impl<'a> WalkBodyState<'a> {
    fn new(
        headings: &'a HashMap<String, u8>,
        relationships: &'a HashMap<&'a str, &'a Relationship>,
    ) -> Self {
        Self {
            headings,
            relationships,
            nodes: Vec::new(),
            page_size: None,
            in_body: false,
            in_paragraph: false,
            in_paragraph_props: false,
            in_run: false,
            in_run_props: false,
            in_text: false,
            in_drawing: false,
            runs: Vec::new(),
            run: Run::default(),
            alignment: Alignment::Left,
            heading_level: None,
            link: None,
            objects: Vec::new(),
            drawing_name: String::new(),
            drawing_found: false,
            table_depth: 0,
            rows: Vec::new(),
            row: Vec::new(),
            cell: String::new(),
        }
    }

    fn handle_start(&mut self, e: &BytesStart<'_>) {
        match e.name().as_ref() {
            b"w:body" => self.in_body = true,
            b"w:tbl" if self.in_body => {
                if self.table_depth == 0 {
                    self.finish_paragraph();
                    self.rows.clear();
                }
                self.table_depth += 1;
            }
            b"w:tr" if self.table_depth == 1 => self.row.clear(),
            b"w:tc" if self.table_depth == 1 => self.cell.clear(),
            b"w:p" if self.in_body => self.start_paragraph(),
            b"w:pPr" if self.in_paragraph => self.in_paragraph_props = true,
            b"w:r" if self.in_paragraph => {
                self.in_run = true;
                self.run = Run {
                    link: self.link.clone(),
                    ..Run::default()
                };
            }
            b"w:rPr" if self.in_run => self.in_run_props = true,
            b"w:t" if self.in_run && !self.in_drawing => self.in_text = true,
            b"w:hyperlink" if self.in_paragraph => self.link = self.hyperlink_target(e),
            b"w:drawing" | b"w:pict" if self.in_run => {
                self.in_drawing = true;
                self.drawing_name.clear();
                self.drawing_found = false;
            }
            b"w:sectPr" => {}
            _ => self.handle_empty(e),
        }
    }

    fn handle_empty(&mut self, e: &BytesStart<'_>) {
        match e.name().as_ref() {
            b"w:p" if self.in_body => {
                self.start_paragraph();
                self.finish_paragraph();
            }
            b"w:pStyle" if self.in_paragraph_props => {
                if let Some(level) = attr(e, b"w:val").and_then(|s| self.headings.get(&s)) {
                    self.heading_level = Some(*level);
                }
            }
            b"w:outlineLvl" if self.in_paragraph_props => {
                if let Some(level) = attr(e, b"w:val")
                    .and_then(|v| v.parse::<u8>().ok())
                    .filter(|l| *l < 9)
                {
                    self.heading_level = Some(level + 1);
                }
            }
            b"w:jc" if self.in_paragraph_props => {
                if let Some(value) = attr(e, b"w:val") {
                    self.alignment = Alignment::from_attr(&value);
                }
            }
            b"w:pageBreakBefore" if self.in_paragraph_props && !toggle_off(e) => {
                if self.table_depth == 0 {
                    self.nodes.push(ContentNode::PageBreak);
                }
            }
            b"w:b" if self.in_run_props => self.run.bold = !toggle_off(e),
            b"w:i" if self.in_run_props => self.run.italic = !toggle_off(e),
            b"w:tab" if self.in_run && !self.in_paragraph_props => self.push_text("\t"),
            b"w:br" | b"w:cr" if self.in_run => {
                if attr(e, b"w:type").as_deref() == Some("page") {
                    self.page_break();
                } else {
                    self.push_text("\n");
                }
            }
            b"wp:docPr" if self.in_drawing => {
                if let Some(name) = attr(e, b"name") {
                    self.drawing_name = name;
                }
            }
            b"a:blip" if self.in_drawing => {
                if let Some(rel) = attr(e, b"r:embed").and_then(|id| self.relationships.get(id.as_str())) {
                    self.objects.push(ContentNode::Image {
                        source: rel.target.clone(),
                    });
                    self.drawing_found = true;
                }
            }
            b"v:imagedata" if self.in_drawing => {
                if let Some(rel) = attr(e, b"r:id").and_then(|id| self.relationships.get(id.as_str())) {
                    self.objects.push(ContentNode::Image {
                        source: rel.target.clone(),
                    });
                    self.drawing_found = true;
                }
            }
            b"c:chart" if self.in_drawing => {
                if let Some(rel) = attr(e, b"r:id").and_then(|id| self.relationships.get(id.as_str())) {
                    self.objects.push(ContentNode::Chart {
                        source: rel.target.clone(),
                    });
                    self.drawing_found = true;
                }
            }
            b"w:pgSz" => {
                let twips = |key: &[u8]| attr(e, key).and_then(|v| v.parse::<f32>().ok());
                if let (Some(w), Some(h)) = (twips(b"w:w"), twips(b"w:h")) {
                    if w > 0.0 && h > 0.0 {
                        self.page_size = Some((w / TWIPS_PER_POINT, h / TWIPS_PER_POINT));
                    }
                }
            }
            _ => {}
        }
    }

    fn handle_end(&mut self, name: &[u8]) {
        match name {
            b"w:body" => {
                self.finish_paragraph();
                self.in_body = false;
            }
            b"w:tbl" if self.table_depth > 0 => {
                self.table_depth -= 1;
                if self.table_depth == 0 {
                    let rows = std::mem::take(&mut self.rows);
                    if rows.iter().any(|r| r.iter().any(|c| !c.is_empty())) {
                        self.nodes.push(ContentNode::Table { rows });
                    }
                }
            }
            b"w:tr" if self.table_depth == 1 => {
                let row = std::mem::take(&mut self.row);
                self.rows.push(row);
            }
            b"w:tc" if self.table_depth == 1 => {
                let cell = std::mem::take(&mut self.cell);
                self.row.push(cell.trim().to_string());
            }
            b"w:p" if self.in_paragraph => self.finish_paragraph(),
            b"w:pPr" => self.in_paragraph_props = false,
            b"w:r" if self.in_run => {
                let run = std::mem::take(&mut self.run);
                self.runs.push(run);
                self.in_run = false;
            }
            b"w:rPr" => self.in_run_props = false,
            b"w:t" => self.in_text = false,
            b"w:hyperlink" => self.link = None,
            b"w:drawing" | b"w:pict" if self.in_drawing => {
                if !self.drawing_found {
                    self.objects.push(ContentNode::Drawing {
                        name: std::mem::take(&mut self.drawing_name),
                    });
                }
                self.in_drawing = false;
            }
            _ => {}
        }
    }

    fn start_paragraph(&mut self) {
        self.in_paragraph = true;
        self.runs.clear();
        self.alignment = Alignment::Left;
        self.heading_level = None;
        self.link = None;
    }

    fn push_text(&mut self, text: &str) {
        if self.in_run {
            self.run.text.push_str(text);
        }
    }

    fn hyperlink_target(&self, e: &BytesStart<'_>) -> Option<String> {
        if let Some(rel) = attr(e, b"r:id").and_then(|id| self.relationships.get(id.as_str())) {
            if type_matches(&rel.rel_type, "hyperlink") || rel.external {
                return Some(rel.target.clone());
            }
        }
        attr(e, b"w:anchor").map(|a| format!("#{a}"))
    }

    /// Split the paragraph at a page break.
    fn page_break(&mut self) {
        if self.table_depth > 0 {
            self.push_text("\n");
            return;
        }
        let current = std::mem::take(&mut self.run);
        let mut runs = std::mem::take(&mut self.runs);
        runs.push(current.clone());
        self.emit_paragraph(runs);
        self.nodes.push(ContentNode::PageBreak);
        self.run = Run {
            text: String::new(),
            ..current
        };
    }

    fn finish_paragraph(&mut self) {
        if !self.in_paragraph {
            return;
        }
        let mut runs = std::mem::take(&mut self.runs);
        if self.in_run {
            runs.push(std::mem::take(&mut self.run));
            self.in_run = false;
        }
        self.emit_paragraph(runs);
        self.in_paragraph = false;
        self.in_text = false;
    }

    fn emit_paragraph(&mut self, runs: Vec<Run>) {
        if self.table_depth > 0 {
            let text: String = runs.iter().map(|r| r.text.as_str()).collect();
            let text = text.trim();
            if !text.is_empty() {
                if !self.cell.is_empty() {
                    self.cell.push(' ');
                }
                self.cell.push_str(text);
            }
            self.objects.clear();
            return;
        }
        let node = match self.heading_level {
            Some(level) => {
                let text: String = runs.iter().map(|r| r.text.as_str()).collect();
                let text = text.trim().to_string();
                (!text.is_empty()).then_some(ContentNode::Heading { level, text })
            }
            None => finish_paragraph(runs, self.alignment),
        };
        self.nodes.extend(node);
        self.nodes.append(&mut self.objects);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_styles() {
        let xml = r#"<w:styles>
            <w:style w:type="paragraph" w:styleId="Heading2"><w:name w:val="heading 2"/></w:style>
            <w:style w:type="paragraph" w:styleId="Custom"><w:name w:val="Fancy"/>
                <w:pPr><w:outlineLvl w:val="3"/></w:pPr></w:style>
            <w:style w:type="paragraph" w:styleId="Title"><w:name w:val="Title"/></w:style>
            <w:style w:type="paragraph" w:styleId="Normal"><w:name w:val="Normal"/></w:style>
        </w:styles>"#;
        let levels = parse_heading_styles(xml).unwrap();
        assert_eq!(levels.get("Heading2"), Some(&2));
        assert_eq!(levels.get("Custom"), Some(&4));
        assert_eq!(levels.get("Title"), Some(&1));
        assert_eq!(levels.get("Normal"), None);
    }

    #[test]
    fn test_level_from_name() {
        assert_eq!(level_from_name("Heading 9"), Some(9));
        assert_eq!(level_from_name("heading 10"), None);
        assert_eq!(level_from_name("Body Text"), None);
    }
}
