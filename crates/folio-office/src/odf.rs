//! OpenDocument reader for text, spreadsheet and presentation bodies.
//!
//! One walker handles all three: `office:text` yields content nodes,
//! `office:spreadsheet` sheets and `office:presentation` slides. Paragraph
//! and span formatting comes from named styles in `styles.xml` and the
//! automatic styles of `content.xml`.

use crate::content::{finish_paragraph, Alignment, ContentNode, Run, Slide};
use crate::error::Result;
use crate::kind::OfficeType;
use crate::package::{
    attr, optional_text, parse_length, required_text, ODF_CONTENT_PART, ODF_STYLES_PART,
};
use crate::sheet::{format_number, parse_iso_date, CellValue, Sheet, MAX_COLS, MAX_ROWS};
use folio_archive::Archive;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;

/// Repeated rows or columns that carry content are materialized at most
/// this many times.
pub(crate) const MAX_MATERIALIZED_REPEAT: u32 = 1_024;

/// Parsed ODF body.
#[derive(Debug, Default)]
pub(crate) struct OdfContent {
    pub nodes: Vec<ContentNode>,
    pub sheets: Vec<Sheet>,
    pub slides: Vec<Slide>,
    /// `(width, height)` in points of the first master page's layout
    pub page_size: Option<(f32, f32)>,
}

/// Formatting carried by a named style.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct OdfStyle {
    parent: Option<String>,
    bold: Option<bool>,
    italic: Option<bool>,
    alignment: Option<Alignment>,
    break_before: bool,
}

/// Styles and page layouts gathered from `styles.xml` and `content.xml`.
#[derive(Debug, Default)]
pub(crate) struct OdfStyles {
    styles: HashMap<String, OdfStyle>,
    layouts: HashMap<String, (f32, f32)>,
    first_layout: Option<String>,
    master_layout: Option<String>,
}

impl OdfStyles {
    /// Add the styles and page layouts of one part.
    pub(crate) fn parse_part(&mut self, xml: &str) -> Result<()> {
        let mut reader = Reader::from_str(xml);
        reader.trim_text(true);
        let mut style: Option<(String, OdfStyle)> = None;
        let mut layout: Option<String> = None;
        let mut buf = Vec::new();
        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(e) | Event::Empty(e) => match e.name().as_ref() {
                    b"style:style" => {
                        if let Some((name, done)) = style.take() {
                            self.styles.insert(name, done);
                        }
                        style = attr(&e, b"style:name").map(|name| {
                            (
                                name,
                                OdfStyle {
                                    parent: attr(&e, b"style:parent-style-name"),
                                    ..OdfStyle::default()
                                },
                            )
                        });
                    }
                    b"style:text-properties" => {
                        if let Some((_, s)) = style.as_mut() {
                            if let Some(weight) = attr(&e, b"fo:font-weight") {
                                s.bold = Some(weight == "bold" || weight.parse::<u32>().is_ok_and(|w| w >= 600));
                            }
                            if let Some(font_style) = attr(&e, b"fo:font-style") {
                                s.italic = Some(font_style == "italic" || font_style == "oblique");
                            }
                        }
                    }
                    b"style:paragraph-properties" => {
                        if let Some((_, s)) = style.as_mut() {
                            if let Some(align) = attr(&e, b"fo:text-align") {
                                s.alignment = Some(Alignment::from_attr(&align));
                            }
                            if attr(&e, b"fo:break-before").as_deref() == Some("page") {
                                s.break_before = true;
                            }
                        }
                    }
                    b"style:page-layout" => {
                        layout = attr(&e, b"style:name");
                        if self.first_layout.is_none() {
                            self.first_layout.clone_from(&layout);
                        }
                    }
                    b"style:page-layout-properties" => {
                        let size = (
                            attr(&e, b"fo:page-width").and_then(|v| parse_length(&v)),
                            attr(&e, b"fo:page-height").and_then(|v| parse_length(&v)),
                        );
                        if let (Some(name), (Some(w), Some(h))) = (layout.as_ref(), size) {
                            self.layouts.insert(name.clone(), (w, h));
                        }
                    }
                    b"style:master-page" if self.master_layout.is_none() => {
                        self.master_layout = attr(&e, b"style:page-layout-name");
                    }
                    _ => {}
                },
                Event::End(e) => match e.name().as_ref() {
                    b"style:style" => {
                        if let Some((name, done)) = style.take() {
                            self.styles.insert(name, done);
                        }
                    }
                    b"style:page-layout" => layout = None,
                    _ => {}
                },
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }
        if let Some((name, done)) = style.take() {
            self.styles.insert(name, done);
        }
        Ok(())
    }

    /// Effective style with parent properties filled in.
    fn resolve(&self, name: &str) -> OdfStyle {
        let mut out = OdfStyle::default();
        let mut current = Some(name.to_string());
        // Parent chains are short; the bound stops cycles
        for _ in 0..16 {
            let Some(style) = current.as_deref().and_then(|n| self.styles.get(n)) else {
                break;
            };
            out.bold = out.bold.or(style.bold);
            out.italic = out.italic.or(style.italic);
            out.alignment = out.alignment.or(style.alignment);
            out.break_before |= style.break_before;
            current.clone_from(&style.parent);
        }
        out
    }

    fn page_size(&self) -> Option<(f32, f32)> {
        self.master_layout
            .as_ref()
            .or(self.first_layout.as_ref())
            .and_then(|name| self.layouts.get(name))
            .copied()
    }
}

/// Parse `content.xml` (and `styles.xml` when present).
///
/// # Errors
///
/// Returns an error if `content.xml` is missing or any XML is malformed.
pub(crate) fn parse(archive: &Archive, kind: OfficeType) -> Result<OdfContent> {
    let content = required_text(archive, ODF_CONTENT_PART)?;
    let mut styles = OdfStyles::default();
    if let Some(xml) = optional_text(archive, ODF_STYLES_PART) {
        styles.parse_part(xml)?;
    }
    styles.parse_part(content)?;

    let mut out = parse_body(content, kind, &styles)?;
    out.page_size = styles.page_size();
    Ok(out)
}

/// Walk the `office:body` of a content part.
pub(crate) fn parse_body(xml: &str, kind: OfficeType, styles: &OdfStyles) -> Result<OdfContent> {
    let mut state = OdfWalkState::new(kind, styles);
    let mut reader = Reader::from_str(xml);
    reader.trim_text(false);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => state.handle_start(&e, false),
            Event::Empty(e) => {
                state.handle_start(&e, true);
                state.handle_end(e.name().as_ref());
            }
            Event::Text(t) => {
                if state.paragraph_depth > 0 {
                    state.push_text(&t.unescape()?);
                }
            }
            Event::End(e) => state.handle_end(e.name().as_ref()),
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(state.out)
}

/// Spreadsheet cell being read.
#[derive(Debug, Default)]
struct OdfCell {
    value_type: Option<String>,
    value: Option<String>,
    date_value: Option<String>,
    boolean_value: Option<String>,
    formula: Option<String>,
    repeat: u32,
    text: String,
}

impl OdfCell {
    fn into_value(self) -> CellValue {
        let text = self.text;
        let value = match self.value_type.as_deref() {
            Some("float" | "percentage" | "currency") => self
                .value
                .as_deref()
                .and_then(|v| v.trim().parse::<f64>().ok())
                .map_or_else(|| CellValue::String(text.clone()), CellValue::Number),
            Some("boolean") => CellValue::Boolean(
                self.boolean_value
                    .as_deref()
                    .is_some_and(|b| b.eq_ignore_ascii_case("true")),
            ),
            Some("date") => self
                .date_value
                .as_deref()
                .and_then(parse_iso_date)
                .map_or_else(|| CellValue::String(text.clone()), CellValue::Date),
            _ if text.is_empty() => CellValue::Empty,
            _ => CellValue::String(text.clone()),
        };
        match self.formula {
            Some(formula) => {
                let formula = formula
                    .strip_prefix("of:")
                    .unwrap_or(formula.as_str())
                    .trim_start_matches('=')
                    .to_string();
                let cached = match &value {
                    CellValue::Empty => None,
                    CellValue::Number(n) => Some(format_number(*n)),
                    other => Some(other.display()),
                };
                CellValue::Formula { formula, cached }
            }
            None => value,
        }
    }
}

#[allow(clippy::struct_excessive_bools)]
struct OdfWalkState<'a> {
    kind: OfficeType,
    styles: &'a OdfStyles,
    out: OdfContent,

    in_body: bool,
    // Nested paragraphs (text boxes, notes) fold into the outer one
    paragraph_depth: usize,
    heading_level: Option<u8>,
    alignment: Alignment,
    runs: Vec<Run>,
    span_styles: Vec<OdfStyle>,
    paragraph_style: OdfStyle,
    link: Option<String>,
    in_note: usize,

    // Text tables and spreadsheet tables
    table_depth: usize,
    rows: Vec<Vec<String>>,
    row: Vec<String>,
    row_repeat: u32,
    cell: Option<OdfCell>,
    next_row: u32,
    next_col: u32,
    row_cells: Vec<(u32, u32, CellValue)>,

    // Presentation frames
    in_page: bool,
    in_title_frame: bool,
    frame_paragraphs: Vec<Vec<Run>>,
    frame_alignments: Vec<Alignment>,
}

impl<'a> OdfWalkState<'a> {
    fn new(kind: OfficeType, styles: &'a OdfStyles) -> Self {
        Self {
            kind,
            styles,
            out: OdfContent::default(),
            in_body: false,
            paragraph_depth: 0,
            heading_level: None,
            alignment: Alignment::Left,
            runs: Vec::new(),
            span_styles: Vec::new(),
            paragraph_style: OdfStyle::default(),
            link: None,
            in_note: 0,
            table_depth: 0,
            rows: Vec::new(),
            row: Vec::new(),
            row_repeat: 1,
            cell: None,
            next_row: 0,
            next_col: 0,
            row_cells: Vec::new(),
            in_page: false,
            in_title_frame: false,
            frame_paragraphs: Vec::new(),
            frame_alignments: Vec::new(),
        }
    }

    fn is_spreadsheet(&self) -> bool {
        self.kind == OfficeType::Ods
    }

    fn handle_start(&mut self, e: &BytesStart<'_>, empty: bool) {
        match e.name().as_ref() {
            b"office:body" => self.in_body = true,
            _ if !self.in_body => {}
            b"text:note-body" | b"office:annotation" => self.in_note += 1,
            _ if self.in_note > 0 => {}
            b"draw:page" if self.kind == OfficeType::Odp => {
                self.in_page = true;
                self.out.slides.push(Slide::default());
            }
            b"draw:frame" if self.in_page => {
                self.in_title_frame = matches!(
                    attr(e, b"presentation:class").as_deref(),
                    Some("title")
                );
                self.frame_paragraphs.clear();
                self.frame_alignments.clear();
            }
            b"table:table" => self.start_table(e),
            b"table:table-row" if self.table_depth == 1 => {
                self.row.clear();
                self.row_cells.clear();
                self.next_col = 0;
                self.row_repeat = repeat_attr(e, b"table:number-rows-repeated");
            }
            b"table:table-cell" | b"table:covered-table-cell" if self.table_depth == 1 => {
                self.cell = Some(OdfCell {
                    value_type: attr(e, b"office:value-type"),
                    value: attr(e, b"office:value"),
                    date_value: attr(e, b"office:date-value"),
                    boolean_value: attr(e, b"office:boolean-value"),
                    formula: attr(e, b"table:formula"),
                    repeat: repeat_attr(e, b"table:number-columns-repeated"),
                    text: String::new(),
                });
            }
            b"text:p" | b"text:h" => {
                self.paragraph_depth += 1;
                if self.paragraph_depth == 1 {
                    self.start_paragraph(e);
                } else if !empty {
                    self.push_text(" ");
                }
            }
            b"text:span" if self.paragraph_depth > 0 => {
                let style = attr(e, b"text:style-name")
                    .map(|n| self.styles.resolve(&n))
                    .unwrap_or_default();
                self.span_styles.push(style);
            }
            b"text:a" if self.paragraph_depth > 0 => self.link = attr(e, b"xlink:href"),
            b"text:s" if self.paragraph_depth > 0 => {
                let count = attr(e, b"text:c")
                    .and_then(|c| c.parse::<usize>().ok())
                    .unwrap_or(1)
                    .min(64);
                self.push_text(&" ".repeat(count));
            }
            b"text:tab" if self.paragraph_depth > 0 => self.push_text("\t"),
            b"text:line-break" if self.paragraph_depth > 0 => self.push_text("\n"),
            b"draw:image" if self.table_depth == 0 => {
                if let Some(href) = attr(e, b"xlink:href") {
                    self.push_object(ContentNode::Image {
                        source: href.trim_start_matches("./").to_string(),
                    });
                }
            }
            b"draw:object" if self.table_depth == 0 => {
                if let Some(href) = attr(e, b"xlink:href") {
                    self.push_object(ContentNode::Chart {
                        source: href.trim_start_matches("./").to_string(),
                    });
                }
            }
            _ => {}
        }
    }

    fn handle_end(&mut self, name: &[u8]) {
        match name {
            b"office:body" => self.in_body = false,
            b"text:note-body" | b"office:annotation" => {
                self.in_note = self.in_note.saturating_sub(1);
            }
            _ if self.in_note > 0 => {}
            b"draw:page" => self.in_page = false,
            b"draw:frame" if self.in_page => self.finish_frame(),
            b"table:table" => self.finish_table(),
            b"table:table-row" if self.table_depth == 1 => self.finish_row(),
            b"table:table-cell" | b"table:covered-table-cell" if self.table_depth == 1 => {
                self.finish_cell();
            }
            b"text:p" | b"text:h" if self.paragraph_depth > 0 => {
                self.paragraph_depth -= 1;
                if self.paragraph_depth == 0 {
                    self.finish_paragraph();
                }
            }
            b"text:span" if self.paragraph_depth > 0 => {
                self.span_styles.pop();
            }
            b"text:a" => self.link = None,
            _ => {}
        }
    }

    fn start_paragraph(&mut self, e: &BytesStart<'_>) {
        self.runs.clear();
        self.span_styles.clear();
        self.link = None;
        self.heading_level = (e.name().as_ref() == b"text:h").then(|| {
            attr(e, b"text:outline-level")
                .and_then(|l| l.parse::<u8>().ok())
                .unwrap_or(1)
                .clamp(1, 9)
        });
        self.paragraph_style = attr(e, b"text:style-name")
            .map(|n| self.styles.resolve(&n))
            .unwrap_or_default();
        self.alignment = self.paragraph_style.alignment.unwrap_or_default();
        if self.paragraph_style.break_before
            && self.kind == OfficeType::Odt
            && self.table_depth == 0
            && !self.out.nodes.is_empty()
        {
            self.out.nodes.push(ContentNode::PageBreak);
        }
    }

    fn push_text(&mut self, text: &str) {
        if let Some(cell) = self.cell.as_mut() {
            cell.text.push_str(text);
            return;
        }
        let span = self.span_styles.last();
        let bold = span
            .and_then(|s| s.bold)
            .or(self.paragraph_style.bold)
            .unwrap_or(false);
        let italic = span
            .and_then(|s| s.italic)
            .or(self.paragraph_style.italic)
            .unwrap_or(false);
        self.runs.push(Run {
            text: text.to_string(),
            bold,
            italic,
            link: self.link.clone(),
        });
    }

    fn push_object(&mut self, node: ContentNode) {
        if self.in_page {
            if let Some(slide) = self.out.slides.last_mut() {
                slide.body.push(node);
            }
        } else if self.kind == OfficeType::Odt {
            self.out.nodes.push(node);
        }
    }

    fn finish_paragraph(&mut self) {
        let runs = std::mem::take(&mut self.runs);
        if let Some(cell) = self.cell.as_mut() {
            // Cell paragraphs are separated by newlines
            if !cell.text.is_empty() && !cell.text.ends_with('\n') {
                cell.text.push('\n');
            }
            return;
        }
        if self.in_page {
            self.frame_paragraphs.push(runs);
            self.frame_alignments.push(self.alignment);
            return;
        }
        if self.kind != OfficeType::Odt {
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
        self.out.nodes.extend(node);
    }

    fn finish_frame(&mut self) {
        let paragraphs = std::mem::take(&mut self.frame_paragraphs);
        let alignments = std::mem::take(&mut self.frame_alignments);
        let Some(slide) = self.out.slides.last_mut() else {
            return;
        };
        if self.in_title_frame && slide.title.is_none() {
            let title = paragraphs
                .iter()
                .map(|runs| runs.iter().map(|r| r.text.as_str()).collect::<String>())
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect::<Vec<_>>()
                .join(" ");
            if !title.is_empty() {
                slide.title = Some(title);
                self.in_title_frame = false;
                return;
            }
        }
        for (runs, alignment) in paragraphs.into_iter().zip(alignments) {
            slide.body.extend(finish_paragraph(runs, alignment));
        }
        self.in_title_frame = false;
    }

    fn start_table(&mut self, e: &BytesStart<'_>) {
        self.table_depth += 1;
        if self.table_depth > 1 {
            return;
        }
        self.rows.clear();
        self.next_row = 0;
        if self.is_spreadsheet() {
            let name = attr(e, b"table:name")
                .unwrap_or_else(|| format!("Sheet{}", self.out.sheets.len() + 1));
            self.out.sheets.push(Sheet::new(name));
        } else if self.paragraph_depth > 0 {
            // A table inside a paragraph closes the paragraph first
            self.finish_paragraph();
            self.paragraph_depth = 0;
        }
    }

    fn finish_table(&mut self) {
        if self.table_depth == 0 {
            return;
        }
        self.table_depth -= 1;
        if self.table_depth > 0 || self.is_spreadsheet() {
            return;
        }
        let rows = std::mem::take(&mut self.rows);
        if rows.iter().all(|r| r.iter().all(String::is_empty)) {
            return;
        }
        let node = ContentNode::Table { rows };
        if self.in_page {
            if let Some(slide) = self.out.slides.last_mut() {
                slide.body.push(node);
            }
        } else if self.kind == OfficeType::Odt {
            self.out.nodes.push(node);
        }
    }

    fn finish_cell(&mut self) {
        let Some(mut cell) = self.cell.take() else {
            return;
        };
        let trimmed = cell.text.trim_end_matches('\n').len();
        cell.text.truncate(trimmed);
        let repeat = cell.repeat;
        if self.is_spreadsheet() {
            let value = cell.into_value();
            if value == CellValue::Empty {
                self.next_col = self.next_col.saturating_add(repeat);
                return;
            }
            for _ in 0..repeat.min(MAX_MATERIALIZED_REPEAT) {
                if self.next_col >= MAX_COLS {
                    break;
                }
                self.row_cells.push((self.next_row, self.next_col, value.clone()));
                self.next_col += 1;
            }
        } else {
            let text = cell.text.replace('\n', " ");
            for _ in 0..repeat.min(MAX_MATERIALIZED_REPEAT) {
                self.row.push(text.clone());
            }
        }
    }

    fn finish_row(&mut self) {
        let repeat = self.row_repeat;
        if self.is_spreadsheet() {
            let cells = std::mem::take(&mut self.row_cells);
            let copies = if cells.is_empty() {
                0
            } else {
                repeat.min(MAX_MATERIALIZED_REPEAT)
            };
            if let Some(sheet) = self.out.sheets.last_mut() {
                for copy in 0..copies {
                    for (row, col, value) in &cells {
                        let row = row.saturating_add(copy);
                        if row < MAX_ROWS {
                            sheet.set(row, *col, value.clone());
                        }
                    }
                }
            }
        } else {
            let row = std::mem::take(&mut self.row);
            for _ in 0..repeat.min(MAX_MATERIALIZED_REPEAT) {
                self.rows.push(row.clone());
            }
        }
        self.next_row = self.next_row.saturating_add(repeat);
    }
}

fn repeat_attr(e: &BytesStart<'_>, key: &[u8]) -> u32 {
    attr(e, key)
        .and_then(|v| v.parse::<u32>().ok())
        .filter(|n| *n > 0)
        .unwrap_or(1)
}
