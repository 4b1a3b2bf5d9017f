//! SpreadsheetML reader: workbook, shared strings, date styles and cells.

use crate::error::Result;
use crate::package::{local_attr, main_part, optional_text, part_rels, rel_by_type, required_text};
use crate::sheet::{
    parse_cell_ref, parse_iso_date, serial_to_datetime, CellValue, Sheet, MAX_COLS,
};
use folio_archive::Archive;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;

pub(crate) const DEFAULT_MAIN_PART: &str = "xl/workbook.xml";

/// Parse every worksheet listed in the workbook, in workbook order.
///
/// # Errors
///
/// Returns an error if the workbook is missing or any XML is malformed.
/// A sheet whose part is missing is skipped with a warning.
pub(crate) fn parse(archive: &Archive) -> Result<Vec<Sheet>> {
    let workbook = main_part(archive, DEFAULT_MAIN_PART)?;
    let xml = required_text(archive, &workbook)?;
    let rels = part_rels(archive, &workbook)?;

    let shared_strings = match rel_by_type(&rels, "sharedStrings")
        .and_then(|r| optional_text(archive, &r.target))
    {
        Some(text) => parse_shared_strings(text)?,
        None => Vec::new(),
    };
    let date_styles = match rel_by_type(&rels, "styles").and_then(|r| optional_text(archive, &r.target)) {
        Some(text) => parse_date_styles(text)?,
        None => Vec::new(),
    };

    let mut sheets = Vec::new();
    for (name, rel_id) in parse_workbook_sheets(xml)? {
        let Some(target) = rels.iter().find(|r| r.id == rel_id && !r.external) else {
            log::warn!("Sheet '{name}' has no relationship {rel_id}");
            continue;
        };
        let Some(sheet_xml) = optional_text(archive, &target.target) else {
            log::warn!("Sheet '{name}' part {} is missing", target.target);
            continue;
        };
        let mut sheet = Sheet::new(name);
        parse_worksheet(sheet_xml, &shared_strings, &date_styles, &mut sheet)?;
        log::debug!("Sheet '{}': {} cells", sheet.name, sheet.cell_count());
        sheets.push(sheet);
    }
    Ok(sheets)
}

/// `(name, relationship id)` of each `<sheet>` in the workbook.
fn parse_workbook_sheets(xml: &str) -> Result<Vec<(String, String)>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut sheets = Vec::new();
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"sheet" => {
                if let (Some(name), Some(id)) = (local_attr(&e, b"name"), local_attr(&e, b"id")) {
                    sheets.push((name, id));
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(sheets)
}

/// Shared string table. Rich text runs are concatenated; phonetic runs are
/// skipped.
pub(crate) fn parse_shared_strings(xml: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(false);
    let mut strings = Vec::new();
    let mut current = String::new();
    let mut in_item = false;
    let mut in_text = false;
    let mut phonetic_depth = 0usize;
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"si" => {
                    in_item = true;
                    current.clear();
                }
                b"rPh" => phonetic_depth += 1,
                b"t" if in_item && phonetic_depth == 0 => in_text = true,
                _ => {}
            },
            Event::Empty(e) if e.local_name().as_ref() == b"si" => strings.push(String::new()),
            Event::Text(t) if in_text => current.push_str(&t.unescape()?),
            Event::End(e) => match e.local_name().as_ref() {
                b"si" => {
                    strings.push(std::mem::take(&mut current));
                    in_item = false;
                }
                b"rPh" => phonetic_depth = phonetic_depth.saturating_sub(1),
                b"t" => in_text = false,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(strings)
}

/// Whether a number format displays a date.
fn is_date_format(id: u32, custom: &HashMap<u32, String>) -> bool {
    if matches!(id, 14..=22 | 45..=47) {
        return true;
    }
    custom.get(&id).is_some_and(|code| {
        // Strip quoted literals and bracketed colors/conditions first
        let mut plain = String::new();
        let mut quoted = false;
        let mut bracket = false;
        for c in code.chars() {
            match c {
                '"' => quoted = !quoted,
                '[' if !quoted => bracket = true,
                ']' if !quoted => bracket = false,
                _ if !quoted && !bracket => plain.push(c.to_ascii_lowercase()),
                _ => {}
            }
        }
        plain.contains('y') || plain.contains('d')
    })
}

/// Per `cellXfs` entry, whether it formats a date.
pub(crate) fn parse_date_styles(xml: &str) -> Result<Vec<bool>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut custom: HashMap<u32, String> = HashMap::new();
    let mut xf_formats: Vec<u32> = Vec::new();
    let mut in_cell_xfs = false;
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) => match e.local_name().as_ref() {
                b"numFmt" => {
                    if let (Some(id), Some(code)) = (
                        local_attr(&e, b"numFmtId").and_then(|v| v.parse().ok()),
                        local_attr(&e, b"formatCode"),
                    ) {
                        custom.insert(id, code);
                    }
                }
                b"cellXfs" => in_cell_xfs = true,
                b"xf" if in_cell_xfs => xf_formats.push(
                    local_attr(&e, b"numFmtId")
                        .and_then(|v| v.parse().ok())
                        .unwrap_or(0),
                ),
                _ => {}
            },
            Event::End(e) if e.local_name().as_ref() == b"cellXfs" => in_cell_xfs = false,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(xf_formats
        .into_iter()
        .map(|id| is_date_format(id, &custom))
        .collect())
}

/// Cell being read.
#[derive(Default)]
struct PendingCell {
    position: Option<(u32, u32)>,
    cell_type: String,
    style: usize,
    value: Option<String>,
    formula: Option<String>,
    inline: Option<String>,
}

impl PendingCell {
    fn start(e: &BytesStart<'_>, row: u32, next_col: u32) -> Self {
        let position = local_attr(e, b"r")
            .and_then(|r| parse_cell_ref(&r))
            .or_else(|| (next_col < MAX_COLS).then_some((row, next_col)));
        Self {
            position,
            cell_type: local_attr(e, b"t").unwrap_or_default(),
            style: local_attr(e, b"s").and_then(|s| s.parse().ok()).unwrap_or(0),
            ..Self::default()
        }
    }

    fn into_value(self, shared: &[String], date_styles: &[bool]) -> CellValue {
        let raw = self.value.unwrap_or_default();
        let value = match self.cell_type.as_str() {
            "s" => raw
                .trim()
                .parse::<usize>()
                .ok()
                .and_then(|i| shared.get(i))
                .map_or(CellValue::Empty, |s| CellValue::String(s.clone())),
            "b" => CellValue::Boolean(raw.trim() == "1"),
            "e" => CellValue::Error(raw),
            "str" => CellValue::String(raw),
            "inlineStr" => CellValue::String(self.inline.unwrap_or_default()),
            "d" => parse_iso_date(&raw).map_or(CellValue::String(raw), CellValue::Date),
            _ if raw.trim().is_empty() => CellValue::Empty,
            _ => match raw.trim().parse::<f64>() {
                Ok(n) if date_styles.get(self.style).copied().unwrap_or(false) => {
                    serial_to_datetime(n).map_or(CellValue::Number(n), CellValue::Date)
                }
                Ok(n) => CellValue::Number(n),
                Err(_) => CellValue::String(raw),
            },
        };
        match self.formula {
            Some(formula) if !formula.is_empty() => {
                let cached = (value != CellValue::Empty).then(|| value.display());
                CellValue::Formula { formula, cached }
            }
            _ => value,
        }
    }
}

/// Read the cells of one worksheet into `sheet`.
pub(crate) fn parse_worksheet(
    xml: &str,
    shared: &[String],
    date_styles: &[bool],
    sheet: &mut Sheet,
) -> Result<()> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(false);
    let mut row: u32 = 0;
    let mut next_row: u32 = 0;
    let mut next_col: u32 = 0;
    let mut cell: Option<PendingCell> = None;
    let mut field: Option<&'static str> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"row" => {
                    row = local_attr(&e, b"r")
                        .and_then(|r| r.parse::<u32>().ok())
                        .and_then(|r| r.checked_sub(1))
                        .unwrap_or(next_row);
                    next_row = row.saturating_add(1);
                    next_col = 0;
                }
                b"c" => cell = Some(PendingCell::start(&e, row, next_col)),
                b"v" if cell.is_some() => field = Some("v"),
                b"f" if cell.is_some() => field = Some("f"),
                b"t" if cell.is_some() => field = Some("t"),
                _ => {}
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"row" => {
                    next_row = local_attr(&e, b"r")
                        .and_then(|r| r.parse::<u32>().ok())
                        .unwrap_or(next_row.saturating_add(1));
                }
                b"c" => {
                    if let Some((_, c)) = PendingCell::start(&e, row, next_col).position {
                        next_col = c.saturating_add(1);
                    }
                }
                _ => {}
            },
            Event::Text(t) => {
                if let (Some(pending), Some(which)) = (cell.as_mut(), field) {
                    let text = t.unescape()?;
                    let slot = match which {
                        "v" => &mut pending.value,
                        "f" => &mut pending.formula,
                        _ => &mut pending.inline,
                    };
                    slot.get_or_insert_with(String::new).push_str(&text);
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"c" => {
                    if let Some(pending) = cell.take() {
                        if let Some((r, c)) = pending.position {
                            next_col = c.saturating_add(1);
                            sheet.set(r, c, pending.into_value(shared, date_styles));
                        }
                    }
                }
                b"v" | b"f" | b"t" => field = None,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(())
}
