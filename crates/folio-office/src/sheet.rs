//! Spreadsheet model: sheets of typed cells.

use crate::error::{OfficeError, Result};
use chrono::{Duration, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Rows per sheet (Excel limit).
pub const MAX_ROWS: u32 = 1_048_576;

/// Columns per sheet (Excel limit, `XFD`).
pub const MAX_COLS: u32 = 16_384;

/// Typed cell value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    #[default]
    Empty,
    String(String),
    Number(f64),
    Boolean(bool),
    /// Formula without the leading `=`, with the last computed value if the
    /// file carried one
    Formula {
        formula: String,
        cached: Option<String>,
    },
    /// Error code such as `#DIV/0!`
    Error(String),
    Date(NaiveDateTime),
}

impl CellValue {
    /// Numeric type code used at the handle boundary.
    #[must_use = "returns the cell type code"]
    pub const fn type_code(&self) -> i32 {
        match self {
            Self::Empty => 0,
            Self::String(_) => 1,
            Self::Number(_) => 2,
            Self::Boolean(_) => 3,
            Self::Formula { .. } => 4,
            Self::Error(_) => 5,
            Self::Date(_) => 6,
        }
    }

    /// Displayed text: numbers without a trailing `.0`, booleans as
    /// `TRUE`/`FALSE`, dates as ISO 8601, formulas as their cached value or
    /// `=formula`.
    #[must_use = "returns the displayed text"]
    pub fn display(&self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::String(s) | Self::Error(s) => s.clone(),
            Self::Number(n) => format_number(*n),
            Self::Boolean(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
            Self::Formula { formula, cached } => {
                cached.clone().unwrap_or_else(|| format!("={formula}"))
            }
            Self::Date(d) => {
                if d.num_seconds_from_midnight() == 0 {
                    d.format("%Y-%m-%d").to_string()
                } else {
                    d.format("%Y-%m-%dT%H:%M:%S").to_string()
                }
            }
        }
    }
}

/// Shortest text for a number.
#[must_use = "returns the formatted number"]
#[allow(clippy::cast_possible_truncation)]
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

/// Spreadsheet serial number (1900 date system) to a date-time.
#[must_use = "returns the converted date"]
#[allow(clippy::cast_possible_truncation)]
pub fn serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || !(0.0..2_958_466.0).contains(&serial) {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let millis = (serial * 86_400_000.0).round() as i64;
    epoch.checked_add_signed(Duration::milliseconds(millis))
}

/// ISO 8601 date or date-time (`2024-01-01`, `2024-01-01T12:30:00`).
#[must_use = "returns the parsed date"]
pub fn parse_iso_date(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Column letters for a zero-based index (`0` → `A`, `27` → `AB`).
#[must_use = "returns the column name"]
pub fn column_name(col: u32) -> String {
    let mut n = col + 1;
    let mut out = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        out.push(b'A' + u8::try_from(rem).unwrap_or(0));
        n = (n - 1) / 26;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

/// Parse an A1-style reference into zero-based `(row, col)`. `$` markers
/// are ignored.
#[must_use = "returns the parsed cell position"]
pub fn parse_cell_ref(reference: &str) -> Option<(u32, u32)> {
    let reference = reference.replace('$', "");
    let split = reference.find(|c: char| c.is_ascii_digit())?;
    let (letters, digits) = reference.split_at(split);
    if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let mut col: u32 = 0;
    for c in letters.bytes() {
        col = col
            .checked_mul(26)?
            .checked_add(u32::from(c.to_ascii_uppercase() - b'A') + 1)?;
    }
    let row: u32 = digits.parse().ok()?;
    if row == 0 || row > MAX_ROWS || col > MAX_COLS {
        return None;
    }
    Some((row - 1, col - 1))
}

/// Check a zero-based cell position against the sheet limits.
///
/// # Errors
///
/// Returns [`OfficeError::InvalidValue`] for a row ≥ 1,048,576 or a column
/// ≥ 16,384.
pub fn check_position(row: u32, col: u32) -> Result<()> {
    if row >= MAX_ROWS {
        return Err(OfficeError::invalid("row", format!("{row} exceeds {}", MAX_ROWS - 1)));
    }
    if col >= MAX_COLS {
        return Err(OfficeError::invalid("column", format!("{col} exceeds {}", MAX_COLS - 1)));
    }
    Ok(())
}

/// One sheet. Only non-empty cells are stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sheet {
    pub name: String,
    cells: BTreeMap<(u32, u32), CellValue>,
}

impl Sheet {
    #[must_use = "creates an empty sheet"]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cells: BTreeMap::new(),
        }
    }

    /// Value at a position; unset cells are [`CellValue::Empty`].
    #[must_use = "returns the cell value"]
    pub fn get(&self, row: u32, col: u32) -> &CellValue {
        static EMPTY: CellValue = CellValue::Empty;
        self.cells.get(&(row, col)).unwrap_or(&EMPTY)
    }

    /// Store a value; storing [`CellValue::Empty`] clears the cell.
    pub fn set(&mut self, row: u32, col: u32, value: CellValue) {
        if value == CellValue::Empty {
            self.cells.remove(&(row, col));
        } else {
            self.cells.insert((row, col), value);
        }
    }

    #[must_use = "returns the number of non-empty cells"]
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Non-empty cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = (u32, u32, &CellValue)> + '_ {
        self.cells.iter().map(|(&(r, c), v)| (r, c, v))
    }

    /// `(rows, cols)` of the used range, counted from A1.
    #[must_use = "returns the used range size"]
    pub fn dimensions(&self) -> (u32, u32) {
        self.cells
            .keys()
            .fold((0, 0), |(rows, cols), &(r, c)| (rows.max(r + 1), cols.max(c + 1)))
    }

    /// Displayed text of each row of the used range.
    #[must_use = "returns the grid rows"]
    pub fn grid(&self) -> Vec<Vec<String>> {
        let (rows, cols) = self.dimensions();
        (0..rows)
            .map(|r| (0..cols).map(|c| self.get(r, c).display()).collect())
            .collect()
    }
}
