//! Cell values, cells and range positions shared by the grid, decoder and encoder.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// The value held by a cell.
///
/// Every variant has exactly one canonical text form, produced by
/// [`CellValue::to_text`]. The encoder only ever sees that text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum CellValue {
    Text(String),
    Number(f64),
    Bool(bool),
    /// A value of a foreign type, stored already rendered.
    Other(String),
}

impl CellValue {
    /// Render the value to its canonical text.
    ///
    /// - Text and other values are returned as stored.
    /// - Integral numbers print without a fractional part (`3.0` → `3`), other numbers
    ///   use the shortest representation that parses back to the same `f64`.
    /// - Non-finite numbers print as `NaN`, `Infinity` and `-Infinity`.
    /// - Booleans print as `TRUE` / `FALSE`.
    pub fn to_text(&self) -> Cow<'_, str> {
        match self {
            CellValue::Text(s) | CellValue::Other(s) => Cow::Borrowed(s),
            CellValue::Number(n) => Cow::Owned(format_number(*n)),
            CellValue::Bool(true) => Cow::Borrowed("TRUE"),
            CellValue::Bool(false) => Cow::Borrowed("FALSE"),
        }
    }

    /// True when the rendered text is empty or whitespace only.
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Text(s) | CellValue::Other(s) => s.trim().is_empty(),
            CellValue::Number(_) | CellValue::Bool(_) => false,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<i64> for CellValue {
    fn from(n: i64) -> Self {
        CellValue::Number(n as f64)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Bool(b)
    }
}

fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    // -0 renders as 0
    let n = if n == 0.0 { 0.0 } else { n };
    if n.fract() == 0.0 && n.abs() < (i64::MAX as f64) {
        return (n as i64).to_string();
    }
    format!("{}", n)
}

/// A grid cell: a value plus the number of columns it spans.
///
/// Cells covered by another cell's span are *invalid*: they carry no data of their own
/// and both the encoder and the in-memory grid skip them.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    value: CellValue,
    colspan: usize,
    valid: bool,
}

impl Cell {
    pub fn new(value: impl Into<CellValue>) -> Self {
        Self {
            value: value.into(),
            colspan: 1,
            valid: true,
        }
    }

    /// A cell that occupies `colspan` columns. Spans below one are raised to one.
    pub fn spanning(value: impl Into<CellValue>, colspan: usize) -> Self {
        Self {
            value: value.into(),
            colspan: colspan.max(1),
            valid: true,
        }
    }

    /// A placeholder for a column hidden under a merged cell.
    pub fn covered() -> Self {
        Self {
            value: CellValue::Text(String::new()),
            colspan: 1,
            valid: false,
        }
    }

    pub fn value(&self) -> &CellValue {
        &self.value
    }

    pub fn set_value(&mut self, value: impl Into<CellValue>) {
        self.value = value.into();
    }

    pub fn colspan(&self) -> usize {
        self.colspan
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }
}

/// A rectangular region of a sheet.
///
/// `rows` / `cols` of `None` mean "to the end of the sheet", so
/// [`RangePosition::ENTIRE`] addresses the whole sheet without constraining it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangePosition {
    pub row: usize,
    pub col: usize,
    #[serde(default)]
    pub rows: Option<usize>,
    #[serde(default)]
    pub cols: Option<usize>,
}

impl RangePosition {
    /// The whole sheet, unconstrained.
    pub const ENTIRE: RangePosition = RangePosition {
        row: 0,
        col: 0,
        rows: None,
        cols: None,
    };

    /// A fully bounded region.
    pub fn new(row: usize, col: usize, rows: usize, cols: usize) -> Self {
        Self {
            row,
            col,
            rows: Some(rows),
            cols: Some(cols),
        }
    }

    /// Everything from `row` downward, all columns.
    pub fn from_row(row: usize) -> Self {
        Self {
            row,
            ..Self::ENTIRE
        }
    }

    pub fn is_entire(&self) -> bool {
        *self == Self::ENTIRE
    }

    /// Exclusive end row, if the row extent is bounded.
    pub fn end_row(&self) -> Option<usize> {
        self.rows.map(|rows| self.row + rows)
    }

    /// Exclusive end column, if the column extent is bounded.
    pub fn end_col(&self) -> Option<usize> {
        self.cols.map(|cols| self.col + cols)
    }

    /// Clamp the region to a sheet of `row_count` x `column_count`, resolving open
    /// extents to the sheet edge. The result may be empty.
    pub fn fit_to(&self, row_count: usize, column_count: usize) -> RangePosition {
        let row = self.row.min(row_count);
        let col = self.col.min(column_count);
        let end_row = self.end_row().unwrap_or(row_count).min(row_count);
        let end_col = self.end_col().unwrap_or(column_count).min(column_count);
        RangePosition::new(
            row,
            col,
            end_row.saturating_sub(row),
            end_col.saturating_sub(col),
        )
    }
}

impl Default for RangePosition {
    fn default() -> Self {
        Self::ENTIRE
    }
}

impl fmt::Display for RangePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let extent = |n: Option<usize>| n.map_or_else(|| "*".to_string(), |n| n.to_string());
        write!(
            f,
            "({}, {}) {}x{}",
            self.row,
            self.col,
            extent(self.rows),
            extent(self.cols)
        )
    }
}
