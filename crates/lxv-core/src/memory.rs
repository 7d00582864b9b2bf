//! In-memory implementation of [`Grid`] and [`Workbook`].
//!
//! Storage is row-major and sparse at the end of each row: a row only holds slots up to
//! its last written column, so a freshly grown 100k-row sheet costs one empty `Vec` per
//! row actually touched. Change notifications are recorded as [`SheetEvent`]s instead of
//! being dispatched, which makes the notification discipline observable.

use crate::error::{LxvError, Result};
use crate::grid::{Grid, Workbook};
use crate::types::{Cell, CellValue, RangePosition};

/// Row count of a newly created sheet.
pub const DEFAULT_ROW_COUNT: usize = 200;

/// Column count of a newly created sheet.
pub const DEFAULT_COLUMN_COUNT: usize = 100;

/// A change notification recorded by [`MemorySheet`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetEvent {
    /// Notifications went from active to suspended.
    Suspended,
    /// Notifications went from suspended back to active.
    Resumed,
    /// A bulk write happened while notifications were active.
    CellsChanged(RangePosition),
    /// An explicit aggregate notification.
    RangeChanged(RangePosition),
}

#[derive(Debug, Clone)]
pub struct MemorySheet {
    name: String,
    rows: Vec<Vec<Option<Cell>>>,
    row_count: usize,
    column_count: usize,
    suspend_depth: usize,
    events: Vec<SheetEvent>,
}

impl MemorySheet {
    pub fn new(name: &str) -> Self {
        Self::with_size(name, DEFAULT_ROW_COUNT, DEFAULT_COLUMN_COUNT)
    }

    pub fn with_size(name: &str, row_count: usize, column_count: usize) -> Self {
        Self {
            name: name.to_string(),
            rows: Vec::new(),
            row_count,
            column_count,
            suspend_depth: 0,
            events: Vec::new(),
        }
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    /// Store a value at `(row, col)`, growing the sheet when the address lies outside it.
    pub fn set_value(&mut self, row: usize, col: usize, value: impl Into<CellValue>) {
        self.put(row, col, Some(Cell::new(value)));
    }

    /// Place `cell` at `(row, col)`. A cell spanning several columns marks the columns
    /// it covers as invalid.
    pub fn set_cell(&mut self, row: usize, col: usize, cell: Cell) {
        let span = cell.colspan();
        self.put(row, col, Some(cell));
        for covered in col + 1..col + span {
            self.put(row, covered, Some(Cell::covered()));
        }
    }

    pub fn remove_cell(&mut self, row: usize, col: usize) {
        if let Some(slot) = self.rows.get_mut(row).and_then(|r| r.get_mut(col)) {
            *slot = None;
        }
    }

    /// Text of the cell at `(row, col)`, if present and valid.
    pub fn text(&self, row: usize, col: usize) -> Option<String> {
        self.cell(row, col)
            .filter(|c| c.is_valid())
            .map(|c| c.value().to_text().into_owned())
    }

    /// Exclusive bounds `(rows, cols)` of all non-blank valid cells.
    pub fn used_extent(&self) -> (usize, usize) {
        let mut rows = 0;
        let mut cols = 0;
        for (r, row) in self.rows.iter().enumerate() {
            for (c, slot) in row.iter().enumerate() {
                if let Some(cell) = slot {
                    if cell.is_valid() && !cell.value().is_blank() {
                        rows = rows.max(r + 1);
                        cols = cols.max(c + 1);
                    }
                }
            }
        }
        (rows, cols)
    }

    pub fn events(&self) -> &[SheetEvent] {
        &self.events
    }

    pub fn take_events(&mut self) -> Vec<SheetEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn notifications_suspended(&self) -> bool {
        self.suspend_depth > 0
    }

    fn put(&mut self, row: usize, col: usize, cell: Option<Cell>) {
        if row >= self.row_count {
            self.row_count = row + 1;
        }
        if col >= self.column_count {
            self.column_count = col + 1;
        }
        if self.rows.len() <= row {
            self.rows.resize_with(row + 1, Vec::new);
        }
        let cells = &mut self.rows[row];
        if cells.len() <= col {
            if cell.is_none() {
                return;
            }
            cells.resize_with(col + 1, || None);
        }
        cells[col] = cell;
    }
}

impl Grid for MemorySheet {
    fn name(&self) -> &str {
        &self.name
    }

    fn cell(&self, row: usize, col: usize) -> Option<&Cell> {
        self.rows.get(row)?.get(col)?.as_ref()
    }

    fn set_range_data(
        &mut self,
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
        data: &[Vec<String>],
    ) -> Result<()> {
        let rows_fit = row.checked_add(rows).is_some_and(|end| end <= self.row_count);
        let cols_fit = col.checked_add(cols).is_some_and(|end| end <= self.column_count);
        if !rows_fit || !cols_fit || data.len() < rows {
            return Err(LxvError::OutOfBounds {
                row,
                col,
                rows,
                cols,
            });
        }

        for (i, fields) in data.iter().take(rows).enumerate() {
            for (j, field) in fields.iter().take(cols).enumerate() {
                let (r, c) = (row + i, col + j);
                // columns hidden under a merged cell keep no data
                if self.cell(r, c).is_some_and(|cell| !cell.is_valid()) {
                    continue;
                }
                if field.is_empty() {
                    self.remove_cell(r, c);
                    continue;
                }
                match self.rows.get_mut(r).and_then(|cells| cells.get_mut(c)) {
                    Some(Some(cell)) => cell.set_value(field.as_str()),
                    _ => self.put(r, c, Some(Cell::new(field.as_str()))),
                }
            }
        }

        if self.suspend_depth == 0 {
            self.events
                .push(SheetEvent::CellsChanged(RangePosition::new(row, col, rows, cols)));
        }
        Ok(())
    }

    fn append_rows(&mut self, count: usize) {
        self.row_count += count;
    }

    fn set_column_count(&mut self, count: usize) {
        self.column_count = count;
        for cells in &mut self.rows {
            cells.truncate(count);
        }
    }

    fn row_count(&self) -> usize {
        self.row_count
    }

    fn column_count(&self) -> usize {
        self.column_count
    }

    fn suspend_change_notifications(&mut self) {
        if self.suspend_depth == 0 {
            self.events.push(SheetEvent::Suspended);
        }
        self.suspend_depth += 1;
    }

    fn resume_change_notifications(&mut self) {
        match self.suspend_depth {
            0 => {}
            1 => {
                self.suspend_depth = 0;
                self.events.push(SheetEvent::Resumed);
            }
            _ => self.suspend_depth -= 1,
        }
    }

    fn raise_range_changed(&mut self, range: RangePosition) {
        self.events.push(SheetEvent::RangeChanged(range));
    }

    fn clear(&mut self) {
        self.rows.clear();
    }
}

/// An ordered list of [`MemorySheet`]s.
#[derive(Debug, Clone)]
pub struct MemoryWorkbook {
    sheets: Vec<MemorySheet>,
    default_rows: usize,
    default_columns: usize,
}

impl MemoryWorkbook {
    pub fn new() -> Self {
        Self::with_sheet_size(DEFAULT_ROW_COUNT, DEFAULT_COLUMN_COUNT)
    }

    /// A workbook whose new sheets start with the given size.
    pub fn with_sheet_size(rows: usize, columns: usize) -> Self {
        Self {
            sheets: Vec::new(),
            default_rows: rows,
            default_columns: columns,
        }
    }

    /// Append an already populated sheet.
    pub fn push(&mut self, sheet: MemorySheet) {
        self.sheets.push(sheet);
    }

    pub fn sheets(&self) -> &[MemorySheet] {
        &self.sheets
    }

    pub fn sheets_mut(&mut self) -> &mut [MemorySheet] {
        &mut self.sheets
    }

    pub fn sheet_by_name(&self, name: &str) -> Option<&MemorySheet> {
        self.sheets.iter().find(|s| s.name() == name)
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name()).collect()
    }
}

impl Default for MemoryWorkbook {
    fn default() -> Self {
        Self::new()
    }
}

impl Workbook for MemoryWorkbook {
    type Sheet = MemorySheet;

    fn clear(&mut self) {
        self.sheets.clear();
    }

    fn add_sheet(&mut self, name: &str) -> &mut MemorySheet {
        self.sheets.push(MemorySheet::with_size(
            name,
            self.default_rows,
            self.default_columns,
        ));
        let last = self.sheets.len() - 1;
        &mut self.sheets[last]
    }

    fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    fn sheet(&self, index: usize) -> Option<&MemorySheet> {
        self.sheets.get(index)
    }
}
