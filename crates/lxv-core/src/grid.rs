//! The narrow grid and workbook contracts the decoder and encoder work against.
//!
//! The engine never stores cells itself. A host spreadsheet implements [`Grid`] for its
//! sheets and [`Workbook`] for its sheet collection; [`crate::memory`] provides a
//! self-contained implementation.

use crate::error::Result;
use crate::types::{Cell, RangePosition};
use std::ops::{Deref, DerefMut};

/// One sheet: a growable 2-D grid of cells addressed by 0-based `(row, col)`.
pub trait Grid {
    fn name(&self) -> &str;

    /// The cell at `(row, col)`. `None` means "empty".
    fn cell(&self, row: usize, col: usize) -> Option<&Cell>;

    /// Bulk-assign text to the `rows` x `cols` block starting at `(row, col)`.
    ///
    /// `data[i]` holds the fields of row `row + i`; rows shorter than `cols` leave the
    /// remaining cells untouched and empty fields clear their cell.
    fn set_range_data(
        &mut self,
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
        data: &[Vec<String>],
    ) -> Result<()>;

    fn append_rows(&mut self, count: usize);

    fn set_column_count(&mut self, count: usize);

    fn row_count(&self) -> usize;

    fn column_count(&self) -> usize;

    /// Stop emitting per-write change notifications. Calls nest.
    fn suspend_change_notifications(&mut self);

    /// Undo one [`Grid::suspend_change_notifications`].
    fn resume_change_notifications(&mut self);

    /// Emit one aggregate "range changed" notification.
    fn raise_range_changed(&mut self, range: RangePosition);

    /// Remove every cell. The decoder calls this on each sheet it adds, before loading it.
    fn clear(&mut self);
}

/// An ordered collection of sheets.
pub trait Workbook {
    type Sheet: Grid;

    /// Remove every sheet.
    fn clear(&mut self);

    /// Construct a sheet called `name`, append it and return it.
    fn add_sheet(&mut self, name: &str) -> &mut Self::Sheet;

    fn sheet_count(&self) -> usize;

    fn sheet(&self, index: usize) -> Option<&Self::Sheet>;
}

/// Keeps a grid's change notifications suspended for as long as it lives.
///
/// Dropping the guard resumes notifications, on early returns and `?` propagation
/// as much as on normal completion.
pub struct SuspendedNotifications<'a, G: Grid + ?Sized> {
    grid: &'a mut G,
}

impl<'a, G: Grid + ?Sized> SuspendedNotifications<'a, G> {
    pub fn new(grid: &'a mut G) -> Self {
        grid.suspend_change_notifications();
        Self { grid }
    }
}

impl<G: Grid + ?Sized> Deref for SuspendedNotifications<'_, G> {
    type Target = G;

    fn deref(&self) -> &G {
        self.grid
    }
}

impl<G: Grid + ?Sized> DerefMut for SuspendedNotifications<'_, G> {
    fn deref_mut(&mut self) -> &mut G {
        self.grid
    }
}

impl<G: Grid + ?Sized> Drop for SuspendedNotifications<'_, G> {
    fn drop(&mut self) {
        self.grid.resume_change_notifications();
    }
}
