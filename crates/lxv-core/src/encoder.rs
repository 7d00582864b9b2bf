//! LXV Encoder: writes sheets out as LXV text.
//!
//! Output layout:
//!
//! ```text
//! ---sep:∤          declaration, once
//! ---sheet:<name>   boundary, once per sheet
//! a∤b∤c             one line per row
//! ```
//!
//! Each sheet is scanned in full before its first row is written to find the used
//! extent: the last row holding a non-blank cell and the rightmost column at which a
//! non-blank cell starts. [`encode`] writes every row up to the sheet's row count,
//! empty ones included; [`encode_range`] stops at the last row with content. Every
//! emitted row carries one field per visited column position up to the used extent,
//! so empty cells keep later fields in place. A cell spanning several columns
//! produces one field and moves the cursor past its whole span.
//!
//! There is no quoting. Cell text is passed through [`format::escape_field`] and
//! written verbatim; text containing the separator cannot be decoded back into the
//! same columns and is reported with a warning.

use crate::config::{validate_range, FormatConfig};
use crate::error::{LxvError, Result};
use crate::format;
use crate::grid::{Grid, Workbook};
use crate::text::TextSink;
use crate::types::RangePosition;
use encoding_rs::{Encoding, UTF_8};
use std::io::{self, Write};
use std::ops::Range;
use tracing::{debug, debug_span, warn};

/// Encode every sheet of `workbook`, in order.
///
/// Rows are written up to each sheet's row count, so a sheet keeps its height
/// through a save and load even when its last rows are empty.
pub fn encode<W, B>(
    workbook: &B,
    writer: W,
    encoding: &'static Encoding,
    config: &FormatConfig,
) -> Result<()>
where
    W: Write,
    B: Workbook + ?Sized,
{
    config.validate()?;
    let mut sink = TextSink::new(writer, encoding);
    sink.write_line(&format::declaration_line(config.separator))?;
    for index in 0..workbook.sheet_count() {
        if let Some(sheet) = workbook.sheet(index) {
            encode_sheet(
                sheet,
                &RangePosition::ENTIRE,
                RowEnd::RowCount,
                &mut sink,
                config.separator,
            )?;
        }
    }
    sink.finish()?;
    Ok(())
}

/// Encode one region of one sheet as a single-sheet LXV document.
///
/// Open extents in `range` run to the sheet edge, so `RangePosition::from_row(1)`
/// exports everything below a header row. Column positions in the output are
/// relative to `range.col`.
pub fn encode_range<W, G>(
    sheet: &G,
    range: RangePosition,
    writer: W,
    encoding: &'static Encoding,
    config: &FormatConfig,
) -> Result<()>
where
    W: Write,
    G: Grid + ?Sized,
{
    config.validate()?;
    validate_range(&range)?;
    let mut sink = TextSink::new(writer, encoding);
    sink.write_line(&format::declaration_line(config.separator))?;
    encode_sheet(sheet, &range, RowEnd::LastContent, &mut sink, config.separator)?;
    sink.finish()?;
    Ok(())
}

/// Encode `workbook` to a UTF-8 string.
///
/// ```
/// use lxv_core::{encode_to_string, FormatConfig, MemorySheet, MemoryWorkbook};
///
/// let mut sheet = MemorySheet::with_size("A", 0, 0);
/// sheet.set_value(0, 0, "x");
/// sheet.set_value(0, 1, 2.5);
/// let mut book = MemoryWorkbook::new();
/// book.push(sheet);
///
/// let text = encode_to_string(&book, &FormatConfig::default()).unwrap();
/// assert_eq!(text, "---sep:∤\n---sheet:A\nx∤2.5\n");
/// ```
pub fn encode_to_string<B>(workbook: &B, config: &FormatConfig) -> Result<String>
where
    B: Workbook + ?Sized,
{
    let mut out = Vec::new();
    encode(workbook, &mut out, UTF_8, config)?;
    String::from_utf8(out).map_err(|e| LxvError::Io(io::Error::new(io::ErrorKind::InvalidData, e)))
}

/// Where the rows written for a sheet stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowEnd {
    /// The end of the (fitted) range, normally the sheet's row count.
    RowCount,
    /// One past the last row holding a non-blank cell.
    LastContent,
}

/// Exclusive end of the used region found by the prescan.
struct Extent {
    end_row: usize,
    end_col: usize,
}

fn encode_sheet<G, W>(
    sheet: &G,
    range: &RangePosition,
    row_end: RowEnd,
    sink: &mut TextSink<W>,
    separator: char,
) -> Result<()>
where
    G: Grid + ?Sized,
    W: Write,
{
    let _span = debug_span!("encode_sheet", sheet = sheet.name()).entered();

    let fitted = range.fit_to(sheet.row_count(), sheet.column_count());
    let rows = fitted.row..fitted.end_row().unwrap_or(fitted.row);
    let cols = fitted.col..fitted.end_col().unwrap_or(fitted.col);
    let extent = scan_extent(sheet, rows.clone(), cols.clone());

    let end_row = match row_end {
        RowEnd::RowCount => rows.end,
        RowEnd::LastContent => extent.end_row,
    };

    sink.write_line(&format::sheet_line(sheet.name()))?;

    let mut line = String::new();
    let mut lossy_rows = 0usize;
    for row in rows.start..end_row {
        line.clear();
        let clean = write_row(sheet, row, cols.start..extent.end_col, separator, &mut line);
        if !clean || format::is_sentinel(&line) {
            lossy_rows += 1;
        }
        sink.write_line(&line)?;
    }

    if lossy_rows > 0 {
        warn!(
            rows = lossy_rows,
            "rows contain the separator or start with a sentinel prefix and will not decode back unchanged"
        );
    }
    debug!(
        rows = end_row - rows.start,
        cols = extent.end_col - cols.start,
        "sheet encoded"
    );
    Ok(())
}

/// Full prescan of `rows` x `cols` for the last non-blank row and the rightmost
/// starting column of a non-blank cell.
fn scan_extent<G: Grid + ?Sized>(sheet: &G, rows: Range<usize>, cols: Range<usize>) -> Extent {
    let mut extent = Extent {
        end_row: rows.start,
        end_col: cols.start,
    };
    for row in rows {
        let mut col = cols.start;
        while col < cols.end {
            match sheet.cell(row, col).filter(|cell| cell.is_valid()) {
                None => col += 1,
                Some(cell) => {
                    if !cell.value().is_blank() {
                        extent.end_row = row + 1;
                        extent.end_col = extent.end_col.max(col + 1);
                    }
                    col += cell.colspan();
                }
            }
        }
    }
    extent
}

/// Append one row's fields to `line`. Returns false when a field contains the separator.
fn write_row<G: Grid + ?Sized>(
    sheet: &G,
    row: usize,
    cols: Range<usize>,
    separator: char,
    line: &mut String,
) -> bool {
    let mut clean = true;
    let mut col = cols.start;
    while col < cols.end {
        if col > cols.start {
            line.push(separator);
        }
        match sheet.cell(row, col).filter(|cell| cell.is_valid()) {
            None => col += 1,
            Some(cell) => {
                let text = cell.value().to_text();
                let field = format::escape_field(&text);
                clean &= !field.contains(separator);
                line.push_str(&field);
                col += cell.colspan();
            }
        }
    }
    clean
}
