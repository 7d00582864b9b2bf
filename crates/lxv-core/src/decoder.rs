//! LXV Decoder: reads an LXV stream into a workbook.
//!
//! The decoder walks the stream once, front to back:
//!
//! - An optional leading `---sep:` declaration is consumed.
//! - Each `---sheet:<name>` line appends a new sheet and hands the stream to the row loop.
//! - The row loop fills a fixed-size [`LineBuffer`] with up to `buffer_lines` rows and
//!   writes each batch with a single `set_range_data` call. It stops *before* the next
//!   sentinel line, leaving it in the [`Lookahead`] for the sheet loop.
//!
//! # Key design decisions
//!
//! - **Bounded memory**: at most `buffer_lines` parsed rows are held at a time, and the
//!   buffer's row slots are allocated once per decode and reused for every batch.
//! - **Chunked growth**: with auto-spread the row count is raised to the next multiple
//!   of `buffer_lines`, so a sheet of N rows grows O(N / buffer_lines) times.
//! - **One notification per sheet**: per-write notifications are suspended by a
//!   [`SuspendedNotifications`] guard and a single aggregate range notification follows.
//! - **Lenient grammar**: unknown sentinels are skipped and rows before any sheet
//!   boundary land in an implicit sheet with an empty name.

use crate::config::FormatConfig;
use crate::error::{LxvError, Result};
use crate::format::{self, Line};
use crate::grid::{Grid, SuspendedNotifications, Workbook};
use crate::lookahead::Lookahead;
use crate::text::TextLines;
use crate::types::RangePosition;
use encoding_rs::{Encoding, UTF_8};
use std::io::{self, Read};
use tracing::{debug, debug_span, warn};

/// Decode an LXV stream into `workbook`.
///
/// The workbook is cleared first; on error, sheets appended before the failure remain
/// and should be discarded by the caller.
pub fn decode<R, W>(
    reader: R,
    encoding: &'static Encoding,
    workbook: &mut W,
    config: &FormatConfig,
) -> Result<()>
where
    R: Read,
    W: Workbook + ?Sized,
{
    config.validate()?;
    workbook.clear();
    let mut lines = Lookahead::new(TextLines::new(reader, encoding));
    decode_lines(&mut lines, workbook, config)
}

/// Decode LXV text that is already in memory.
///
/// ```
/// use lxv_core::{decode_str, FormatConfig, MemoryWorkbook};
///
/// let mut book = MemoryWorkbook::new();
/// decode_str("---sep:∤\n---sheet:A\n1∤2\n", &mut book, &FormatConfig::default()).unwrap();
/// assert_eq!(book.sheets()[0].text(0, 1).as_deref(), Some("2"));
/// ```
pub fn decode_str<W>(text: &str, workbook: &mut W, config: &FormatConfig) -> Result<()>
where
    W: Workbook + ?Sized,
{
    decode(text.as_bytes(), UTF_8, workbook, config)
}

/// What the sheet loop does with the line at the head of the stream.
enum Next {
    Sheet(String),
    Implicit,
    Skip,
}

fn decode_lines<I, W>(lines: &mut Lookahead<I>, workbook: &mut W, config: &FormatConfig) -> Result<()>
where
    I: Iterator<Item = io::Result<String>>,
    W: Workbook + ?Sized,
{
    read_declaration(lines, config.separator)?;

    let mut buffer = LineBuffer::new(config.buffer_lines);

    loop {
        let next = match lines.peek()? {
            None => break,
            Some(line) => match format::classify(line) {
                Line::Sheet(name) => Next::Sheet(name.to_string()),
                Line::Row(_) => Next::Implicit,
                Line::Separator(_) | Line::Sentinel(_) => Next::Skip,
            },
        };

        let name = match next {
            Next::Sheet(name) => {
                lines.consume()?;
                name
            }
            Next::Implicit => {
                warn!(
                    line = lines.line_number() + 1,
                    "rows outside any sheet, collecting them into an unnamed sheet"
                );
                String::new()
            }
            Next::Skip => {
                let skipped = lines.consume()?;
                debug!(line = lines.line_number(), ?skipped, "skipping sentinel line");
                continue;
            }
        };

        let sheet = workbook.add_sheet(&name);
        decode_sheet(lines, sheet, config, &mut buffer)?;
    }

    Ok(())
}

/// Consume a leading separator declaration, if there is one.
///
/// The declaration is informational: the configured separator stays active and a
/// different declared one is only reported.
fn read_declaration<I>(lines: &mut Lookahead<I>, separator: char) -> Result<()>
where
    I: Iterator<Item = io::Result<String>>,
{
    let declared = match lines.peek()? {
        Some(line) => match format::classify(line) {
            Line::Separator(declared) => Some(declared),
            _ => None,
        },
        None => None,
    };
    let Some(declared) = declared else {
        debug!("no separator declaration");
        return Ok(());
    };
    lines.consume()?;

    match declared {
        Some(declared) if declared != separator => warn!(
            declared = %declared,
            active = %separator,
            "declared separator differs from the configured one, keeping the configured separator"
        ),
        None => warn!("separator declaration names no character"),
        Some(_) => {}
    }
    Ok(())
}

/// Fixed set of reusable row slots.
struct LineBuffer {
    rows: Vec<Vec<String>>,
    len: usize,
}

impl LineBuffer {
    fn new(capacity: usize) -> Self {
        Self {
            rows: (0..capacity).map(|_| Vec::new()).collect(),
            len: 0,
        }
    }

    fn reset(&mut self) {
        self.len = 0;
    }

    fn len(&self) -> usize {
        self.len
    }

    fn is_full(&self) -> bool {
        self.len == self.rows.len()
    }

    /// Split `line` into the next free slot; returns its field count.
    fn push(&mut self, line: &str, separator: char, limit: Option<usize>) -> usize {
        let count = format::split_fields(line, separator, limit, &mut self.rows[self.len]);
        self.len += 1;
        count
    }

    fn batch(&self) -> &[Vec<String>] {
        &self.rows[..self.len]
    }
}

/// Where a sheet's rows go and how many fit.
struct Limits {
    row: usize,
    col: usize,
    /// `None`: unbounded (auto-spread).
    max_rows: Option<usize>,
    /// `None`: fields are not truncated.
    max_cols: Option<usize>,
}

impl Limits {
    fn resolve(target: &RangePosition, row_count: usize, column_count: usize, auto_spread: bool) -> Self {
        if auto_spread {
            return Self {
                row: target.row,
                col: target.col,
                max_rows: None,
                max_cols: target.cols,
            };
        }
        // without growth everything must fit the sheet as it is
        let fitted = target.fit_to(row_count, column_count);
        let max_cols = fitted.cols.unwrap_or(0);
        let max_rows = if max_cols == 0 { 0 } else { fitted.rows.unwrap_or(0) };
        Self {
            row: target.row,
            col: target.col,
            max_rows: Some(max_rows),
            max_cols: Some(max_cols),
        }
    }
}

#[derive(Debug, Default)]
struct Progress {
    rows: usize,
    max_cols: usize,
    skipped: usize,
}

fn decode_sheet<I, G>(
    lines: &mut Lookahead<I>,
    sheet: &mut G,
    config: &FormatConfig,
    buffer: &mut LineBuffer,
) -> Result<()>
where
    I: Iterator<Item = io::Result<String>>,
    G: Grid + ?Sized,
{
    let _span = debug_span!("decode_sheet", sheet = sheet.name()).entered();

    // a host may hand out sheets with template content
    sheet.clear();

    let limits = Limits::resolve(
        &config.target_range,
        sheet.row_count(),
        sheet.column_count(),
        config.auto_spread,
    );

    let progress = {
        let mut suspended = SuspendedNotifications::new(&mut *sheet);
        read_rows(lines, &mut *suspended, config, &limits, buffer)?
    };

    sheet.raise_range_changed(RangePosition::new(
        limits.row,
        limits.col,
        progress.rows,
        progress.max_cols,
    ));

    debug!(
        rows = progress.rows,
        cols = progress.max_cols,
        skipped = progress.skipped,
        "sheet decoded"
    );
    Ok(())
}

/// The row-buffering loop: batches of rows until the next sentinel or end of stream.
fn read_rows<I, G>(
    lines: &mut Lookahead<I>,
    sheet: &mut G,
    config: &FormatConfig,
    limits: &Limits,
    buffer: &mut LineBuffer,
) -> Result<Progress>
where
    I: Iterator<Item = io::Result<String>>,
    G: Grid + ?Sized,
{
    let mut progress = Progress::default();
    let mut row = limits.row;

    loop {
        buffer.reset();
        let mut finished = false;

        while !buffer.is_full() {
            if limits
                .max_rows
                .is_some_and(|max| progress.rows + buffer.len() >= max)
            {
                finished = true;
                break;
            }
            match lines.next_if(|line| !format::is_sentinel(line))? {
                Some(line) => {
                    let count = buffer.push(&line, config.separator, limits.max_cols);
                    progress.max_cols = progress.max_cols.max(count);
                }
                None => {
                    finished = true;
                    break;
                }
            }
        }

        let count = buffer.len();
        if count > 0 {
            if config.auto_spread {
                let rows_needed = row
                    .checked_add(count)
                    .ok_or_else(|| past_grid(row, limits.col))?;
                let cols_needed = limits
                    .col
                    .checked_add(progress.max_cols)
                    .ok_or_else(|| past_grid(row, limits.col))?;
                grow(sheet, rows_needed, cols_needed, config.buffer_lines)?;
            }
            sheet.set_range_data(row, limits.col, count, progress.max_cols, buffer.batch())?;
            row += count;
            progress.rows += count;
            debug!(rows = count, total = progress.rows, "batch written");
        }

        if finished {
            break;
        }
    }

    if limits.max_rows.is_some_and(|max| progress.rows >= max) {
        while lines.next_if(|line| !format::is_sentinel(line))?.is_some() {
            progress.skipped += 1;
        }
        if progress.skipped > 0 {
            debug!(
                skipped = progress.skipped,
                "target range is full, dropping the rest of the sheet"
            );
        }
    }

    Ok(progress)
}

/// Make room for `rows_needed` rows and `cols_needed` columns.
///
/// Rows grow to the next multiple of `chunk`; columns grow to one past the need.
fn grow<G: Grid + ?Sized>(
    sheet: &mut G,
    rows_needed: usize,
    cols_needed: usize,
    chunk: usize,
) -> Result<()> {
    let row_count = sheet.row_count();
    if rows_needed > row_count {
        let grown = rows_needed
            .div_ceil(chunk)
            .checked_mul(chunk)
            .ok_or_else(|| past_grid(rows_needed, cols_needed))?;
        sheet.append_rows(grown - row_count);
        debug!(from = row_count, to = grown, "rows appended");
    }
    if cols_needed >= sheet.column_count() {
        let grown = cols_needed
            .checked_add(1)
            .ok_or_else(|| past_grid(rows_needed, cols_needed))?;
        sheet.set_column_count(grown);
    }
    Ok(())
}

fn past_grid(row: usize, col: usize) -> LxvError {
    LxvError::InvalidRange(format!("data at ({row}, {col}) runs past the addressable grid"))
}
