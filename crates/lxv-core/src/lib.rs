//! # lxv-core
//!
//! Streaming decoder and encoder for **LXV**, a line-oriented, multi-sheet,
//! delimiter-separated text format for spreadsheet data.
//!
//! LXV has no quoting grammar. Fields are split on one reserved non-ASCII character
//! (`∤` by default) declared at the top of the stream, and sheets are introduced by
//! sentinel lines:
//!
//! ```text
//! ---sep:∤
//! ---sheet:Orders
//! id∤item∤qty
//! 1∤apple∤3
//! ---sheet:Totals
//! apple∤3
//! ```
//!
//! ## Quick start
//!
//! ```rust
//! use lxv_core::{decode_str, encode_to_string, FormatConfig, Grid, MemoryWorkbook};
//!
//! let text = "---sep:∤\n---sheet:Orders\nid∤item\n1∤apple\n";
//! let config = FormatConfig::default();
//!
//! // LXV → workbook
//! let mut book = MemoryWorkbook::new();
//! decode_str(text, &mut book, &config).unwrap();
//! assert_eq!(book.sheet_names(), ["Orders"]);
//!
//! // workbook → LXV: the sheet's remaining rows follow as empty rows
//! let back = encode_to_string(&book, &config).unwrap();
//! assert!(back.starts_with(text));
//! assert_eq!(back.lines().count(), 2 + book.sheets()[0].row_count());
//! ```
//!
//! ## Modules
//!
//! - [`decoder`]: LXV stream → workbook, in fixed-size row batches
//! - [`encoder`]: workbook or sheet range → LXV stream
//! - [`format`]: sentinel lines, field splitting and escaping
//! - [`grid`]: `Grid` / `Workbook` traits the engine reads and writes through
//! - [`memory`]: in-memory `Grid` / `Workbook` implementation
//! - [`config`]: `FormatConfig` (auto-spread, buffer size, target range, separator)
//! - [`text`]: encoded byte stream ⇄ lines
//! - [`lookahead`]: one-line lookahead over a line source
//! - [`types`]: `CellValue`, `Cell`, `RangePosition`
//! - [`error`]: error types

pub mod config;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod format;
pub mod grid;
pub mod lookahead;
pub mod memory;
pub mod text;
pub mod types;

pub use config::{FormatConfig, DEFAULT_BUFFER_LINES};
pub use decoder::{decode, decode_str};
pub use encoder::{encode, encode_range, encode_to_string};
pub use error::LxvError;
pub use grid::{Grid, SuspendedNotifications, Workbook};
pub use memory::{MemorySheet, MemoryWorkbook, SheetEvent};
pub use types::{Cell, CellValue, RangePosition};
