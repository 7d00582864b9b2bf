//! `lxv` CLI: convert, slice and inspect LXV workbooks from the command line.
//!
//! ## Usage
//!
//! ```sh
//! # Decode LXV to pretty-printed JSON (stdin → stdout)
//! cat book.lxv | lxv to-json
//!
//! # Build an LXV file from JSON
//! lxv from-json -i book.json -o book.lxv
//!
//! # Export one sheet from row 1 down, skipping a header row
//! lxv slice -i book.lxv --sheet Orders --start-row 1
//!
//! # Read a Shift_JIS file with a custom separator
//! lxv to-json -i legacy.lxv --encoding shift_jis --separator '|'
//!
//! # Per-sheet sizes
//! lxv stats -i book.lxv
//! ```
//!
//! Logging goes to stderr and follows `RUST_LOG` (default `warn`); `--verbose` turns on
//! debug output from the decoder and encoder.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use encoding_rs::Encoding;
use lxv_core::{format, CellValue, FormatConfig, Grid, MemorySheet, MemoryWorkbook, RangePosition};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(
    name = "lxv",
    version,
    about = "LXV (multi-sheet delimiter-separated text) CLI"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    format: FormatArgs,

    /// Log decoder and encoder progress to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Flags shared by every subcommand.
#[derive(Args)]
struct FormatArgs {
    /// Text encoding of LXV input and output (any WHATWG label, e.g. utf-16le, shift_jis)
    #[arg(long, global = true, default_value = "utf-8")]
    encoding: String,

    /// Rows read and written per batch
    #[arg(long, global = true)]
    buffer_lines: Option<usize>,

    /// Do not grow sheets to fit the data; stop at the target range instead
    #[arg(long, global = true)]
    no_auto_spread: bool,

    /// Field separator character
    #[arg(long, global = true)]
    separator: Option<char>,

    /// JSON file holding a format configuration; other flags override it
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode LXV into JSON
    ToJson {
        /// Input LXV file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Output file (writes to stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Encode JSON into LXV
    FromJson {
        /// Input JSON file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Output LXV file (writes to stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Export a range of one sheet as a standalone LXV document
    Slice {
        /// Input LXV file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Output LXV file (writes to stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Sheet to export, by name
        #[arg(long, conflicts_with = "index")]
        sheet: Option<String>,
        /// Sheet to export, by 0-based position
        #[arg(long)]
        index: Option<usize>,
        /// First row of the range
        #[arg(long, default_value_t = 0)]
        start_row: usize,
        /// First column of the range
        #[arg(long, default_value_t = 0)]
        start_col: usize,
        /// Number of rows (to the last used row if omitted)
        #[arg(long)]
        rows: Option<usize>,
        /// Number of columns (to the last used column if omitted)
        #[arg(long)]
        cols: Option<usize>,
    },
    /// Show sheet names and used sizes
    Stats {
        /// Input LXV file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
}

/// JSON shape of a workbook: sheets in order, each a list of rows of cells.
#[derive(Serialize, Deserialize)]
struct JsonWorkbook {
    sheets: Vec<JsonSheet>,
}

#[derive(Serialize, Deserialize)]
struct JsonSheet {
    #[serde(default)]
    name: String,
    /// `null` marks an absent cell.
    #[serde(default)]
    rows: Vec<Vec<Value>>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = cli.format.build_config()?;
    let encoding = cli.format.encoding()?;
    debug!(?config, encoding = encoding.name(), "format settings");

    match cli.command {
        Commands::ToJson { input, output } => {
            let book = read_workbook(input.as_deref(), encoding, &config)?;
            let json = serde_json::to_string_pretty(&workbook_to_json(&book))?;
            write_output(output.as_deref(), &format!("{json}\n"))?;
        }
        Commands::FromJson { input, output } => {
            let text = read_input(input.as_deref())?;
            let json: JsonWorkbook =
                serde_json::from_str(&text).context("Failed to parse workbook JSON")?;
            let book = workbook_from_json(json);
            let writer = open_output(output.as_deref())?;
            lxv_core::encode(&book, writer, encoding, &config)
                .context("Failed to encode workbook to LXV")?;
        }
        Commands::Slice {
            input,
            output,
            sheet,
            index,
            start_row,
            start_col,
            rows,
            cols,
        } => {
            let book = read_workbook(input.as_deref(), encoding, &config)?;
            let selected = select_sheet(&book, sheet.as_deref(), index)?;
            let range = RangePosition {
                row: start_row,
                col: start_col,
                rows,
                cols,
            };
            let writer = open_output(output.as_deref())?;
            lxv_core::encode_range(selected, range, writer, encoding, &config)
                .with_context(|| format!("Failed to export {range} of sheet '{}'", selected.name()))?;
        }
        Commands::Stats { input } => {
            let book = read_workbook(input.as_deref(), encoding, &config)?;
            println!("Sheets:  {}", book.sheets().len());
            for (i, sheet) in book.sheets().iter().enumerate() {
                let (rows, cols) = sheet.used_extent();
                println!("  [{i}] {:?}: {rows} rows x {cols} columns", sheet.name());
            }
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(io::stderr))
        .init();
}

impl FormatArgs {
    /// The config file (if any) with command-line overrides applied.
    fn build_config(&self) -> Result<FormatConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config file: {}", path.display()))?;
                serde_json::from_str(&text)
                    .with_context(|| format!("Failed to parse config file: {}", path.display()))?
            }
            None => FormatConfig::default(),
        };
        if let Some(buffer_lines) = self.buffer_lines {
            config.buffer_lines = buffer_lines;
        }
        if self.no_auto_spread {
            config.auto_spread = false;
        }
        if let Some(separator) = self.separator {
            config.separator = separator;
        }
        config.validate().context("Invalid format configuration")?;
        Ok(config)
    }

    fn encoding(&self) -> Result<&'static Encoding> {
        Encoding::for_label(self.encoding.as_bytes())
            .with_context(|| format!("Unknown encoding label: '{}'", self.encoding))
    }
}

fn read_workbook(
    input: Option<&Path>,
    encoding: &'static Encoding,
    config: &FormatConfig,
) -> Result<MemoryWorkbook> {
    if let Some(path) = input {
        if !format::is_lxv_path(path) {
            warn!(path = %path.display(), "input does not have an .lxv extension, reading it anyway");
        }
    }
    let reader = open_input(input)?;
    let mut book = MemoryWorkbook::new();
    lxv_core::decode(reader, encoding, &mut book, config).context("Failed to decode LXV input")?;
    Ok(book)
}

fn select_sheet<'a>(
    book: &'a MemoryWorkbook,
    name: Option<&str>,
    index: Option<usize>,
) -> Result<&'a MemorySheet> {
    match (name, index) {
        (Some(name), _) => book.sheet_by_name(name).with_context(|| {
            format!(
                "No sheet named '{}'. Available sheets: {:?}",
                name,
                book.sheet_names()
            )
        }),
        (None, index) => {
            let index = index.unwrap_or(0);
            book.sheets().get(index).with_context(|| {
                format!(
                    "No sheet at index {} (the workbook has {} sheets)",
                    index,
                    book.sheets().len()
                )
            })
        }
    }
}

fn workbook_to_json(book: &MemoryWorkbook) -> JsonWorkbook {
    let sheets = book
        .sheets()
        .iter()
        .map(|sheet| {
            let (rows, cols) = sheet.used_extent();
            let rows = (0..rows)
                .map(|r| {
                    (0..cols)
                        .map(|c| {
                            sheet
                                .cell(r, c)
                                .filter(|cell| cell.is_valid())
                                .map_or(Value::Null, |cell| value_to_json(cell.value()))
                        })
                        .collect()
                })
                .collect();
            JsonSheet {
                name: sheet.name().to_string(),
                rows,
            }
        })
        .collect();
    JsonWorkbook { sheets }
}

fn value_to_json(value: &CellValue) -> Value {
    match value {
        CellValue::Text(s) | CellValue::Other(s) => Value::String(s.clone()),
        CellValue::Number(n) => serde_json::Number::from_f64(*n)
            .map_or_else(|| Value::String(value.to_text().into_owned()), Value::Number),
        CellValue::Bool(b) => Value::Bool(*b),
    }
}

fn workbook_from_json(json: JsonWorkbook) -> MemoryWorkbook {
    let mut book = MemoryWorkbook::new();
    for sheet in json.sheets {
        // sized to the JSON so the LXV output carries exactly its rows
        let width = sheet.rows.iter().map(Vec::len).max().unwrap_or(0);
        let mut out = MemorySheet::with_size(&sheet.name, sheet.rows.len(), width);
        for (r, row) in sheet.rows.into_iter().enumerate() {
            for (c, value) in row.into_iter().enumerate() {
                if let Some(value) = json_to_value(value) {
                    out.set_value(r, c, value);
                }
            }
        }
        book.push(out);
    }
    book
}

/// `null` is an absent cell; arrays and objects are kept as their JSON text.
fn json_to_value(value: Value) -> Option<CellValue> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(CellValue::Text(s)),
        Value::Bool(b) => Some(CellValue::Bool(b)),
        Value::Number(n) => Some(match n.as_f64() {
            Some(f) => CellValue::Number(f),
            None => CellValue::Other(n.to_string()),
        }),
        other => Some(CellValue::Other(other.to_string())),
    }
}

fn open_input(path: Option<&Path>) -> Result<Box<dyn Read>> {
    match path {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("Failed to open file: {}", path.display()))?;
            Ok(Box::new(file))
        }
        None => Ok(Box::new(io::stdin().lock())),
    }
}

fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    match path {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create file: {}", path.display()))?;
            Ok(Box::new(file))
        }
        None => Ok(Box::new(io::stdout().lock())),
    }
}

fn read_input(path: Option<&Path>) -> Result<String> {
    let mut buf = String::new();
    open_input(path)?
        .read_to_string(&mut buf)
        .context("Failed to read input")?;
    Ok(buf)
}

fn write_output(path: Option<&Path>, content: &str) -> Result<()> {
    let mut out = open_output(path)?;
    out.write_all(content.as_bytes())
        .and_then(|()| out.flush())
        .context("Failed to write output")
}
