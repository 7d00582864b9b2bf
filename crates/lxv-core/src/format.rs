//! LXV line grammar shared by the decoder and the encoder.
//!
//! An LXV stream is a sequence of lines. Lines starting with [`SENTINEL_PREFIX`] carry
//! metadata; every other line is one row of fields joined by the separator character:
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
//! There is no quoting. A field that contains the separator, or a row whose first field
//! begins with `---`, cannot be represented.

use std::borrow::Cow;
use std::path::Path;

/// Prefix shared by all metadata lines.
pub const SENTINEL_PREFIX: &str = "---";

/// Separator declaration: `---sep:<char>`.
pub const SEPARATOR_PREFIX: &str = "---sep:";

/// Sheet boundary: `---sheet:<name>`.
pub const SHEET_PREFIX: &str = "---sheet:";

/// `∤` (U+2224, DOES NOT DIVIDE).
pub const DEFAULT_SEPARATOR: char = '\u{2224}';

pub const FILE_EXTENSION: &str = "lxv";

/// One classified input line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Line<'a> {
    /// `---sep:` followed by the declared separator, `None` when nothing follows.
    Separator(Option<char>),
    /// `---sheet:` followed by the sheet name (possibly empty).
    Sheet(&'a str),
    /// Any other `---` line. Ends a sheet's rows and is otherwise ignored.
    Sentinel(&'a str),
    /// A data row.
    Row(&'a str),
}

/// Classify a line (without its line terminator).
pub fn classify(line: &str) -> Line<'_> {
    if let Some(rest) = line.strip_prefix(SEPARATOR_PREFIX) {
        return Line::Separator(rest.chars().next());
    }
    if let Some(name) = line.strip_prefix(SHEET_PREFIX) {
        return Line::Sheet(name);
    }
    if line.starts_with(SENTINEL_PREFIX) {
        return Line::Sentinel(line);
    }
    Line::Row(line)
}

/// True for any metadata line, recognised or not.
pub fn is_sentinel(line: &str) -> bool {
    line.starts_with(SENTINEL_PREFIX)
}

/// Split a row into `out`, reusing its allocation.
///
/// Interior empty fields are kept so later fields stay in their columns; empty fragments
/// at the end of the line are dropped, which makes trailing empty cells
/// indistinguishable from absent ones. At most `limit` fields are kept.
///
/// Returns the number of fields written.
pub fn split_fields(line: &str, separator: char, limit: Option<usize>, out: &mut Vec<String>) -> usize {
    out.clear();
    let limit = limit.unwrap_or(usize::MAX);
    for field in line.split(separator) {
        if out.len() >= limit {
            break;
        }
        out.push(field.to_string());
    }
    while out.last().is_some_and(|f| f.is_empty()) {
        out.pop();
    }
    out.len()
}

/// Make cell text safe for a single LXV line.
///
/// Carriage returns are removed; newlines and tabs become the two-character sequences
/// `\n` and `\t`. The decoder does not reverse this.
pub fn escape_field(text: &str) -> Cow<'_, str> {
    if !text.contains(['\r', '\n', '\t']) {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len() + 8);
    for ch in text.chars() {
        match ch {
            '\r' => {}
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            _ => out.push(ch),
        }
    }
    Cow::Owned(out)
}

pub fn declaration_line(separator: char) -> String {
    format!("{SEPARATOR_PREFIX}{separator}")
}

/// Sheet boundary line; the name is escaped like a field so it stays on one line.
pub fn sheet_line(name: &str) -> String {
    format!("{SHEET_PREFIX}{}", escape_field(name))
}

/// True when `path` has an `.lxv` extension (any case).
pub fn is_lxv_path(path: impl AsRef<Path>) -> bool {
    path.as_ref()
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(FILE_EXTENSION))
}
