//! Format configuration consumed by both the decoder and the encoder.

use crate::error::{LxvError, Result};
use crate::format::DEFAULT_SEPARATOR;
use crate::types::RangePosition;
use serde::{Deserialize, Serialize};

/// Rows read from the stream per batch when nothing else is configured.
pub const DEFAULT_BUFFER_LINES: usize = 512;

/// Parameters for loading and saving LXV.
///
/// Plain data; [`FormatConfig::validate`] is called by the decoder and the encoder
/// before any stream I/O. Deserialises from partial JSON with every missing field
/// taking its default:
///
/// ```
/// use lxv_core::FormatConfig;
/// let config: FormatConfig = serde_json::from_str(r#"{"buffer_lines": 64}"#).unwrap();
/// assert!(config.auto_spread);
/// assert_eq!(config.buffer_lines, 64);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatConfig {
    /// Grow the destination sheet to fit the data instead of stopping at the
    /// target range. Defaults to `true`.
    pub auto_spread: bool,
    /// How many rows are buffered and written to the sheet at a time.
    pub buffer_lines: usize,
    /// Where decoded data is placed on each sheet.
    pub target_range: RangePosition,
    /// Field separator written to and expected in the stream.
    pub separator: char,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            auto_spread: true,
            buffer_lines: DEFAULT_BUFFER_LINES,
            target_range: RangePosition::ENTIRE,
            separator: DEFAULT_SEPARATOR,
        }
    }
}

impl FormatConfig {
    pub fn with_auto_spread(mut self, auto_spread: bool) -> Self {
        self.auto_spread = auto_spread;
        self
    }

    pub fn with_buffer_lines(mut self, buffer_lines: usize) -> Self {
        self.buffer_lines = buffer_lines;
        self
    }

    pub fn with_target_range(mut self, target_range: RangePosition) -> Self {
        self.target_range = target_range;
        self
    }

    pub fn with_separator(mut self, separator: char) -> Self {
        self.separator = separator;
        self
    }

    /// Reject configurations that cannot drive a decode or encode.
    pub fn validate(&self) -> Result<()> {
        if self.buffer_lines == 0 {
            return Err(LxvError::Config(
                "buffer_lines must be greater than zero".to_string(),
            ));
        }
        if matches!(self.separator, '\r' | '\n' | '-') {
            return Err(LxvError::Config(format!(
                "separator {:?} cannot be used as a field delimiter",
                self.separator
            )));
        }
        validate_range(&self.target_range)?;
        // the first batch and the column after the widest row must stay addressable
        let range = &self.target_range;
        if range.row.checked_add(self.buffer_lines).is_none()
            || range.col.checked_add(1).is_none()
        {
            return Err(LxvError::InvalidRange(format!(
                "{range} starts too close to the end of the addressable grid"
            )));
        }
        Ok(())
    }
}

/// A range is usable when its bounded extents are non-empty and its end is addressable.
pub(crate) fn validate_range(range: &RangePosition) -> Result<()> {
    if range.rows == Some(0) || range.cols == Some(0) {
        return Err(LxvError::InvalidRange(format!("{range} has an empty extent")));
    }
    let rows_overflow = range.rows.is_some_and(|rows| range.row.checked_add(rows).is_none());
    let cols_overflow = range.cols.is_some_and(|cols| range.col.checked_add(cols).is_none());
    if rows_overflow || cols_overflow {
        return Err(LxvError::InvalidRange(format!("{range} ends past the addressable grid")));
    }
    Ok(())
}
