//! Error types for LXV decoding and encoding operations.

use thiserror::Error;

/// Errors that can occur while decoding or encoding an LXV stream.
///
/// Grammar leniency is not represented here: unknown sentinel lines, a missing
/// separator declaration or an empty sheet name are accepted silently.
#[derive(Error, Debug)]
pub enum LxvError {
    /// The format configuration was rejected before any I/O took place.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// The target range does not describe a usable region.
    #[error("Invalid range: {0}")]
    InvalidRange(String),

    /// The underlying stream failed to read or write.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A grid refused a bulk write that does not fit inside its current extent.
    #[error("Range write out of bounds: {rows}x{cols} at ({row}, {col})")]
    OutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },
}

/// Convenience alias used throughout lxv-core.
pub type Result<T> = std::result::Result<T, LxvError>;
