//! Error types for interplot operations.
//!
//! Dispatch and rendering degrade instead of failing: untranslatable points are
//! dropped, empty batches are suppressed, unknown datasets are skipped and
//! undefined values split paths. The variants below cover the operations that
//! can legitimately fail (layout, configuration, file output, surfaced
//! callback failures).

use std::io;
use thiserror::Error;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in interplot operations.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error (file operations, etc.).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Invalid dimensions for a plot layout.
    #[error("Invalid dimensions: {width}x{height}")]
    InvalidDimensions {
        /// Width value.
        width: u32,
        /// Height value.
        height: u32,
    },

    /// Scale domain error (e.g., empty ordinal domain).
    #[error("Scale domain error: {0}")]
    ScaleDomain(String),

    /// Color parsing error.
    #[error("Invalid color: {0}")]
    InvalidColor(String),

    /// Configuration parsing error with line number.
    #[error("configuration error at line {line}: {message}")]
    ConfigParse {
        /// Line number where the error occurred (1-indexed, 0 if unknown).
        line: usize,
        /// Error message describing the issue.
        message: String,
    },

    /// Invalid configuration value.
    #[error("invalid configuration value for '{key}': {message}")]
    ConfigInvalid {
        /// The configuration key with invalid value.
        key: String,
        /// Error message describing why the value is invalid.
        message: String,
    },

    /// One or more callbacks failed during a broadcast.
    #[error("{failed} callback(s) failed during broadcast, first: {first}")]
    Broadcast {
        /// Number of failed callbacks.
        failed: usize,
        /// Message of the first failure, in invocation order.
        first: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidDimensions { width: 0, height: 100 };
        assert!(err.to_string().contains("Invalid dimensions"));
    }

    #[test]
    fn test_config_parse_display_has_line() {
        let err = Error::ConfigParse { line: 7, message: "bad".to_string() };
        assert!(err.to_string().contains("line 7"));
    }

    #[test]
    fn test_broadcast_display() {
        let err = Error::Broadcast { failed: 2, first: "boom".to_string() };
        let text = err.to_string();
        assert!(text.contains('2'));
        assert!(text.contains("boom"));
    }

    #[test]
    fn test_io_from() {
        let err: Error = io::Error::new(io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(err, Error::Io(_)));
    }
}
