//! Error types for edgepick.
//!
//! Library crates use [`EdgepickError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all edgepick operations.
#[derive(Debug, thiserror::Error)]
pub enum EdgepickError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP error during a source fetch.
    #[error("network error: {0}")]
    Network(String),

    /// HTML parsing or table extraction error.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// A source rendered, but yielded too few endpoints to be trusted.
    #[error("source '{source}' extracted too few endpoints: {count} (min {min})")]
    Degraded {
        source: String,
        count: usize,
        min: usize,
    },

    /// Merged total fell below the commit threshold. Nothing is written.
    #[error("merged total {total} below threshold {min}; refusing to overwrite snapshot")]
    Threshold { total: usize, min: usize },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (bad URL, malformed config value, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, EdgepickError>;

impl EdgepickError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = EdgepickError::config("missing sources table");
        assert_eq!(err.to_string(), "config error: missing sources table");

        let err = EdgepickError::Threshold { total: 9, min: 10 };
        assert!(err.to_string().contains("9"));
        assert!(err.to_string().contains("10"));
        assert!(err.to_string().contains("refusing"));
    }

    #[test]
    fn degraded_names_the_source() {
        let err = EdgepickError::Degraded {
            source: "wetest".into(),
            count: 2,
            min: 5,
        };
        assert!(err.to_string().contains("wetest"));
        assert!(err.to_string().contains("2"));
    }
}
