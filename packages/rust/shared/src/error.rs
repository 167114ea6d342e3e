//! Error types for chatblog.
//!
//! Library crates use [`ChatBlogError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all chatblog operations.
#[derive(Debug, thiserror::Error)]
pub enum ChatBlogError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Transport-level HTTP error.
    #[error("network error: {0}")]
    Network(String),

    /// The chat platform rejected the request (missing channel, wrong type, bad status).
    #[error("message source error: {0}")]
    Source(String),

    /// Malformed input (JSON batch, API payload, front matter).
    #[error("parse error: {message}")]
    Parse { message: String },

    /// AI polishing failed. Never fatal; callers fall back to the original text.
    #[error("polish error: {0}")]
    Polish(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (broken invariant, invalid value).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// Front matter or index serialization error.
    #[error("render error: {0}")]
    Render(String),
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ChatBlogError>;

impl ChatBlogError {
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
