//! Error types for Guidecraft.
//!
//! Library crates use [`GuideError`] via `thiserror`.
//! App crates (cli) wrap this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all Guidecraft operations.
#[derive(Debug, thiserror::Error)]
pub enum GuideError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP error talking to a collaborator.
    #[error("network error: {0}")]
    Network(String),

    /// Malformed payload (JSON, event stream framing, etc.).
    #[error("parse error: {message}")]
    Parse { message: String },

    /// The search provider rejected or failed a query.
    #[error("search error: {0}")]
    Search(String),

    /// The automation agent failed to start or run a task.
    #[error("agent error: {0}")]
    Agent(String),

    /// Run-level pipeline failure (discovery exhaustion, total scrape failure).
    #[error("{0}")]
    Pipeline(String),

    /// The run lifecycle was driven out of order. Always an internal bug.
    #[error("illegal phase transition {from} -> {to}")]
    Transition { from: String, to: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Input validation error (empty topic, missing credential, etc.).
    #[error("{message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, GuideError>;

impl GuideError {
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

    /// Whether this error should be reported before any phase starts.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = GuideError::config("missing endpoint");
        assert_eq!(err.to_string(), "config error: missing endpoint");

        let err = GuideError::validation("Topic is required.");
        assert_eq!(err.to_string(), "Topic is required.");
        assert!(err.is_validation());

        let err = GuideError::Agent("HTTP 502".into());
        assert!(err.to_string().contains("502"));
        assert!(!err.is_validation());

        let err = GuideError::Transition {
            from: "Idle".into(),
            to: "Scraping".into(),
        };
        assert_eq!(err.to_string(), "illegal phase transition Idle -> Scraping");
    }
}
