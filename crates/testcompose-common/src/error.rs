//! Unified error types for the testcompose workspace.
//!
//! Configuration errors are raised before any runtime call is made.
//! Runtime-origin errors are split into [`TestcomposeError::NotFound`] and
//! [`TestcomposeError::Transport`] so callers can react to a missing
//! image or container without string matching.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum TestcomposeError {
    /// An I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A container specification value is malformed.
    #[error("invalid configuration: {message}")]
    Config {
        /// Description of the invalid configuration.
        message: String,
    },

    /// The runtime reported that a resource does not exist.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Type of the missing resource.
        kind: &'static str,
        /// Identifier of the missing resource.
        id: String,
    },

    /// A container did not become ready before its deadline.
    #[error(
        "container {container} did not emit logs satisfying predicate in {:.3} seconds (waited {elapsed_ms} ms)",
        seconds(.timeout_ms)
    )]
    Timeout {
        /// Human-readable container name.
        container: String,
        /// Configured wait timeout in milliseconds.
        timeout_ms: u64,
        /// Time actually spent waiting in milliseconds.
        elapsed_ms: u64,
    },

    /// The runtime call failed for a reason other than a missing resource.
    #[error("runtime error: {message}")]
    Transport {
        /// Description reported by the runtime client.
        message: String,
    },

    /// A specification file could not be parsed.
    #[error("serialization error: {message}")]
    Serialization {
        /// Parser error description.
        message: String,
    },
}

impl TestcomposeError {
    /// Shorthand for a [`TestcomposeError::Config`] error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Returns whether this error reports a missing resource.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<serde_json::Error> for TestcomposeError {
    fn from(source: serde_json::Error) -> Self {
        Self::Serialization {
            message: source.to_string(),
        }
    }
}

impl From<serde_yaml::Error> for TestcomposeError {
    fn from(source: serde_yaml::Error) -> Self {
        Self::Serialization {
            message: source.to_string(),
        }
    }
}

#[allow(clippy::cast_precision_loss, clippy::trivially_copy_pass_by_ref)]
fn seconds(ms: &u64) -> f64 {
    *ms as f64 / 1000.0
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, TestcomposeError>;
