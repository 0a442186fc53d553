//! Error types for exploration sessions
//!
//! Three categories, kept apart so callers can tell them apart:
//! - Caller bugs: an operation invoked in a state that does not allow it
//! - Configuration problems
//! - Ranking oracle failures (recovered locally, surfaced as warnings)
//!
//! Absent references and missing paths are not errors at all; they are
//! empty results.

use std::path::PathBuf;

/// Main session error type
#[derive(Debug, thiserror::Error)]
pub enum ExplorerError {
    /// Operation invoked in a state that does not allow it
    #[error("{operation} requires {required} (found {actual})")]
    PreconditionNotMet {
        /// Operation name
        operation: &'static str,
        /// What the operation needs
        required: &'static str,
        /// What the session had
        actual: String,
    },

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl ExplorerError {
    /// Check if this is a precondition failure
    #[inline]
    #[must_use]
    pub fn is_precondition(&self) -> bool {
        matches!(self, Self::PreconditionNotMet { .. })
    }

    #[inline]
    pub(crate) fn precondition(
        operation: &'static str,
        required: &'static str,
        actual: impl Into<String>,
    ) -> Self {
        Self::PreconditionNotMet {
            operation,
            required,
            actual: actual.into(),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("cannot read {path}: {source}")]
    Io {
        /// File path
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// Config text is not valid TOML for this schema
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range
    #[error("invalid value: {0}")]
    Invalid(String),
}

/// Ranking oracle failures
///
/// Never fatal: the session falls back to the first enumerated candidate
/// and reports the failure alongside the result.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OracleError {
    /// Oracle could not be reached
    #[error("ranking oracle unavailable: {0}")]
    Unavailable(String),

    /// Oracle answered with something unusable
    #[error("ranking oracle failed: {0}")]
    Failed(String),

    /// Oracle did not answer in time
    #[error("ranking oracle timed out after {after_ms}ms")]
    Timeout {
        /// Elapsed budget in milliseconds
        after_ms: u64,
    },

    /// Chosen index does not point into the candidate list
    #[error("ranking oracle chose index {index} of {candidates} candidates")]
    InvalidIndex {
        /// Index returned by the oracle
        index: i64,
        /// Number of candidates offered
        candidates: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precondition_display() {
        let err = ExplorerError::precondition(
            "request_shortest_path",
            "exactly 2 selected nodes",
            "1 selected",
        );
        assert!(err.is_precondition());
        assert_eq!(
            err.to_string(),
            "request_shortest_path requires exactly 2 selected nodes (found 1 selected)"
        );
    }

    #[test]
    fn oracle_error_display() {
        let err = OracleError::InvalidIndex { index: 7, candidates: 3 };
        assert!(err.to_string().contains("index 7 of 3"));
        assert!(OracleError::Timeout { after_ms: 250 }.to_string().contains("250ms"));
    }

    #[test]
    fn config_error_is_not_precondition() {
        let err = ExplorerError::from(ConfigError::Invalid("max_path_depth must be > 0".into()));
        assert!(!err.is_precondition());
    }
}
