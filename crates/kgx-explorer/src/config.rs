//! Explorer configuration
//!
//! All tunables of a session in one serde value. Defaults match the
//! bounds the engine was designed around; a TOML file may override any
//! subset of them.

use crate::error::ConfigError;
use kgx_graph::{ClusterOptions, PathOptions};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use std::time::Duration;

/// Session configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorerConfig {
    /// Nodes shown when no filter or expansion is active
    pub default_view_limit: usize,
    /// Edge bound for candidate path enumeration
    pub max_path_depth: usize,
    /// Candidates handed to the ranking oracle
    pub max_candidates: usize,
    /// Minimum members for a type cluster to be reported
    pub cluster_min_size: usize,
    /// Minimum relevant-set size before clustering activates
    pub cluster_activation_size: usize,
    /// Budget for one ranking oracle call
    pub oracle_timeout_ms: u64,
    /// Relationship types path search may traverse (all when unset)
    pub traversable_relationship_types: Option<BTreeSet<String>>,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            default_view_limit: kgx_graph::relevance::DEFAULT_VIEW_LIMIT,
            max_path_depth: kgx_graph::paths::DEFAULT_MAX_DEPTH,
            max_candidates: kgx_graph::paths::DEFAULT_MAX_CANDIDATES,
            cluster_min_size: kgx_graph::cluster::DEFAULT_MIN_CLUSTER_SIZE,
            cluster_activation_size: kgx_graph::cluster::DEFAULT_ACTIVATION_SIZE,
            oracle_timeout_ms: 30_000,
            traversable_relationship_types: None,
        }
    }
}

impl ExplorerConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With candidate depth bound
    #[inline]
    #[must_use]
    pub fn with_max_path_depth(mut self, depth: usize) -> Self {
        self.max_path_depth = depth;
        self
    }

    /// With candidate cap
    #[inline]
    #[must_use]
    pub fn with_max_candidates(mut self, cap: usize) -> Self {
        self.max_candidates = cap;
        self
    }

    /// With default view size
    #[inline]
    #[must_use]
    pub fn with_default_view_limit(mut self, limit: usize) -> Self {
        self.default_view_limit = limit;
        self
    }

    /// With oracle timeout
    #[inline]
    #[must_use]
    pub fn with_oracle_timeout(mut self, timeout: Duration) -> Self {
        self.oracle_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Restrict path search to these relationship types
    #[must_use]
    pub fn with_traversable_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.traversable_relationship_types = Some(types.into_iter().map(Into::into).collect());
        self
    }

    /// Parse and validate TOML text
    ///
    /// # Errors
    /// - `ConfigError::Parse` on malformed TOML
    /// - `ConfigError::Invalid` on out-of-range values
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file
    ///
    /// # Errors
    /// `ConfigError::Io` if the file cannot be read, otherwise as
    /// [`ExplorerConfig::from_toml_str`]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "loading explorer config");
        Self::from_toml_str(&text)
    }

    /// Check value ranges
    ///
    /// # Errors
    /// `ConfigError::Invalid` naming the first offending field
    pub fn validate(&self) -> Result<(), ConfigError> {
        let checks = [
            (self.default_view_limit, "default_view_limit"),
            (self.max_path_depth, "max_path_depth"),
            (self.max_candidates, "max_candidates"),
        ];
        for (value, name) in checks {
            if value == 0 {
                return Err(ConfigError::Invalid(format!("{name} must be greater than 0")));
            }
        }
        if self.oracle_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "oracle_timeout_ms must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Path search options derived from this config
    #[must_use]
    pub fn path_options(&self) -> PathOptions {
        PathOptions {
            max_depth: self.max_path_depth,
            max_candidates: self.max_candidates,
            allowed_relationship_types: self.traversable_relationship_types.clone(),
        }
    }

    /// Clustering thresholds derived from this config
    #[must_use]
    pub fn cluster_options(&self) -> ClusterOptions {
        ClusterOptions {
            min_cluster_size: self.cluster_min_size,
            activation_size: self.cluster_activation_size,
        }
    }

    /// Oracle call budget
    #[inline]
    #[must_use]
    pub fn oracle_timeout(&self) -> Duration {
        Duration::from_millis(self.oracle_timeout_ms)
    }
}
