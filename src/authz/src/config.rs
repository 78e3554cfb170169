//! Engine configuration loading
//!
//! Limits are `NonZeroUsize`, so a zero limit is rejected while the
//! document is parsed and cannot be constructed in code.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::Path;

/// Complete engine configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct AuthzConfig {
    #[serde(default)]
    pub graph: GraphConfig,

    #[serde(default)]
    pub evaluator: EvaluatorConfig,
}

/// Resource graph limits
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct GraphConfig {
    /// Deepest name accepted by `ResourceGraph::add`
    #[serde(default = "default_max_depth")]
    pub max_depth: NonZeroUsize,

    /// Most ancestry paths a single segment may resolve to
    #[serde(default = "default_max_resolved_paths")]
    pub max_resolved_paths: NonZeroUsize,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            max_resolved_paths: default_max_resolved_paths(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct EvaluatorConfig {
    /// Emit an info-level event for every decision
    #[serde(default = "default_true")]
    pub log_decisions: bool,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            log_decisions: default_true(),
        }
    }
}

const DEFAULT_MAX_DEPTH: NonZeroUsize = match NonZeroUsize::new(32) {
    Some(n) => n,
    None => panic!("default max_depth is nonzero"),
};

const DEFAULT_MAX_RESOLVED_PATHS: NonZeroUsize = match NonZeroUsize::new(1024) {
    Some(n) => n,
    None => panic!("default max_resolved_paths is nonzero"),
};

fn default_max_depth() -> NonZeroUsize {
    DEFAULT_MAX_DEPTH
}

fn default_max_resolved_paths() -> NonZeroUsize {
    DEFAULT_MAX_RESOLVED_PATHS
}

fn default_true() -> bool {
    true
}

impl AuthzConfig {
    /// Parse a TOML document
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("Failed to parse authorization config")
    }

    /// Load a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml_str(&contents)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }
}
