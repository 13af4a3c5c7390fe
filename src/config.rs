//! Analysis configuration.
//!
//! Loaded from an optional TOML file; every key has a default, so an empty
//! file (or no file) gives the standard analysis:
//!
//! ```toml
//! [null_model]
//! iterations = 100
//! rewiring_factor = 10
//! max_tries_factor = 10
//! # seed = 1234
//!
//! [community]
//! resolution = 1.0
//! max_iter = 100
//! max_levels = 10
//! seed = 42
//!
//! [report]
//! top_values = 15
//! ```

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub null_model: NullModelConfig,

    #[serde(default)]
    pub community: CommunityConfig,

    #[serde(default)]
    pub report: ReportConfig,
}

/// `[null_model]` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NullModelConfig {
    /// Randomized graphs per ensemble.
    #[serde(default = "default_iterations")]
    pub iterations: usize,

    /// Double edge swaps per edge in each rewired graph.
    #[serde(default = "default_rewiring_factor")]
    pub rewiring_factor: usize,

    /// Candidate draws allowed per requested swap.
    #[serde(default = "default_max_tries_factor")]
    pub max_tries_factor: usize,

    /// Master seed. Unset means a fresh OS-random seed per run.
    #[serde(default)]
    pub seed: Option<u64>,
}

/// `[community]` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunityConfig {
    /// Modularity resolution (gamma).
    #[serde(default = "default_resolution")]
    pub resolution: f64,

    /// Local-moving passes per level.
    #[serde(default = "default_max_iter")]
    pub max_iter: usize,

    /// Aggregation levels.
    #[serde(default = "default_max_levels")]
    pub max_levels: usize,

    /// Seed for the node visiting order.
    #[serde(default = "default_community_seed")]
    pub seed: u64,
}

/// `[report]` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Rows shown in frequency tables and community listings.
    #[serde(default = "default_top_values")]
    pub top_values: usize,
}

// ── defaults ──

fn default_iterations() -> usize {
    100
}
fn default_rewiring_factor() -> usize {
    10
}
fn default_max_tries_factor() -> usize {
    10
}
fn default_resolution() -> f64 {
    1.0
}
fn default_max_iter() -> usize {
    100
}
fn default_max_levels() -> usize {
    10
}
fn default_community_seed() -> u64 {
    42
}
fn default_top_values() -> usize {
    15
}

impl Default for NullModelConfig {
    fn default() -> Self {
        Self {
            iterations: default_iterations(),
            rewiring_factor: default_rewiring_factor(),
            max_tries_factor: default_max_tries_factor(),
            seed: None,
        }
    }
}

impl Default for CommunityConfig {
    fn default() -> Self {
        Self {
            resolution: default_resolution(),
            max_iter: default_max_iter(),
            max_levels: default_max_levels(),
            seed: default_community_seed(),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            top_values: default_top_values(),
        }
    }
}

impl AnalysisConfig {
    /// Parse a TOML document.
    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load from `path`, or the defaults when `path` is `None`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::from_toml(&fs::read_to_string(p)?),
            None => Ok(Self::default()),
        }
    }
}
