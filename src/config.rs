//! Pipeline configuration

use crate::error::{PipelineError, Result};
use crate::training::{Criterion, MaxFeatures};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Hyperparameter grid explored by model search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Forest sizes, iterated in the outer loop
    pub n_estimators: Vec<usize>,
    /// Tree depth limits, iterated in the inner loop
    pub max_depths: Vec<usize>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            n_estimators: vec![50, 100, 200],
            max_depths: vec![5, 10, 15],
        }
    }
}

impl SearchConfig {
    /// Number of grid points
    pub fn n_candidates(&self) -> usize {
        self.n_estimators.len() * self.max_depths.len()
    }
}

/// Settings shared by every forest trained during the search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestConfig {
    /// Minimum samples to split an internal node
    pub min_samples_split: usize,
    /// Minimum samples in a leaf
    pub min_samples_leaf: usize,
    /// Features considered per split
    pub max_features: MaxFeatures,
    /// Bootstrap sampling per tree
    pub bootstrap: bool,
    /// Split quality measure
    pub criterion: Criterion,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: MaxFeatures::Sqrt,
            bootstrap: true,
            criterion: Criterion::Gini,
        }
    }
}

/// Configuration for one train-and-evaluate run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Source CSV file
    pub data_path: PathBuf,
    /// Directory holding model artifacts
    pub model_dir: PathBuf,
    /// Seed for label synthesis, splitting and forest construction
    pub random_state: u64,
    /// Fraction of rows held out for evaluation
    pub test_size: f64,
    /// Divisor applied to BALANCE in the synthetic churn probability
    pub label_scale: f64,
    /// Hyperparameter grid
    pub search: SearchConfig,
    /// Forest settings
    pub forest: ForestConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("data/file.csv"),
            model_dir: PathBuf::from("model"),
            random_state: 42,
            test_size: 0.2,
            label_scale: 5000.0,
            search: SearchConfig::default(),
            forest: ForestConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Create a configuration reading from `data_path`
    pub fn new(data_path: impl Into<PathBuf>) -> Self {
        Self {
            data_path: data_path.into(),
            ..Default::default()
        }
    }

    /// Load a configuration from a JSON file. Missing fields take their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| PipelineError::InvalidParameter {
            name: "config".to_string(),
            value: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Set the model directory
    pub fn with_model_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.model_dir = dir.into();
        self
    }

    /// Set the random seed
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    /// Set the held-out fraction
    pub fn with_test_size(mut self, test_size: f64) -> Self {
        self.test_size = test_size;
        self
    }

    /// Set the hyperparameter grid
    pub fn with_search(mut self, search: SearchConfig) -> Self {
        self.search = search;
        self
    }

    /// Set the forest settings
    pub fn with_forest(mut self, forest: ForestConfig) -> Self {
        self.forest = forest;
        self
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            return Err(invalid("test_size", self.test_size, "must be in (0, 1)"));
        }
        if !(self.label_scale.is_finite() && self.label_scale > 0.0) {
            return Err(invalid("label_scale", self.label_scale, "must be positive"));
        }
        if self.search.n_estimators.is_empty() || self.search.max_depths.is_empty() {
            return Err(invalid("search", self.search.n_candidates(), "grid must not be empty"));
        }
        if let Some(n) = self.search.n_estimators.iter().find(|&&n| n == 0) {
            return Err(invalid("n_estimators", n, "must be at least 1"));
        }
        if let Some(d) = self.search.max_depths.iter().find(|&&d| d == 0) {
            return Err(invalid("max_depth", d, "must be at least 1"));
        }
        if self.forest.min_samples_split < 2 {
            return Err(invalid("min_samples_split", self.forest.min_samples_split, "must be at least 2"));
        }
        if self.forest.min_samples_leaf == 0 {
            return Err(invalid("min_samples_leaf", self.forest.min_samples_leaf, "must be at least 1"));
        }
        Ok(())
    }
}

fn invalid(name: &str, value: impl ToString, reason: &str) -> PipelineError {
    PipelineError::InvalidParameter {
        name: name.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
