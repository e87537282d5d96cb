//! Churn Pipeline - batch churn prediction
//!
//! Four independently invocable stages, sequenced by an external orchestrator:
//!
//! 1. **load** - read the customer dataset, synthesizing a `CHURN` label when absent
//! 2. **preprocess** - derive features, stratified split, standardize on train rows
//! 3. **train** - grid-search random forests, persist the best one
//! 4. **evaluate** - score the stored model on the held-out rows
//!
//! Stages exchange versioned JSON [`export::Blob`]s.
//!
//! # Modules
//!
//! - [`data`] - Raw and labeled datasets, CSV loading, label synthesis
//! - [`preprocessing`] - Feature engineering, splitting, scaling
//! - [`training`] - Decision trees, random forests, grid search
//! - [`export`] - Stage blobs and the model store
//! - [`evaluation`] - Test metrics and reports
//! - [`pipeline`] - The stage functions
//! - [`cli`] - Command-line interface

pub mod error;
pub mod config;

pub mod data;
pub mod preprocessing;
pub mod training;
pub mod export;
pub mod evaluation;
pub mod pipeline;

pub mod utils;
pub mod cli;

pub use error::{PipelineError, Result};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::config::{ForestConfig, PipelineConfig, SearchConfig};
    pub use crate::data::{DataLoader, LabeledDataset, RawDataset, SyntheticLabeler};
    pub use crate::error::{PipelineError, Result};
    pub use crate::evaluation::{ClassificationReport, EvaluationReport, Evaluator};
    pub use crate::export::{Blob, ModelArtifact, ModelStore};
    pub use crate::pipeline::{Pipeline, DEFAULT_ARTIFACT_NAME};
    pub use crate::preprocessing::{FeatureEngineer, PreprocessedData, StandardScaler, FEATURE_COLUMNS};
    pub use crate::training::{
        CandidateResult, GridSearch, Hyperparameters, MaxFeatures, RandomForest,
    };
}
