//! Model training module
//!
//! Provides the model-search stage:
//! - Binary decision trees with per-split feature sampling
//! - Random forests built in parallel from seeded bootstrap samples
//! - Exhaustive grid search selecting by training accuracy

pub mod decision_tree;
pub mod random_forest;
mod search;

pub use decision_tree::{Criterion, DecisionTree, TreeNode};
pub use random_forest::{MaxFeatures, RandomForest};
pub use search::{select_best, CandidateResult, GridSearch, Hyperparameters, ModelCandidate, SearchOutcome};
