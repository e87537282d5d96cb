//! Data preprocessing module
//!
//! Provides the feature-engineering stage:
//! - Dropping incomplete rows
//! - Derived balance and purchase ratios
//! - Stratified train/test partitioning
//! - Standard scaling fitted on the train partition only

mod features;
mod scaler;
mod split;

pub use features::{
    FeatureEngineer, FeatureMatrix, PreprocessedData, BALANCE_TO_CREDIT_RATIO, FEATURE_COLUMNS,
    PURCHASES_PER_TRANSACTION,
};
pub use scaler::StandardScaler;
pub use split::{stratified_split, TrainTestSplit};
