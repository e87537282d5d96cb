//! Feature engineering: cleaning, derived ratios, split and scaling

use super::scaler::StandardScaler;
use super::split::{stratified_split, TrainTestSplit};
use crate::data::{LabeledDataset, BALANCE, CREDIT_LIMIT, PURCHASES, PURCHASES_TRX};
use crate::error::{PipelineError, Result};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, info};

/// Derived `BALANCE / (CREDIT_LIMIT + 1)`
pub const BALANCE_TO_CREDIT_RATIO: &str = "BALANCE_TO_CREDIT_RATIO";
/// Derived `PURCHASES / (PURCHASES_TRX + 1)`
pub const PURCHASES_PER_TRANSACTION: &str = "PURCHASES_PER_TRANSACTION";

/// Model input columns, in matrix order
pub const FEATURE_COLUMNS: [&str; 5] = [
    BALANCE,
    PURCHASES,
    CREDIT_LIMIT,
    BALANCE_TO_CREDIT_RATIO,
    PURCHASES_PER_TRANSACTION,
];

/// Transaction count used when the dataset has no `PURCHASES_TRX` column
const DEFAULT_TRANSACTIONS: f64 = 1.0;

/// Cleaned feature matrix and labels before partitioning
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    pub x: Array2<f64>,
    pub y: Array1<f64>,
    /// Rows removed for missing or non-finite values
    pub n_dropped: usize,
}

/// Everything later stages need: scaled partitions, the fitted scaler and the feature order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreprocessedData {
    pub x_train: Array2<f64>,
    pub x_test: Array2<f64>,
    pub y_train: Array1<f64>,
    pub y_test: Array1<f64>,
    pub scaler: StandardScaler,
    pub feature_names: Vec<String>,
    /// Cleaned-row positions assigned to each partition
    pub split: TrainTestSplit,
}

impl PreprocessedData {
    pub fn n_train(&self) -> usize {
        self.x_train.nrows()
    }

    pub fn n_test(&self) -> usize {
        self.x_test.nrows()
    }

    /// Check that matrices, labels and feature names agree in shape
    pub fn validate(&self) -> Result<()> {
        let n_features = self.feature_names.len();
        for (name, x, y) in [
            ("train", &self.x_train, &self.y_train),
            ("test", &self.x_test, &self.y_test),
        ] {
            if x.ncols() != n_features {
                return Err(PipelineError::ShapeError {
                    expected: format!("{} {} columns", n_features, name),
                    actual: format!("{} columns", x.ncols()),
                });
            }
            if x.nrows() != y.len() {
                return Err(PipelineError::ShapeError {
                    expected: format!("{} {} labels", x.nrows(), name),
                    actual: format!("{} labels", y.len()),
                });
            }
        }
        Ok(())
    }
}

/// Turns a labeled dataset into scaled train/test partitions
#[derive(Debug, Clone)]
pub struct FeatureEngineer {
    test_size: f64,
    random_state: u64,
}

impl Default for FeatureEngineer {
    fn default() -> Self {
        Self {
            test_size: 0.2,
            random_state: 42,
        }
    }
}

impl FeatureEngineer {
    pub fn new(test_size: f64, random_state: u64) -> Self {
        Self {
            test_size,
            random_state,
        }
    }

    /// Drop rows with any missing cell and compute the feature matrix in `FEATURE_COLUMNS` order
    pub fn build_features(&self, dataset: &LabeledDataset) -> Result<FeatureMatrix> {
        let data = dataset.data();
        let balance = data.numeric(BALANCE)?;
        let purchases = data.numeric(PURCHASES)?;
        let credit_limit = data.numeric(CREDIT_LIMIT)?;
        let transactions = if data.has_column(PURCHASES_TRX) {
            Some(data.numeric(PURCHASES_TRX)?)
        } else {
            None
        };
        let labels = dataset.labels()?;
        // any empty cell drops the row, whether or not the column becomes a feature
        let complete = data.complete_rows();

        let n_rows = dataset.n_rows();
        let mut values = Vec::with_capacity(n_rows * FEATURE_COLUMNS.len());
        let mut y = Vec::with_capacity(n_rows);

        for i in 0..n_rows {
            if !complete[i] {
                continue;
            }
            let trx = match transactions {
                Some(col) => col[i],
                None => Some(DEFAULT_TRANSACTIONS),
            };
            let (Some(b), Some(p), Some(c), Some(t), Some(label)) =
                (balance[i], purchases[i], credit_limit[i], trx, labels[i])
            else {
                continue;
            };

            let ratio = b / (c + 1.0);
            let per_trx = p / (t + 1.0);
            if !(ratio.is_finite() && per_trx.is_finite()) {
                continue;
            }

            values.extend_from_slice(&[b, p, c, ratio, per_trx]);
            y.push(label);
        }

        let n_kept = y.len();
        let x = Array2::from_shape_vec((n_kept, FEATURE_COLUMNS.len()), values)?;
        Ok(FeatureMatrix {
            x,
            y: Array1::from_vec(y),
            n_dropped: n_rows - n_kept,
        })
    }

    /// Clean, derive, split and scale
    pub fn transform(&self, dataset: &LabeledDataset) -> Result<PreprocessedData> {
        let features = self.build_features(dataset)?;
        info!(
            rows = features.y.len(),
            dropped = features.n_dropped,
            "Built feature matrix"
        );

        let classes: BTreeSet<i64> = features.y.iter().map(|v| v.round() as i64).collect();
        if classes.len() < 2 {
            return Err(PipelineError::InsufficientData(format!(
                "{} class(es) remain after dropping incomplete rows, need 2",
                classes.len()
            )));
        }

        let y: Vec<f64> = features.y.to_vec();
        let split = stratified_split(&y, self.test_size, self.random_state)?;

        let x_train_raw = features.x.select(Axis(0), &split.train_indices);
        let x_test_raw = features.x.select(Axis(0), &split.test_indices);
        let y_train = features.y.select(Axis(0), &split.train_indices);
        let y_test = features.y.select(Axis(0), &split.test_indices);

        let mut scaler = StandardScaler::new();
        scaler.fit(&x_train_raw)?;
        let x_train = scaler.transform(&x_train_raw)?;
        let x_test = scaler.transform(&x_test_raw)?;

        debug!(
            train = split.train_indices.len(),
            test = split.test_indices.len(),
            "Partitioned and scaled"
        );

        Ok(PreprocessedData {
            x_train,
            x_test,
            y_train,
            y_test,
            scaler,
            feature_names: FEATURE_COLUMNS.iter().map(|s| s.to_string()).collect(),
            split,
        })
    }
}
