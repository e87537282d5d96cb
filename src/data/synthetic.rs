//! Synthetic churn labels for datasets that ship without an outcome column

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Draws a binary churn label per row from a logistic function of the balance.
///
/// Higher balances give lower churn probability. Labels depend only on the
/// balances, the seed and the scale, so re-running on the same input yields
/// the same column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SyntheticLabeler {
    pub seed: u64,
    pub scale: f64,
}

impl Default for SyntheticLabeler {
    fn default() -> Self {
        Self {
            seed: 42,
            scale: 5000.0,
        }
    }
}

impl SyntheticLabeler {
    pub fn new(seed: u64, scale: f64) -> Self {
        Self { seed, scale }
    }

    /// `1 / (1 + exp(balance / scale))`, missing balance counted as 0
    pub fn churn_probability(&self, balance: Option<f64>) -> f64 {
        1.0 / (1.0 + (balance.unwrap_or(0.0) / self.scale).exp())
    }

    /// One label per balance, 1.0 when the row's uniform draw falls below its probability
    pub fn generate(&self, balances: &[Option<f64>]) -> Vec<f64> {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        balances
            .iter()
            .map(|&balance| {
                let draw: f64 = rng.gen();
                if draw < self.churn_probability(balance) {
                    1.0
                } else {
                    0.0
                }
            })
            .collect()
    }
}
