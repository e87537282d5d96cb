//! Exhaustive hyperparameter grid search over random forests

use super::random_forest::RandomForest;
use crate::config::{ForestConfig, SearchConfig};
use crate::error::{PipelineError, Result};
use ndarray::{Array1, Array2};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};

/// One point of the search grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Hyperparameters {
    pub n_estimators: usize,
    pub max_depth: usize,
}

impl fmt::Display for Hyperparameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n_estimators={}, max_depth={}", self.n_estimators, self.max_depth)
    }
}

/// Reported score of one grid point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateResult {
    #[serde(flatten)]
    pub hyperparameters: Hyperparameters,
    pub train_accuracy: f64,
}

/// A fitted grid point
#[derive(Debug, Clone)]
pub struct ModelCandidate {
    pub hyperparameters: Hyperparameters,
    pub model: RandomForest,
    pub train_accuracy: f64,
}

impl ModelCandidate {
    pub fn result(&self) -> CandidateResult {
        CandidateResult {
            hyperparameters: self.hyperparameters,
            train_accuracy: self.train_accuracy,
        }
    }
}

/// Winning candidate plus every candidate's score in grid order
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub best: ModelCandidate,
    pub results: Vec<CandidateResult>,
}

/// Keep the highest training accuracy; on ties the earlier candidate wins
pub fn select_best(candidates: impl IntoIterator<Item = ModelCandidate>) -> Option<ModelCandidate> {
    candidates
        .into_iter()
        .reduce(|best, c| if c.train_accuracy > best.train_accuracy { c } else { best })
}

/// Trains one forest per grid point and picks the best by training accuracy.
///
/// Known weakness: scoring on the training partition favors larger, deeper
/// forests since it rewards memorization.
#[derive(Debug, Clone)]
pub struct GridSearch {
    search: SearchConfig,
    forest: ForestConfig,
    random_state: u64,
}

impl GridSearch {
    pub fn new(search: SearchConfig, forest: ForestConfig, random_state: u64) -> Self {
        Self {
            search,
            forest,
            random_state,
        }
    }

    /// Grid points, `n_estimators` in the outer loop and `max_depth` in the inner loop
    pub fn grid(&self) -> Vec<Hyperparameters> {
        self.search
            .n_estimators
            .iter()
            .flat_map(|&n_estimators| {
                self.search.max_depths.iter().map(move |&max_depth| Hyperparameters {
                    n_estimators,
                    max_depth,
                })
            })
            .collect()
    }

    fn build_model(&self, hp: Hyperparameters) -> RandomForest {
        RandomForest::new(hp.n_estimators)
            .with_max_depth(hp.max_depth)
            .with_min_samples_split(self.forest.min_samples_split)
            .with_min_samples_leaf(self.forest.min_samples_leaf)
            .with_max_features(self.forest.max_features)
            .with_bootstrap(self.forest.bootstrap)
            .with_criterion(self.forest.criterion)
            .with_random_state(self.random_state)
    }

    /// Fit and score a single grid point
    pub fn train_candidate(
        &self,
        hp: Hyperparameters,
        x: &Array2<f64>,
        y: &Array1<f64>,
    ) -> Result<ModelCandidate> {
        let mut model = self.build_model(hp);
        model.fit(x, y)?;
        let train_accuracy = model.score(x, y)?;
        debug!(%hp, train_accuracy, "Scored candidate");
        Ok(ModelCandidate {
            hyperparameters: hp,
            model,
            train_accuracy,
        })
    }

    /// Fit every grid point in parallel and reduce to the best one
    pub fn fit(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<SearchOutcome> {
        let grid = self.grid();
        if grid.is_empty() {
            return Err(PipelineError::InvalidParameter {
                name: "search".to_string(),
                value: "[]".to_string(),
                reason: "grid must not be empty".to_string(),
            });
        }

        let candidates: Vec<ModelCandidate> = grid
            .par_iter()
            .map(|&hp| self.train_candidate(hp, x, y))
            .collect::<Result<Vec<_>>>()?;

        let results: Vec<CandidateResult> = candidates.iter().map(ModelCandidate::result).collect();
        let best = select_best(candidates).ok_or(PipelineError::ModelNotFitted)?;

        info!(
            best = %best.hyperparameters,
            candidates = results.len(),
            "Best training accuracy: {:.4}",
            best.train_accuracy
        );

        Ok(SearchOutcome { best, results })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::training::Criterion;
    use ndarray::array;

    fn candidate(n_estimators: usize, max_depth: usize, acc: f64) -> ModelCandidate {
        ModelCandidate {
            hyperparameters: Hyperparameters {
                n_estimators,
                max_depth,
            },
            model: RandomForest::new(n_estimators),
            train_accuracy: acc,
        }
    }

    #[test]
    fn test_grid_order() {
        let search = GridSearch::new(SearchConfig::default(), ForestConfig::default(), 42);
        let grid = search.grid();
        assert_eq!(grid.len(), 9);
        assert_eq!(grid[0], Hyperparameters { n_estimators: 50, max_depth: 5 });
        assert_eq!(grid[1], Hyperparameters { n_estimators: 50, max_depth: 10 });
        assert_eq!(grid[3], Hyperparameters { n_estimators: 100, max_depth: 5 });
        assert_eq!(grid[8], Hyperparameters { n_estimators: 200, max_depth: 15 });
    }

    #[test]
    fn test_select_best_tie_keeps_first() {
        let best = select_best(vec![
            candidate(50, 5, 0.9),
            candidate(50, 10, 0.95),
            candidate(100, 5, 0.95),
            candidate(100, 10, 0.7),
        ])
        .unwrap();
        assert_eq!(best.hyperparameters, Hyperparameters { n_estimators: 50, max_depth: 10 });
    }

    #[test]
    fn test_select_best_all_zero() {
        let best = select_best(vec![candidate(50, 5, 0.0), candidate(50, 10, 0.0)]).unwrap();
        assert_eq!(best.hyperparameters.max_depth, 5);
        assert!(select_best(Vec::<ModelCandidate>::new()).is_none());
    }

    #[test]
    fn test_fit_small_grid() {
        let x = array![[0.0], [0.1], [0.2], [0.3], [1.0], [1.1], [1.2], [1.3]];
        let y = array![0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0];
        let search = GridSearch::new(
            SearchConfig {
                n_estimators: vec![3, 5],
                max_depths: vec![1, 2],
            },
            ForestConfig::default(),
            42,
        );
        let outcome = search.fit(&x, &y).unwrap();
        assert_eq!(outcome.results.len(), 4);
        assert!(outcome
            .results
            .iter()
            .all(|r| (0.0..=1.0).contains(&r.train_accuracy)));
        let best_acc = outcome
            .results
            .iter()
            .map(|r| r.train_accuracy)
            .fold(f64::MIN, f64::max);
        assert_eq!(outcome.best.train_accuracy, best_acc);
    }

    #[test]
    fn test_forest_settings_reach_models() {
        let forest = ForestConfig {
            criterion: Criterion::Entropy,
            bootstrap: false,
            ..ForestConfig::default()
        };
        let search = GridSearch::new(SearchConfig::default(), forest, 7);
        let model = search.build_model(Hyperparameters {
            n_estimators: 50,
            max_depth: 10,
        });
        assert_eq!(model.criterion, Criterion::Entropy);
        assert!(!model.bootstrap);
        assert_eq!(model.max_depth, Some(10));
        assert_eq!(model.random_state, Some(7));
    }

    #[test]
    fn test_result_serializes_flat() {
        let result = candidate(100, 10, 0.5).result();
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["n_estimators"], 100);
        assert_eq!(json["max_depth"], 10);
        assert_eq!(json["train_accuracy"], 0.5);
    }
}
