//! Model evaluation on the held-out partition

mod evaluator;
mod metrics;

pub use evaluator::{EvaluationReport, Evaluator};
pub use metrics::{
    accuracy, confusion_matrix, roc_auc, ClassMetrics, ClassificationReport, ConfusionMatrix,
};
