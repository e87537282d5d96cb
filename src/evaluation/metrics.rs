//! Binary classification metrics

use crate::error::{PipelineError, Result};
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 2×2 confusion matrix; rows are true class 0/1, columns predicted class 0/1
pub type ConfusionMatrix = [[u64; 2]; 2];

fn check_lengths(y_true: &Array1<f64>, other: &Array1<f64>) -> Result<()> {
    if y_true.len() != other.len() {
        return Err(PipelineError::ShapeError {
            expected: format!("{} values", y_true.len()),
            actual: format!("{} values", other.len()),
        });
    }
    if y_true.is_empty() {
        return Err(PipelineError::InsufficientData("no rows to score".to_string()));
    }
    Ok(())
}

fn class_of(value: f64) -> usize {
    usize::from(value > 0.5)
}

/// Fraction of predictions equal to the true label
pub fn accuracy(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<f64> {
    check_lengths(y_true, y_pred)?;
    let correct = y_true
        .iter()
        .zip(y_pred.iter())
        .filter(|(t, p)| (*t - *p).abs() < 0.5)
        .count();
    Ok(correct as f64 / y_true.len() as f64)
}

/// Counts of (true, predicted) class pairs
pub fn confusion_matrix(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<ConfusionMatrix> {
    check_lengths(y_true, y_pred)?;
    let mut matrix = [[0u64; 2]; 2];
    for (&t, &p) in y_true.iter().zip(y_pred.iter()) {
        matrix[class_of(t)][class_of(p)] += 1;
    }
    Ok(matrix)
}

/// Area under the ROC curve for positive-class scores.
///
/// Computed as the Mann-Whitney U statistic with average ranks for tied
/// scores. Needs both classes present in `y_true`.
pub fn roc_auc(y_true: &Array1<f64>, scores: &Array1<f64>) -> Result<f64> {
    check_lengths(y_true, scores)?;

    let n_pos = y_true.iter().filter(|&&t| class_of(t) == 1).count();
    let n_neg = y_true.len() - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return Err(PipelineError::InsufficientData(
            "ROC AUC is undefined when only one class is present".to_string(),
        ));
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));

    let mut pos_rank_sum = 0.0;
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && scores[order[end]] == scores[order[start]] {
            end += 1;
        }
        // ranks are 1-based; tied block shares the mean rank
        let avg_rank = (start + 1 + end) as f64 / 2.0;
        let positives = order[start..end]
            .iter()
            .filter(|&&i| class_of(y_true[i]) == 1)
            .count();
        pos_rank_sum += avg_rank * positives as f64;
        start = end;
    }

    let n_pos = n_pos as f64;
    let u = pos_rank_sum - n_pos * (n_pos + 1.0) / 2.0;
    Ok(u / (n_pos * n_neg as f64))
}

/// Precision, recall and F1 for one class
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub support: u64,
}

impl ClassMetrics {
    fn from_counts(tp: u64, fp: u64, fn_: u64) -> Self {
        let precision = if tp + fp > 0 {
            tp as f64 / (tp + fp) as f64
        } else {
            0.0
        };
        let recall = if tp + fn_ > 0 {
            tp as f64 / (tp + fn_) as f64
        } else {
            0.0
        };
        let f1_score = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };
        Self {
            precision,
            recall,
            f1_score,
            support: tp + fn_,
        }
    }
}

/// Per-class breakdown with macro and support-weighted averages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub classes: [ClassMetrics; 2],
    pub accuracy: f64,
    pub macro_avg: ClassMetrics,
    pub weighted_avg: ClassMetrics,
}

impl ClassificationReport {
    pub fn from_confusion(matrix: &ConfusionMatrix) -> Self {
        let total: u64 = matrix.iter().flatten().sum();
        let classes = [0, 1].map(|c| {
            let other = 1 - c;
            ClassMetrics::from_counts(matrix[c][c], matrix[other][c], matrix[c][other])
        });

        let average = |weights: [f64; 2]| ClassMetrics {
            precision: classes[0].precision * weights[0] + classes[1].precision * weights[1],
            recall: classes[0].recall * weights[0] + classes[1].recall * weights[1],
            f1_score: classes[0].f1_score * weights[0] + classes[1].f1_score * weights[1],
            support: total,
        };
        let weighted = if total > 0 {
            [
                classes[0].support as f64 / total as f64,
                classes[1].support as f64 / total as f64,
            ]
        } else {
            [0.0, 0.0]
        };

        let macro_avg = average([0.5, 0.5]);
        let weighted_avg = average(weighted);

        let correct = matrix[0][0] + matrix[1][1];
        Self {
            classes,
            accuracy: if total > 0 {
                correct as f64 / total as f64
            } else {
                0.0
            },
            macro_avg,
            weighted_avg,
        }
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:>14} {:>10} {:>10} {:>10} {:>10}", "", "precision", "recall", "f1-score", "support")?;
        for (label, m) in self.classes.iter().enumerate() {
            writeln!(
                f,
                "{:>14} {:>10.2} {:>10.2} {:>10.2} {:>10}",
                label, m.precision, m.recall, m.f1_score, m.support
            )?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:>14} {:>10} {:>10} {:>10.2} {:>10}",
            "accuracy", "", "", self.accuracy, self.macro_avg.support
        )?;
        for (label, m) in [("macro avg", &self.macro_avg), ("weighted avg", &self.weighted_avg)] {
            writeln!(
                f,
                "{:>14} {:>10.2} {:>10.2} {:>10.2} {:>10}",
                label, m.precision, m.recall, m.f1_score, m.support
            )?;
        }
        Ok(())
    }
}
