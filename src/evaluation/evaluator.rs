//! Scores a stored model against the held-out partition

use super::metrics::{accuracy, confusion_matrix, roc_auc, ClassificationReport, ConfusionMatrix};
use crate::error::{PipelineError, Result};
use crate::export::ModelArtifact;
use crate::preprocessing::PreprocessedData;
use crate::training::CandidateResult;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

/// Final metrics of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub test_accuracy: f64,
    pub roc_auc: f64,
    /// Importance per feature name
    pub feature_importance: BTreeMap<String, f64>,
    /// Rows are true class 0/1, columns predicted class 0/1
    pub confusion_matrix: ConfusionMatrix,
    /// Grid search scores, unchanged
    pub training_results: Vec<CandidateResult>,
}

impl EvaluationReport {
    /// Importances sorted from most to least important
    pub fn ranked_importances(&self) -> Vec<(&str, f64)> {
        let mut ranked: Vec<(&str, f64)> = self
            .feature_importance
            .iter()
            .map(|(name, &v)| (name.as_str(), v))
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked
    }

    /// Number of test rows the confusion matrix covers
    pub fn n_scored(&self) -> u64 {
        self.confusion_matrix.iter().flatten().sum()
    }
}

pub struct Evaluator<'a> {
    artifact: &'a ModelArtifact,
}

impl<'a> Evaluator<'a> {
    pub fn new(artifact: &'a ModelArtifact) -> Self {
        Self { artifact }
    }

    /// The test matrix must have the artifact's columns in the artifact's order
    fn check_compatible(&self, data: &PreprocessedData) -> Result<()> {
        let expected = self.artifact.feature_names.len();
        if data.x_test.ncols() != expected {
            return Err(PipelineError::EvaluationDataMismatch(format!(
                "test matrix has {} columns, model expects {}",
                data.x_test.ncols(),
                expected
            )));
        }
        if data.feature_names != self.artifact.feature_names {
            return Err(PipelineError::EvaluationDataMismatch(format!(
                "feature order {:?} differs from model's {:?}",
                data.feature_names, self.artifact.feature_names
            )));
        }
        if data.x_test.nrows() != data.y_test.len() {
            return Err(PipelineError::EvaluationDataMismatch(format!(
                "{} test rows but {} labels",
                data.x_test.nrows(),
                data.y_test.len()
            )));
        }
        Ok(())
    }

    pub fn evaluate(
        &self,
        data: &PreprocessedData,
        training_results: Vec<CandidateResult>,
    ) -> Result<EvaluationReport> {
        self.check_compatible(data)?;

        let model = &self.artifact.model;
        let y_pred = model.predict(&data.x_test)?;
        let y_proba = model.predict_positive_proba(&data.x_test)?;

        let test_accuracy = accuracy(&data.y_test, &y_pred)?;
        let roc_auc = roc_auc(&data.y_test, &y_proba)?;
        let confusion_matrix = confusion_matrix(&data.y_test, &y_pred)?;

        let importances = model.feature_importances().ok_or(PipelineError::ModelNotFitted)?;
        let feature_importance = self
            .artifact
            .feature_names
            .iter()
            .cloned()
            .zip(importances.iter().copied())
            .collect();

        let report = EvaluationReport {
            test_accuracy,
            roc_auc,
            feature_importance,
            confusion_matrix,
            training_results,
        };

        info!(test_rows = data.n_test(), "Test accuracy: {:.4}", report.test_accuracy);
        info!("ROC AUC: {:.4}", report.roc_auc);
        for (name, importance) in report.ranked_importances() {
            info!(feature = name, importance, "Feature importance");
        }
        info!(
            "Confusion matrix: [[{}, {}], [{}, {}]]",
            confusion_matrix[0][0], confusion_matrix[0][1], confusion_matrix[1][0], confusion_matrix[1][1]
        );
        info!("Classification report:\n{}", ClassificationReport::from_confusion(&confusion_matrix));

        Ok(report)
    }

    /// Per-class precision, recall and F1 on the test partition
    pub fn classification_report(&self, data: &PreprocessedData) -> Result<ClassificationReport> {
        self.check_compatible(data)?;
        let y_pred = self.artifact.model.predict(&data.x_test)?;
        let matrix = confusion_matrix(&data.y_test, &y_pred)?;
        Ok(ClassificationReport::from_confusion(&matrix))
    }
}
