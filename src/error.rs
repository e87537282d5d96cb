//! Error types for the churn pipeline

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Main error type for the pipeline.
///
/// The first five variants are the stage-level failures an orchestrator has to
/// react to. None of them are retried inside the pipeline.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Data unavailable: {0}")]
    DataUnavailable(String),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Persistence failure: {0}")]
    PersistenceFailure(String),

    #[error("Artifact not found: {0}")]
    ArtifactNotFound(String),

    #[error("Evaluation data mismatch: {0}")]
    EvaluationDataMismatch(String),

    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Model not fitted")]
    ModelNotFitted,

    #[error("Invalid parameter: {name} = {value}, {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },
}

impl PipelineError {
    /// Whether this error belongs to the stage-level taxonomy surfaced to an orchestrator
    pub fn is_stage_failure(&self) -> bool {
        matches!(
            self,
            PipelineError::DataUnavailable(_)
                | PipelineError::InsufficientData(_)
                | PipelineError::PersistenceFailure(_)
                | PipelineError::ArtifactNotFound(_)
                | PipelineError::EvaluationDataMismatch(_)
        )
    }
}

impl From<polars::error::PolarsError> for PipelineError {
    fn from(err: polars::error::PolarsError) -> Self {
        PipelineError::DataUnavailable(err.to_string())
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(err: serde_json::Error) -> Self {
        PipelineError::SerializationError(err.to_string())
    }
}

impl From<bincode::Error> for PipelineError {
    fn from(err: bincode::Error) -> Self {
        PipelineError::SerializationError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for PipelineError {
    fn from(err: ndarray::ShapeError) -> Self {
        PipelineError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PipelineError::ArtifactNotFound("churn_model.bin".to_string());
        assert_eq!(err.to_string(), "Artifact not found: churn_model.bin");
    }

    #[test]
    fn test_stage_failure_classification() {
        assert!(PipelineError::InsufficientData("one class".into()).is_stage_failure());
        assert!(!PipelineError::ModelNotFitted.is_stage_failure());
    }

    #[test]
    fn test_error_from_json() {
        let json_err = serde_json::from_str::<u32>("not a number").unwrap_err();
        let err: PipelineError = json_err.into();
        assert!(matches!(err, PipelineError::SerializationError(_)));
    }
}
