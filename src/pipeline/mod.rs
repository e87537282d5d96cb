//! The four stage functions an external orchestrator sequences:
//! `load → preprocess → train → evaluate`.
//!
//! Stages talk to each other only through [`Blob`]s and the training results
//! list. The model itself travels through the [`ModelStore`].

use crate::config::PipelineConfig;
use crate::data::{DataLoader, LabeledDataset, SyntheticLabeler};
use crate::error::Result;
use crate::evaluation::{ClassificationReport, EvaluationReport, Evaluator};
use crate::export::{Blob, ModelArtifact, ModelStore};
use crate::preprocessing::{FeatureEngineer, PreprocessedData};
use crate::training::{CandidateResult, GridSearch};
use crate::utils::Timer;
use chrono::Utc;
use std::path::PathBuf;
use tracing::info;

/// Artifact name used when the caller does not pick one
pub const DEFAULT_ARTIFACT_NAME: &str = "churn_model.bin";

#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
    store: ModelStore,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        let store = ModelStore::new(config.model_dir.clone());
        Self { config, store }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn store(&self) -> &ModelStore {
        &self.store
    }

    /// Read the configured dataset and guarantee a `CHURN` label
    pub fn load(&self) -> Result<Blob> {
        let mut timer = Timer::start("load");
        let loader = DataLoader::new(SyntheticLabeler::new(
            self.config.random_state,
            self.config.label_scale,
        ));
        let dataset = loader.load(&self.config.data_path)?;
        timer.checkpoint("read");

        info!(
            path = %self.config.data_path.display(),
            rows = dataset.n_rows(),
            columns = dataset.data().n_columns(),
            synthesized = dataset.label_synthesized,
            "Loaded dataset"
        );

        let blob = Blob::encode(&dataset)?;
        timer.checkpoint("encode");
        timer.stop();
        Ok(blob)
    }

    /// Clean, derive features, split and scale
    pub fn preprocess(&self, blob: &Blob) -> Result<Blob> {
        let timer = Timer::start("preprocess");
        let dataset: LabeledDataset = blob.decode()?;
        let data = FeatureEngineer::new(self.config.test_size, self.config.random_state)
            .transform(&dataset)?;

        info!(
            train = data.n_train(),
            test = data.n_test(),
            features = data.feature_names.len(),
            "Preprocessed dataset"
        );

        let out = Blob::encode(&data)?;
        timer.stop();
        Ok(out)
    }

    /// Grid-search the forest, persist the best one as `artifact_name` and
    /// return every candidate's score in grid order
    pub fn train(&self, blob: &Blob, artifact_name: &str) -> Result<Vec<CandidateResult>> {
        let mut timer = Timer::start("train");
        let data: PreprocessedData = blob.decode()?;
        data.validate()?;

        let search = GridSearch::new(
            self.config.search.clone(),
            self.config.forest.clone(),
            self.config.random_state,
        );
        let outcome = search.fit(&data.x_train, &data.y_train)?;
        timer.checkpoint("search");

        let best = outcome.best;
        let artifact = ModelArtifact {
            model: best.model,
            scaler: data.scaler,
            feature_names: data.feature_names,
            hyperparameters: best.hyperparameters,
            train_accuracy: best.train_accuracy,
            trained_at: Utc::now(),
        };
        let path = self.store.write(&artifact, artifact_name)?;
        timer.checkpoint("persist");

        info!(
            artifact = %path.display(),
            best = %artifact.hyperparameters,
            "Stored best model"
        );
        timer.stop();
        Ok(outcome.results)
    }

    /// Score the stored model on the test partition
    pub fn evaluate(
        &self,
        artifact_name: &str,
        results: Vec<CandidateResult>,
        blob: &Blob,
    ) -> Result<EvaluationReport> {
        let timer = Timer::start("evaluate");
        let artifact = self.store.read(artifact_name)?;
        let data: PreprocessedData = blob.decode()?;
        let report = Evaluator::new(&artifact).evaluate(&data, results)?;
        timer.stop();
        Ok(report)
    }

    /// Per-class breakdown for the stored model on the test partition
    pub fn classification_report(&self, artifact_name: &str, blob: &Blob) -> Result<ClassificationReport> {
        let artifact = self.store.read(artifact_name)?;
        let data: PreprocessedData = blob.decode()?;
        Evaluator::new(&artifact).classification_report(&data)
    }

    /// All four stages once, in order
    pub fn run(&self, artifact_name: &str) -> Result<EvaluationReport> {
        let raw = self.load()?;
        let prepared = self.preprocess(&raw)?;
        let results = self.train(&prepared, artifact_name)?;
        self.evaluate(artifact_name, results, &prepared)
    }

    /// Where `artifact_name` is stored, if the name is valid
    pub fn artifact_path(&self, artifact_name: &str) -> Option<PathBuf> {
        self.store.path_for(artifact_name)
    }
}
