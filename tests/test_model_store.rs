//! Integration test: model artifacts written by training and read back

use churn_pipeline::prelude::*;
use churn_pipeline::data::{ColumnData, DataColumn};

fn create_prepared(n: usize) -> PreprocessedData {
    let column = |name: &str, values: Vec<f64>| DataColumn {
        name: name.to_string(),
        data: ColumnData::Numeric(values.into_iter().map(Some).collect()),
    };
    let raw = RawDataset::new(vec![
        column("BALANCE", (0..n).map(|i| (i * 37 % 100) as f64 * 40.0).collect()),
        column("PURCHASES", (0..n).map(|i| (i % 6) as f64 * 15.0).collect()),
        column("CREDIT_LIMIT", vec![3000.0; n]),
        column("CHURN", (0..n).map(|i| ((i * 37 % 100) > 55) as u8 as f64).collect()),
    ])
    .unwrap();
    let dataset = LabeledDataset::from_raw(raw, false).unwrap();
    FeatureEngineer::default().transform(&dataset).unwrap()
}

#[test]
fn test_artifact_keeps_feature_order_and_scaler() {
    let dir = tempfile::tempdir().unwrap();
    let config = PipelineConfig::default()
        .with_model_dir(dir.path().join("models"))
        .with_search(SearchConfig {
            n_estimators: vec![5],
            max_depths: vec![4],
        });
    let pipeline = Pipeline::new(config);

    let prepared = create_prepared(150);
    let blob = Blob::encode(&prepared).unwrap();
    let results = pipeline.train(&blob, "churn_model.bin").unwrap();
    assert_eq!(results.len(), 1);

    let artifact = pipeline.store().read("churn_model.bin").unwrap();
    assert_eq!(artifact.feature_names, FEATURE_COLUMNS.to_vec());
    assert_eq!(artifact.scaler, prepared.scaler);
    assert_eq!(artifact.hyperparameters, Hyperparameters { n_estimators: 5, max_depth: 4 });
    assert_eq!(artifact.model.n_trees(), 5);

    // the restored model scores exactly as the search reported
    let acc = artifact.model.score(&prepared.x_train, &prepared.y_train).unwrap();
    assert_eq!(acc, results[0].train_accuracy);
}

#[test]
fn test_retraining_overwrites_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let store = ModelStore::new(dir.path());
    let prepared = Blob::encode(&create_prepared(150)).unwrap();

    for (n_estimators, max_depth) in [(3, 2), (4, 3)] {
        let config = PipelineConfig::default()
            .with_model_dir(dir.path())
            .with_search(SearchConfig {
                n_estimators: vec![n_estimators],
                max_depths: vec![max_depth],
            });
        Pipeline::new(config).train(&prepared, "m.bin").unwrap();
    }

    let artifact = store.read("m.bin").unwrap();
    assert_eq!(artifact.hyperparameters, Hyperparameters { n_estimators: 4, max_depth: 3 });
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[test]
fn test_evaluate_rejects_foreign_feature_layout() {
    let dir = tempfile::tempdir().unwrap();
    let config = PipelineConfig::default()
        .with_model_dir(dir.path())
        .with_search(SearchConfig {
            n_estimators: vec![3],
            max_depths: vec![3],
        });
    let pipeline = Pipeline::new(config);

    let mut prepared = create_prepared(120);
    let results = pipeline.train(&Blob::encode(&prepared).unwrap(), "m.bin").unwrap();

    // drop the last feature column from the test matrix
    let keep = prepared.x_test.ncols() - 1;
    prepared.x_test = prepared.x_test.slice(ndarray::s![.., ..keep]).to_owned();
    prepared.feature_names.truncate(keep);

    let err = pipeline
        .evaluate("m.bin", results, &Blob::encode(&prepared).unwrap())
        .unwrap_err();
    assert!(matches!(err, PipelineError::EvaluationDataMismatch(_)));
}
