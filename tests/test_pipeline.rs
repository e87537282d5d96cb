//! Integration test: the four stages end to end

use churn_pipeline::prelude::*;
use polars::prelude::*;
use std::fs::File;
use std::path::{Path, PathBuf};

fn write_frame(dir: &Path, name: &str, mut df: DataFrame) -> PathBuf {
    let path = dir.join(name);
    let mut file = File::create(&path).unwrap();
    CsvWriter::new(&mut file).finish(&mut df).unwrap();
    path
}

/// Customers whose balance is high relative to their limit churn, with some label noise
fn create_churn_dataset(n: usize) -> DataFrame {
    let mut balance = Vec::with_capacity(n);
    let mut purchases = Vec::with_capacity(n);
    let mut credit_limit = Vec::with_capacity(n);
    let mut trx = Vec::with_capacity(n);
    let mut churn = Vec::with_capacity(n);

    for i in 0..n {
        let limit = 1000.0 + (i % 13) as f64 * 500.0;
        let b = ((i * 7919) % 1000) as f64 * limit / 1000.0;
        balance.push(b);
        credit_limit.push(limit);
        purchases.push(((i * 31) % 500) as f64);
        trx.push((i % 9) as i64);
        let noisy = i % 17 == 0;
        churn.push(((b / limit > 0.6) != noisy) as i64);
    }

    df!(
        "CUST_ID" => (0..n).map(|i| format!("C{:05}", i)).collect::<Vec<_>>(),
        "BALANCE" => &balance,
        "PURCHASES" => &purchases,
        "PURCHASES_TRX" => &trx,
        "CREDIT_LIMIT" => &credit_limit,
        "CHURN" => &churn
    )
    .unwrap()
}

fn small_grid() -> SearchConfig {
    SearchConfig {
        n_estimators: vec![5, 10],
        max_depths: vec![3, 6],
    }
}

fn pipeline(data: PathBuf, model_dir: &Path) -> Pipeline {
    Pipeline::new(PipelineConfig::new(data).with_model_dir(model_dir))
}

#[test]
fn test_full_run_with_real_labels() {
    let dir = tempfile::tempdir().unwrap();
    let data = write_frame(dir.path(), "customers.csv", create_churn_dataset(1000));
    let pipeline = pipeline(data, &dir.path().join("model"));

    let raw = pipeline.load().unwrap();
    let prepared = pipeline.preprocess(&raw).unwrap();
    let results = pipeline.train(&prepared, "churn_model.bin").unwrap();

    assert_eq!(results.len(), 9);
    assert!(results.iter().all(|r| (0.0..=1.0).contains(&r.train_accuracy)));
    assert_eq!(results[0].hyperparameters, Hyperparameters { n_estimators: 50, max_depth: 5 });
    assert_eq!(results[8].hyperparameters, Hyperparameters { n_estimators: 200, max_depth: 15 });

    let report = pipeline
        .evaluate("churn_model.bin", results.clone(), &prepared)
        .unwrap();

    let data: PreprocessedData = prepared.decode().unwrap();
    assert_eq!(data.n_test(), 200);
    assert_eq!(report.n_scored(), data.n_test() as u64);
    assert_eq!(report.training_results, results);
    assert!(report.test_accuracy > 0.7, "accuracy {}", report.test_accuracy);
    assert!(report.roc_auc > 0.7, "auc {}", report.roc_auc);

    let names: Vec<&str> = report.feature_importance.keys().map(String::as_str).collect();
    let mut expected = FEATURE_COLUMNS.to_vec();
    expected.sort();
    assert_eq!(names, expected);
}

#[test]
fn test_selected_model_has_best_train_accuracy() {
    let dir = tempfile::tempdir().unwrap();
    let data = write_frame(dir.path(), "customers.csv", create_churn_dataset(300));
    let config = PipelineConfig::new(data)
        .with_model_dir(dir.path())
        .with_search(small_grid());
    let pipeline = Pipeline::new(config);

    let prepared = pipeline.preprocess(&pipeline.load().unwrap()).unwrap();
    let results = pipeline.train(&prepared, "m.bin").unwrap();
    let artifact = pipeline.store().read("m.bin").unwrap();

    let max = results.iter().map(|r| r.train_accuracy).fold(f64::MIN, f64::max);
    let first_best = results.iter().find(|r| r.train_accuracy == max).unwrap();
    assert_eq!(artifact.hyperparameters, first_best.hyperparameters);
    assert_eq!(artifact.train_accuracy, max);
}

#[test]
fn test_synthesized_labels_zero_balance() {
    let dir = tempfile::tempdir().unwrap();
    let n = 4000;
    let df = df!(
        "BALANCE" => vec![0.0; n],
        "PURCHASES" => vec![10.0; n],
        "CREDIT_LIMIT" => vec![1000.0; n]
    )
    .unwrap();
    let data = write_frame(dir.path(), "no_label.csv", df);
    let pipeline = pipeline(data, dir.path());

    let dataset: LabeledDataset = pipeline.load().unwrap().decode().unwrap();
    assert!(dataset.label_synthesized);
    let rate = dataset.positive_rate().unwrap();
    assert!((rate - 0.5).abs() < 0.03, "positive rate {}", rate);
}

#[test]
fn test_synthesized_labels_are_reproducible() {
    let dir = tempfile::tempdir().unwrap();
    let mut df = create_churn_dataset(200);
    let _ = df.drop_in_place("CHURN").unwrap();
    let data = write_frame(dir.path(), "no_label.csv", df);
    let pipeline = pipeline(data, dir.path());

    let first = pipeline.load().unwrap();
    let second = pipeline.load().unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_evaluate_unknown_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let data = write_frame(dir.path(), "customers.csv", create_churn_dataset(100));
    let pipeline = pipeline(data, &dir.path().join("model"));
    let prepared = pipeline.preprocess(&pipeline.load().unwrap()).unwrap();

    let err = pipeline.evaluate("never_written.bin", vec![], &prepared).unwrap_err();
    assert!(matches!(err, PipelineError::ArtifactNotFound(_)));
}

#[test]
fn test_single_class_after_cleaning() {
    let dir = tempfile::tempdir().unwrap();
    // every churned row lacks a balance, so only class 0 survives cleaning
    let df = df!(
        "BALANCE" => &[Some(100.0), None, Some(300.0), None, Some(500.0), Some(50.0)],
        "PURCHASES" => &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
        "CREDIT_LIMIT" => &[1000.0, 1000.0, 2000.0, 2000.0, 3000.0, 500.0],
        "CHURN" => &[0i64, 1, 0, 1, 0, 0]
    )
    .unwrap();
    let data = write_frame(dir.path(), "one_class.csv", df);
    let pipeline = pipeline(data, dir.path());

    let raw = pipeline.load().unwrap();
    let err = pipeline.preprocess(&raw).unwrap_err();
    assert!(matches!(err, PipelineError::InsufficientData(_)));
}

#[test]
fn test_rows_with_any_empty_cell_are_dropped() {
    let dir = tempfile::tempdir().unwrap();
    let n = 100;
    let mut df = create_churn_dataset(n);
    let minimum_payments: Vec<Option<f64>> =
        (0..n).map(|i| (i % 5 != 0).then_some(i as f64 * 3.0)).collect();
    df.with_column(Column::new("MINIMUM_PAYMENTS".into(), minimum_payments))
        .unwrap();
    let data = write_frame(dir.path(), "sparse.csv", df);
    let pipeline = pipeline(data, dir.path());

    let prepared: PreprocessedData = pipeline
        .preprocess(&pipeline.load().unwrap())
        .unwrap()
        .decode()
        .unwrap();
    assert_eq!(prepared.n_train() + prepared.n_test(), 80);
    assert_eq!(prepared.n_test(), 16);
}

#[test]
fn test_missing_input_file() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline(dir.path().join("absent.csv"), dir.path());
    assert!(matches!(pipeline.load(), Err(PipelineError::DataUnavailable(_))));
}

#[test]
fn test_missing_required_column() {
    let dir = tempfile::tempdir().unwrap();
    let df = df!(
        "BALANCE" => &[1.0, 2.0],
        "CREDIT_LIMIT" => &[10.0, 20.0]
    )
    .unwrap();
    let data = write_frame(dir.path(), "partial.csv", df);
    let pipeline = pipeline(data, dir.path());
    assert!(matches!(pipeline.load(), Err(PipelineError::DataUnavailable(_))));
}

#[test]
fn test_stage_rejects_wrong_blob_kind() {
    let dir = tempfile::tempdir().unwrap();
    let data = write_frame(dir.path(), "customers.csv", create_churn_dataset(100));
    let pipeline = pipeline(data, dir.path());
    let raw = pipeline.load().unwrap();

    // train expects a preprocessed blob
    let err = pipeline.train(&raw, "m.bin").unwrap_err();
    assert!(matches!(err, PipelineError::SerializationError(_)));
    assert!(!pipeline.store().exists("m.bin"));
}

#[test]
fn test_train_into_unwritable_location() {
    let dir = tempfile::tempdir().unwrap();
    let data = write_frame(dir.path(), "customers.csv", create_churn_dataset(100));
    // model directory path is occupied by a regular file
    let blocker = dir.path().join("blocked");
    std::fs::write(&blocker, b"x").unwrap();

    let config = PipelineConfig::new(data)
        .with_model_dir(&blocker)
        .with_search(small_grid());
    let pipeline = Pipeline::new(config);
    let prepared = pipeline.preprocess(&pipeline.load().unwrap()).unwrap();

    let err = pipeline.train(&prepared, "m.bin").unwrap_err();
    assert!(matches!(err, PipelineError::PersistenceFailure(_)));
}

#[test]
fn test_run_all_stages() {
    let dir = tempfile::tempdir().unwrap();
    let data = write_frame(dir.path(), "customers.csv", create_churn_dataset(250));
    let config = PipelineConfig::new(data)
        .with_model_dir(dir.path().join("model"))
        .with_search(small_grid());
    let pipeline = Pipeline::new(config);

    let report = pipeline.run(DEFAULT_ARTIFACT_NAME).unwrap();
    assert_eq!(report.training_results.len(), 4);
    assert_eq!(report.n_scored(), 50);
    assert!(pipeline.store().exists(DEFAULT_ARTIFACT_NAME));
}
