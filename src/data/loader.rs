//! Reads the source CSV and guarantees a churn label

use super::dataset::{ColumnData, DataColumn, LabeledDataset, RawDataset, BALANCE, CHURN, REQUIRED_COLUMNS};
use super::synthetic::SyntheticLabeler;
use crate::error::{PipelineError, Result};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use tracing::{debug, info};

/// Loads customer records and attaches the `CHURN` label
#[derive(Debug, Clone, Default)]
pub struct DataLoader {
    labeler: SyntheticLabeler,
}

impl DataLoader {
    /// Create a loader that synthesizes missing labels with `labeler`
    pub fn new(labeler: SyntheticLabeler) -> Self {
        Self { labeler }
    }

    /// Load a delimited file. `.tsv` files are tab separated, everything else comma separated.
    pub fn load_csv(&self, path: &Path) -> Result<RawDataset> {
        let file = File::open(path)
            .map_err(|e| PipelineError::DataUnavailable(format!("{}: {}", path.display(), e)))?;

        let is_tsv = path
            .extension()
            .and_then(|e| e.to_str())
            .map_or(false, |e| e.eq_ignore_ascii_case("tsv"));
        let parse_opts = CsvParseOptions::default().with_separator(if is_tsv { b'\t' } else { b',' });

        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(None)
            .with_parse_options(parse_opts)
            .into_reader_with_file_handle(file)
            .finish()
            .map_err(|e| PipelineError::DataUnavailable(format!("{}: {}", path.display(), e)))?;

        debug!(rows = df.height(), columns = df.width(), path = %path.display(), "Parsed input file");
        Self::from_frame(&df)
    }

    /// Convert a polars frame. Non-finite numbers are treated as missing.
    pub fn from_frame(df: &DataFrame) -> Result<RawDataset> {
        let mut columns = Vec::with_capacity(df.width());
        for column in df.get_columns() {
            let series = column.as_materialized_series();
            let data = match series.dtype() {
                DataType::String => {
                    let ca = series.str()?;
                    ColumnData::Text(ca.into_iter().map(|v| v.map(str::to_string)).collect())
                }
                _ => match series.cast(&DataType::Float64) {
                    Ok(cast) => {
                        let ca = cast.f64()?;
                        ColumnData::Numeric(
                            ca.into_iter().map(|v| v.filter(|x| x.is_finite())).collect(),
                        )
                    }
                    Err(_) => {
                        let cast = series.cast(&DataType::String)?;
                        let ca = cast.str()?;
                        ColumnData::Text(ca.into_iter().map(|v| v.map(str::to_string)).collect())
                    }
                },
            };
            columns.push(DataColumn {
                name: series.name().to_string(),
                data,
            });
        }
        RawDataset::new(columns)
    }

    /// Attach `CHURN`, synthesizing it from `BALANCE` if the dataset has none
    pub fn label(&self, raw: RawDataset) -> Result<LabeledDataset> {
        for required in REQUIRED_COLUMNS {
            if raw.numeric(required).is_err() {
                return Err(PipelineError::DataUnavailable(format!(
                    "input lacks numeric column {}",
                    required
                )));
            }
        }

        if raw.has_column(CHURN) {
            debug!("Using existing {} column", CHURN);
            return LabeledDataset::from_raw(raw, false);
        }

        let labels = self.labeler.generate(raw.numeric(BALANCE)?);
        let positives = labels.iter().filter(|&&l| l == 1.0).count();
        info!(
            rows = labels.len(),
            positives,
            seed = self.labeler.seed,
            "Synthesized churn labels"
        );
        let raw = raw.with_column(CHURN, ColumnData::Numeric(labels.into_iter().map(Some).collect()))?;
        LabeledDataset::from_raw(raw, true)
    }

    /// Read `path` and return a labeled dataset
    pub fn load(&self, path: &Path) -> Result<LabeledDataset> {
        let raw = self.load_csv(path)?;
        self.label(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::df;
    use std::io::Write;

    fn write_csv(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_missing_file_is_data_unavailable() {
        let loader = DataLoader::default();
        let err = loader.load(Path::new("/nonexistent/customers.csv")).unwrap_err();
        assert!(matches!(err, PipelineError::DataUnavailable(_)));
    }

    #[test]
    fn test_missing_required_column() {
        let file = write_csv("BALANCE,PURCHASES\n1.0,2.0\n");
        let err = DataLoader::default().load(file.path()).unwrap_err();
        assert!(matches!(err, PipelineError::DataUnavailable(_)));
    }

    #[test]
    fn test_existing_churn_kept() {
        let file = write_csv("CUST_ID,BALANCE,PURCHASES,CREDIT_LIMIT,CHURN\nC1,10.5,3,1000,1\nC2,,4,2000,0\n");
        let labeled = DataLoader::default().load(file.path()).unwrap();
        assert!(!labeled.label_synthesized);
        assert_eq!(labeled.labels().unwrap(), &[Some(1.0), Some(0.0)]);
        assert_eq!(labeled.data().numeric(BALANCE).unwrap(), &[Some(10.5), None]);
        assert!(matches!(labeled.data().column("CUST_ID"), Some(ColumnData::Text(_))));
    }

    #[test]
    fn test_synthesizes_churn() {
        let file = write_csv("BALANCE,PURCHASES,CREDIT_LIMIT\n0,1,100\n50000,2,100\n,3,100\n");
        let labeled = DataLoader::default().load(file.path()).unwrap();
        assert!(labeled.label_synthesized);
        assert_eq!(labeled.n_rows(), 3);
        assert!(labeled.labels().unwrap().iter().all(|l| l.is_some()));
    }

    #[test]
    fn test_from_frame_casts_integers() {
        let df = df!(
            "BALANCE" => &[1i64, 2, 3],
            "PURCHASES" => &[0.5, 1.5, 2.5],
            "CREDIT_LIMIT" => &[100i64, 200, 300],
        )
        .unwrap();
        let raw = DataLoader::from_frame(&df).unwrap();
        assert_eq!(raw.numeric("BALANCE").unwrap(), &[Some(1.0), Some(2.0), Some(3.0)]);
    }
}
