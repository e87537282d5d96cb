//! In-memory tabular dataset passed between the load and preprocess stages

use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};

/// Outcome label column
pub const CHURN: &str = "CHURN";
/// Outstanding balance column
pub const BALANCE: &str = "BALANCE";
/// Credit limit column
pub const CREDIT_LIMIT: &str = "CREDIT_LIMIT";
/// Purchase amount column
pub const PURCHASES: &str = "PURCHASES";
/// Purchase transaction count column (optional)
pub const PURCHASES_TRX: &str = "PURCHASES_TRX";

/// Columns every input dataset has to provide
pub const REQUIRED_COLUMNS: [&str; 3] = [BALANCE, CREDIT_LIMIT, PURCHASES];

/// Values of a single column. `None` marks a missing cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "values", rename_all = "snake_case")]
pub enum ColumnData {
    Numeric(Vec<Option<f64>>),
    Text(Vec<Option<String>>),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Numeric(v) => v.len(),
            ColumnData::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the cell at `row` is empty
    pub fn is_missing(&self, row: usize) -> bool {
        match self {
            ColumnData::Numeric(v) => v[row].is_none(),
            ColumnData::Text(v) => v[row].is_none(),
        }
    }

    pub fn as_numeric(&self) -> Option<&[Option<f64>]> {
        match self {
            ColumnData::Numeric(v) => Some(v),
            ColumnData::Text(_) => None,
        }
    }
}

/// Named column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataColumn {
    pub name: String,
    pub data: ColumnData,
}

/// Ordered collection of equally long columns, as read from the source file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawDataset {
    columns: Vec<DataColumn>,
}

impl RawDataset {
    /// Build a dataset, checking that all columns have the same length
    pub fn new(columns: Vec<DataColumn>) -> Result<Self> {
        if let Some(first) = columns.first() {
            let n_rows = first.data.len();
            if let Some(bad) = columns.iter().find(|c| c.data.len() != n_rows) {
                return Err(PipelineError::ShapeError {
                    expected: format!("{} rows", n_rows),
                    actual: format!("{} rows in column {}", bad.data.len(), bad.name),
                });
            }
        }
        Ok(Self { columns })
    }

    pub fn n_rows(&self) -> usize {
        self.columns.first().map_or(0, |c| c.data.len())
    }

    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    pub fn column(&self, name: &str) -> Option<&ColumnData> {
        self.columns.iter().find(|c| c.name == name).map(|c| &c.data)
    }

    /// Numeric values of `name`, or `MissingColumn` if absent or textual
    pub fn numeric(&self, name: &str) -> Result<&[Option<f64>]> {
        self.column(name)
            .and_then(ColumnData::as_numeric)
            .ok_or_else(|| PipelineError::MissingColumn(name.to_string()))
    }

    /// Per-row flag, true when no column has a missing cell in that row
    pub fn complete_rows(&self) -> Vec<bool> {
        (0..self.n_rows())
            .map(|row| self.columns.iter().all(|c| !c.data.is_missing(row)))
            .collect()
    }

    /// Append a column, replacing any existing column of the same name
    pub fn with_column(mut self, name: &str, data: ColumnData) -> Result<Self> {
        if !self.columns.is_empty() && data.len() != self.n_rows() {
            return Err(PipelineError::ShapeError {
                expected: format!("{} rows", self.n_rows()),
                actual: format!("{} rows in column {}", data.len(), name),
            });
        }
        match self.columns.iter_mut().find(|c| c.name == name) {
            Some(existing) => existing.data = data,
            None => self.columns.push(DataColumn {
                name: name.to_string(),
                data,
            }),
        }
        Ok(self)
    }
}

/// Dataset guaranteed to carry a binary numeric `CHURN` column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledDataset {
    data: RawDataset,
    /// Whether `CHURN` was manufactured by the synthetic label generator
    pub label_synthesized: bool,
}

impl LabeledDataset {
    /// Wrap a dataset that already holds its label column
    pub fn from_raw(data: RawDataset, label_synthesized: bool) -> Result<Self> {
        let labeled = Self {
            data,
            label_synthesized,
        };
        labeled.validate()?;
        Ok(labeled)
    }

    /// Check the label column: present, numeric, every known value 0 or 1
    pub fn validate(&self) -> Result<()> {
        let labels = self.data.numeric(CHURN)?;
        if let Some(bad) = labels.iter().flatten().find(|&&v| v != 0.0 && v != 1.0) {
            return Err(PipelineError::DataUnavailable(format!(
                "{} must be binary, found {}",
                CHURN, bad
            )));
        }
        Ok(())
    }

    pub fn data(&self) -> &RawDataset {
        &self.data
    }

    pub fn labels(&self) -> Result<&[Option<f64>]> {
        self.data.numeric(CHURN)
    }

    pub fn n_rows(&self) -> usize {
        self.data.n_rows()
    }

    /// Fraction of positive labels among known labels
    pub fn positive_rate(&self) -> Result<f64> {
        let known: Vec<f64> = self.labels()?.iter().flatten().copied().collect();
        if known.is_empty() {
            return Ok(0.0);
        }
        Ok(known.iter().sum::<f64>() / known.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numeric(name: &str, values: &[Option<f64>]) -> DataColumn {
        DataColumn {
            name: name.to_string(),
            data: ColumnData::Numeric(values.to_vec()),
        }
    }

    #[test]
    fn test_rejects_ragged_columns() {
        let result = RawDataset::new(vec![
            numeric(BALANCE, &[Some(1.0), Some(2.0)]),
            numeric(PURCHASES, &[Some(1.0)]),
        ]);
        assert!(matches!(result, Err(PipelineError::ShapeError { .. })));
    }

    #[test]
    fn test_with_column_replaces() {
        let raw = RawDataset::new(vec![numeric(BALANCE, &[Some(1.0), None])]).unwrap();
        let raw = raw
            .with_column(BALANCE, ColumnData::Numeric(vec![Some(3.0), Some(4.0)]))
            .unwrap();
        assert_eq!(raw.n_columns(), 1);
        assert_eq!(raw.numeric(BALANCE).unwrap(), &[Some(3.0), Some(4.0)]);
    }

    #[test]
    fn test_labeled_requires_binary_churn() {
        let raw = RawDataset::new(vec![numeric(CHURN, &[Some(0.0), Some(2.0)])]).unwrap();
        assert!(matches!(
            LabeledDataset::from_raw(raw, false),
            Err(PipelineError::DataUnavailable(_))
        ));
    }

    #[test]
    fn test_labeled_requires_churn_column() {
        let raw = RawDataset::new(vec![numeric(BALANCE, &[Some(0.0)])]).unwrap();
        assert!(matches!(
            LabeledDataset::from_raw(raw, false),
            Err(PipelineError::MissingColumn(_))
        ));
    }

    #[test]
    fn test_positive_rate_ignores_missing() {
        let raw = RawDataset::new(vec![numeric(CHURN, &[Some(1.0), None, Some(0.0), Some(1.0)])]).unwrap();
        let labeled = LabeledDataset::from_raw(raw, false).unwrap();
        assert!((labeled.positive_rate().unwrap() - 2.0 / 3.0).abs() < 1e-12);
    }
}
