//! Data loading module
//!
//! Reads raw customer records and makes sure every row carries a binary
//! `CHURN` outcome, synthesizing one from `BALANCE` when the source has none.

mod dataset;
mod loader;
mod synthetic;

pub use dataset::{
    ColumnData, DataColumn, LabeledDataset, RawDataset, BALANCE, CHURN, CREDIT_LIMIT, PURCHASES,
    PURCHASES_TRX, REQUIRED_COLUMNS,
};
pub use loader::DataLoader;
pub use synthetic::SyntheticLabeler;
