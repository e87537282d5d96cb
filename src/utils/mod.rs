//! Utility functions and types

mod metrics;

pub use metrics::Timer;
