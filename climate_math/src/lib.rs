//! # Climate Math
//!
//! Numeric kernels used by the climate analysis pipeline.
//! This crate provides the statistics, smoothing, regression and
//! optimization routines that the data crate composes into yearly
//! trends, outlier fences and forecasts. Nothing in here performs I/O.

use thiserror::Error;

pub mod descriptive;
pub mod forest;
pub mod metrics;
pub mod moving_averages;
pub mod optimization;
pub mod regression;

pub use descriptive::{histogram, mean, pearson_correlation, quantile_linear, Histogram};
pub use forest::{ForestConfig, RandomForestRegressor};
pub use metrics::{mean_absolute_error, r2_score, root_mean_squared_error, FitMetrics};
pub use moving_averages::centered_rolling_mean;
pub use optimization::{nelder_mead, NelderMeadConfig, NelderMeadResult};
pub use regression::{LinearFit, PolynomialRegression};

/// Errors that can occur in numeric calculations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),
}

/// Result type for numeric operations
pub type Result<T> = std::result::Result<T, MathError>;
