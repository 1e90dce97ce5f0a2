//! Error types for the climate_data crate

use climate_math::MathError;
use polars::prelude::PolarsError;
use thiserror::Error;

/// Errors raised while loading, reshaping or aggregating climate tables
#[derive(Debug, Error)]
pub enum ClimateError {
    /// The dataset could not be fetched or read; fatal for the current page
    #[error("Data unavailable: {0}")]
    DataUnavailable(String),

    /// The payload is not readable as CSV
    #[error("CSV error: {0}")]
    Csv(String),

    /// A required column is missing from the raw table
    #[error("Missing column: {0}")]
    MissingColumn(String),

    /// Error from invalid parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Configuration could not be read or validated
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error from numeric kernels
    #[error("Math error: {0}")]
    Math(#[from] MathError),

    /// Error from IO operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error from Polars operations
    #[error("Polars error: {0}")]
    Polars(String),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ClimateError>;

impl From<PolarsError> for ClimateError {
    fn from(err: PolarsError) -> Self {
        ClimateError::Polars(err.to_string())
    }
}

impl From<csv::Error> for ClimateError {
    fn from(err: csv::Error) -> Self {
        ClimateError::Csv(err.to_string())
    }
}

impl From<toml::de::Error> for ClimateError {
    fn from(err: toml::de::Error) -> Self {
        ClimateError::Config(err.to_string())
    }
}

/// Reasons an ARIMA fit or projection can fail.
///
/// These never escape [`crate::forecast::forecast`], which degrades them to
/// absent placeholders; [`crate::forecast::try_forecast`] exposes them.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ForecastError {
    /// The requested `(p, d, q)` order cannot be estimated
    #[error("Invalid model order: {0}")]
    InvalidOrder(String),

    /// Error from invalid parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Series too short for the requested order
    #[error("Insufficient data: need at least {needed} observations, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// Input or objective produced non-finite values
    #[error("Non-finite values encountered: {0}")]
    NonFinite(String),

    /// Parameter search did not converge
    #[error("Model fitting did not converge after {iterations} iterations")]
    NonConvergence { iterations: usize },
}
