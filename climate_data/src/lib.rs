//! # Climate Data
//!
//! Loading, reshaping and analysis of the global temperature anomaly table.
//!
//! ## Pipeline
//!
//! - **Loader**: fetch the wide table from the GISTEMP endpoint or a local CSV
//! - **Cleaner**: drop duplicate year columns, coerce cells, reshape to one
//!   row per year and month
//! - **Aggregators**: yearly and monthly means, rolling average, linear
//!   trend, IQR outliers, year by month pivot and correlations
//! - **Forecaster**: ARIMA projection of the yearly series that degrades to
//!   absent values instead of failing
//!
//! ## Quick Start
//!
//! ```no_run
//! use climate_data::{clean, compute_trend, forecast, yearly_mean, ArimaOrder, DataSource, RawSource};
//!
//! let raw = DataSource::local("data/global_temperature.csv").fetch()?;
//! let observations = clean(&raw)?;
//! let yearly = yearly_mean(&observations);
//!
//! let trend = compute_trend(&yearly)?;
//! println!("{:.4} degrees per decade", trend.slope * 10.0);
//!
//! let next_decade = forecast(&yearly.points(), 10, ArimaOrder::default());
//! # Ok::<(), climate_data::ClimateError>(())
//! ```

pub mod analysis;
pub mod clean;
pub mod config;
pub mod error;
pub mod forecast;
pub mod loader;
pub mod models;
pub mod prediction;
pub mod session;
pub mod tables;

// Re-export commonly used types
pub use crate::analysis::{
    add_rolling_average, anomaly_histogram, compute_trend, detect_outliers, monthly_correlation,
    monthly_mean, pivot_year_month, yearly_mean,
};
pub use crate::clean::clean;
pub use crate::config::{DashboardConfig, PredictionSettings, SourceMode};
pub use crate::error::{ClimateError, ForecastError, Result};
pub use crate::forecast::{forecast, try_forecast, MAX_FORECAST_STEPS};
pub use crate::loader::{DataSource, RawSource, RawTable, GISTEMP_URL};
pub use crate::models::{ArimaModel, ArimaOrder, ForecastResult};
pub use crate::prediction::{compare_models, predict_year, ModelComparison, ModelKind, ModelPredictions};
pub use crate::session::Session;
pub use crate::tables::{
    CorrelationMatrix, Month, MonthlySeries, Observation, ObservationTable, OutlierSet, TrendStats,
    YearMonthPivot, YearlySeries,
};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
