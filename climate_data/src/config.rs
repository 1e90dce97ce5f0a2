//! Dashboard configuration
//!
//! Every field has a default, so an empty TOML document is a valid
//! configuration:
//!
//! ```toml
//! [source]
//! mode = "local"
//! local_path = "data/global_temperature.csv"
//!
//! [analysis]
//! rolling_window = 5
//!
//! [forecast]
//! steps = 10
//! order = [1, 1, 1]
//! ```

use crate::error::{ClimateError, Result};
use crate::forecast::MAX_FORECAST_STEPS;
use crate::loader::{DataSource, GISTEMP_URL};
use crate::models::ArimaOrder;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Where the raw table comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceMode {
    Remote,
    Local,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub mode: SourceMode,
    pub url: String,
    pub local_path: PathBuf,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            mode: SourceMode::Remote,
            url: GISTEMP_URL.to_string(),
            local_path: PathBuf::from("data/global_temperature.csv"),
        }
    }
}

impl SourceConfig {
    /// Build the loader source selected by `mode`
    pub fn data_source(&self) -> DataSource {
        match self.mode {
            SourceMode::Remote => DataSource::Remote {
                url: self.url.clone(),
            },
            SourceMode::Local => DataSource::Local {
                path: self.local_path.clone(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Centered window for the yearly rolling average
    pub rolling_window: usize,
    /// Number of bins for the anomaly histogram
    pub histogram_bins: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            rolling_window: 5,
            histogram_bins: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    /// Years to project beyond the last observation
    pub steps: usize,
    /// ARIMA `(p, d, q)`
    pub order: [usize; 3],
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            steps: 10,
            order: [1, 1, 1],
        }
    }
}

impl ForecastConfig {
    pub fn arima_order(&self) -> ArimaOrder {
        ArimaOrder::new(self.order[0], self.order[1], self.order[2])
    }
}

/// Settings for the illustrative prediction models
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictionSettings {
    /// Degree of the polynomial regression, 2 to 6
    pub polynomial_degree: usize,
    /// Number of trees in the random forest
    pub forest_trees: usize,
    /// Seed for the random forest bootstrap
    pub forest_seed: u64,
}

impl Default for PredictionSettings {
    fn default() -> Self {
        Self {
            polynomial_degree: 3,
            forest_trees: 200,
            forest_seed: 42,
        }
    }
}

/// Complete dashboard configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub source: SourceConfig,
    pub analysis: AnalysisConfig,
    pub forecast: ForecastConfig,
    pub prediction: PredictionSettings,
}

impl DashboardConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: DashboardConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            ClimateError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&text)
    }

    /// Check value ranges that serde cannot express
    pub fn validate(&self) -> Result<()> {
        if self.analysis.rolling_window == 0 {
            return Err(ClimateError::Config(
                "analysis.rolling_window must be greater than zero".to_string(),
            ));
        }
        if self.analysis.histogram_bins == 0 {
            return Err(ClimateError::Config(
                "analysis.histogram_bins must be greater than zero".to_string(),
            ));
        }
        if self.forecast.steps == 0 {
            return Err(ClimateError::Config(
                "forecast.steps must be greater than zero".to_string(),
            ));
        }
        if self.forecast.steps > MAX_FORECAST_STEPS {
            return Err(ClimateError::Config(format!(
                "forecast.steps must be at most {}, got {}",
                MAX_FORECAST_STEPS, self.forecast.steps
            )));
        }
        if !(2..=6).contains(&self.prediction.polynomial_degree) {
            return Err(ClimateError::Config(format!(
                "prediction.polynomial_degree must be between 2 and 6, got {}",
                self.prediction.polynomial_degree
            )));
        }
        if self.prediction.forest_trees == 0 {
            return Err(ClimateError::Config(
                "prediction.forest_trees must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
