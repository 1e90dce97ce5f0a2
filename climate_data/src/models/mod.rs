//! Time-series models used to extrapolate the yearly series

use crate::error::ForecastError;
use serde::Serialize;
use std::fmt::{self, Debug};

pub mod arima;

pub use arima::ArimaModel;

/// Largest AR or MA lag accepted by the estimator
pub const MAX_LAG: usize = 10;

/// Largest differencing order accepted by the estimator
pub const MAX_DIFFERENCING: usize = 2;

/// ARIMA `(p, d, q)` order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ArimaOrder {
    /// Autoregressive lags
    pub p: usize,
    /// Differencing passes
    pub d: usize,
    /// Moving-average lags
    pub q: usize,
}

impl ArimaOrder {
    pub const fn new(p: usize, d: usize, q: usize) -> Self {
        Self { p, d, q }
    }

    /// Whether a constant term is estimated; only undifferenced models carry one
    pub fn has_constant(&self) -> bool {
        self.d == 0
    }

    /// Number of estimated parameters
    pub fn num_params(&self) -> usize {
        self.p + self.q + usize::from(self.has_constant())
    }

    /// Shortest series the estimator accepts for this order.
    ///
    /// Differencing consumes `d` points, the first `max(p, q)` differenced
    /// points only seed the recursion, and at least one more residual than
    /// there are parameters must remain.
    pub fn min_observations(&self) -> usize {
        self.d + self.p.max(self.q) + self.num_params() + 1
    }

    pub fn validate(&self) -> Result<(), ForecastError> {
        if self.p > MAX_LAG || self.q > MAX_LAG {
            return Err(ForecastError::InvalidOrder(format!(
                "{}: AR and MA lags are limited to {}",
                self, MAX_LAG
            )));
        }
        if self.d > MAX_DIFFERENCING {
            return Err(ForecastError::InvalidOrder(format!(
                "{}: differencing is limited to order {}",
                self, MAX_DIFFERENCING
            )));
        }
        Ok(())
    }
}

impl Default for ArimaOrder {
    fn default() -> Self {
        Self::new(1, 1, 1)
    }
}

impl fmt::Display for ArimaOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ARIMA({},{},{})", self.p, self.d, self.q)
    }
}

/// Forecast values paired with the years they belong to
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastResult {
    years: Vec<i32>,
    values: Vec<f64>,
}

impl ForecastResult {
    /// Create a new forecast result
    pub fn new(years: Vec<i32>, values: Vec<f64>) -> Result<Self, ForecastError> {
        if years.len() != values.len() {
            return Err(ForecastError::InvalidParameter(format!(
                "Years length ({}) doesn't match values length ({})",
                years.len(),
                values.len()
            )));
        }
        Ok(Self { years, values })
    }

    pub fn years(&self) -> &[i32] {
        &self.years
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of periods forecasted
    pub fn horizons(&self) -> usize {
        self.values.len()
    }

    /// `(year, value)` pairs in order
    pub fn points(&self) -> impl Iterator<Item = (i32, f64)> + '_ {
        self.years.iter().copied().zip(self.values.iter().copied())
    }

    /// Final forecast value, if any
    pub fn last(&self) -> Option<f64> {
        self.values.last().copied()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Model specification that can be estimated on a series
pub trait ForecastModel: Debug {
    /// The estimated model
    type Fitted: FittedModel;

    /// Estimate the model on `series`
    fn fit(&self, series: &[f64]) -> Result<Self::Fitted, ForecastError>;

    /// Display name of the model
    fn name(&self) -> String;
}

/// Estimated model able to project forward
pub trait FittedModel: Debug {
    /// Forecast `steps` periods past the end of the training series
    fn forecast(&self, steps: usize) -> Result<Vec<f64>, ForecastError>;

    /// One-step in-sample predictions aligned with the training series,
    /// absent where the recursion has no prediction yet
    fn fitted_values(&self) -> Vec<Option<f64>>;
}

impl ForecastModel for ArimaOrder {
    type Fitted = ArimaModel;

    fn fit(&self, series: &[f64]) -> Result<ArimaModel, ForecastError> {
        ArimaModel::fit(series, *self)
    }

    fn name(&self) -> String {
        self.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_min_observations() {
        assert_eq!(ArimaOrder::new(2, 1, 2).min_observations(), 8);
        assert_eq!(ArimaOrder::new(1, 1, 1).min_observations(), 5);
        assert_eq!(ArimaOrder::new(1, 0, 0).min_observations(), 4);
        assert_eq!(ArimaOrder::new(0, 1, 0).min_observations(), 2);
    }

    #[test]
    fn test_order_limits() {
        assert!(ArimaOrder::new(11, 0, 0).validate().is_err());
        assert!(ArimaOrder::new(1, 3, 1).validate().is_err());
        assert!(ArimaOrder::default().validate().is_ok());
        assert_eq!(ArimaOrder::default().to_string(), "ARIMA(1,1,1)");
    }

    #[test]
    fn test_forecast_result_lengths() {
        assert!(ForecastResult::new(vec![2021], vec![]).is_err());
        let result = ForecastResult::new(vec![2021, 2022], vec![0.9, 1.0]).unwrap();
        assert_eq!(result.horizons(), 2);
        assert_eq!(result.last(), Some(1.0));
        assert!(result.to_json().unwrap().contains("2022"));
    }
}
