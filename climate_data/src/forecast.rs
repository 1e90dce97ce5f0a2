//! Forecasting the yearly series
//!
//! [`try_forecast`] reports why a forecast could not be produced.
//! [`forecast`] never fails: any estimation problem degrades to a sequence
//! of absent values of the requested length.

use crate::error::ForecastError;
use crate::models::{ArimaOrder, FittedModel, ForecastModel, ForecastResult};
use tracing::{info, warn};

/// Longest horizon any forecast may request
pub const MAX_FORECAST_STEPS: usize = 200;

/// Fit `model` on the values of `series` and project `steps` years ahead.
///
/// `series` must be in strictly ascending year order. Forecast years run
/// from the year after the last observation.
pub fn forecast_with<M: ForecastModel>(
    model: &M,
    series: &[(i32, f64)],
    steps: usize,
) -> Result<ForecastResult, ForecastError> {
    if steps == 0 {
        return Err(ForecastError::InvalidParameter(
            "forecast steps must be greater than zero".to_string(),
        ));
    }
    if steps > MAX_FORECAST_STEPS {
        return Err(ForecastError::InvalidParameter(format!(
            "forecast steps must be at most {}, got {}",
            MAX_FORECAST_STEPS, steps
        )));
    }
    if let Some(pair) = series.windows(2).find(|w| w[1].0 <= w[0].0) {
        return Err(ForecastError::InvalidParameter(format!(
            "years must be strictly ascending, found {} after {}",
            pair[1].0, pair[0].0
        )));
    }

    let values: Vec<f64> = series.iter().map(|&(_, v)| v).collect();
    let fitted = model.fit(&values)?;
    let projected = fitted.forecast(steps)?;

    let last_year = series.last().map(|&(year, _)| year).unwrap_or_default();
    let years = (1..=steps as i32).map(|h| last_year + h).collect();

    info!(model = %model.name(), steps, last_year, "forecast produced");
    ForecastResult::new(years, projected)
}

/// ARIMA forecast of `steps` years, or the reason it failed
pub fn try_forecast(
    series: &[(i32, f64)],
    steps: usize,
    order: ArimaOrder,
) -> Result<ForecastResult, ForecastError> {
    forecast_with(&order, series, steps)
}

/// ARIMA forecast of `steps` years, absent values when estimation fails
///
/// The placeholder vector always has `steps` entries, so callers bound
/// user-supplied horizons by [`MAX_FORECAST_STEPS`] first.
pub fn forecast(series: &[(i32, f64)], steps: usize, order: ArimaOrder) -> Vec<Option<f64>> {
    match try_forecast(series, steps, order) {
        Ok(result) => result.values().iter().copied().map(Some).collect(),
        Err(err) => {
            warn!(%order, steps, error = %err, "forecast degraded to placeholders");
            vec![None; steps]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unordered_years_are_rejected() {
        let series = [(2001, 0.2), (2000, 0.1), (2002, 0.3)];
        assert!(matches!(
            try_forecast(&series, 1, ArimaOrder::new(0, 1, 0)),
            Err(ForecastError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_forecast_years_follow_last_observation() {
        let series = [(2018, 0.8), (2019, 0.9), (2020, 1.0)];
        let result = try_forecast(&series, 2, ArimaOrder::new(0, 1, 0)).unwrap();
        assert_eq!(result.years(), &[2021, 2022]);
        assert_eq!(result.values(), &[1.0, 1.0]);
    }

    #[test]
    fn test_horizon_is_bounded() {
        let series = [(2018, 0.8), (2019, 0.9), (2020, 1.0)];
        assert!(matches!(
            try_forecast(&series, MAX_FORECAST_STEPS + 1, ArimaOrder::new(0, 1, 0)),
            Err(ForecastError::InvalidParameter(_))
        ));
        let result = try_forecast(&series, MAX_FORECAST_STEPS, ArimaOrder::new(0, 1, 0)).unwrap();
        assert_eq!(result.years().last(), Some(&2220));
    }

    #[test]
    fn test_degraded_forecast_has_requested_length() {
        let series = [(2000, 0.1), (2001, 0.2)];
        assert_eq!(forecast(&series, 4, ArimaOrder::new(2, 1, 2)), vec![None; 4]);
    }
}
