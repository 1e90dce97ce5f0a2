//! ARIMA estimation by conditional sum of squares
//!
//! The series is differenced `d` times, an ARMA(p, q) recursion is fitted
//! to the differenced values with Nelder-Mead, and forecasts are integrated
//! back to the original scale.

use crate::error::ForecastError;
use crate::models::{ArimaOrder, FittedModel};
use climate_math::{nelder_mead, NelderMeadConfig};
use tracing::debug;

/// Bound on every AR and MA coefficient
const COEFFICIENT_BOUND: f64 = 0.99;

const OPTIMIZER_MAX_ITER: usize = 5000;
const OPTIMIZER_TOLERANCE: f64 = 1e-10;

/// Fitted ARIMA model
#[derive(Debug, Clone)]
pub struct ArimaModel {
    order: ArimaOrder,
    intercept: f64,
    ar_coefficients: Vec<f64>,
    ma_coefficients: Vec<f64>,
    /// Training series on the original scale
    original: Vec<f64>,
    /// Training series after differencing
    differenced: Vec<f64>,
    /// One-step residuals on the differenced scale
    residuals: Vec<f64>,
    /// Conditional sum of squares at the optimum
    css: f64,
}

impl ArimaModel {
    /// Estimate `order` on `series`
    pub fn fit(series: &[f64], order: ArimaOrder) -> Result<Self, ForecastError> {
        order.validate()?;

        if series.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::NonFinite(
                "training series contains non-finite values".to_string(),
            ));
        }
        let needed = order.min_observations();
        if series.len() < needed {
            return Err(ForecastError::InsufficientData {
                needed,
                got: series.len(),
            });
        }

        let differenced = difference(series, order.d);
        let (intercept, ar, ma) = estimate(&differenced, order)?;
        let (residuals, css) = conditional_residuals(&differenced, order, intercept, &ar, &ma);

        if !css.is_finite() {
            return Err(ForecastError::NonFinite(format!(
                "{} residuals diverged",
                order
            )));
        }

        debug!(%order, intercept, ?ar, ?ma, css, "fitted ARIMA");

        Ok(Self {
            order,
            intercept,
            ar_coefficients: ar,
            ma_coefficients: ma,
            original: series.to_vec(),
            differenced,
            residuals,
            css,
        })
    }

    pub fn order(&self) -> ArimaOrder {
        self.order
    }

    /// Constant term of the differenced process, zero when `d > 0`
    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    pub fn ar_coefficients(&self) -> &[f64] {
        &self.ar_coefficients
    }

    pub fn ma_coefficients(&self) -> &[f64] {
        &self.ma_coefficients
    }

    /// Mean squared one-step residual
    pub fn residual_variance(&self) -> f64 {
        let start = self.order.p.max(self.order.q);
        let count = self.differenced.len().saturating_sub(start);
        if count == 0 {
            return 0.0;
        }
        self.css / count as f64
    }

    /// ARMA prediction for position `t` of `values` from the preceding lags
    fn predict_next(&self, values: &[f64], residuals: &[f64], t: usize) -> f64 {
        arma_step(
            values,
            residuals,
            t,
            self.intercept,
            &self.ar_coefficients,
            &self.ma_coefficients,
        )
    }

    /// Forecast `steps` periods past the training series
    pub fn forecast(&self, steps: usize) -> Result<Vec<f64>, ForecastError> {
        if steps == 0 {
            return Err(ForecastError::InvalidParameter(
                "forecast steps must be greater than zero".to_string(),
            ));
        }

        let mut diffs = self.differenced.clone();
        let mut shocks = self.residuals.clone();
        for _ in 0..steps {
            let t = diffs.len();
            let next = self.predict_next(&diffs, &shocks, t);
            diffs.push(next);
            shocks.push(0.0);
        }

        let mut levels = self.original.clone();
        let weights = integration_weights(self.order.d);
        for &step in &diffs[self.differenced.len()..] {
            let t = levels.len();
            let level = step
                + weights
                    .iter()
                    .enumerate()
                    .map(|(k, w)| w * levels[t - 1 - k])
                    .sum::<f64>();
            levels.push(level);
        }

        let forecasts = levels.split_off(self.original.len());
        if forecasts.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::NonFinite(format!(
                "{} forecast diverged",
                self.order
            )));
        }
        Ok(forecasts)
    }

    /// One-step in-sample predictions on the original scale.
    ///
    /// Position `i` predicts `series[i]` from actual values before it; the
    /// first `d + max(p, q)` positions have no prediction.
    pub fn fitted_values(&self) -> Vec<Option<f64>> {
        let d = self.order.d;
        let start = self.order.p.max(self.order.q);
        let weights = integration_weights(d);

        let mut fitted = vec![None; self.original.len()];
        for j in start..self.differenced.len() {
            let t = j + d;
            let predicted_diff = self.predict_next(&self.differenced, &self.residuals, j);
            let carried: f64 = weights
                .iter()
                .enumerate()
                .map(|(k, w)| w * self.original[t - 1 - k])
                .sum();
            fitted[t] = Some(predicted_diff + carried);
        }
        fitted
    }
}

impl FittedModel for ArimaModel {
    fn forecast(&self, steps: usize) -> Result<Vec<f64>, ForecastError> {
        ArimaModel::forecast(self, steps)
    }

    fn fitted_values(&self) -> Vec<Option<f64>> {
        ArimaModel::fitted_values(self)
    }
}

/// Apply `d` rounds of first differencing
pub fn difference(series: &[f64], d: usize) -> Vec<f64> {
    let mut result = series.to_vec();
    for _ in 0..d {
        if result.len() <= 1 {
            return Vec::new();
        }
        result = result.windows(2).map(|w| w[1] - w[0]).collect();
    }
    result
}

/// Weights `w_k` such that `x_t = Δ^d x_t + Σ w_k x_{t-1-k}`.
///
/// These are the signed binomial coefficients `(-1)^(k) C(d, k+1)`.
fn integration_weights(d: usize) -> Vec<f64> {
    let mut weights = Vec::with_capacity(d);
    let mut binomial = 1.0;
    for k in 1..=d {
        binomial = binomial * (d + 1 - k) as f64 / k as f64;
        let sign = if k % 2 == 1 { 1.0 } else { -1.0 };
        weights.push(sign * binomial);
    }
    weights
}

fn arma_step(
    values: &[f64],
    residuals: &[f64],
    t: usize,
    intercept: f64,
    ar: &[f64],
    ma: &[f64],
) -> f64 {
    let mut pred = intercept;
    for (i, phi) in ar.iter().enumerate() {
        pred += phi * (values[t - 1 - i] - intercept);
    }
    for (i, theta) in ma.iter().enumerate() {
        pred += theta * residuals[t - 1 - i];
    }
    pred
}

/// Residuals of the ARMA recursion and their sum of squares
fn conditional_residuals(
    values: &[f64],
    order: ArimaOrder,
    intercept: f64,
    ar: &[f64],
    ma: &[f64],
) -> (Vec<f64>, f64) {
    let start = order.p.max(order.q);
    let mut residuals = vec![0.0; values.len()];
    let mut css = 0.0;

    for t in start..values.len() {
        let error = values[t] - arma_step(values, &residuals, t, intercept, ar, ma);
        residuals[t] = error;
        css += error * error;
    }

    (residuals, css)
}

/// Minimize the conditional sum of squares over the free parameters.
///
/// Parameter vector layout: `[constant?, ar..., ma...]`.
fn estimate(
    values: &[f64],
    order: ArimaOrder,
) -> Result<(f64, Vec<f64>, Vec<f64>), ForecastError> {
    let offset = usize::from(order.has_constant());
    let mean = values.iter().sum::<f64>() / values.len() as f64;

    if order.num_params() == 0 {
        return Ok((0.0, Vec::new(), Vec::new()));
    }

    let mut initial = Vec::with_capacity(order.num_params());
    let mut bounds = Vec::with_capacity(order.num_params());
    if order.has_constant() {
        initial.push(mean);
        bounds.push((f64::NEG_INFINITY, f64::INFINITY));
    }
    for i in 0..order.p {
        initial.push(0.1 / (i + 1) as f64);
        bounds.push((-COEFFICIENT_BOUND, COEFFICIENT_BOUND));
    }
    for i in 0..order.q {
        initial.push(0.1 / (i + 1) as f64);
        bounds.push((-COEFFICIENT_BOUND, COEFFICIENT_BOUND));
    }

    let split = |params: &[f64]| {
        let intercept = if order.has_constant() { params[0] } else { 0.0 };
        let ar = params[offset..offset + order.p].to_vec();
        let ma = params[offset + order.p..].to_vec();
        (intercept, ar, ma)
    };

    let config = NelderMeadConfig {
        max_iter: OPTIMIZER_MAX_ITER,
        tolerance: OPTIMIZER_TOLERANCE,
        ..Default::default()
    };
    let result = nelder_mead(
        |params| {
            let (intercept, ar, ma) = split(params);
            conditional_residuals(values, order, intercept, &ar, &ma).1
        },
        &initial,
        Some(&bounds),
        &config,
    );

    if !result.optimal_value.is_finite() {
        return Err(ForecastError::NonFinite(format!(
            "{} objective is not finite",
            order
        )));
    }
    if !result.converged {
        return Err(ForecastError::NonConvergence {
            iterations: result.iterations,
        });
    }

    Ok(split(&result.optimal_point))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_difference() {
        assert_eq!(difference(&[1.0, 3.0, 6.0, 10.0], 1), vec![2.0, 3.0, 4.0]);
        assert_eq!(difference(&[1.0, 3.0, 6.0, 10.0], 2), vec![1.0, 1.0]);
        assert_eq!(difference(&[1.0], 2), Vec::<f64>::new());
    }

    #[test]
    fn test_integration_weights() {
        assert_eq!(integration_weights(0), Vec::<f64>::new());
        assert_eq!(integration_weights(1), vec![1.0]);
        assert_eq!(integration_weights(2), vec![2.0, -1.0]);
    }

    #[test]
    fn test_random_walk_repeats_last_value() {
        let model = ArimaModel::fit(&[1.0, 2.0, 4.0], ArimaOrder::new(0, 1, 0)).unwrap();
        assert_eq!(model.forecast(3).unwrap(), vec![4.0, 4.0, 4.0]);
        assert_eq!(model.fitted_values(), vec![None, Some(1.0), Some(2.0)]);
    }

    #[test]
    fn test_second_difference_extends_line() {
        let model = ArimaModel::fit(&[1.0, 2.0, 3.0], ArimaOrder::new(0, 2, 0)).unwrap();
        let forecast = model.forecast(3).unwrap();
        assert_relative_eq!(forecast[0], 4.0);
        assert_relative_eq!(forecast[1], 5.0);
        assert_relative_eq!(forecast[2], 6.0);
    }

    #[test]
    fn test_ar1_recovers_coefficient() {
        let mut series = vec![1.0];
        for t in 1..12 {
            let prev: f64 = series[t - 1];
            series.push(0.5 * prev + if t % 2 == 0 { 0.3 } else { -0.3 });
        }
        let model = ArimaModel::fit(&series, ArimaOrder::new(1, 0, 0)).unwrap();

        assert!(model.ar_coefficients()[0].abs() <= COEFFICIENT_BOUND);
        assert!(model.residual_variance().is_finite());
        let forecast = model.forecast(2).unwrap();
        assert_eq!(forecast.len(), 2);
        assert!(forecast.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_short_series_is_rejected() {
        let err = ArimaModel::fit(&[0.1, 0.2, 0.3, 0.4], ArimaOrder::new(2, 1, 2)).unwrap_err();
        assert_eq!(err, ForecastError::InsufficientData { needed: 8, got: 4 });
    }

    #[test]
    fn test_non_finite_input_is_rejected() {
        let series = [0.1, f64::NAN, 0.3, 0.4, 0.5, 0.6];
        assert!(matches!(
            ArimaModel::fit(&series, ArimaOrder::new(1, 1, 1)),
            Err(ForecastError::NonFinite(_))
        ));
    }

    #[test]
    fn test_zero_steps_is_rejected() {
        let model = ArimaModel::fit(&[1.0, 2.0], ArimaOrder::new(0, 1, 0)).unwrap();
        assert!(model.forecast(0).is_err());
    }
}
