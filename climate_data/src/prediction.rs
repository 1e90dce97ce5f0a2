//! Illustrative predictions of a future year's anomaly
//!
//! Four models are fitted to the yearly series: a straight line, a
//! polynomial, a random forest over the year, and ARIMA. Only ARIMA may
//! come back absent; the regressions either fit or report an error.

use crate::config::PredictionSettings;
use crate::error::{ClimateError, Result};
use crate::forecast::{forecast, MAX_FORECAST_STEPS};
use crate::models::{ArimaModel, ArimaOrder};
use crate::tables::YearlySeries;
use climate_math::{FitMetrics, ForestConfig, LinearFit, PolynomialRegression, RandomForestRegressor};
use serde::Serialize;
use std::fmt;
use tracing::{info, warn};

/// ARIMA order used for single-year predictions
pub const PREDICTION_ARIMA_ORDER: ArimaOrder = ArimaOrder::new(1, 1, 1);

/// ARIMA order used when comparing models
pub const COMPARISON_ARIMA_ORDER: ArimaOrder = ArimaOrder::new(2, 1, 2);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ModelKind {
    Linear,
    Polynomial,
    RandomForest,
    Arima,
}

impl ModelKind {
    pub const ALL: [ModelKind; 4] = [
        ModelKind::Linear,
        ModelKind::Polynomial,
        ModelKind::RandomForest,
        ModelKind::Arima,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ModelKind::Linear => "Linear Regression",
            ModelKind::Polynomial => "Polynomial Regression",
            ModelKind::RandomForest => "Random Forest",
            ModelKind::Arima => "ARIMA",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

/// Point predictions of every model for one target year
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelPredictions {
    pub target_year: i32,
    pub polynomial_degree: usize,
    pub linear: f64,
    pub polynomial: f64,
    pub random_forest: f64,
    /// Absent when ARIMA estimation failed
    pub arima: Option<f64>,
}

impl ModelPredictions {
    /// Predictions in display order
    pub fn entries(&self) -> [(ModelKind, Option<f64>); 4] {
        [
            (ModelKind::Linear, Some(self.linear)),
            (ModelKind::Polynomial, Some(self.polynomial)),
            (ModelKind::RandomForest, Some(self.random_forest)),
            (ModelKind::Arima, self.arima),
        ]
    }
}

/// One model's prediction and in-sample fit quality
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelScore {
    pub model: ModelKind,
    pub prediction: Option<f64>,
    pub metrics: Option<FitMetrics>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelComparison {
    pub target_year: i32,
    pub scores: Vec<ModelScore>,
}

impl ModelComparison {
    pub fn get(&self, model: ModelKind) -> Option<&ModelScore> {
        self.scores.iter().find(|s| s.model == model)
    }

    /// Model with the lowest in-sample RMSE
    pub fn best_by_rmse(&self) -> Option<ModelKind> {
        self.scores
            .iter()
            .filter_map(|s| s.metrics.map(|m| (s.model, m.rmse)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(model, _)| model)
    }
}

/// The three regressions fitted on year against anomaly
struct Regressions {
    years: Vec<f64>,
    values: Vec<f64>,
    linear: LinearFit,
    polynomial: PolynomialRegression,
    forest: RandomForestRegressor,
}

impl Regressions {
    fn fit(yearly: &YearlySeries, settings: &PredictionSettings) -> Result<Self> {
        if !(2..=6).contains(&settings.polynomial_degree) {
            return Err(ClimateError::InvalidParameter(format!(
                "polynomial degree must be between 2 and 6, got {}",
                settings.polynomial_degree
            )));
        }

        let years: Vec<f64> = yearly.years().into_iter().map(f64::from).collect();
        let values = yearly.values();

        let linear = LinearFit::fit(&years, &values)?;
        let polynomial = PolynomialRegression::fit(&years, &values, settings.polynomial_degree)?;
        let forest = RandomForestRegressor::fit(
            &years,
            &values,
            &ForestConfig {
                n_trees: settings.forest_trees,
                seed: settings.forest_seed,
                ..Default::default()
            },
        )?;

        Ok(Self {
            years,
            values,
            linear,
            polynomial,
            forest,
        })
    }

    fn in_sample(&self, predict: impl Fn(f64) -> f64) -> Result<FitMetrics> {
        let predicted: Vec<f64> = self.years.iter().map(|&x| predict(x)).collect();
        Ok(FitMetrics::evaluate(&self.values, &predicted)?)
    }
}

/// Years between the last observation and `target_year`
fn check_target(yearly: &YearlySeries, target_year: i32) -> Result<usize> {
    let last_year = yearly.last_year().ok_or_else(|| {
        ClimateError::InvalidParameter("yearly series is empty".to_string())
    })?;
    if target_year <= last_year {
        return Err(ClimateError::InvalidParameter(format!(
            "target year {} must be after the last observed year {}",
            target_year, last_year
        )));
    }
    let horizon = (i64::from(target_year) - i64::from(last_year)) as u64;
    if horizon > MAX_FORECAST_STEPS as u64 {
        return Err(ClimateError::InvalidParameter(format!(
            "target year {} is more than {} years after the last observed year {}",
            target_year, MAX_FORECAST_STEPS, last_year
        )));
    }
    Ok(horizon as usize)
}

/// Predict the anomaly of `target_year` with every model.
///
/// ARIMA forecasts `target_year - last_year` steps and reports the last one.
pub fn predict_year(
    yearly: &YearlySeries,
    target_year: i32,
    settings: &PredictionSettings,
) -> Result<ModelPredictions> {
    let steps = check_target(yearly, target_year)?;
    let fits = Regressions::fit(yearly, settings)?;
    let x = f64::from(target_year);

    let arima = forecast(&yearly.points(), steps, PREDICTION_ARIMA_ORDER)
        .last()
        .copied()
        .flatten();

    info!(target_year, steps, arima_available = arima.is_some(), "predicted target year");
    Ok(ModelPredictions {
        target_year,
        polynomial_degree: settings.polynomial_degree,
        linear: fits.linear.predict(x),
        polynomial: fits.polynomial.predict(x),
        random_forest: fits.forest.predict(x),
        arima,
    })
}

/// Fit every model, predict `target_year` and score the in-sample fit.
///
/// ARIMA predicts one step past the last year and is scored on its
/// one-step fitted values; both are absent when estimation fails.
pub fn compare_models(
    yearly: &YearlySeries,
    target_year: i32,
    settings: &PredictionSettings,
) -> Result<ModelComparison> {
    check_target(yearly, target_year)?;
    let fits = Regressions::fit(yearly, settings)?;
    let x = f64::from(target_year);

    let mut scores = vec![
        ModelScore {
            model: ModelKind::Linear,
            prediction: Some(fits.linear.predict(x)),
            metrics: Some(fits.in_sample(|v| fits.linear.predict(v))?),
        },
        ModelScore {
            model: ModelKind::Polynomial,
            prediction: Some(fits.polynomial.predict(x)),
            metrics: Some(fits.in_sample(|v| fits.polynomial.predict(v))?),
        },
        ModelScore {
            model: ModelKind::RandomForest,
            prediction: Some(fits.forest.predict(x)),
            metrics: Some(fits.in_sample(|v| fits.forest.predict(v))?),
        },
    ];
    scores.push(arima_score(&fits.values));

    Ok(ModelComparison {
        target_year,
        scores,
    })
}

fn arima_score(values: &[f64]) -> ModelScore {
    let degraded = ModelScore {
        model: ModelKind::Arima,
        prediction: None,
        metrics: None,
    };

    let model = match ArimaModel::fit(values, COMPARISON_ARIMA_ORDER) {
        Ok(model) => model,
        Err(err) => {
            warn!(order = %COMPARISON_ARIMA_ORDER, error = %err, "ARIMA comparison degraded");
            return degraded;
        }
    };
    let prediction = match model.forecast(1) {
        Ok(forecast) => forecast.first().copied(),
        Err(err) => {
            warn!(order = %COMPARISON_ARIMA_ORDER, error = %err, "ARIMA comparison degraded");
            return degraded;
        }
    };

    let (actual, fitted): (Vec<f64>, Vec<f64>) = values
        .iter()
        .zip(model.fitted_values())
        .filter_map(|(&a, f)| f.map(|f| (a, f)))
        .unzip();
    let metrics = FitMetrics::evaluate(&actual, &fitted).ok();

    ModelScore {
        model: ModelKind::Arima,
        prediction,
        metrics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(n: i32) -> YearlySeries {
        let points: Vec<(i32, f64)> = (0..n)
            .map(|i| (1980 + i, 0.02 * i as f64 + if i % 3 == 0 { 0.05 } else { -0.02 }))
            .collect();
        YearlySeries::from_points(&points).unwrap()
    }

    #[test]
    fn test_target_must_be_in_future() {
        let yearly = series(10);
        let settings = PredictionSettings::default();
        assert!(predict_year(&yearly, 1989, &settings).is_err());
        assert!(compare_models(&yearly, 1980, &settings).is_err());
        assert!(predict_year(&YearlySeries::default(), 2000, &settings).is_err());
    }

    #[test]
    fn test_distant_target_is_rejected() {
        let yearly = series(10);
        let settings = PredictionSettings::default();
        assert!(matches!(
            predict_year(&yearly, i32::MAX, &settings),
            Err(ClimateError::InvalidParameter(_))
        ));
        assert!(matches!(
            compare_models(&yearly, 1989 + MAX_FORECAST_STEPS as i32 + 1, &settings),
            Err(ClimateError::InvalidParameter(_))
        ));
        let farthest = predict_year(&yearly, 1989 + MAX_FORECAST_STEPS as i32, &settings).unwrap();
        assert_eq!(farthest.target_year, 2189);
    }

    #[test]
    fn test_polynomial_degree_is_checked() {
        let settings = PredictionSettings {
            polynomial_degree: 7,
            ..Default::default()
        };
        assert!(predict_year(&series(20), 2010, &settings).is_err());
    }

    #[test]
    fn test_short_series_degrades_only_arima() {
        let comparison = compare_models(&series(6), 1990, &PredictionSettings::default()).unwrap();

        assert_eq!(comparison.scores.len(), 4);
        let arima = comparison.get(ModelKind::Arima).unwrap();
        assert_eq!(arima.prediction, None);
        assert_eq!(arima.metrics, None);
        assert!(comparison.get(ModelKind::Linear).unwrap().metrics.is_some());
        assert!(comparison.best_by_rmse().is_some());
    }
}
