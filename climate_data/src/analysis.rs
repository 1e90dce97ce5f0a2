//! Aggregations over the observation table and the yearly series
//!
//! Every function here is pure: it reads a table and returns a new one.
//! Absent anomalies never take part in a mean, a quantile or a fit.

use crate::error::{ClimateError, Result};
use crate::tables::{
    AnomalyHistogram, CorrelationMatrix, Month, MonthlyRow, MonthlySeries, ObservationTable,
    OutlierSet, PivotRow, TrendStats, YearMonthPivot, YearlyRow, YearlySeries,
};
use climate_math::{
    centered_rolling_mean, histogram, pearson_correlation, quantile_linear, LinearFit,
};
use std::collections::BTreeMap;
use tracing::debug;

/// Multiplier applied to the interquartile range to place the fences
pub const IQR_FENCE_FACTOR: f64 = 1.5;

/// Running sum and count of present values
#[derive(Debug, Clone, Copy, Default)]
struct MeanAccumulator {
    sum: f64,
    count: usize,
}

impl MeanAccumulator {
    fn push(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    fn mean(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(self.sum / self.count as f64)
        }
    }
}

/// Mean anomaly per year, ascending by year.
///
/// Years whose observations are all absent do not appear.
pub fn yearly_mean(table: &ObservationTable) -> YearlySeries {
    let mut groups: BTreeMap<i32, MeanAccumulator> = BTreeMap::new();
    for obs in table {
        if let Some(value) = obs.anomaly {
            groups.entry(obs.year).or_default().push(value);
        }
    }

    let rows = groups
        .into_iter()
        .filter_map(|(year, acc)| {
            acc.mean().map(|anomaly| YearlyRow {
                year,
                anomaly,
                rolling: None,
            })
        })
        .collect();

    YearlySeries::from_rows(rows)
}

/// Mean anomaly per calendar month across all years, January first
pub fn monthly_mean(table: &ObservationTable) -> MonthlySeries {
    let mut groups = [MeanAccumulator::default(); 12];
    for obs in table {
        if let Some(value) = obs.anomaly {
            groups[obs.month.index()].push(value);
        }
    }

    let rows = Month::ALL
        .iter()
        .filter_map(|&month| {
            groups[month.index()]
                .mean()
                .map(|anomaly| MonthlyRow { month, anomaly })
        })
        .collect();

    MonthlySeries::from_rows(rows)
}

/// Attach a centered rolling mean of `window` years.
///
/// The window shrinks at both ends of the series instead of producing
/// absent values.
pub fn add_rolling_average(yearly: &YearlySeries, window: usize) -> Result<YearlySeries> {
    if window == 0 {
        return Err(ClimateError::InvalidParameter(
            "rolling window must be greater than zero".to_string(),
        ));
    }

    let smoothed = centered_rolling_mean(&yearly.values(), window)?;
    let rows = yearly
        .rows()
        .iter()
        .zip(smoothed)
        .map(|(row, rolling)| YearlyRow {
            rolling: Some(rolling),
            ..*row
        })
        .collect();

    Ok(YearlySeries::from_rows(rows))
}

/// Ordinary least squares of yearly anomaly against year
pub fn compute_trend(yearly: &YearlySeries) -> Result<TrendStats> {
    let x: Vec<f64> = yearly.years().into_iter().map(f64::from).collect();
    let y = yearly.values();

    let fit = LinearFit::fit(&x, &y)?;
    debug!(slope = fit.slope, p_value = fit.p_value, n = fit.n, "fitted trend");

    Ok(TrendStats {
        slope: fit.slope,
        intercept: fit.intercept,
        r_squared: fit.r_squared(),
        p_value: fit.p_value,
        std_err: fit.std_err,
        n: fit.n,
    })
}

/// Years outside `[Q1 - 1.5 IQR, Q3 + 1.5 IQR]`, both bounds exclusive.
///
/// Quartiles interpolate linearly between order statistics. An empty
/// series yields an empty set with NaN statistics.
pub fn detect_outliers(yearly: &YearlySeries) -> OutlierSet {
    let values = yearly.values();
    let (q1, q3) = match (quantile_linear(&values, 0.25), quantile_linear(&values, 0.75)) {
        (Ok(q1), Ok(q3)) => (q1, q3),
        _ => {
            return OutlierSet {
                q1: f64::NAN,
                q3: f64::NAN,
                iqr: f64::NAN,
                lower_fence: f64::NAN,
                upper_fence: f64::NAN,
                rows: Vec::new(),
            }
        }
    };

    let iqr = q3 - q1;
    let mut set = OutlierSet {
        q1,
        q3,
        iqr,
        lower_fence: q1 - IQR_FENCE_FACTOR * iqr,
        upper_fence: q3 + IQR_FENCE_FACTOR * iqr,
        rows: Vec::new(),
    };
    set.rows = yearly
        .rows()
        .iter()
        .filter(|r| set.is_outlier(r.anomaly))
        .copied()
        .collect();

    debug!(outliers = set.rows.len(), "detected outlier years");
    set
}

/// Year by month grid of mean anomalies.
///
/// Years without any present value are left out.
pub fn pivot_year_month(table: &ObservationTable) -> YearMonthPivot {
    let mut grid: BTreeMap<i32, [MeanAccumulator; 12]> = BTreeMap::new();
    for obs in table {
        if let Some(value) = obs.anomaly {
            grid.entry(obs.year).or_default()[obs.month.index()].push(value);
        }
    }

    let rows = grid
        .into_iter()
        .map(|(year, cells)| PivotRow {
            year,
            values: cells.map(|acc| acc.mean()),
        })
        .collect();

    YearMonthPivot { rows }
}

/// Pearson correlation between every pair of month columns.
///
/// Each pair uses only the years where both months are present; the
/// entry is absent with fewer than two such years or zero variance.
pub fn monthly_correlation(table: &ObservationTable) -> CorrelationMatrix {
    let pivot = pivot_year_month(table);
    let mut values = [[None; 12]; 12];

    for a in Month::ALL {
        for b in Month::ALL {
            if b < a {
                values[a.index()][b.index()] = values[b.index()][a.index()];
                continue;
            }
            let (xs, ys): (Vec<f64>, Vec<f64>) = pivot
                .rows
                .iter()
                .filter_map(|row| Some((row.values[a.index()]?, row.values[b.index()]?)))
                .unzip();
            values[a.index()][b.index()] = pearson_correlation(&xs, &ys);
        }
    }

    CorrelationMatrix { values }
}

/// Equal-width histogram of present anomalies
pub fn anomaly_histogram(table: &ObservationTable, bins: usize) -> Result<AnomalyHistogram> {
    Ok(histogram(&table.present_anomalies(), bins)?)
}
