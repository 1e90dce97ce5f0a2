//! Derived table types handed to the presentation layer
//!
//! [`ObservationTable`] is the canonical long-format table every other
//! table is computed from. All tables are plain ordered collections that
//! serialize with serde; the two main series also convert to polars
//! DataFrames.

use crate::error::{ClimateError, Result};
use chrono::{Datelike, NaiveDate};
use climate_math::Histogram;
use polars::prelude::*;
use serde::Serialize;
use std::fmt;

/// Days from 0001-01-01 to 1970-01-01 in the proleptic Gregorian calendar
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Calendar month, the fixed set of recognized month columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(into = "u32")]
pub enum Month {
    Jan = 1,
    Feb,
    Mar,
    Apr,
    May,
    Jun,
    Jul,
    Aug,
    Sep,
    Oct,
    Nov,
    Dec,
}

impl Month {
    pub const ALL: [Month; 12] = [
        Month::Jan,
        Month::Feb,
        Month::Mar,
        Month::Apr,
        Month::May,
        Month::Jun,
        Month::Jul,
        Month::Aug,
        Month::Sep,
        Month::Oct,
        Month::Nov,
        Month::Dec,
    ];

    /// Month number, 1 for January through 12 for December
    pub fn number(self) -> u32 {
        self as u32
    }

    /// Zero-based position, handy for fixed-size arrays
    pub fn index(self) -> usize {
        self as usize - 1
    }

    /// Three-letter column label
    pub fn abbreviation(self) -> &'static str {
        match self {
            Month::Jan => "Jan",
            Month::Feb => "Feb",
            Month::Mar => "Mar",
            Month::Apr => "Apr",
            Month::May => "May",
            Month::Jun => "Jun",
            Month::Jul => "Jul",
            Month::Aug => "Aug",
            Month::Sep => "Sep",
            Month::Oct => "Oct",
            Month::Nov => "Nov",
            Month::Dec => "Dec",
        }
    }

    pub fn from_number(number: u32) -> Option<Month> {
        number
            .checked_sub(1)
            .and_then(|i| Month::ALL.get(i as usize).copied())
    }

    /// Recognize a column label by its first three characters.
    ///
    /// The comparison is exact and case-sensitive, so `January` maps to
    /// [`Month::Jan`] while `JAN`, `J-D` or `DJF` are not months.
    pub fn from_prefix(label: &str) -> Option<Month> {
        let prefix: String = label.chars().take(3).collect();
        Month::ALL
            .iter()
            .copied()
            .find(|m| m.abbreviation() == prefix)
    }
}

impl From<Month> for u32 {
    fn from(month: Month) -> u32 {
        month.number()
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.abbreviation())
    }
}

/// One year-month reading
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Observation {
    pub year: i32,
    pub month: Month,
    /// Anomaly in degrees; `None` when the source cell was missing or unparseable
    pub anomaly: Option<f64>,
    /// First day of the month
    pub date: NaiveDate,
}

impl Observation {
    /// Build an observation, deriving its first-of-month date.
    ///
    /// Returns `None` for years outside the representable calendar.
    pub fn new(year: i32, month: Month, anomaly: Option<f64>) -> Option<Self> {
        let date = NaiveDate::from_ymd_opt(year, month.number(), 1)?;
        Some(Self {
            year,
            month,
            anomaly,
            date,
        })
    }
}

/// Canonical long-format table: unique on `(year, month)`, sorted by date
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ObservationTable {
    rows: Vec<Observation>,
}

impl ObservationTable {
    /// Build a table from arbitrary observations.
    ///
    /// Rows are sorted by date; a repeated `(year, month)` is rejected.
    pub fn from_observations(mut rows: Vec<Observation>) -> Result<Self> {
        rows.sort_by_key(|o| o.date);
        if let Some(pair) = rows.windows(2).find(|w| w[0].date == w[1].date) {
            return Err(ClimateError::InvalidParameter(format!(
                "duplicate observation for {} {}",
                pair[0].month, pair[0].year
            )));
        }
        Ok(Self { rows })
    }

    pub fn rows(&self) -> &[Observation] {
        &self.rows
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Observation> {
        self.rows.iter()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Anomalies that are present, in date order
    pub fn present_anomalies(&self) -> Vec<f64> {
        self.rows.iter().filter_map(|o| o.anomaly).collect()
    }

    /// Number of rows whose anomaly is absent
    pub fn absent_count(&self) -> usize {
        self.rows.iter().filter(|o| o.anomaly.is_none()).count()
    }

    /// First `n` rows, for previews
    pub fn head(&self, n: usize) -> &[Observation] {
        &self.rows[..n.min(self.rows.len())]
    }

    /// Columns `Year`, `Month`, `TempAnomaly` (nullable) and `Date`
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let years: Vec<i32> = self.rows.iter().map(|o| o.year).collect();
        let months: Vec<i32> = self.rows.iter().map(|o| o.month.number() as i32).collect();
        let anomalies: Vec<Option<f64>> = self.rows.iter().map(|o| o.anomaly).collect();
        let days: Vec<i32> = self
            .rows
            .iter()
            .map(|o| o.date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE)
            .collect();

        let df = DataFrame::new(vec![
            Series::new("Year", years),
            Series::new("Month", months),
            Series::new("TempAnomaly", anomalies),
            Series::new("Date", days).cast(&DataType::Date)?,
        ])?;
        Ok(df)
    }
}

impl<'a> IntoIterator for &'a ObservationTable {
    type Item = &'a Observation;
    type IntoIter = std::slice::Iter<'a, Observation>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

/// One row of a yearly series
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct YearlyRow {
    pub year: i32,
    pub anomaly: f64,
    /// Centered rolling mean, present only after smoothing
    pub rolling: Option<f64>,
}

/// Mean anomaly per year, ordered by year
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct YearlySeries {
    rows: Vec<YearlyRow>,
}

impl YearlySeries {
    /// Build a series from `(year, anomaly)` points.
    ///
    /// Points are ordered by year; repeated years and non-finite values are
    /// rejected.
    pub fn from_points(points: &[(i32, f64)]) -> Result<Self> {
        let mut rows: Vec<YearlyRow> = points
            .iter()
            .map(|&(year, anomaly)| YearlyRow {
                year,
                anomaly,
                rolling: None,
            })
            .collect();
        rows.sort_by_key(|r| r.year);

        if let Some(row) = rows.iter().find(|r| !r.anomaly.is_finite()) {
            return Err(ClimateError::InvalidParameter(format!(
                "non-finite anomaly for year {}",
                row.year
            )));
        }
        if let Some(pair) = rows.windows(2).find(|w| w[0].year == w[1].year) {
            return Err(ClimateError::InvalidParameter(format!(
                "duplicate year {}",
                pair[0].year
            )));
        }

        Ok(Self { rows })
    }

    pub(crate) fn from_rows(rows: Vec<YearlyRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[YearlyRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn years(&self) -> Vec<i32> {
        self.rows.iter().map(|r| r.year).collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.anomaly).collect()
    }

    /// `(year, anomaly)` pairs in year order
    pub fn points(&self) -> Vec<(i32, f64)> {
        self.rows.iter().map(|r| (r.year, r.anomaly)).collect()
    }

    pub fn last_year(&self) -> Option<i32> {
        self.rows.last().map(|r| r.year)
    }

    pub fn has_rolling(&self) -> bool {
        self.rows.iter().any(|r| r.rolling.is_some())
    }

    /// Columns `Year`, `TempAnomaly` and, when attached, `Rolling`
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let mut columns = vec![
            Series::new("Year", self.years()),
            Series::new("TempAnomaly", self.values()),
        ];
        if self.has_rolling() {
            let rolling: Vec<Option<f64>> = self.rows.iter().map(|r| r.rolling).collect();
            columns.push(Series::new("Rolling", rolling));
        }
        Ok(DataFrame::new(columns)?)
    }
}

/// Mean anomaly of one calendar month across all years
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MonthlyRow {
    pub month: Month,
    pub anomaly: f64,
}

/// Monthly climatology, ordered January to December
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MonthlySeries {
    rows: Vec<MonthlyRow>,
}

impl MonthlySeries {
    pub(crate) fn from_rows(rows: Vec<MonthlyRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[MonthlyRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, month: Month) -> Option<f64> {
        self.rows
            .iter()
            .find(|r| r.month == month)
            .map(|r| r.anomaly)
    }
}

/// Least squares trend of yearly anomaly against year
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrendStats {
    /// Degrees per year
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
    /// Two-sided p-value for zero slope
    pub p_value: f64,
    /// Standard error of the slope
    pub std_err: f64,
    /// Number of years fitted
    pub n: usize,
}

impl TrendStats {
    /// Trend line value at `year`
    pub fn predict(&self, year: i32) -> f64 {
        self.slope * year as f64 + self.intercept
    }
}

/// Years falling outside the interquartile fences
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutlierSet {
    pub q1: f64,
    pub q3: f64,
    pub iqr: f64,
    pub lower_fence: f64,
    pub upper_fence: f64,
    /// Outlying rows, in year order
    pub rows: Vec<YearlyRow>,
}

impl OutlierSet {
    /// Strictly below the lower fence or strictly above the upper fence
    pub fn is_outlier(&self, value: f64) -> bool {
        value < self.lower_fence || value > self.upper_fence
    }

    pub fn years(&self) -> Vec<i32> {
        self.rows.iter().map(|r| r.year).collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Mean anomaly for every year and month, absent where there is no reading
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PivotRow {
    pub year: i32,
    pub values: [Option<f64>; 12],
}

/// Year by month grid of anomalies
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct YearMonthPivot {
    pub rows: Vec<PivotRow>,
}

impl YearMonthPivot {
    /// Values of one month column, one entry per pivot row
    pub fn column(&self, month: Month) -> Vec<Option<f64>> {
        self.rows.iter().map(|r| r.values[month.index()]).collect()
    }
}

/// Pairwise correlation between monthly anomaly columns
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub values: [[Option<f64>; 12]; 12],
}

impl CorrelationMatrix {
    pub fn get(&self, a: Month, b: Month) -> Option<f64> {
        self.values[a.index()][b.index()]
    }
}

/// Distribution of present anomalies
pub type AnomalyHistogram = Histogram;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_labels() {
        assert_eq!(Month::from_prefix("Jan"), Some(Month::Jan));
        assert_eq!(Month::from_prefix("September"), Some(Month::Sep));
        assert_eq!(Month::from_prefix("JAN"), None);
        assert_eq!(Month::from_prefix("J-D"), None);
        assert_eq!(Month::from_prefix("DJF"), None);
        assert_eq!(Month::from_prefix("Ja"), None);
        assert_eq!(Month::Dec.number(), 12);
        assert_eq!(Month::from_number(0), None);
        assert_eq!(Month::from_number(13), None);
        assert_eq!(Month::from_number(3), Some(Month::Mar));
    }

    #[test]
    fn test_observation_date_is_first_of_month() {
        let obs = Observation::new(1999, Month::Feb, Some(0.4)).unwrap();
        assert_eq!(obs.date, NaiveDate::from_ymd_opt(1999, 2, 1).unwrap());
    }

    #[test]
    fn test_duplicate_observations_are_rejected() {
        let a = Observation::new(2000, Month::Jan, Some(0.1)).unwrap();
        let b = Observation::new(2000, Month::Jan, Some(0.2)).unwrap();
        assert!(ObservationTable::from_observations(vec![a, b]).is_err());
    }

    #[test]
    fn test_yearly_series_sorted_by_year() {
        let series = YearlySeries::from_points(&[(2001, 0.2), (2000, 0.1)]).unwrap();
        assert_eq!(series.years(), vec![2000, 2001]);
        assert!(YearlySeries::from_points(&[(2000, 0.1), (2000, 0.2)]).is_err());
        assert!(YearlySeries::from_points(&[(2000, f64::NAN)]).is_err());
    }

    #[test]
    fn test_dataframe_shape() {
        let rows = vec![
            Observation::new(2000, Month::Feb, None).unwrap(),
            Observation::new(2000, Month::Jan, Some(0.5)).unwrap(),
        ];
        let table = ObservationTable::from_observations(rows).unwrap();
        let df = table.to_dataframe().unwrap();

        assert_eq!(df.height(), 2);
        assert_eq!(df.get_column_names(), &["Year", "Month", "TempAnomaly", "Date"]);
        assert_eq!(df.column("TempAnomaly").unwrap().null_count(), 1);
        assert_eq!(df.column("Date").unwrap().dtype(), &DataType::Date);
    }
}
