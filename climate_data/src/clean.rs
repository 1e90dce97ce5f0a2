//! Cleaning and reshaping the wide table into long format
//!
//! The wide table has one row per year. Reshaping produces one
//! [`Observation`] per year and recognized month column, so a table with
//! `Y` usable years yields exactly `12 * Y` rows when all twelve month
//! columns are present.

use crate::error::{ClimateError, Result};
use crate::loader::RawTable;
use crate::tables::{Month, Observation, ObservationTable};
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Sentinel used upstream for a missing reading
pub const MISSING_SENTINEL: &str = "***";

const YEAR_COLUMN: &str = "Year";

/// Clean and reshape a raw table into the canonical observation table.
///
/// Columns whose name contains `year`, any one character, then `1`
/// (case-insensitive) are discarded as duplicates of the year column.
/// Rows whose year is unusable are dropped. Cells that are empty, the
/// `***` sentinel, or not numeric become absent anomalies.
pub fn clean(raw: &RawTable) -> Result<ObservationTable> {
    let retained: Vec<usize> = raw
        .headers()
        .iter()
        .enumerate()
        .filter(|(_, name)| !is_duplicate_year_column(name))
        .map(|(i, _)| i)
        .collect();

    let year_idx = raw
        .column_index(YEAR_COLUMN)
        .ok_or_else(|| ClimateError::MissingColumn(YEAR_COLUMN.to_string()))?;

    let month_columns = month_columns(raw, &retained, year_idx);
    if month_columns.is_empty() {
        warn!("no month columns recognized; the observation table will be empty");
    }

    let mut seen_years = HashSet::new();
    let mut dropped_rows = 0usize;
    let mut observations = Vec::with_capacity(raw.len() * month_columns.len());

    for row in raw.rows() {
        let year = match parse_year(&row[year_idx]) {
            Some(year) => year,
            None => {
                dropped_rows += 1;
                continue;
            }
        };
        if !seen_years.insert(year) {
            warn!(year, "duplicate year row ignored");
            continue;
        }

        for &(col, month) in &month_columns {
            // Year range is checked by parse_year, so every date exists
            if let Some(obs) = Observation::new(year, month, coerce_anomaly(&row[col])) {
                observations.push(obs);
            }
        }
    }

    if dropped_rows > 0 {
        debug!(dropped_rows, "rows without a usable year dropped");
    }

    let table = ObservationTable::from_observations(observations)?;
    info!(
        rows = table.len(),
        years = seen_years.len(),
        absent = table.absent_count(),
        "reshaped observations"
    );
    Ok(table)
}

/// Month columns in header order, first occurrence of each month wins
fn month_columns(raw: &RawTable, retained: &[usize], year_idx: usize) -> Vec<(usize, Month)> {
    let mut found: Vec<(usize, Month)> = Vec::with_capacity(12);

    for &i in retained.iter().filter(|&&i| i != year_idx) {
        let name = &raw.headers()[i];
        match Month::from_prefix(name) {
            Some(month) if found.iter().any(|&(_, m)| m == month) => {
                warn!(column = %name, month = %month, "repeated month column ignored");
            }
            Some(month) => found.push((i, month)),
            None => debug!(column = %name, "column is not a month; discarded"),
        }
    }

    found
}

/// `year`, any single character, then `1`, ignoring case
pub fn is_duplicate_year_column(name: &str) -> bool {
    let chars: Vec<char> = name.to_lowercase().chars().collect();
    chars.windows(6).any(|w| {
        w[0] == 'y' && w[1] == 'e' && w[2] == 'a' && w[3] == 'r' && w[4] != '\n' && w[5] == '1'
    })
}

/// Parse a year cell; integral decimals such as `1880.0` are accepted
pub fn parse_year(cell: &str) -> Option<i32> {
    let cell = cell.trim();
    let year = match cell.parse::<i32>() {
        Ok(year) => year,
        Err(_) => {
            let value = cell.parse::<f64>().ok()?;
            if !value.is_finite() || value.fract() != 0.0 {
                return None;
            }
            if value < i32::MIN as f64 || value > i32::MAX as f64 {
                return None;
            }
            value as i32
        }
    };

    chrono::NaiveDate::from_ymd_opt(year, 1, 1).map(|_| year)
}

/// Coerce an anomaly cell, `None` when missing or not numeric
pub fn coerce_anomaly(cell: &str) -> Option<f64> {
    let cell = cell.trim();
    if cell.is_empty() || cell == MISSING_SENTINEL {
        return None;
    }
    cell.parse::<f64>().ok().filter(|v| !v.is_nan())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn raw(headers: &[&str], rows: &[&[&str]]) -> RawTable {
        RawTable::new(
            headers.iter().map(|h| h.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    #[test]
    fn test_duplicate_year_pattern() {
        assert!(is_duplicate_year_column("Year.1"));
        assert!(is_duplicate_year_column("YEAR_1"));
        assert!(is_duplicate_year_column("fiscal year 12"));
        assert!(!is_duplicate_year_column("Year"));
        assert!(!is_duplicate_year_column("Year.2"));
        assert!(!is_duplicate_year_column("Year1"));
    }

    #[test]
    fn test_cell_coercion() {
        assert_eq!(coerce_anomaly("***"), None);
        assert_eq!(coerce_anomaly(""), None);
        assert_eq!(coerce_anomaly("n/a"), None);
        assert_eq!(coerce_anomaly("nan"), None);
        assert_eq!(coerce_anomaly(" -.18 "), Some(-0.18));
        assert_eq!(parse_year("1880"), Some(1880));
        assert_eq!(parse_year("1880.0"), Some(1880));
        assert_eq!(parse_year("1880.5"), None);
        assert_eq!(parse_year("Year"), None);
        assert_eq!(parse_year(""), None);
    }

    #[test]
    fn test_missing_year_column() {
        let table = raw(&["Jan", "Feb"], &[&["0.1", "0.2"]]);
        match clean(&table) {
            Err(ClimateError::MissingColumn(name)) => assert_eq!(name, "Year"),
            other => panic!("expected MissingColumn, got {:?}", other),
        }
    }

    #[test]
    fn test_summary_columns_are_discarded() {
        let table = raw(
            &["Year", "Jan", "Feb", "J-D", "DJF", "Year"],
            &[&["2000", "0.1", "***", "0.15", "0.2", "2000"]],
        );
        let cleaned = clean(&table).unwrap();

        assert_eq!(cleaned.len(), 2);
        assert_eq!(cleaned.rows()[0].month, Month::Jan);
        assert_eq!(cleaned.rows()[0].anomaly, Some(0.1));
        assert_eq!(cleaned.rows()[1].anomaly, None);
    }

    #[test]
    fn test_unusable_and_duplicate_years_are_dropped() {
        let table = raw(
            &["Year", "Jan"],
            &[&["2001", "0.3"], &["", "0.9"], &["2000", "0.1"], &["2000", "0.7"]],
        );
        let cleaned = clean(&table).unwrap();

        let years: Vec<i32> = cleaned.iter().map(|o| o.year).collect();
        assert_eq!(years, vec![2000, 2001]);
        assert_eq!(cleaned.rows()[0].anomaly, Some(0.1));
    }
}
