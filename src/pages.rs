//! Plain-text and JSON renderings of the dashboard pages
//!
//! Every page loads the session data on demand, computes its tables and
//! renders them. Absent values are shown as `N/A`.

use anyhow::Result;
use climate_data::{
    anomaly_histogram, compare_models, compute_trend, detect_outliers, forecast, monthly_correlation,
    monthly_mean, pivot_year_month, predict_year, Month, Observation, ObservationTable, Session,
    YearlySeries,
};
use serde::Serialize;
use std::fmt::Write;

/// Years shown in tabular previews
const PREVIEW_YEARS: usize = 10;

/// Leading observations shown on the overview page
const PREVIEW_ROWS: usize = 5;

/// Width of the longest histogram bar
const BAR_WIDTH: usize = 40;

/// Default target offset for the prediction page
const PREDICT_YEARS_AHEAD: i32 = 5;

/// Earliest target year offered by the comparison page
const COMPARE_DEFAULT_YEAR: i32 = 2026;

/// The dashboard pages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Overview,
    Trend,
    Monthly,
    Outliers,
    Heatmap,
    Predict,
    Compare,
    About,
}

impl Page {
    pub const ALL: [Page; 8] = [
        Page::Overview,
        Page::Trend,
        Page::Monthly,
        Page::Outliers,
        Page::Heatmap,
        Page::Predict,
        Page::Compare,
        Page::About,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Page::Overview => "Climate Data Dashboard - Overview",
            Page::Trend => "Trend Analysis",
            Page::Monthly => "Monthly Pattern",
            Page::Outliers => "Outliers",
            Page::Heatmap => "Heatmap",
            Page::Predict => "ML Prediction",
            Page::Compare => "Model Comparison",
            Page::About => "About",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PageOptions {
    /// Target year for the prediction and comparison pages
    pub target_year: Option<i32>,
    pub format: OutputFormat,
}

/// Render `page` from the session data
pub fn render(page: Page, session: &Session, options: &PageOptions) -> Result<String> {
    match page {
        Page::Overview => overview(session, options.format),
        Page::Trend => trend(session, options.format),
        Page::Monthly => monthly(session, options.format),
        Page::Outliers => outliers(session, options.format),
        Page::Heatmap => heatmap(session, options.format),
        Page::Predict => predict(session, options),
        Page::Compare => compare(session, options),
        Page::About => about(session, options.format),
    }
}

/// `N/A` for an absent value, fixed precision otherwise
pub fn format_value(value: Option<f64>, precision: usize) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{:.*}", precision, v),
        _ => "N/A".to_string(),
    }
}

fn header(page: Page) -> String {
    format!("{}\n{}\n", page.title(), "=".repeat(page.title().len()))
}

fn to_json<T: Serialize>(payload: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(payload)?)
}

fn tail<T>(rows: &[T], n: usize) -> &[T] {
    &rows[rows.len().saturating_sub(n)..]
}

#[derive(Serialize)]
struct OverviewPayload<'a> {
    observations: usize,
    absent: usize,
    first_year: Option<i32>,
    last_year: Option<i32>,
    preview: &'a [Observation],
    yearly: &'a YearlySeries,
    histogram: &'a climate_math::Histogram,
}

fn overview(session: &Session, format: OutputFormat) -> Result<String> {
    let table = session.observations()?;
    let yearly = session.smoothed_yearly()?;
    let histogram = anomaly_histogram(table, session.config().analysis.histogram_bins)?;

    let payload = OverviewPayload {
        observations: table.len(),
        absent: table.absent_count(),
        first_year: yearly.rows().first().map(|r| r.year),
        last_year: yearly.last_year(),
        preview: table.head(PREVIEW_ROWS),
        yearly: &yearly,
        histogram: &histogram,
    };
    if format == OutputFormat::Json {
        return to_json(&payload);
    }

    let mut out = header(Page::Overview);
    writeln!(
        out,
        "{} monthly observations ({} absent), years {} to {}",
        payload.observations,
        payload.absent,
        payload.first_year.map_or("N/A".to_string(), |y| y.to_string()),
        payload.last_year.map_or("N/A".to_string(), |y| y.to_string()),
    )?;

    writeln!(out, "\nData preview")?;
    writeln!(out, "{:>6} {:>5} {:>10} {:>12}", "Year", "Month", "Anomaly", "Date")?;
    for row in payload.preview {
        writeln!(
            out,
            "{:>6} {:>5} {:>10} {:>12}",
            row.year,
            row.month,
            format_value(row.anomaly, 2),
            row.date.to_string()
        )?;
    }

    writeln!(
        out,
        "\nRecent years ({}-year rolling mean)",
        session.config().analysis.rolling_window
    )?;
    writeln!(out, "{:>6} {:>10} {:>10}", "Year", "Anomaly", "Rolling")?;
    for row in tail(yearly.rows(), PREVIEW_YEARS) {
        writeln!(
            out,
            "{:>6} {:>10.3} {:>10}",
            row.year,
            row.anomaly,
            format_value(row.rolling, 3)
        )?;
    }

    writeln!(out, "\nDistribution of monthly anomalies")?;
    let peak = histogram.counts.iter().copied().max().unwrap_or(0).max(1);
    for (i, &count) in histogram.counts.iter().enumerate() {
        let bar = "#".repeat(count * BAR_WIDTH / peak);
        writeln!(
            out,
            "[{:>7.3}, {:>7.3}) {:>5} {}",
            histogram.edges[i],
            histogram.edges[i + 1],
            count,
            bar
        )?;
    }
    Ok(out)
}

#[derive(Serialize)]
struct TrendPayload<'a> {
    trend: &'a climate_data::TrendStats,
    forecast_years: Vec<i32>,
    forecast: &'a [Option<f64>],
}

fn trend(session: &Session, format: OutputFormat) -> Result<String> {
    let yearly = session.yearly()?;
    let stats = compute_trend(&yearly)?;

    let settings = &session.config().forecast;
    let projected = forecast(&yearly.points(), settings.steps, settings.arima_order());
    let last_year = yearly.last_year().unwrap_or_default();
    let forecast_years: Vec<i32> = (1..=projected.len() as i32).map(|h| last_year + h).collect();

    if format == OutputFormat::Json {
        return to_json(&TrendPayload {
            trend: &stats,
            forecast_years,
            forecast: &projected,
        });
    }

    let mut out = header(Page::Trend);
    writeln!(out, "Trend Statistics")?;
    writeln!(out, "  Slope:     {:.6} per year ({:.4} per decade)", stats.slope, stats.slope * 10.0)?;
    writeln!(out, "  Intercept: {:.4}", stats.intercept)?;
    writeln!(out, "  R²:        {:.4}", stats.r_squared)?;
    writeln!(out, "  p-value:   {:.3e}", stats.p_value)?;
    writeln!(out, "  Std err:   {:.6}", stats.std_err)?;
    writeln!(out, "  Years:     {}", stats.n)?;

    writeln!(out, "\n{} forecast", settings.arima_order())?;
    for (year, value) in forecast_years.iter().zip(&projected) {
        writeln!(out, "  {} {:>8}", year, format_value(*value, 4))?;
    }
    Ok(out)
}

fn monthly(session: &Session, format: OutputFormat) -> Result<String> {
    let series = monthly_mean(session.observations()?);
    if format == OutputFormat::Json {
        return to_json(&series);
    }

    let mut out = header(Page::Monthly);
    writeln!(out, "Average anomaly per month")?;
    for month in Month::ALL {
        writeln!(out, "  {} {:>8}", month, format_value(series.get(month), 4))?;
    }
    Ok(out)
}

fn outliers(session: &Session, format: OutputFormat) -> Result<String> {
    let set = detect_outliers(&session.yearly()?);
    if format == OutputFormat::Json {
        return to_json(&set);
    }

    let mut out = header(Page::Outliers);
    writeln!(
        out,
        "Q1 {}  Q3 {}  IQR {}",
        format_value(Some(set.q1), 4),
        format_value(Some(set.q3), 4),
        format_value(Some(set.iqr), 4)
    )?;
    writeln!(
        out,
        "Fences [{}, {}]",
        format_value(Some(set.lower_fence), 4),
        format_value(Some(set.upper_fence), 4)
    )?;

    writeln!(out, "\nOutlier Years")?;
    if set.is_empty() {
        writeln!(out, "  none")?;
    }
    for row in &set.rows {
        writeln!(out, "  {} {:>8.4}", row.year, row.anomaly)?;
    }
    Ok(out)
}

#[derive(Serialize)]
struct HeatmapPayload {
    pivot: climate_data::YearMonthPivot,
    correlation: climate_data::CorrelationMatrix,
}

fn heatmap(session: &Session, format: OutputFormat) -> Result<String> {
    let table: &ObservationTable = session.observations()?;
    let payload = HeatmapPayload {
        pivot: pivot_year_month(table),
        correlation: monthly_correlation(table),
    };
    if format == OutputFormat::Json {
        return to_json(&payload);
    }

    let mut out = header(Page::Heatmap);
    let months: String = Month::ALL.iter().map(|m| format!("{:>6}", m)).collect();

    writeln!(out, "Year x Month anomalies (last {} years)", PREVIEW_YEARS)?;
    writeln!(out, "{:>6}{}", "Year", months)?;
    for row in tail(&payload.pivot.rows, PREVIEW_YEARS) {
        let cells: String = row
            .values
            .iter()
            .map(|v| format!("{:>6}", format_value(*v, 2)))
            .collect();
        writeln!(out, "{:>6}{}", row.year, cells)?;
    }

    writeln!(out, "\nMonthly correlation")?;
    writeln!(out, "{:>6}{}", "", months)?;
    for a in Month::ALL {
        let cells: String = Month::ALL
            .iter()
            .map(|&b| format!("{:>6}", format_value(payload.correlation.get(a, b), 2)))
            .collect();
        writeln!(out, "{:>6}{}", a, cells)?;
    }
    Ok(out)
}

fn predict(session: &Session, options: &PageOptions) -> Result<String> {
    let yearly = session.yearly()?;
    let last_year = yearly.last_year().unwrap_or_default();
    let target = options.target_year.unwrap_or(last_year + PREDICT_YEARS_AHEAD);

    let predictions = predict_year(&yearly, target, &session.config().prediction)?;
    if options.format == OutputFormat::Json {
        return to_json(&predictions);
    }

    let mut out = header(Page::Predict);
    writeln!(out, "Prediction Results for {}", target)?;
    for (model, value) in predictions.entries() {
        let label = match model {
            climate_data::ModelKind::Polynomial => {
                format!("{} (degree {})", model, predictions.polynomial_degree)
            }
            _ => model.to_string(),
        };
        writeln!(out, "  {:<32} {:>8} °C", label, format_value(value, 4))?;
    }
    Ok(out)
}

fn compare(session: &Session, options: &PageOptions) -> Result<String> {
    let yearly = session.yearly()?;
    let last_year = yearly.last_year().unwrap_or_default();
    let target = options
        .target_year
        .unwrap_or_else(|| COMPARE_DEFAULT_YEAR.max(last_year + 1));

    let comparison = compare_models(&yearly, target, &session.config().prediction)?;
    if options.format == OutputFormat::Json {
        return to_json(&comparison);
    }

    let mut out = header(Page::Compare);
    writeln!(out, "Model Predictions for {}", target)?;
    writeln!(
        out,
        "  {:<24} {:>10} {:>10} {:>10} {:>10}",
        "Model", "Predicted", "RMSE", "MAE", "R2"
    )?;
    for score in &comparison.scores {
        let metrics = score.metrics;
        writeln!(
            out,
            "  {:<24} {:>10} {:>10} {:>10} {:>10}",
            score.model.label(),
            format_value(score.prediction, 4),
            format_value(metrics.map(|m| m.rmse), 4),
            format_value(metrics.map(|m| m.mae), 4),
            format_value(metrics.map(|m| m.r2), 4)
        )?;
    }
    if let Some(best) = comparison.best_by_rmse() {
        writeln!(out, "\nLowest in-sample RMSE: {}", best)?;
    }
    Ok(out)
}

#[derive(Serialize)]
struct AboutPayload<'a> {
    version: &'a str,
    source: String,
    config: &'a climate_data::DashboardConfig,
}

fn about(session: &Session, format: OutputFormat) -> Result<String> {
    if format == OutputFormat::Json {
        return to_json(&AboutPayload {
            version: crate::VERSION,
            source: session.source_description(),
            config: session.config(),
        });
    }

    let mut out = header(Page::About);
    writeln!(out, "This project uses NASA global temperature anomaly data.")?;
    writeln!(out, "It demonstrates:")?;
    for topic in [
        "Cleaning raw data",
        "Long-format conversion",
        "Trend analysis using linear regression",
        "Outlier detection using IQR",
        "Monthly correlation analysis",
        "Simple ML prediction",
    ] {
        writeln!(out, "  - {}", topic)?;
    }
    writeln!(out, "\nData source: {}", session.source_description())?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use climate_data::{DashboardConfig, RawTable};
    use pretty_assertions::assert_eq;

    fn session() -> Session {
        let mut text = String::from("Year,Jan,Feb,Mar,Apr,May,Jun,Jul,Aug,Sep,Oct,Nov,Dec\n");
        for i in 0..30 {
            let base = -0.3 + 0.02 * i as f64;
            let cells: Vec<String> = (0..12)
                .map(|m| {
                    if i == 29 && m == 11 {
                        "***".to_string()
                    } else {
                        format!("{:.2}", base + 0.01 * ((i + m) % 4) as f64)
                    }
                })
                .collect();
            text.push_str(&format!("{},{}\n", 1990 + i, cells.join(",")));
        }
        let raw = RawTable::from_csv_str(&text, 0).unwrap();
        Session::new(Box::new(raw), DashboardConfig::default())
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(None, 2), "N/A");
        assert_eq!(format_value(Some(f64::NAN), 2), "N/A");
        assert_eq!(format_value(Some(0.126), 2), "0.13");
    }

    #[test]
    fn test_every_page_renders() {
        let session = session();
        for page in Page::ALL {
            let text = render(page, &session, &PageOptions::default()).unwrap();
            assert!(text.starts_with(page.title()), "{:?}", page);
        }
    }

    #[test]
    fn test_json_output_parses() {
        let session = session();
        let options = PageOptions {
            target_year: Some(2030),
            format: OutputFormat::Json,
        };
        for page in Page::ALL {
            let text = render(page, &session, &options).unwrap();
            let value: serde_json::Value = serde_json::from_str(&text).unwrap();
            assert!(value.is_object(), "{:?}", page);
        }
    }

    #[test]
    fn test_about_does_not_load_data() {
        let session = session();
        render(Page::About, &session, &PageOptions::default()).unwrap();
        assert!(!session.is_loaded());
    }

    #[test]
    fn test_overview_previews_leading_rows() {
        let text = render(Page::Overview, &session(), &PageOptions::default()).unwrap();
        assert!(text.contains("Data preview"));
        assert!(text.contains("  1990   Jan      -0.30   1990-01-01"));
        assert!(text.contains("  1990   May      -0.30   1990-05-01"));
        assert!(!text.contains("1990-06-01"));

        let json = render(
            Page::Overview,
            &session(),
            &PageOptions {
                target_year: None,
                format: OutputFormat::Json,
            },
        )
        .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["preview"].as_array().map(Vec::len), Some(PREVIEW_ROWS));
        assert_eq!(value["preview"][0]["month"], 1);
    }

    #[test]
    fn test_distant_target_year_is_reported() {
        let session = session();
        for page in [Page::Predict, Page::Compare] {
            let options = PageOptions {
                target_year: Some(i32::MAX),
                format: OutputFormat::Text,
            };
            let err = render(page, &session, &options).unwrap_err();
            assert!(
                matches!(
                    err.downcast_ref::<climate_data::ClimateError>(),
                    Some(climate_data::ClimateError::InvalidParameter(_))
                ),
                "{:?}",
                page
            );
        }
    }
}
