use approx::assert_relative_eq;
use climate_data::{
    add_rolling_average, compute_trend, detect_outliers, monthly_mean, pivot_year_month,
    yearly_mean, Month, Observation, ObservationTable, YearlySeries,
};
use rstest::rstest;

fn table(rows: &[(i32, Month, Option<f64>)]) -> ObservationTable {
    ObservationTable::from_observations(
        rows.iter()
            .map(|&(y, m, v)| Observation::new(y, m, v).unwrap())
            .collect(),
    )
    .unwrap()
}

fn yearly(values: &[f64]) -> YearlySeries {
    let points: Vec<(i32, f64)> = values
        .iter()
        .enumerate()
        .map(|(i, &v)| (1900 + i as i32, v))
        .collect();
    YearlySeries::from_points(&points).unwrap()
}

#[test]
fn test_yearly_mean_ignores_absent_values() {
    let t = table(&[
        (2020, Month::Jan, Some(1.0)),
        (2020, Month::Feb, Some(2.0)),
        (2020, Month::Mar, None),
    ]);
    let series = yearly_mean(&t);

    assert_eq!(series.len(), 1);
    assert_relative_eq!(series.rows()[0].anomaly, 1.5);
}

#[test]
fn test_year_without_present_values_is_omitted() {
    let t = table(&[
        (2019, Month::Jan, None),
        (2020, Month::Jan, Some(0.2)),
        (2021, Month::Jan, None),
        (2021, Month::Feb, None),
    ]);
    assert_eq!(yearly_mean(&t).years(), vec![2020]);
    assert_eq!(monthly_mean(&t).len(), 1);
}

#[test]
fn test_rolling_average_shrinks_at_boundaries() {
    let series = yearly(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);
    let smoothed = add_rolling_average(&series, 5).unwrap();
    let rolling: Vec<f64> = smoothed.rows().iter().map(|r| r.rolling.unwrap()).collect();

    assert_relative_eq!(rolling[0], 2.0);
    assert_relative_eq!(rolling[1], 2.5);
    assert_relative_eq!(rolling[3], 4.0);
    assert_relative_eq!(rolling[5], 5.5);
    assert_relative_eq!(rolling[6], 6.0);
    // The source series is left untouched
    assert!(!series.has_rolling());
}

#[rstest]
#[case(10.5, false)]
#[case(11.5, true)]
#[case(6.0, false)]
fn test_outlier_upper_fence_is_strict(#[case] last: f64, #[case] outlier: bool) {
    let series = yearly(&[0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, last]);
    let set = detect_outliers(&series);

    assert_relative_eq!(set.q1, 1.75);
    assert_relative_eq!(set.q3, 5.25);
    assert_relative_eq!(set.upper_fence, 10.5);
    assert_eq!(set.years().contains(&1907), outlier);
}

#[test]
fn test_outliers_keep_year_order() {
    let series = yearly(&[-9.0, 0.0, 0.1, 0.2, 0.1, 0.0, 0.1, 9.0]);
    let set = detect_outliers(&series);
    assert_eq!(set.years(), vec![1900, 1907]);
}

#[test]
fn test_trend_statistics() {
    let series =
        YearlySeries::from_points(&[(2000, 1.0), (2001, 3.0), (2002, 2.0), (2003, 5.0), (2004, 4.0)])
            .unwrap();
    let trend = compute_trend(&series).unwrap();

    assert_relative_eq!(trend.slope, 0.8, epsilon = 1e-9);
    assert_relative_eq!(trend.intercept, -1598.6, epsilon = 1e-6);
    assert_relative_eq!(trend.r_squared, 0.64, epsilon = 1e-9);
    assert_relative_eq!(trend.p_value, 0.10409, epsilon = 1e-4);
    assert_eq!(trend.n, 5);
    assert_relative_eq!(trend.predict(2005), 5.4, epsilon = 1e-6);
}

#[test]
fn test_trend_needs_two_years() {
    let series = YearlySeries::from_points(&[(2000, 1.0)]).unwrap();
    assert!(compute_trend(&series).is_err());
}

#[test]
fn test_pivot_leaves_missing_months_absent() {
    let t = table(&[
        (2000, Month::Jan, Some(0.1)),
        (2000, Month::Feb, None),
        (2001, Month::Feb, Some(0.3)),
    ]);
    let pivot = pivot_year_month(&t);

    assert_eq!(pivot.rows.len(), 2);
    assert_eq!(pivot.column(Month::Jan), vec![Some(0.1), None]);
    assert_eq!(pivot.column(Month::Feb), vec![None, Some(0.3)]);
}
