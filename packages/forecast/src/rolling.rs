//! Rolling-window forecasts per zone.
//!
//! Each zone's (date, trips) series is processed independently, sorted
//! ascending by date:
//!
//! - `pred_next_day[i]`: median of the current and immediately preceding
//!   observation (window 2, minimum 1 — the first observation predicts
//!   itself).
//! - `pred_next_week[i]`: sum of the trailing window of up to 7
//!   observations ending at `i`, only once at least 5 observations are
//!   in the window; otherwise imputed as `pred_next_day * 0.90 * 7`.
//!
//! The imputation runs element-wise after the rolling pass.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use taxi_demand_trip_models::{DailyZoneCount, ZoneForecast};

/// Trailing window length for the next-week prediction.
const WEEK_WINDOW: usize = 7;

/// Minimum observations in the trailing window before the next-week sum
/// is considered valid.
const WEEK_MIN_OBSERVATIONS: usize = 5;

/// Discount applied to the daily median when imputing a weekly estimate.
const WEEK_FALLBACK_DISCOUNT: f64 = 0.90;

/// Computes forecasts for every zone in the aggregated series.
///
/// Rows come back grouped by zone (the `None` bucket first), dates
/// ascending within each zone.
#[must_use]
pub fn forecast_zones(counts: &[DailyZoneCount]) -> Vec<ZoneForecast> {
    let mut by_zone: BTreeMap<Option<String>, Vec<(NaiveDate, i64)>> = BTreeMap::new();
    for count in counts {
        by_zone
            .entry(count.zone.clone())
            .or_default()
            .push((count.date, count.trips));
    }

    let mut rows = Vec::with_capacity(counts.len());
    for (zone, mut series) in by_zone {
        series.sort_by_key(|&(date, _)| date);
        rows.extend(forecast_series(zone, &series));
    }

    log::info!("Forecast {} (date, zone) rows", rows.len());
    rows
}

/// Runs the rolling windows over one zone's date-ordered series.
#[allow(clippy::cast_precision_loss)]
fn forecast_series(zone: Option<String>, series: &[(NaiveDate, i64)]) -> Vec<ZoneForecast> {
    let trips: Vec<i64> = series.iter().map(|&(_, t)| t).collect();

    // Rolling pass: window-2 median and window-7/min-5 trailing sum.
    let pred_next_day: Vec<f64> = (0..trips.len())
        .map(|i| {
            if i == 0 {
                trips[0] as f64
            } else {
                (trips[i - 1] + trips[i]) as f64 / 2.0
            }
        })
        .collect();

    let week_sums: Vec<Option<f64>> = (0..trips.len())
        .map(|i| {
            let window = &trips[i.saturating_sub(WEEK_WINDOW - 1)..=i];
            if window.len() >= WEEK_MIN_OBSERVATIONS {
                Some(window.iter().sum::<i64>() as f64)
            } else {
                None
            }
        })
        .collect();

    // Imputation pass, element-wise after the rolling computation.
    series
        .iter()
        .enumerate()
        .map(|(i, &(date, actual))| ZoneForecast {
            date,
            zone: zone.clone(),
            trips: actual,
            pred_next_day: pred_next_day[i],
            pred_next_week: week_sums[i]
                .unwrap_or(pred_next_day[i] * WEEK_FALLBACK_DISCOUNT * 7.0),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(zone: &str, trips: &[i64]) -> Vec<DailyZoneCount> {
        trips
            .iter()
            .enumerate()
            .map(|(i, &t)| DailyZoneCount {
                date: NaiveDate::from_ymd_opt(2024, 1, 1 + u32::try_from(i).unwrap()).unwrap(),
                zone: Some(zone.to_string()),
                trips: t,
            })
            .collect()
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn next_day_is_window_two_median() {
        let rows = forecast_zones(&counts("60601", &[3, 5, 4, 6, 2, 7, 1]));

        assert_close(rows[0].pred_next_day, 3.0);
        assert_close(rows[1].pred_next_day, 4.0);
        assert_close(rows[2].pred_next_day, 4.5);
        assert_close(rows[3].pred_next_day, 5.0);
        assert_close(rows[4].pred_next_day, 4.0);
        assert_close(rows[5].pred_next_day, 4.5);
        assert_close(rows[6].pred_next_day, 4.0);
    }

    #[test]
    fn next_week_sums_once_five_observations_exist() {
        let rows = forecast_zones(&counts("60601", &[3, 5, 4, 6, 2, 7, 1]));

        // Days 1-4: fewer than 5 observations, imputed from the median.
        for row in &rows[..4] {
            assert_close(row.pred_next_week, row.pred_next_day * 0.90 * 7.0);
        }

        assert_close(rows[4].pred_next_week, 20.0); // 3+5+4+6+2
        assert_close(rows[5].pred_next_week, 27.0); // 3+5+4+6+2+7
        assert_close(rows[6].pred_next_week, 28.0); // full week
    }

    #[test]
    fn week_window_slides_after_seven_observations() {
        let rows = forecast_zones(&counts("60601", &[3, 5, 4, 6, 2, 7, 1, 10]));

        // Day 8 drops day 1 from the window: 5+4+6+2+7+1+10.
        assert_close(rows[7].pred_next_week, 35.0);
    }

    #[test]
    fn first_observation_predicts_itself() {
        let rows = forecast_zones(&counts("60601", &[9]));

        assert_close(rows[0].pred_next_day, 9.0);
        assert_close(rows[0].pred_next_week, 9.0 * 0.90 * 7.0);
    }

    #[test]
    fn median_of_adjacent_counts_can_be_fractional() {
        let rows = forecast_zones(&counts("60601", &[4, 5]));
        assert_close(rows[1].pred_next_day, 4.5);
    }

    #[test]
    fn zones_never_read_across_each_other() {
        let mut all = counts("60601", &[3, 5, 4, 6, 2]);
        all.extend(counts("60699", &[100, 200, 300, 400, 500]));

        let rows = forecast_zones(&all);
        let a: Vec<&ZoneForecast> = rows
            .iter()
            .filter(|r| r.zone.as_deref() == Some("60601"))
            .collect();
        let b: Vec<&ZoneForecast> = rows
            .iter()
            .filter(|r| r.zone.as_deref() == Some("60699"))
            .collect();

        assert_close(a[4].pred_next_week, 20.0);
        assert_close(b[4].pred_next_week, 1500.0);
        assert_close(b[1].pred_next_day, 150.0);
    }

    #[test]
    fn null_zone_bucket_is_forecast_like_any_zone() {
        let series: Vec<DailyZoneCount> = (0..5)
            .map(|i| DailyZoneCount {
                date: NaiveDate::from_ymd_opt(2024, 1, 1 + i).unwrap(),
                zone: None,
                trips: 2,
            })
            .collect();

        let rows = forecast_zones(&series);
        assert_eq!(rows.len(), 5);
        assert!(rows.iter().all(|r| r.zone.is_none()));
        assert_close(rows[4].pred_next_week, 10.0);
    }

    #[test]
    fn dates_stay_sorted_within_zone() {
        // Feed counts out of order; the forecaster must sort by date.
        let mut series = counts("60601", &[3, 5, 4]);
        series.reverse();

        let rows = forecast_zones(&series);
        assert_close(rows[0].pred_next_day, 3.0);
        assert_close(rows[1].pred_next_day, 4.0);
        assert_close(rows[2].pred_next_day, 4.5);
    }
}
