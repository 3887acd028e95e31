//! Daily trip counts per zone.
//!
//! Two partial series — per (date, pickup zone) and per (date, dropoff
//! zone) — unioned and summed per (date, zone). A trip whose pickup and
//! dropoff resolve to the same zone on the same date counts twice in
//! that bucket. Unresolved sides aggregate under the `None` zone bucket,
//! which is retained so total volume stays traceable.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use taxi_demand_trip_models::{DailyZoneCount, EnrichedTrip};

/// Builds the daily (date, zone) trip-count series from enriched trips.
///
/// Output pairs are unique after the sum, ordered by date then zone
/// (the `None` bucket sorts first within a date).
#[must_use]
pub fn daily_zone_counts(trips: &[EnrichedTrip]) -> Vec<DailyZoneCount> {
    let mut buckets: BTreeMap<(NaiveDate, Option<String>), i64> = BTreeMap::new();

    for trip in trips {
        *buckets
            .entry((trip.trip_date, trip.pickup_zone.clone()))
            .or_insert(0) += 1;
        *buckets
            .entry((trip.trip_date, trip.dropoff_zone.clone()))
            .or_insert(0) += 1;
    }

    let counts: Vec<DailyZoneCount> = buckets
        .into_iter()
        .map(|((date, zone), trips)| DailyZoneCount { date, zone, trips })
        .collect();

    log::info!(
        "Aggregated {} trips into {} (date, zone) buckets",
        trips.len(),
        counts.len()
    );

    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone as _, Utc};
    use taxi_demand_trip_models::{GridCoord, Trip};

    fn enriched(
        day: u32,
        pickup_zone: Option<&str>,
        dropoff_zone: Option<&str>,
    ) -> EnrichedTrip {
        let trip = Trip {
            trip_id: "t".to_string(),
            taxi_id: "cab1".to_string(),
            started_at: Utc.with_ymd_and_hms(2024, 1, day, 9, 0, 0).unwrap(),
            ended_at: None,
            trip_seconds: 300.0,
            trip_miles: 1.0,
            pickup: GridCoord::new(41.88, -87.63),
            dropoff: GridCoord::new(41.90, -87.65),
        };
        EnrichedTrip::new(
            trip,
            pickup_zone.map(String::from),
            dropoff_zone.map(String::from),
        )
    }

    fn series_for(counts: &[DailyZoneCount], zone: Option<&str>) -> Vec<i64> {
        counts
            .iter()
            .filter(|c| c.zone.as_deref() == zone)
            .map(|c| c.trips)
            .collect()
    }

    #[test]
    fn pickup_only_zone_series_is_exact() {
        // Zone 60601 appears only as a pickup zone: 3 trips on day 1,
        // 5 trips on day 2. Its series must be exactly [3, 5].
        let mut trips = Vec::new();
        for _ in 0..3 {
            trips.push(enriched(1, Some("60601"), Some("60699")));
        }
        for _ in 0..5 {
            trips.push(enriched(2, Some("60601"), Some("60699")));
        }

        let counts = daily_zone_counts(&trips);
        assert_eq!(series_for(&counts, Some("60601")), vec![3, 5]);
    }

    #[test]
    fn same_zone_both_sides_counts_twice() {
        let trips = vec![enriched(1, Some("60601"), Some("60601"))];
        let counts = daily_zone_counts(&trips);

        assert_eq!(counts.len(), 1);
        assert_eq!(counts[0].trips, 2);
    }

    #[test]
    fn buckets_are_unique_after_sum() {
        let trips = vec![
            enriched(1, Some("60601"), Some("60602")),
            enriched(1, Some("60602"), Some("60601")),
        ];
        let counts = daily_zone_counts(&trips);

        assert_eq!(counts.len(), 2);
        for count in &counts {
            assert_eq!(count.trips, 2);
        }
    }

    #[test]
    fn null_zone_bucket_is_retained() {
        let trips = vec![enriched(1, None, Some("60601"))];
        let counts = daily_zone_counts(&trips);

        assert_eq!(counts.len(), 2);
        assert_eq!(series_for(&counts, None), vec![1]);
        assert_eq!(series_for(&counts, Some("60601")), vec![1]);
    }

    #[test]
    fn all_null_batch_aggregates_under_one_bucket_per_date() {
        let trips = vec![
            enriched(1, None, None),
            enriched(1, None, None),
            enriched(2, None, None),
        ];
        let counts = daily_zone_counts(&trips);

        assert_eq!(counts.len(), 2);
        assert_eq!(series_for(&counts, None), vec![4, 2]);
    }

    #[test]
    fn zero_null_batch_has_no_null_bucket() {
        let trips = vec![enriched(1, Some("60601"), Some("60602"))];
        let counts = daily_zone_counts(&trips);

        assert!(counts.iter().all(|c| c.zone.is_some()));
    }
}
