//! Batch coordinate resolution.
//!
//! Collects the distinct rounded coordinates across all pickups and
//! dropoffs, then resolves each to a postal zone with exactly one
//! external call per grid cell. Calls are strictly sequential with an
//! enforced minimum inter-call delay — this protects a shared external
//! quota and must not be parallelized without renegotiating the
//! provider's rate limits.
//!
//! Lookup failures never fail the batch: an unresolvable point, a
//! missing postal code, or a transport error all degrade to a null zone
//! for that coordinate, and every trip referencing it still flows
//! through enrichment.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use taxi_demand_trip_models::{GridCoord, Trip, ZoneLookup};

use crate::progress::ProgressCallback;
use crate::{GeocodeError, ReverseGeocoder};

/// Collects the distinct grid cells referenced by a batch of trips.
///
/// Both the pickup and dropoff side of every trip contribute; the map is
/// keyed by the composite grid key so cells shared between trips (or
/// between both sides of one trip) appear exactly once.
#[must_use]
pub fn distinct_coordinates(trips: &[Trip]) -> BTreeMap<String, GridCoord> {
    let mut coords = BTreeMap::new();
    for trip in trips {
        coords.insert(trip.pickup.key(), trip.pickup);
        coords.insert(trip.dropoff.key(), trip.dropoff);
    }
    coords
}

/// Resolves every distinct coordinate to a zone, one call per cell.
///
/// Issues lookups sequentially with a `rate_limit_ms` sleep gate before
/// each call. The returned [`ZoneLookup`] contains an entry for every
/// input key — unresolved coordinates map to `None`, so downstream joins
/// never distinguish "not looked up" from "looked up, no zone".
///
/// On [`GeocodeError::RateLimited`] the resolver backs off for 60 seconds
/// before continuing; the coordinate still resolves to `None` (no
/// automatic retry).
pub async fn resolve_zones(
    geocoder: &dyn ReverseGeocoder,
    coords: &BTreeMap<String, GridCoord>,
    rate_limit_ms: u64,
    progress: Option<&Arc<dyn ProgressCallback>>,
) -> ZoneLookup {
    let mut zones = ZoneLookup::new();

    if let Some(p) = progress {
        p.set_total(coords.len() as u64);
    }

    for (key, coord) in coords {
        tokio::time::sleep(Duration::from_millis(rate_limit_ms)).await;

        match geocoder.reverse(coord.latitude, coord.longitude).await {
            Ok(Some(zone)) => {
                zones.insert(key.clone(), Some(zone));
            }
            Ok(None) => {
                log::debug!("No postal code for coordinate {key}");
                zones.insert(key.clone(), None);
            }
            Err(e) => {
                log::warn!("Reverse geocode failed for {key}: {e}");
                if matches!(e, GeocodeError::RateLimited) {
                    log::warn!("Rate limited by geocoder, waiting 60s...");
                    tokio::time::sleep(Duration::from_secs(60)).await;
                }
                zones.insert(key.clone(), None);
            }
        }

        if let Some(p) = progress {
            p.set_message(key.clone());
            p.inc(1);
        }
    }

    let resolved = zones.values().filter(|z| z.is_some()).count();
    log::info!(
        "Resolved {resolved}/{} distinct coordinates to zones",
        zones.len()
    );

    zones
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::{TimeZone as _, Utc};

    /// Scripted test double: records every call and answers from a fixed
    /// table of `"lat,lon" -> outcome`.
    struct ScriptedGeocoder {
        calls: Mutex<Vec<String>>,
        zones: BTreeMap<String, Option<String>>,
        failing: Vec<String>,
    }

    impl ScriptedGeocoder {
        fn new(
            zones: &[(&str, Option<&str>)],
            failing: &[&str],
        ) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                zones: zones
                    .iter()
                    .map(|(k, z)| ((*k).to_string(), z.map(String::from)))
                    .collect(),
                failing: failing.iter().map(|s| (*s).to_string()).collect(),
            }
        }

        fn call_keys(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ReverseGeocoder for ScriptedGeocoder {
        async fn reverse(
            &self,
            latitude: f64,
            longitude: f64,
        ) -> Result<Option<String>, GeocodeError> {
            let key = GridCoord::new(latitude, longitude).key();
            self.calls.lock().unwrap().push(key.clone());

            if self.failing.contains(&key) {
                return Err(GeocodeError::Parse {
                    message: "scripted transport failure".to_string(),
                });
            }
            Ok(self.zones.get(&key).cloned().flatten())
        }
    }

    fn trip(id: &str, pickup: (f64, f64), dropoff: (f64, f64)) -> Trip {
        Trip {
            trip_id: id.to_string(),
            taxi_id: "cab1".to_string(),
            started_at: Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap(),
            ended_at: None,
            trip_seconds: 300.0,
            trip_miles: 1.2,
            pickup: GridCoord::new(pickup.0, pickup.1),
            dropoff: GridCoord::new(dropoff.0, dropoff.1),
        }
    }

    #[test]
    fn distinct_coordinates_deduplicates_across_trips() {
        let trips = vec![
            trip("a", (41.88, -87.63), (41.90, -87.65)),
            trip("b", (41.88, -87.63), (41.90, -87.65)),
            // Rounds into the same cells as trip "a".
            trip("c", (41.880_2, -87.630_1), (41.899_8, -87.650_3)),
        ];

        let coords = distinct_coordinates(&trips);
        assert_eq!(coords.len(), 2);
        assert!(coords.contains_key("41.88,-87.63"));
        assert!(coords.contains_key("41.9,-87.65"));
    }

    #[tokio::test]
    async fn one_lookup_call_per_distinct_coordinate() {
        let trips = vec![
            trip("a", (41.88, -87.63), (41.90, -87.65)),
            trip("b", (41.88, -87.63), (41.88, -87.63)),
            trip("c", (41.88, -87.63), (41.90, -87.65)),
        ];
        let double = ScriptedGeocoder::new(
            &[
                ("41.88,-87.63", Some("60602")),
                ("41.9,-87.65", Some("60654")),
            ],
            &[],
        );

        let coords = distinct_coordinates(&trips);
        let zones = resolve_zones(&double, &coords, 0, None).await;

        let mut calls = double.call_keys();
        calls.sort();
        assert_eq!(calls, vec!["41.88,-87.63", "41.9,-87.65"]);
        assert_eq!(zones.len(), 2);
        assert_eq!(zones["41.88,-87.63"].as_deref(), Some("60602"));
        assert_eq!(zones["41.9,-87.65"].as_deref(), Some("60654"));
    }

    #[tokio::test]
    async fn lookup_error_resolves_to_null_zone() {
        let trips = vec![trip("a", (41.88, -87.63), (41.90, -87.65))];
        let double = ScriptedGeocoder::new(
            &[("41.9,-87.65", Some("60654"))],
            &["41.88,-87.63"],
        );

        let coords = distinct_coordinates(&trips);
        let zones = resolve_zones(&double, &coords, 0, None).await;

        assert_eq!(zones.len(), 2);
        assert!(zones["41.88,-87.63"].is_none());
        assert_eq!(zones["41.9,-87.65"].as_deref(), Some("60654"));
    }

    #[tokio::test]
    async fn missing_postcode_resolves_to_null_zone() {
        let trips = vec![trip("a", (41.88, -87.63), (41.90, -87.65))];
        // No entry for the dropoff cell: provider answers with no zone.
        let double = ScriptedGeocoder::new(&[("41.88,-87.63", Some("60602"))], &[]);

        let coords = distinct_coordinates(&trips);
        let zones = resolve_zones(&double, &coords, 0, None).await;

        assert_eq!(zones["41.88,-87.63"].as_deref(), Some("60602"));
        assert!(zones.contains_key("41.9,-87.65"));
        assert!(zones["41.9,-87.65"].is_none());
    }

    #[tokio::test]
    async fn every_input_key_gets_an_entry() {
        let trips = vec![
            trip("a", (41.88, -87.63), (41.90, -87.65)),
            trip("b", (42.01, -87.70), (41.75, -87.60)),
        ];
        let double = ScriptedGeocoder::new(&[], &[]);

        let coords = distinct_coordinates(&trips);
        let zones = resolve_zones(&double, &coords, 0, None).await;

        assert_eq!(zones.len(), coords.len());
        for key in coords.keys() {
            assert!(zones.contains_key(key));
        }
    }
}
