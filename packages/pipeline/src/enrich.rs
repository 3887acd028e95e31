//! Zone enrichment join.
//!
//! Left join: every cleaned trip survives regardless of lookup outcome.
//! Both sides join against the batch's [`ZoneLookup`] by the exact
//! rounded-coordinate key, so two raw coordinates that rounded into the
//! same grid cell share one resolved zone.

use taxi_demand_trip_models::{EnrichedTrip, Trip, ZoneLookup};

/// Joins resolved zones onto every trip, pickup and dropoff side
/// independently.
#[must_use]
pub fn enrich_trips(trips: Vec<Trip>, zones: &ZoneLookup) -> Vec<EnrichedTrip> {
    trips
        .into_iter()
        .map(|trip| {
            let pickup_zone = zones.get(&trip.pickup.key()).cloned().flatten();
            let dropoff_zone = zones.get(&trip.dropoff.key()).cloned().flatten();
            EnrichedTrip::new(trip, pickup_zone, dropoff_zone)
        })
        .collect()
}
