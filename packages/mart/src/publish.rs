//! Batch publisher with per-table outcomes.
//!
//! Each table write is independent: the enriched trip table may succeed
//! while the forecast table fails, or vice versa. Failures are reported
//! as values in the [`PublishReport`] — nothing propagates past this
//! boundary, and there is no rollback of a table that already succeeded.

use duckdb::Connection;
use taxi_demand_trip_models::{EnrichedTrip, ZoneForecast};

use crate::{FORECAST_TABLE, MartError, TRIPS_TABLE, enriched, forecasts};

/// Per-table results of a publish run.
#[derive(Debug)]
pub struct PublishReport {
    /// Outcome of the enriched trip table write (rows written on
    /// success).
    pub enriched_trips: Result<u64, MartError>,
    /// Outcome of the forecast table write (rows written on success).
    pub forecasts: Result<u64, MartError>,
}

impl PublishReport {
    /// Whether both table writes succeeded.
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.enriched_trips.is_ok() && self.forecasts.is_ok()
    }
}

/// Writes both mart tables, full-replace, reporting each outcome
/// independently.
pub fn publish(
    conn: &Connection,
    trips: &[EnrichedTrip],
    zone_forecasts: &[ZoneForecast],
) -> PublishReport {
    let enriched_trips = enriched::replace_enriched_trips(conn, trips);
    if let Err(e) = &enriched_trips {
        log::error!("Failed write to data mart ({TRIPS_TABLE}): {e}");
    }

    let forecast_result = forecasts::replace_forecasts(conn, zone_forecasts);
    if let Err(e) = &forecast_result {
        log::error!("Failed write to data mart ({FORECAST_TABLE}): {e}");
    }

    PublishReport {
        enriched_trips,
        forecasts: forecast_result,
    }
}
