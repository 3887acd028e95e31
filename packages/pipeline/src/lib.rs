#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Batch orchestration for the taxi demand pipeline.
//!
//! One batch run is strictly sequential: load → clean → resolve →
//! enrich → aggregate → forecast → publish, with no re-entrancy across
//! stages. [`process_rows`] is the in-memory middle of the pipeline
//! (everything between the lake read and the mart write), so it can be
//! exercised end to end against a geocoder double without touching
//! either store. [`run_batch`] wraps it with the scoped lake and mart
//! sessions.

pub mod enrich;
pub mod progress;

use std::sync::Arc;
use std::time::Instant;

use taxi_demand_geocoder::ReverseGeocoder;
use taxi_demand_geocoder::progress::ProgressCallback;
use taxi_demand_geocoder::resolver;
use taxi_demand_mart::publish::PublishReport;
use taxi_demand_trip_models::{EnrichedTrip, RawTripRow, ZoneForecast};
use thiserror::Error;

/// Errors from a batch run.
///
/// Lookup defects never appear here — the resolver degrades them to
/// null zones. Mart write failures are reported inside
/// [`BatchSummary::report`] rather than raised.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Reading the lake failed.
    #[error("Warehouse error: {0}")]
    Warehouse(#[from] taxi_demand_warehouse::WarehouseError),

    /// Opening the mart failed.
    #[error("Mart error: {0}")]
    Mart(#[from] taxi_demand_mart::MartError),
}

/// Tunables for one batch run.
#[derive(Debug, Clone, Copy, Default)]
pub struct BatchOptions {
    /// Cap on raw rows fetched from the lake (for testing).
    pub limit: Option<u64>,
    /// Minimum inter-call delay for the resolver, in milliseconds.
    pub rate_limit_ms: u64,
}

/// In-memory results of the middle pipeline stages.
pub struct BatchData {
    /// Every cleaned trip, zone-enriched.
    pub trips: Vec<EnrichedTrip>,
    /// Forecast rows derived from the aggregated series.
    pub forecasts: Vec<ZoneForecast>,
    /// Distinct grid cells observed across pickups and dropoffs.
    pub distinct_coordinates: usize,
    /// How many of those cells resolved to a zone.
    pub resolved_zones: usize,
}

/// Outcome of a full batch run.
pub struct BatchSummary {
    /// Raw rows fetched from the lake.
    pub raw_rows: usize,
    /// Rows that survived cleaning.
    pub cleaned_trips: usize,
    /// Distinct grid cells resolved.
    pub distinct_coordinates: usize,
    /// Cells that resolved to a zone.
    pub resolved_zones: usize,
    /// Forecast rows produced.
    pub forecast_rows: usize,
    /// Per-table publish outcomes.
    pub report: PublishReport,
}

/// Runs the in-memory pipeline stages over already-fetched rows.
///
/// Cleans the rows, resolves distinct coordinates through `geocoder`
/// (sequentially, gated by `rate_limit_ms`), enriches every surviving
/// trip, aggregates daily zone counts, and computes forecasts.
pub async fn process_rows(
    geocoder: &dyn ReverseGeocoder,
    rows: &[RawTripRow],
    rate_limit_ms: u64,
    progress: Option<&Arc<dyn ProgressCallback>>,
) -> BatchData {
    let trips = taxi_demand_warehouse::clean::clean_trips(rows);

    let coords = resolver::distinct_coordinates(&trips);
    let zones = resolver::resolve_zones(geocoder, &coords, rate_limit_ms, progress).await;
    let resolved_zones = zones.values().filter(|z| z.is_some()).count();

    let enriched = enrich::enrich_trips(trips, &zones);
    let counts = taxi_demand_forecast::aggregate::daily_zone_counts(&enriched);
    let forecasts = taxi_demand_forecast::rolling::forecast_zones(&counts);

    BatchData {
        trips: enriched,
        forecasts,
        distinct_coordinates: coords.len(),
        resolved_zones,
    }
}

/// Runs one full batch: lake read, in-memory stages, mart publish.
///
/// The lake connection is held only for the initial read and the mart
/// connection only for the publish, so each store session is scoped to
/// its single use. Mart write failures end up in the returned
/// [`BatchSummary::report`]; only failures to *reach* a store become
/// errors.
///
/// # Errors
///
/// Returns [`PipelineError`] if the lake read or the mart connection
/// fails.
pub async fn run_batch(
    geocoder: &dyn ReverseGeocoder,
    options: BatchOptions,
    progress: Option<&Arc<dyn ProgressCallback>>,
) -> Result<BatchSummary, PipelineError> {
    let start = Instant::now();

    let rows = {
        let lake = taxi_demand_warehouse::open_from_env()?;
        taxi_demand_warehouse::fetch_trip_rows(&lake, options.limit)?
    };

    let data = process_rows(geocoder, &rows, options.rate_limit_ms, progress).await;

    let report = {
        let mart = taxi_demand_mart::open_from_env()?;
        taxi_demand_mart::publish::publish(&mart, &data.trips, &data.forecasts)
    };

    let summary = BatchSummary {
        raw_rows: rows.len(),
        cleaned_trips: data.trips.len(),
        distinct_coordinates: data.distinct_coordinates,
        resolved_zones: data.resolved_zones,
        forecast_rows: data.forecasts.len(),
        report,
    };

    log::info!(
        "Batch complete in {:.1}s: {} raw rows, {} cleaned, {}/{} coordinates resolved, {} forecast rows",
        start.elapsed().as_secs_f64(),
        summary.raw_rows,
        summary.cleaned_trips,
        summary.resolved_zones,
        summary.distinct_coordinates,
        summary.forecast_rows,
    );

    Ok(summary)
}
