#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Warehouse read side of the taxi demand pipeline.
//!
//! The lake is an opaque tabular store holding raw `taxi_trips` rows.
//! [`fetch_trip_rows`] reads every column as TEXT so that "empty string
//! denotes missing" holds uniformly regardless of how the warehouse
//! typed the column; [`clean`] turns raw rows into validated [`Trip`]s
//! with grid-rounded coordinates.
//!
//! The connection is a scoped resource: opened for the single read and
//! dropped when the caller is done, on success or failure.

pub mod clean;

use std::path::Path;

use duckdb::Connection;
use taxi_demand_trip_models::RawTripRow;
use thiserror::Error;

/// Default lake location when `TAXI_LAKE_DB` is not set.
const DEFAULT_LAKE_DB: &str = "data/lake.duckdb";

/// Errors that can occur reading the warehouse.
#[derive(Debug, Error)]
pub enum WarehouseError {
    /// Database query error.
    #[error("Database error: {0}")]
    DuckDb(#[from] duckdb::Error),
}

/// Opens the lake database at the given path.
///
/// # Errors
///
/// Returns [`WarehouseError`] if the connection fails.
pub fn open(path: &Path) -> Result<Connection, WarehouseError> {
    Ok(Connection::open(path)?)
}

/// Opens the lake database from the `TAXI_LAKE_DB` environment variable,
/// falling back to `data/lake.duckdb`.
///
/// # Errors
///
/// Returns [`WarehouseError`] if the connection fails.
pub fn open_from_env() -> Result<Connection, WarehouseError> {
    let path = std::env::var("TAXI_LAKE_DB").unwrap_or_else(|_| DEFAULT_LAKE_DB.to_string());
    open(Path::new(&path))
}

/// Fetches raw trip rows from the `taxi_trips` table.
///
/// Every column is cast to TEXT with NULL collapsed to the empty string,
/// matching the "empty string denotes missing" warehouse convention. If
/// `limit` is `Some`, returns at most that many rows (for testing).
///
/// # Errors
///
/// Returns [`WarehouseError`] if the query fails.
pub fn fetch_trip_rows(
    conn: &Connection,
    limit: Option<u64>,
) -> Result<Vec<RawTripRow>, WarehouseError> {
    const BASE_QUERY: &str = "SELECT
            COALESCE(tripid::TEXT, ''),
            COALESCE(taxiid::TEXT, ''),
            COALESCE(tripstarttimestamp::TEXT, ''),
            COALESCE(tripendtimestamp::TEXT, ''),
            COALESCE(tripseconds::TEXT, ''),
            COALESCE(tripmiles::TEXT, ''),
            COALESCE(pickupcentroidlatitude::TEXT, ''),
            COALESCE(pickupcentroidlongitude::TEXT, ''),
            COALESCE(dropoffcentroidlatitude::TEXT, ''),
            COALESCE(dropoffcentroidlongitude::TEXT, '')
         FROM taxi_trips";

    let sql = limit.map_or_else(|| BASE_QUERY.to_string(), |n| format!("{BASE_QUERY} LIMIT {n}"));

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([])?;

    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        out.push(RawTripRow {
            trip_id: row.get(0)?,
            taxi_id: row.get(1)?,
            trip_start_timestamp: row.get(2)?,
            trip_end_timestamp: row.get(3)?,
            trip_seconds: row.get(4)?,
            trip_miles: row.get(5)?,
            pickup_latitude: row.get(6)?,
            pickup_longitude: row.get(7)?,
            dropoff_latitude: row.get(8)?,
            dropoff_longitude: row.get(9)?,
        });
    }

    log::info!("Fetched {} raw trip rows from the lake", out.len());
    Ok(out)
}
