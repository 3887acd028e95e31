#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Mart write side of the taxi demand pipeline.
//!
//! Two tables under fixed logical names, both written with full-replace
//! semantics (DROP + CREATE + chunked multi-row INSERT): the enriched
//! trip table and the forecast table. Each table write is independent —
//! one may succeed while the other fails — and [`publish::publish`]
//! reports both outcomes as explicit values instead of propagating
//! errors past the publisher boundary.

pub mod enriched;
pub mod forecasts;
pub mod publish;

use std::path::Path;

use duckdb::Connection;
use thiserror::Error;

/// Logical name of the enriched trip table.
pub const TRIPS_TABLE: &str = "taxi_trips_enriched";

/// Logical name of the forecast table.
pub const FORECAST_TABLE: &str = "taxi_trips_forecast";

/// Default mart location when `TAXI_MART_DB` is not set.
const DEFAULT_MART_DB: &str = "data/mart.duckdb";

/// Number of rows per INSERT chunk.
const CHUNK_SIZE: usize = 5_000;

/// Errors that can occur writing to or reading from the mart.
#[derive(Debug, Error)]
pub enum MartError {
    /// Database query error.
    #[error("Database error: {0}")]
    DuckDb(#[from] duckdb::Error),

    /// Filesystem error creating the mart location.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Data conversion error.
    #[error("Data conversion error: {message}")]
    Conversion {
        /// Description of what went wrong.
        message: String,
    },
}

/// Opens the mart database at the given path, creating parent
/// directories as needed.
///
/// # Errors
///
/// Returns [`MartError`] if the connection fails.
pub fn open(path: &Path) -> Result<Connection, MartError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    Ok(Connection::open(path)?)
}

/// Opens the mart database from the `TAXI_MART_DB` environment variable,
/// falling back to `data/mart.duckdb`.
///
/// # Errors
///
/// Returns [`MartError`] if the connection fails.
pub fn open_from_env() -> Result<Connection, MartError> {
    let path = std::env::var("TAXI_MART_DB").unwrap_or_else(|_| DEFAULT_MART_DB.to_string());
    open(Path::new(&path))
}
