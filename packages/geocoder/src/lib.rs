#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Reverse geocoding for the taxi demand pipeline.
//!
//! Resolves rounded trip coordinates to postal zone codes using Nominatim
//! (see <https://nominatim.org/release-docs/develop/api/Reverse/>).
//! Nominatim has strict rate limits: **1 request per second** maximum on
//! the public instance, configured via `rate_limit_ms` in
//! `services/nominatim.toml`.
//!
//! The provider sits behind the [`ReverseGeocoder`] trait so the resolver
//! can be exercised against a test double. [`resolver`] holds the
//! batch-level logic: deduplicate coordinates across all pickups and
//! dropoffs, call the provider exactly once per distinct grid cell with an
//! enforced minimum inter-call delay, and absorb lookup failures into null
//! zones so a single bad coordinate never fails the batch.

pub mod nominatim;
pub mod progress;
pub mod resolver;
pub mod service;

use async_trait::async_trait;
use thiserror::Error;

/// Errors from geocoding operations.
#[derive(Debug, Error)]
pub enum GeocodeError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response parsing failed.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of the parsing failure.
        message: String,
    },

    /// Rate limit exceeded.
    #[error("Rate limit exceeded")]
    RateLimited,
}

/// Capability interface for the external coordinate-to-zone lookup.
///
/// `Ok(None)` means the provider answered but had no postal code for the
/// point; `Err` means the lookup itself failed. The resolver treats both
/// as a null zone — the distinction only matters for logging.
#[async_trait]
pub trait ReverseGeocoder: Send + Sync {
    /// Looks up the postal zone code for a coordinate.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError`] if the request or response parsing fails.
    async fn reverse(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<Option<String>, GeocodeError>;
}
