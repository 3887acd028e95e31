#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Canonical data model for the taxi demand pipeline.
//!
//! Every stage consumes and produces these types: the warehouse reader
//! yields [`RawTripRow`]s, the cleaner turns them into [`Trip`]s with
//! grid-rounded coordinates, the resolver builds a [`ZoneLookup`], the
//! enricher produces [`EnrichedTrip`]s, and the forecast stage derives
//! [`DailyZoneCount`] and [`ZoneForecast`] rows for the mart.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike as _, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Resolved zones per grid key, built once per batch run.
///
/// Maps the composite coordinate key (see [`GridCoord::key`]) to the
/// postal zone code, or `None` when the lookup failed or returned no
/// postal code. Built before the enrichment stage and passed explicitly;
/// read-only thereafter.
pub type ZoneLookup = BTreeMap<String, Option<String>>;

/// Rounds a coordinate component to 3 decimal places (~111 m grid cell).
///
/// Rounding is idempotent: rounding an already-rounded value yields the
/// same value.
#[must_use]
pub fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// A latitude/longitude pair snapped to the 3-decimal grid.
///
/// The constructor rounds, so two raw coordinates that fall in the same
/// grid cell compare equal and produce the same [`key`](Self::key) — they
/// are the same physical point for zone-resolution purposes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridCoord {
    /// Latitude (WGS84), rounded to 3 decimals.
    pub latitude: f64,
    /// Longitude (WGS84), rounded to 3 decimals.
    pub longitude: f64,
}

impl GridCoord {
    /// Snaps raw coordinates to the grid.
    #[must_use]
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude: round3(latitude),
            longitude: round3(longitude),
        }
    }

    /// Composite `"<lat>,<lon>"` join key.
    ///
    /// Both the resolver and the enricher derive keys through this method,
    /// so join keys always agree for coordinates in the same grid cell.
    #[must_use]
    pub fn key(&self) -> String {
        format!("{},{}", self.latitude, self.longitude)
    }
}

/// One raw trip row as read from the warehouse.
///
/// All fields are text as stored; an empty string denotes "missing".
/// Validation and type conversion happen in the cleaner, not here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTripRow {
    /// Trip identifier from the source system.
    pub trip_id: String,
    /// Vehicle (taxi medallion) identifier.
    pub taxi_id: String,
    /// Trip start timestamp text.
    pub trip_start_timestamp: String,
    /// Trip end timestamp text.
    pub trip_end_timestamp: String,
    /// Trip duration in seconds, as text.
    pub trip_seconds: String,
    /// Trip distance in miles, as text.
    pub trip_miles: String,
    /// Pickup centroid latitude text.
    pub pickup_latitude: String,
    /// Pickup centroid longitude text.
    pub pickup_longitude: String,
    /// Dropoff centroid latitude text.
    pub dropoff_latitude: String,
    /// Dropoff centroid longitude text.
    pub dropoff_longitude: String,
}

/// A syntactically valid trip with grid-rounded coordinates.
///
/// Only rows that pass the cleaner become `Trip`s; everything downstream
/// can rely on duration, distance, both coordinate pairs, and the start
/// timestamp being present and numeric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trip {
    /// Trip identifier from the source system.
    pub trip_id: String,
    /// Vehicle (taxi medallion) identifier.
    pub taxi_id: String,
    /// When the trip started.
    pub started_at: DateTime<Utc>,
    /// When the trip ended. `None` when the source field is missing or
    /// unparseable — end time is not needed downstream.
    pub ended_at: Option<DateTime<Utc>>,
    /// Trip duration in seconds.
    pub trip_seconds: f64,
    /// Trip distance in miles.
    pub trip_miles: f64,
    /// Pickup point, snapped to the grid.
    pub pickup: GridCoord,
    /// Dropoff point, snapped to the grid.
    pub dropoff: GridCoord,
}

/// A trip joined with its resolved pickup/dropoff zones.
///
/// Zones are `None` when the coordinate's lookup failed or returned no
/// postal code — the trip itself always survives enrichment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedTrip {
    /// The cleaned trip.
    pub trip: Trip,
    /// Resolved pickup zone, if any.
    pub pickup_zone: Option<String>,
    /// Resolved dropoff zone, if any.
    pub dropoff_zone: Option<String>,
    /// Pickup grid key used for the join.
    pub pickup_key: String,
    /// Dropoff grid key used for the join.
    pub dropoff_key: String,
    /// Calendar date of the trip start (aggregation bucket).
    pub trip_date: NaiveDate,
    /// Weekday of the trip start, Monday = 0.
    pub trip_weekday: u8,
}

impl EnrichedTrip {
    /// Joins a trip with its resolved zones and derives the date fields.
    #[must_use]
    pub fn new(trip: Trip, pickup_zone: Option<String>, dropoff_zone: Option<String>) -> Self {
        let pickup_key = trip.pickup.key();
        let dropoff_key = trip.dropoff.key();
        let trip_date = trip.started_at.date_naive();
        // num_days_from_monday is always 0..=6
        #[allow(clippy::cast_possible_truncation)]
        let trip_weekday = trip.started_at.weekday().num_days_from_monday() as u8;

        Self {
            trip,
            pickup_zone,
            dropoff_zone,
            pickup_key,
            dropoff_key,
            trip_date,
            trip_weekday,
        }
    }
}

/// Daily trip count for one zone.
///
/// A trip contributes to its pickup zone's bucket and separately to its
/// dropoff zone's bucket; `zone = None` is the bucket for unresolved
/// sides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyZoneCount {
    /// Aggregation date (trip start date).
    pub date: NaiveDate,
    /// Postal zone, or `None` for the unresolved bucket.
    pub zone: Option<String>,
    /// Number of trip-sides counted in this bucket.
    pub trips: i64,
}

/// One forecast row: actuals plus next-day and next-week predictions.
///
/// Predictions derive strictly from the `trips` series ordered by date
/// within the same zone; they never read across zones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneForecast {
    /// Aggregation date.
    pub date: NaiveDate,
    /// Postal zone, or `None` for the unresolved bucket.
    pub zone: Option<String>,
    /// Actual trip count on this date.
    pub trips: i64,
    /// Rolling window-2 median of the trip series.
    pub pred_next_day: f64,
    /// Rolling window-7 sum (min 5 observations), with the
    /// `pred_next_day * 0.90 * 7` fallback already imputed.
    pub pred_next_week: f64,
}
