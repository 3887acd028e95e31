//! Row validation and coordinate normalization.
//!
//! A raw row becomes a [`Trip`] only if duration, distance, and both
//! coordinate pairs are present and numeric, and the start timestamp
//! parses (the aggregation stage needs a trip date). Everything else is
//! silently dropped — rejected rows are never reported individually,
//! only as batch-level counts.

use chrono::{DateTime, NaiveDateTime, Utc};
use taxi_demand_trip_models::{GridCoord, RawTripRow, Trip};

/// Cleans a batch of raw rows into validated trips.
///
/// Coordinates are snapped to the 3-decimal grid here, so every
/// downstream stage sees only rounded values.
#[must_use]
pub fn clean_trips(rows: &[RawTripRow]) -> Vec<Trip> {
    let mut trips = Vec::new();
    let mut dropped = 0usize;

    for row in rows {
        match clean_row(row) {
            Some(trip) => trips.push(trip),
            None => dropped += 1,
        }
    }

    log::info!(
        "Cleaned {} of {} raw rows ({dropped} dropped)",
        trips.len(),
        rows.len()
    );

    trips
}

fn clean_row(row: &RawTripRow) -> Option<Trip> {
    let pickup = parse_coord(&row.pickup_latitude, &row.pickup_longitude)?;
    let dropoff = parse_coord(&row.dropoff_latitude, &row.dropoff_longitude)?;
    let trip_seconds = parse_required_f64(&row.trip_seconds)?;
    let trip_miles = parse_required_f64(&row.trip_miles)?;
    let started_at = parse_timestamp(&row.trip_start_timestamp)?;
    let ended_at = parse_timestamp(&row.trip_end_timestamp);

    Some(Trip {
        trip_id: row.trip_id.clone(),
        taxi_id: row.taxi_id.clone(),
        started_at,
        ended_at,
        trip_seconds,
        trip_miles,
        pickup,
        dropoff,
    })
}

/// Parses a lat/lon pair into a grid cell. `None` if either side is
/// missing or non-numeric.
fn parse_coord(lat: &str, lon: &str) -> Option<GridCoord> {
    let latitude = parse_required_f64(lat)?;
    let longitude = parse_required_f64(lon)?;
    Some(GridCoord::new(latitude, longitude))
}

/// Parses a required numeric field. Empty string denotes "missing".
fn parse_required_f64(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok()
}

/// Parses a warehouse timestamp text representation into a UTC `DateTime`.
///
/// The lake's TEXT cast can produce several formats depending on the
/// stored precision:
/// - `2024-01-15 10:30:00` (no fractional seconds)
/// - `2024-01-15 10:30:00.123` (fractional seconds)
/// - `2024-01-15 10:30:00+0000` (with timezone offset)
/// - `2024-01-15T10:30:00` (ISO 8601 separator)
///
/// This function tries them in order and returns the first successful
/// parse.
#[must_use]
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }

    // With timezone offset first
    if let Ok(dt) = DateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S%z") {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S%.f%z") {
        return Some(dt.with_timezone(&Utc));
    }

    // Naive (no timezone) — assume UTC
    if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }

    None
}
