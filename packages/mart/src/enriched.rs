//! Full-replace writer for the enriched trip table.

use duckdb::Connection;
use taxi_demand_trip_models::EnrichedTrip;

use crate::{CHUNK_SIZE, MartError, TRIPS_TABLE};

/// Replaces the enriched trip table with the given rows.
///
/// Prior contents are discarded (DROP + CREATE), then rows are inserted
/// in chunks. Returns the number of rows written.
///
/// # Errors
///
/// Returns [`MartError`] if any database operation fails.
pub fn replace_enriched_trips(
    conn: &Connection,
    trips: &[EnrichedTrip],
) -> Result<u64, MartError> {
    conn.execute_batch(&format!(
        "DROP TABLE IF EXISTS {TRIPS_TABLE};
         CREATE TABLE {TRIPS_TABLE} (
            tripid TEXT NOT NULL,
            taxiid TEXT NOT NULL,
            tripstarttimestamp TIMESTAMP NOT NULL,
            tripendtimestamp TIMESTAMP,
            tripseconds DOUBLE NOT NULL,
            tripmiles DOUBLE NOT NULL,
            pickupzip TEXT,
            dropoffzip TEXT,
            pickupcoords TEXT NOT NULL,
            dropoffcoords TEXT NOT NULL,
            tripdate DATE NOT NULL,
            tripweekday SMALLINT NOT NULL
         );"
    ))?;

    let mut total_inserted = 0u64;

    for chunk in trips.chunks(CHUNK_SIZE) {
        let mut sql = format!(
            "INSERT INTO {TRIPS_TABLE} (
                tripid, taxiid, tripstarttimestamp, tripendtimestamp,
                tripseconds, tripmiles, pickupzip, dropoffzip,
                pickupcoords, dropoffcoords, tripdate, tripweekday
            ) VALUES "
        );

        for (i, _) in chunk.iter().enumerate() {
            if i > 0 {
                sql.push_str(", ");
            }
            sql.push_str("(?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)");
        }

        let mut stmt = conn.prepare(&sql)?;
        let mut param_idx = 1usize;

        for enriched in chunk {
            let trip = &enriched.trip;

            stmt.raw_bind_parameter(param_idx, &trip.trip_id)?;
            stmt.raw_bind_parameter(param_idx + 1, &trip.taxi_id)?;
            stmt.raw_bind_parameter(
                param_idx + 2,
                trip.started_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            )?;

            if let Some(ended_at) = trip.ended_at {
                stmt.raw_bind_parameter(
                    param_idx + 3,
                    ended_at.format("%Y-%m-%d %H:%M:%S").to_string(),
                )?;
            } else {
                stmt.raw_bind_parameter(param_idx + 3, Option::<&str>::None)?;
            }

            stmt.raw_bind_parameter(param_idx + 4, trip.trip_seconds)?;
            stmt.raw_bind_parameter(param_idx + 5, trip.trip_miles)?;
            stmt.raw_bind_parameter(param_idx + 6, enriched.pickup_zone.as_deref())?;
            stmt.raw_bind_parameter(param_idx + 7, enriched.dropoff_zone.as_deref())?;
            stmt.raw_bind_parameter(param_idx + 8, &enriched.pickup_key)?;
            stmt.raw_bind_parameter(param_idx + 9, &enriched.dropoff_key)?;
            stmt.raw_bind_parameter(param_idx + 10, enriched.trip_date.format("%Y-%m-%d").to_string())?;
            stmt.raw_bind_parameter(param_idx + 11, i16::from(enriched.trip_weekday))?;

            param_idx += 12;
        }

        let rows = stmt.raw_execute()?;
        total_inserted += u64::try_from(rows).unwrap_or(0);
    }

    log::info!("Replaced {TRIPS_TABLE} with {total_inserted} rows");
    Ok(total_inserted)
}
