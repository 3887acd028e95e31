//! Full-replace writer and read-back for the forecast table.

use chrono::NaiveDate;
use duckdb::Connection;
use taxi_demand_trip_models::ZoneForecast;

use crate::{CHUNK_SIZE, FORECAST_TABLE, MartError};

/// Replaces the forecast table with the given rows.
///
/// Prior contents are discarded (DROP + CREATE), then rows are inserted
/// in chunks. Returns the number of rows written.
///
/// # Errors
///
/// Returns [`MartError`] if any database operation fails.
pub fn replace_forecasts(
    conn: &Connection,
    forecasts: &[ZoneForecast],
) -> Result<u64, MartError> {
    conn.execute_batch(&format!(
        "DROP TABLE IF EXISTS {FORECAST_TABLE};
         CREATE TABLE {FORECAST_TABLE} (
            tripdate DATE NOT NULL,
            zip TEXT,
            trips BIGINT NOT NULL,
            pred_next_day DOUBLE NOT NULL,
            pred_next_week DOUBLE NOT NULL
         );"
    ))?;

    let mut total_inserted = 0u64;

    for chunk in forecasts.chunks(CHUNK_SIZE) {
        let mut sql = format!(
            "INSERT INTO {FORECAST_TABLE} (
                tripdate, zip, trips, pred_next_day, pred_next_week
            ) VALUES "
        );

        for (i, _) in chunk.iter().enumerate() {
            if i > 0 {
                sql.push_str(", ");
            }
            sql.push_str("(?, ?, ?, ?, ?)");
        }

        let mut stmt = conn.prepare(&sql)?;
        let mut param_idx = 1usize;

        for forecast in chunk {
            stmt.raw_bind_parameter(param_idx, forecast.date.format("%Y-%m-%d").to_string())?;
            stmt.raw_bind_parameter(param_idx + 1, forecast.zone.as_deref())?;
            stmt.raw_bind_parameter(param_idx + 2, forecast.trips)?;
            stmt.raw_bind_parameter(param_idx + 3, forecast.pred_next_day)?;
            stmt.raw_bind_parameter(param_idx + 4, forecast.pred_next_week)?;

            param_idx += 5;
        }

        let rows = stmt.raw_execute()?;
        total_inserted += u64::try_from(rows).unwrap_or(0);
    }

    log::info!("Replaced {FORECAST_TABLE} with {total_inserted} rows");
    Ok(total_inserted)
}

/// Reads the forecast table back, ordered by zone then date.
///
/// # Errors
///
/// Returns [`MartError`] if the query fails or a stored date does not
/// parse.
pub fn fetch_forecasts(conn: &Connection) -> Result<Vec<ZoneForecast>, MartError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT tripdate::TEXT, zip, trips, pred_next_day, pred_next_week
         FROM {FORECAST_TABLE}
         ORDER BY zip, tripdate"
    ))?;

    let mut rows = stmt.query([])?;
    let mut out = Vec::new();

    while let Some(row) = rows.next()? {
        let date_text: String = row.get(0)?;
        let date = NaiveDate::parse_from_str(&date_text, "%Y-%m-%d").map_err(|e| {
            MartError::Conversion {
                message: format!("Bad tripdate {date_text:?} in {FORECAST_TABLE}: {e}"),
            }
        })?;

        out.push(ZoneForecast {
            date,
            zone: row.get(1)?,
            trips: row.get(2)?,
            pred_next_day: row.get(3)?,
            pred_next_week: row.get(4)?,
        });
    }

    Ok(out)
}
