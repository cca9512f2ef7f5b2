use std::ops::Range;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use sqlx::{PgPool, Row as _, postgres::PgRow};
use tokio_stream::StreamExt as _;
use uuid::Uuid;

use crate::{
    sensor::{Reading, RoomId},
    store::{ReadingStore, StoreError},
};

pub(crate) const SELECT_READING_COLUMNS: &str = "room_id, measured_at, occupancy_count, light_intensity_lux, air_quality_index, smoke_detected";

#[derive(Debug, Clone)]
pub struct PgReadingStore {
    pool: PgPool,
    timezone: Tz,
}

impl PgReadingStore {
    /// Readings returned by `query` are converted into `timezone`.
    pub fn new(pool: PgPool, timezone: Tz) -> Self {
        Self { pool, timezone }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl ReadingStore for PgReadingStore {
    async fn append(&self, reading: &Reading) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO room_readings (id, room_id, measured_at, occupancy_count, light_intensity_lux, air_quality_index, smoke_detected)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(reading.room_id.as_str())
        .bind(reading.measured_at.with_timezone(&Utc))
        .bind(i64::from(reading.occupancy_count))
        .bind(reading.light_intensity_lux)
        .bind(reading.air_quality_index)
        .bind(reading.smoke_detected)
        .execute(&self.pool)
        .await
        .map_err(|source| StoreError::Database {
            operation: "insert reading",
            source,
        })?;

        Ok(())
    }

    async fn query(
        &self,
        room_id: &RoomId,
        range: Range<DateTime<Tz>>,
    ) -> Result<Vec<Reading>, StoreError> {
        let sql = format!(
            r#"
            SELECT {SELECT_READING_COLUMNS}
            FROM room_readings
            WHERE room_id = $1 AND measured_at >= $2 AND measured_at < $3
            ORDER BY measured_at ASC
            "#
        );

        let mut rows = sqlx::query(&sql)
            .bind(room_id.as_str())
            .bind(range.start.with_timezone(&Utc))
            .bind(range.end.with_timezone(&Utc))
            .fetch(&self.pool);

        let mut readings = Vec::new();
        while let Some(row) = rows.next().await {
            let row = row.map_err(|source| StoreError::Database {
                operation: "fetch readings",
                source,
            })?;
            readings.push(reading_from_row(&row, self.timezone)?);
        }

        Ok(readings)
    }
}

pub(crate) fn reading_from_row(row: &PgRow, timezone: Tz) -> Result<Reading, StoreError> {
    let decode = |e: sqlx::Error| StoreError::Decode(e.to_string());

    let room_id: String = row.try_get("room_id").map_err(decode)?;
    let measured_at: DateTime<Utc> = row.try_get("measured_at").map_err(decode)?;
    let occupancy_count: i64 = row.try_get("occupancy_count").map_err(decode)?;

    Ok(Reading {
        room_id: RoomId::new(room_id).map_err(|e| StoreError::Decode(e.to_string()))?,
        measured_at: measured_at.with_timezone(&timezone),
        occupancy_count: u32::try_from(occupancy_count).map_err(|_| {
            StoreError::Decode(format!("occupancy count out of range: {occupancy_count}"))
        })?,
        light_intensity_lux: row.try_get("light_intensity_lux").map_err(decode)?,
        air_quality_index: row.try_get("air_quality_index").map_err(decode)?,
        smoke_detected: row.try_get("smoke_detected").map_err(decode)?,
    })
}
