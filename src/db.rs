use anyhow::{Context as _, Result};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use sqlx::{PgPool, postgres::PgPoolOptions};
use uuid::Uuid;

use crate::{
    sensor::{Reading, RoomId},
    store::postgres::{SELECT_READING_COLUMNS, reading_from_row},
};

pub async fn new_pool(database_url: &str) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(4)
        .connect(database_url)
        .await
        .context("failed to open connection pool")
}

pub async fn migrate(pool: &PgPool) -> Result<()> {
    sqlx::migrate!()
        .run(pool)
        .await
        .context("failed to run migrations")
}

pub async fn bulk_insert_readings(pool: &PgPool, readings: &[Reading]) -> Result<()> {
    if readings.is_empty() {
        return Ok(());
    }

    let ids: Vec<Uuid> = readings.iter().map(|_| Uuid::new_v4()).collect();
    let room_ids: Vec<&str> = readings.iter().map(|r| r.room_id.as_str()).collect();
    let measured_ats: Vec<DateTime<Utc>> = readings
        .iter()
        .map(|r| r.measured_at.with_timezone(&Utc))
        .collect();
    let occupancy_counts: Vec<i64> = readings
        .iter()
        .map(|r| i64::from(r.occupancy_count))
        .collect();
    let light_intensities: Vec<f64> = readings.iter().map(|r| r.light_intensity_lux).collect();
    let air_qualities: Vec<f64> = readings.iter().map(|r| r.air_quality_index).collect();
    let smoke_detecteds: Vec<bool> = readings.iter().map(|r| r.smoke_detected).collect();

    let mut tx = pool.begin().await.context("failed to begin transaction")?;

    sqlx::query(
        r#"
        INSERT INTO room_readings (id, room_id, measured_at, occupancy_count, light_intensity_lux, air_quality_index, smoke_detected)
        SELECT * FROM UNNEST($1::UUID[], $2::TEXT[], $3::TIMESTAMPTZ[], $4::INT8[], $5::FLOAT8[], $6::FLOAT8[], $7::BOOLEAN[])
        "#,
    )
    .bind(&ids)
    .bind(&room_ids)
    .bind(&measured_ats)
    .bind(&occupancy_counts)
    .bind(&light_intensities)
    .bind(&air_qualities)
    .bind(&smoke_detecteds)
    .execute(&mut *tx)
    .await
    .context("failed to execute bulk insert query")?;

    tx.commit().await.context("failed to commit transaction")?;

    Ok(())
}

pub async fn get_latest_reading(
    pool: &PgPool,
    room_id: &RoomId,
    timezone: Tz,
) -> Result<Option<Reading>> {
    let sql = format!(
        r#"
        SELECT {SELECT_READING_COLUMNS}
        FROM room_readings
        WHERE room_id = $1
        ORDER BY measured_at DESC
        LIMIT 1
        "#
    );

    let row = sqlx::query(&sql)
        .bind(room_id.as_str())
        .fetch_optional(pool)
        .await
        .with_context(|| format!("failed to fetch latest reading for {room_id}"))?;

    row.map(|row| reading_from_row(&row, timezone))
        .transpose()
        .context("failed to decode latest reading")
}
