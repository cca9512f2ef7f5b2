use std::io::Write;

use anyhow::{Context as _, Result};
use csv::Writer;
use occupancy_monitor::{sensor::Reading, summary::OccupancyProfile};

const HEADER: [&str; 3] = ["hour", "mean_occupancy", "samples"];

const READINGS_HEADER: [&str; 5] = [
    "measured_at",
    "occupancy_count",
    "light_intensity_lux",
    "air_quality_index",
    "smoke_detected",
];

/// Writes one row per hour; hours without data have an empty mean.
pub fn write_profile<W: Write>(writer: W, profile: &OccupancyProfile) -> Result<()> {
    let mut writer = Writer::from_writer(writer);

    writer
        .write_record(HEADER)
        .context("failed to write CSV header")?;

    for (hour, bucket) in profile.buckets().iter().enumerate() {
        let mean = bucket.mean().map(|m| format!("{m:.2}")).unwrap_or_default();
        writer
            .write_record([hour.to_string(), mean, bucket.samples().to_string()])
            .with_context(|| format!("failed to write CSV row for hour {hour}"))?;
    }

    writer.flush().context("failed to flush CSV output")?;

    Ok(())
}

/// Writes the reading series oldest first, timestamps in RFC 3339.
pub fn write_readings<W: Write>(writer: W, readings: &[Reading]) -> Result<()> {
    let mut writer = Writer::from_writer(writer);

    writer
        .write_record(READINGS_HEADER)
        .context("failed to write CSV header")?;

    for reading in readings {
        writer
            .write_record([
                reading.measured_at.to_rfc3339(),
                reading.occupancy_count.to_string(),
                format!("{:.2}", reading.light_intensity_lux),
                format!("{:.2}", reading.air_quality_index),
                reading.smoke_detected.to_string(),
            ])
            .with_context(|| format!("failed to write CSV row for {}", reading.measured_at))?;
    }

    writer.flush().context("failed to flush CSV output")?;

    Ok(())
}
