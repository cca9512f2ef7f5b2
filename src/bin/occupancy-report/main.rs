mod args;
mod csv;

use std::{io, process::ExitCode};

use anyhow::{Context as _, Result};
use args::Args;
use chrono::Utc;
use clap::Parser as _;
use log::{error, info, warn};
use occupancy_monitor::{
    db::{get_latest_reading, new_pool},
    init_logger,
    store::{PgReadingStore, ReadingStore},
    summary::summarize,
};

use crate::csv::{write_profile, write_readings};

#[tokio::main]
async fn main() -> ExitCode {
    init_logger();

    if let Err(e) = run().await {
        error!("{e:#}");
        return ExitCode::from(1);
    }

    ExitCode::from(0)
}

async fn run() -> Result<()> {
    let args = Args::parse();

    let pool = new_pool(&args.database_url)
        .await
        .context("failed to connect to database")?;

    match get_latest_reading(&pool, &args.room, args.timezone)
        .await
        .context("failed to get latest reading")?
    {
        Some(latest) => {
            info!(
                "{} at {}: {}, {} people, {:.1} lux, air {:.1}",
                args.room,
                latest.measured_at.format("%Y-%m-%d %H:%M:%S"),
                if latest.is_occupied() { "occupied" } else { "empty" },
                latest.occupancy_count,
                latest.light_intensity_lux,
                latest.air_quality_index
            );
            if latest.smoke_detected {
                warn!("{}: SMOKE DETECTED", args.room);
            }
        }
        None => warn!("no readings recorded for {}", args.room),
    }

    let store = PgReadingStore::new(pool, args.timezone);
    let now = Utc::now().with_timezone(&args.timezone);
    let readings = store
        .query(&args.room, args.window.range(now))
        .await
        .with_context(|| format!("failed to query readings for {}", args.room))?;

    if let (Some(first), Some(last)) = (readings.first(), readings.last()) {
        info!(
            "{} readings from {} to {}",
            readings.len(),
            first.measured_at.format("%Y-%m-%d %H:%M:%S"),
            last.measured_at.format("%Y-%m-%d %H:%M:%S")
        );
    } else {
        warn!("no readings in the last {}", args.window);
    }

    let profile = summarize(&readings, args.window);

    if let Some(peak) = profile.peak_hour() {
        info!("occupancy peaks around {peak}:00");
    }
    if let Some(trend) = profile.trend() {
        info!(
            "usage trend: {:+.2} people per hour ({:.1} at 08:00, {:.1} at 18:00)",
            trend.slope,
            trend.predict(8),
            trend.predict(18)
        );
    }

    if args.readings {
        write_readings(io::stdout().lock(), &readings).context("failed to write readings")?;
    } else {
        write_profile(io::stdout().lock(), &profile).context("failed to write profile")?;
    }

    Ok(())
}
