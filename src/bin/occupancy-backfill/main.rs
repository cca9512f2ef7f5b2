mod args;
mod retry;

use std::{process::ExitCode, time::Duration};

use anyhow::{Context as _, Result};
use args::Args;
use chrono::{TimeDelta, Utc};
use clap::Parser as _;
use log::{error, info};
use occupancy_monitor::{
    aggregation::Aggregator,
    db::{bulk_insert_readings, migrate, new_pool},
    init_logger,
    sensor::Room,
    simulation::{ReadingGenerator, Simulator},
    store::MemoryStore,
};
use sqlx::PgPool;
use tokio::time::sleep;

use crate::retry::with_backoff;

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

    args.simulation
        .validate()
        .context("invalid simulation parameters")?;
    args.tolerance.validate().context("invalid tolerance")?;

    let pool = new_pool(&args.database_url)
        .await
        .context("failed to connect to database")?;
    migrate(&pool).await?;

    let generator = ReadingGenerator::from_seed(args.simulation.clone(), args.seed)
        .context("invalid simulation parameters")?;
    // Ticks write into an in-memory buffer that `flush` drains into the database.
    let aggregator = Aggregator::new(args.tolerance, Duration::from_secs(1));
    let mut simulator = Simulator::new(generator, aggregator, MemoryStore::new());
    for room_id in &args.rooms {
        simulator.add_room(Room {
            id: room_id.clone(),
            capacity: args.simulation.capacity,
        });
    }

    let now = Utc::now().with_timezone(&args.timezone);
    let start = now - TimeDelta::days(i64::from(args.days));
    let step = TimeDelta::minutes(i64::from(args.interval_minutes));
    let total_steps = (now - start).num_minutes() / step.num_minutes();

    info!(
        "backfilling {} days for {} rooms at {} minute intervals",
        args.days,
        args.rooms.len(),
        args.interval_minutes
    );

    let mut at = start;
    let mut steps = 0i64;
    let mut total = 0usize;

    while at < now {
        simulator.tick_all(at).await;
        steps += 1;
        at += step;

        if simulator.store().len() as u64 >= args.batch_size {
            total += flush(&pool, simulator.store(), &args).await?;
            info!(
                "backfill progress: {:.1}% complete, {total} readings written",
                steps as f64 / total_steps.max(1) as f64 * 100.0
            );
            sleep(Duration::from_millis(args.pause_between_batches_ms)).await;
        }
    }

    total += flush(&pool, simulator.store(), &args).await?;

    let stats = simulator.stats();
    info!(
        "backfill complete: {total} readings written for {} simulated ticks ({:.1}% suppressed)",
        stats.ticks,
        stats.suppression_ratio() * 100.0
    );

    Ok(())
}

async fn flush(pool: &PgPool, buffer: &MemoryStore, args: &Args) -> Result<usize> {
    let batch = buffer.drain();
    if batch.is_empty() {
        return Ok(0);
    }

    let readings = batch.as_slice();
    with_backoff(
        args.max_attempts,
        Duration::from_secs(args.retry_delay_secs),
        || bulk_insert_readings(pool, readings),
    )
    .await
    .context("failed to commit batch")?;

    Ok(batch.len())
}
