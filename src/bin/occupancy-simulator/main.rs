mod args;

use std::{process::ExitCode, time::Duration};

use anyhow::{Context as _, Result, anyhow};
use args::Args;
use chrono::{TimeDelta, Utc};
use clap::Parser as _;
use log::{error, info, warn};
use occupancy_monitor::{
    aggregation::{Aggregator, TickOutcome},
    db::{migrate, new_pool},
    init_logger,
    sensor::Room,
    simulation::{ReadingGenerator, SimulatedClock, Simulator},
    store::{MemoryStore, PgReadingStore, ReadingStore},
};
use tokio::{signal, time::interval};

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

    if args.dry_run {
        info!("dry run: readings are kept in memory");
        return simulate(&args, MemoryStore::new()).await;
    }

    let database_url = args
        .database_url
        .as_deref()
        .ok_or_else(|| anyhow!("--database-url is required unless --dry-run is set"))?;

    let pool = new_pool(database_url)
        .await
        .context("failed to connect to database")?;
    migrate(&pool).await?;

    simulate(&args, PgReadingStore::new(pool, args.timezone)).await
}

async fn simulate<S: ReadingStore>(args: &Args, store: S) -> Result<()> {
    let generator = ReadingGenerator::from_seed(args.simulation.clone(), args.seed)
        .context("invalid simulation parameters")?;
    let aggregator = Aggregator::new(
        args.tolerance,
        Duration::from_secs(args.write_timeout_secs),
    );
    let mut simulator = Simulator::new(generator, aggregator, store);

    for room_id in &args.rooms {
        let room = Room {
            id: room_id.clone(),
            capacity: args.simulation.capacity,
        };
        if !simulator.add_room(room) {
            warn!("ignoring duplicate room: {room_id}");
        }
    }

    let step = TimeDelta::seconds(
        i64::try_from(args.tick_interval_secs).context("tick interval too large")?
            * i64::from(args.time_acceleration),
    );
    let mut clock = SimulatedClock::new(
        Utc::now().with_timezone(&args.timezone),
        TimeDelta::hours(i64::from(args.backlog_hours)),
        step,
    );
    let mut ticker = interval(Duration::from_secs(args.tick_interval_secs));
    let mut steps = 0u64;
    let mut caught_up = false;

    info!(
        "simulating {} rooms from {}, {}s of simulated time per tick, writing only on change",
        args.rooms.len(),
        clock.at().format("%Y-%m-%d %H:%M:%S"),
        step.num_seconds()
    );

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            result = signal::ctrl_c() => {
                result.context("failed to listen for Ctrl-C")?;
                info!("received Ctrl-C, stopping simulation");
                break;
            }
        }

        let now = Utc::now().with_timezone(&args.timezone);
        let simulated_at = clock.advance(now);
        steps += 1;

        if !caught_up && clock.has_caught_up(now) {
            caught_up = true;
            info!("simulation caught up with the wall clock");
        }

        for (room_id, outcome) in simulator.tick_all(simulated_at).await {
            if !matches!(outcome, TickOutcome::Persisted) {
                continue;
            }

            if let Some(reading) = simulator
                .state(&room_id)
                .and_then(|state| state.last_persisted())
            {
                info!(
                    "{room_id} at {}: {} people, {:.1} lux, air {:.1}{}",
                    reading.measured_at.format("%Y-%m-%d %H:%M:%S"),
                    reading.occupancy_count,
                    reading.light_intensity_lux,
                    reading.air_quality_index,
                    if reading.smoke_detected { ", SMOKE DETECTED" } else { "" }
                );
            }
        }

        if let Some(max_steps) = args.max_steps
            && steps >= max_steps
        {
            info!("reached {max_steps} steps");
            break;
        }
    }

    let stats = simulator.stats();
    info!(
        "{} ticks: {} written, {} suppressed ({:.1}% of writes saved), {} failed",
        stats.ticks,
        stats.persisted,
        stats.suppressed,
        stats.suppression_ratio() * 100.0,
        stats.failed
    );

    Ok(())
}
