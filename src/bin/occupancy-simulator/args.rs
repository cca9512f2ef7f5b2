use chrono_tz::Tz;
use clap::Parser;
use occupancy_monitor::{
    config::{SimulationParams, Tolerance},
    sensor::RoomId,
};

#[derive(Debug, Parser)]
pub struct Args {
    #[arg(long, env = "TZ")]
    pub timezone: Tz,

    #[arg(long, env = "DATABASE_URL", required_unless_present = "dry_run")]
    pub database_url: Option<String>,

    /// Keep readings in memory instead of writing them to the database.
    #[arg(long)]
    pub dry_run: bool,

    #[arg(long, value_delimiter = ',', default_value = "Classroom 1,Classroom 2,Lab")]
    pub rooms: Vec<RoomId>,

    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u64).range(1..))]
    pub tick_interval_secs: u64,

    /// Simulated seconds per real second.
    #[arg(long, default_value_t = 60)]
    pub time_acceleration: u32,

    #[arg(long, default_value_t = 5)]
    pub write_timeout_secs: u64,

    /// Hours of past time to replay before the simulation follows the wall clock.
    #[arg(long, default_value_t = 24)]
    pub backlog_hours: u32,

    /// Stop after this many simulation steps.
    #[arg(long)]
    pub max_steps: Option<u64>,

    #[arg(long)]
    pub seed: Option<u64>,

    #[command(flatten)]
    pub simulation: SimulationParams,

    #[command(flatten)]
    pub tolerance: Tolerance,
}
