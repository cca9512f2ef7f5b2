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

    #[arg(long, env = "DATABASE_URL")]
    pub database_url: String,

    #[arg(long, value_delimiter = ',', default_value = "Classroom 1,Classroom 2,Lab")]
    pub rooms: Vec<RoomId>,

    #[arg(long, default_value_t = 30)]
    pub days: u32,

    #[arg(long, default_value_t = 15, value_parser = clap::value_parser!(u32).range(1..))]
    pub interval_minutes: u32,

    #[arg(long, default_value_t = 50, value_parser = clap::value_parser!(u64).range(1..))]
    pub batch_size: u64,

    #[arg(long, default_value_t = 2000)]
    pub pause_between_batches_ms: u64,

    #[arg(long, default_value_t = 5, value_parser = clap::value_parser!(u32).range(1..))]
    pub max_attempts: u32,

    #[arg(long, default_value_t = 5)]
    pub retry_delay_secs: u64,

    #[arg(long)]
    pub seed: Option<u64>,

    #[command(flatten)]
    pub simulation: SimulationParams,

    #[command(flatten)]
    pub tolerance: Tolerance,
}
