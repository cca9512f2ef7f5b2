use chrono_tz::Tz;
use clap::Parser;
use occupancy_monitor::{sensor::RoomId, summary::Window};

#[derive(Debug, Parser)]
pub struct Args {
    #[arg(long)]
    pub room: RoomId,

    /// One of 12h, 24h, 7d, 30d.
    #[arg(long, default_value = "24h")]
    pub window: Window,

    /// Print the raw reading series instead of the hourly profile.
    #[arg(long)]
    pub readings: bool,

    #[arg(long, env = "TZ")]
    pub timezone: Tz,

    #[arg(long, env = "DATABASE_URL")]
    pub database_url: String,
}
