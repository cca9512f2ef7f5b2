use chrono::DateTime;
use chrono_tz::Tz;

use crate::sensor::RoomId;

#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub room_id: RoomId,

    pub measured_at: DateTime<Tz>,

    pub occupancy_count: u32,

    pub light_intensity_lux: f64,

    pub air_quality_index: f64,

    pub smoke_detected: bool,
}

impl Reading {
    pub fn is_occupied(&self) -> bool {
        self.occupancy_count > 0
    }
}
