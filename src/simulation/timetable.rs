use chrono::{DateTime, Datelike, Timelike};
use chrono_tz::Tz;

/// Likelihood and head-count range of a room being in use at a given time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OccupancyBand {
    pub probability: f64,

    pub min: u32,

    pub max: u32,
}

const LECTURE: OccupancyBand = OccupancyBand {
    probability: 0.7,
    min: 5,
    max: 35,
};

const SHOULDER: OccupancyBand = OccupancyBand {
    probability: 0.3,
    min: 1,
    max: 10,
};

const WEEKEND: OccupancyBand = OccupancyBand {
    probability: 0.15,
    min: 1,
    max: 5,
};

/// Campus timetable: lectures 08-12 and 13-17 on weekdays, lighter use over
/// lunch and in the evening, occasional use on weekend middays.
pub fn occupancy_band(at: &DateTime<Tz>) -> Option<OccupancyBand> {
    let hour = at.hour();
    let is_weekday = at.weekday().num_days_from_monday() < 5;

    if is_weekday {
        match hour {
            8..=11 | 13..=16 => Some(LECTURE),
            12 | 17..=19 => Some(SHOULDER),
            _ => None,
        }
    } else {
        match hour {
            10..=15 => Some(WEEKEND),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use chrono_tz::Asia::Tokyo;

    use super::*;

    #[test]
    fn weekday_lecture_hours() {
        // 2026-10-19 is a Monday
        let at = Tokyo.with_ymd_and_hms(2026, 10, 19, 9, 30, 0).unwrap();
        assert_eq!(occupancy_band(&at), Some(LECTURE));

        let lunch = Tokyo.with_ymd_and_hms(2026, 10, 19, 12, 15, 0).unwrap();
        assert_eq!(occupancy_band(&lunch), Some(SHOULDER));

        let night = Tokyo.with_ymd_and_hms(2026, 10, 19, 23, 0, 0).unwrap();
        assert_eq!(occupancy_band(&night), None);
    }

    #[test]
    fn weekend_hours() {
        let saturday = Tokyo.with_ymd_and_hms(2026, 10, 24, 11, 0, 0).unwrap();
        assert_eq!(occupancy_band(&saturday), Some(WEEKEND));

        let sunday_morning = Tokyo.with_ymd_and_hms(2026, 10, 25, 9, 0, 0).unwrap();
        assert_eq!(occupancy_band(&sunday_morning), None);
    }
}
