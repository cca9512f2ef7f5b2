//! Hourly occupancy profile derived from persisted readings.

use std::{fmt, ops::Range, str::FromStr};

use chrono::{DateTime, TimeDelta, Timelike};
use chrono_tz::Tz;
use thiserror::Error;

use crate::sensor::Reading;

pub const HOURS_PER_DAY: usize = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Window {
    Last12Hours,
    Last24Hours,
    Last7Days,
    Last30Days,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown window: {0} (expected one of 12h, 24h, 7d, 30d)")]
pub struct UnknownWindow(String);

impl Window {
    pub fn as_str(&self) -> &'static str {
        match self {
            Window::Last12Hours => "12h",
            Window::Last24Hours => "24h",
            Window::Last7Days => "7d",
            Window::Last30Days => "30d",
        }
    }

    pub fn duration(&self) -> TimeDelta {
        match self {
            Window::Last12Hours => TimeDelta::hours(12),
            Window::Last24Hours => TimeDelta::hours(24),
            Window::Last7Days => TimeDelta::days(7),
            Window::Last30Days => TimeDelta::days(30),
        }
    }

    /// Query range ending at `now`, inclusive of readings taken at `now`.
    ///
    /// The end is one microsecond past `now`, the resolution of `TIMESTAMPTZ`.
    pub fn range(&self, now: DateTime<Tz>) -> Range<DateTime<Tz>> {
        (now - self.duration())..(now + TimeDelta::microseconds(1))
    }
}

impl FromStr for Window {
    type Err = UnknownWindow;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "12h" => Ok(Window::Last12Hours),
            "24h" => Ok(Window::Last24Hours),
            "7d" => Ok(Window::Last7Days),
            "30d" => Ok(Window::Last30Days),
            _ => Err(UnknownWindow(s.to_owned())),
        }
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HourlyOccupancy {
    NoData,
    Observed { mean: f64, samples: usize },
}

impl HourlyOccupancy {
    pub fn mean(&self) -> Option<f64> {
        match self {
            HourlyOccupancy::NoData => None,
            HourlyOccupancy::Observed { mean, .. } => Some(*mean),
        }
    }

    pub fn samples(&self) -> usize {
        match self {
            HourlyOccupancy::NoData => 0,
            HourlyOccupancy::Observed { samples, .. } => *samples,
        }
    }
}

/// Least-squares fit of mean occupancy against hour of day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UsageTrend {
    pub slope: f64,
    pub intercept: f64,
}

impl UsageTrend {
    pub fn predict(&self, hour: usize) -> f64 {
        self.slope * hour as f64 + self.intercept
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OccupancyProfile {
    window: Window,
    buckets: [HourlyOccupancy; HOURS_PER_DAY],
}

impl OccupancyProfile {
    pub fn window(&self) -> Window {
        self.window
    }

    pub fn buckets(&self) -> &[HourlyOccupancy; HOURS_PER_DAY] {
        &self.buckets
    }

    /// Panics if `hour` is not below 24.
    pub fn hour(&self, hour: usize) -> HourlyOccupancy {
        self.buckets[hour]
    }

    pub fn observed_hours(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.buckets
            .iter()
            .enumerate()
            .filter_map(|(hour, bucket)| bucket.mean().map(|mean| (hour, mean)))
    }

    pub fn is_empty(&self) -> bool {
        self.observed_hours().next().is_none()
    }

    /// Hour with the highest mean occupancy; the earliest hour wins ties.
    pub fn peak_hour(&self) -> Option<usize> {
        self.observed_hours()
            .fold(None, |best: Option<(usize, f64)>, (hour, mean)| match best {
                Some((_, best_mean)) if best_mean >= mean => best,
                _ => Some((hour, mean)),
            })
            .map(|(hour, _)| hour)
    }

    pub fn trend(&self) -> Option<UsageTrend> {
        let points: Vec<(f64, f64)> = self
            .observed_hours()
            .map(|(hour, mean)| (hour as f64, mean))
            .collect();
        if points.len() < 2 {
            return None;
        }

        let n = points.len() as f64;
        let mean_x = points.iter().map(|(x, _)| x).sum::<f64>() / n;
        let mean_y = points.iter().map(|(_, y)| y).sum::<f64>() / n;

        let (covariance, variance) = points.iter().fold((0.0, 0.0), |(cov, var), (x, y)| {
            (cov + (x - mean_x) * (y - mean_y), var + (x - mean_x).powi(2))
        });
        let slope = covariance / variance;

        Some(UsageTrend {
            slope,
            intercept: mean_y - slope * mean_x,
        })
    }
}

/// Groups `readings` by local hour of day and averages their occupancy.
///
/// Hours without any reading are reported as [`HourlyOccupancy::NoData`].
pub fn summarize(readings: &[Reading], window: Window) -> OccupancyProfile {
    let mut sums = [0u64; HOURS_PER_DAY];
    let mut counts = [0usize; HOURS_PER_DAY];

    for reading in readings {
        let hour = reading.measured_at.hour() as usize;
        sums[hour] += u64::from(reading.occupancy_count);
        counts[hour] += 1;
    }

    let buckets = std::array::from_fn(|hour| match counts[hour] {
        0 => HourlyOccupancy::NoData,
        samples => HourlyOccupancy::Observed {
            mean: sums[hour] as f64 / samples as f64,
            samples,
        },
    });

    OccupancyProfile { window, buckets }
}
