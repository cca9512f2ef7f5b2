use chrono::{DateTime, TimeDelta};
use chrono_tz::Tz;

/// Accelerated clock that replays the recent past and never runs ahead of
/// the wall clock.
#[derive(Debug, Clone, Copy)]
pub struct SimulatedClock {
    at: DateTime<Tz>,
    step: TimeDelta,
}

impl SimulatedClock {
    /// Starts `backlog` before `now`, moving `step` per tick.
    pub fn new(now: DateTime<Tz>, backlog: TimeDelta, step: TimeDelta) -> Self {
        Self {
            at: now - backlog,
            step,
        }
    }

    pub fn at(&self) -> DateTime<Tz> {
        self.at
    }

    /// Advances by one step, capped at `now`.
    pub fn advance(&mut self, now: DateTime<Tz>) -> DateTime<Tz> {
        self.at = (self.at + self.step).min(now);
        self.at
    }

    pub fn has_caught_up(&self, now: DateTime<Tz>) -> bool {
        self.at >= now
    }
}
