//! Change-driven write suppression.
//!
//! A candidate reading is only written when it differs from the last reading
//! written for the same room by more than the configured [`Tolerance`].

use std::time::Duration;

use log::{debug, warn};
use tokio::time::timeout;

use crate::{
    config::Tolerance,
    sensor::Reading,
    store::{ReadingStore, StoreError},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Persist,
    Suppress,
}

/// Memory of the last reading written for one room.
#[derive(Debug, Clone, Default)]
pub struct AggregationState {
    last_persisted: Option<Reading>,
}

impl AggregationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_persisted(&self) -> Option<&Reading> {
        self.last_persisted.as_ref()
    }
}

#[derive(Debug)]
pub enum TickOutcome {
    Persisted,
    Suppressed,
    /// The write was attempted and failed; the baseline was left untouched.
    Failed(StoreError),
}

impl TickOutcome {
    pub fn is_persisted(&self) -> bool {
        matches!(self, TickOutcome::Persisted)
    }

    pub fn is_suppressed(&self) -> bool {
        matches!(self, TickOutcome::Suppressed)
    }
}

pub fn decide(state: &AggregationState, candidate: &Reading, tolerance: &Tolerance) -> Decision {
    match state.last_persisted() {
        Some(previous) if is_within_tolerance(previous, candidate, tolerance) => Decision::Suppress,
        _ => Decision::Persist,
    }
}

pub fn is_within_tolerance(previous: &Reading, candidate: &Reading, tolerance: &Tolerance) -> bool {
    previous.occupancy_count == candidate.occupancy_count
        && previous.smoke_detected == candidate.smoke_detected
        && (previous.light_intensity_lux - candidate.light_intensity_lux).abs()
            <= tolerance.light_lux
        && (previous.air_quality_index - candidate.air_quality_index).abs()
            <= tolerance.air_quality
}

#[derive(Debug, Clone)]
pub struct Aggregator {
    tolerance: Tolerance,
    write_timeout: Duration,
}

impl Aggregator {
    pub fn new(tolerance: Tolerance, write_timeout: Duration) -> Self {
        Self {
            tolerance,
            write_timeout,
        }
    }

    pub fn tolerance(&self) -> &Tolerance {
        &self.tolerance
    }

    /// Writes `candidate` if it is a significant change and advances `state`
    /// only once the store has accepted it.
    pub async fn tick<S: ReadingStore>(
        &self,
        state: &mut AggregationState,
        candidate: Reading,
        store: &S,
    ) -> TickOutcome {
        if decide(state, &candidate, &self.tolerance) == Decision::Suppress {
            debug!(
                "suppressed unchanged reading for {}: {} people",
                candidate.room_id, candidate.occupancy_count
            );
            return TickOutcome::Suppressed;
        }

        let written = match timeout(self.write_timeout, store.append(&candidate)).await {
            Ok(written) => written,
            Err(_) => Err(StoreError::Timeout(self.write_timeout)),
        };

        if let Err(err) = written {
            warn!("failed to persist reading for {}: {err}", candidate.room_id);
            return TickOutcome::Failed(err);
        }

        debug!(
            "state change in {}: {:?} -> {} people",
            candidate.room_id,
            state.last_persisted().map(|r| r.occupancy_count),
            candidate.occupancy_count
        );
        state.last_persisted = Some(candidate);

        TickOutcome::Persisted
    }
}
