use chrono::DateTime;
use chrono_tz::Tz;
use indexmap::IndexMap;
use rand::{Rng, rngs::StdRng};
use thiserror::Error;

use crate::{
    aggregation::{AggregationState, Aggregator, TickOutcome},
    sensor::{Reading, Room, RoomId},
    simulation::ReadingGenerator,
    store::ReadingStore,
};

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("unknown room: {0}")]
    UnknownRoom(RoomId),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickStats {
    pub ticks: u64,
    pub persisted: u64,
    pub suppressed: u64,
    pub failed: u64,
}

impl TickStats {
    fn record(&mut self, outcome: &TickOutcome) {
        self.ticks += 1;
        match outcome {
            TickOutcome::Persisted => self.persisted += 1,
            TickOutcome::Suppressed => self.suppressed += 1,
            TickOutcome::Failed(_) => self.failed += 1,
        }
    }

    /// Share of ticks that did not need a write.
    pub fn suppression_ratio(&self) -> f64 {
        if self.ticks == 0 {
            return 0.0;
        }
        self.suppressed as f64 / self.ticks as f64
    }
}

#[derive(Debug)]
struct RoomSimulation {
    room: Room,
    last_generated: Option<Reading>,
    state: AggregationState,
}

/// Drives generation and change-driven persistence for a set of rooms.
pub struct Simulator<S, R = StdRng> {
    rooms: IndexMap<RoomId, RoomSimulation>,
    generator: ReadingGenerator<R>,
    aggregator: Aggregator,
    store: S,
    stats: TickStats,
}

impl<S: ReadingStore, R: Rng> Simulator<S, R> {
    pub fn new(generator: ReadingGenerator<R>, aggregator: Aggregator, store: S) -> Self {
        Self {
            rooms: IndexMap::new(),
            generator,
            aggregator,
            store,
            stats: TickStats::default(),
        }
    }

    /// Returns false if a room with the same id is already registered.
    pub fn add_room(&mut self, room: Room) -> bool {
        if self.rooms.contains_key(&room.id) {
            return false;
        }

        self.rooms.insert(
            room.id.clone(),
            RoomSimulation {
                room,
                last_generated: None,
                state: AggregationState::new(),
            },
        );
        true
    }

    pub fn room_ids(&self) -> impl Iterator<Item = &RoomId> {
        self.rooms.keys()
    }

    pub fn state(&self, room_id: &RoomId) -> Option<&AggregationState> {
        self.rooms.get(room_id).map(|r| &r.state)
    }

    pub fn stats(&self) -> TickStats {
        self.stats
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn tick(
        &mut self,
        room_id: &RoomId,
        at: DateTime<Tz>,
    ) -> Result<TickOutcome, SimulationError> {
        let index = self
            .rooms
            .get_index_of(room_id)
            .ok_or_else(|| SimulationError::UnknownRoom(room_id.clone()))?;

        self.tick_index(index, at)
            .await
            .map(|(_, outcome)| outcome)
            .ok_or_else(|| SimulationError::UnknownRoom(room_id.clone()))
    }

    /// Ticks every room once, in registration order.
    pub async fn tick_all(&mut self, at: DateTime<Tz>) -> Vec<(RoomId, TickOutcome)> {
        let mut outcomes = Vec::with_capacity(self.rooms.len());
        for index in 0..self.rooms.len() {
            if let Some(outcome) = self.tick_index(index, at).await {
                outcomes.push(outcome);
            }
        }
        outcomes
    }

    async fn tick_index(
        &mut self,
        index: usize,
        at: DateTime<Tz>,
    ) -> Option<(RoomId, TickOutcome)> {
        let (room_id, simulation) = self.rooms.get_index_mut(index)?;

        let candidate = self.generator.generate(
            &simulation.room,
            simulation.last_generated.as_ref(),
            at,
        );
        simulation.last_generated = Some(candidate.clone());

        let outcome = self
            .aggregator
            .tick(&mut simulation.state, candidate, &self.store)
            .await;
        self.stats.record(&outcome);

        Some((room_id.clone(), outcome))
    }
}

#[cfg(test)]
mod tests {
    use std::{ops::Range, time::Duration};

    use chrono::{TimeDelta, TimeZone};
    use chrono_tz::Asia::Tokyo;

    use super::*;
    use crate::{
        config::{SimulationParams, Tolerance},
        simulation::SimulatedClock,
        store::{MemoryStore, StoreError},
        summary::Window,
    };

    struct RejectingStore;

    impl ReadingStore for RejectingStore {
        async fn append(&self, _reading: &Reading) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("quota exhausted".to_owned()))
        }

        async fn query(
            &self,
            _room_id: &RoomId,
            _range: Range<DateTime<Tz>>,
        ) -> Result<Vec<Reading>, StoreError> {
            Ok(Vec::new())
        }
    }

    fn simulator(params: SimulationParams, seed: u64) -> Simulator<MemoryStore> {
        simulator_with(params, Tolerance::default(), MemoryStore::new(), seed)
    }

    fn simulator_with<S: ReadingStore>(
        params: SimulationParams,
        tolerance: Tolerance,
        store: S,
        seed: u64,
    ) -> Simulator<S> {
        let mut simulator = Simulator::new(
            ReadingGenerator::from_seed(params, Some(seed)).unwrap(),
            Aggregator::new(tolerance, Duration::from_secs(1)),
            store,
        );
        for name in ["Classroom 1", "Classroom 2", "Lab"] {
            simulator.add_room(Room {
                id: name.parse().unwrap(),
                capacity: 40,
            });
        }
        simulator
    }

    fn monday_morning() -> DateTime<Tz> {
        Tokyo.with_ymd_and_hms(2026, 10, 19, 8, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn never_persists_more_than_ticks() {
        let mut simulator = simulator(SimulationParams::default(), 42);

        for minute in 0..600 {
            let at = monday_morning() + TimeDelta::minutes(minute);
            let outcomes = simulator.tick_all(at).await;
            assert_eq!(outcomes.len(), 3);
        }

        let stats = simulator.stats();
        assert_eq!(stats.ticks, 1_800);
        assert_eq!(stats.persisted + stats.suppressed + stats.failed, stats.ticks);
        assert_eq!(stats.failed, 0);
        assert!(stats.persisted >= 3);
        assert!(stats.persisted < stats.ticks);
        assert_eq!(simulator.store().len() as u64, stats.persisted);
    }

    #[tokio::test]
    async fn steady_room_is_written_once() {
        let params = SimulationParams {
            walk_probability: 0.0,
            step_change_probability: 0.0,
            light_noise_lux: 0.0,
            air_noise: 0.0,
            smoke_probability: 0.0,
            ..SimulationParams::default()
        };
        let mut simulator = simulator(params, 5);
        let lab: RoomId = "Lab".parse().unwrap();

        let first = simulator.tick(&lab, monday_morning()).await.unwrap();
        assert!(first.is_persisted());

        for minute in 1..50 {
            let at = monday_morning() + TimeDelta::minutes(minute);
            let outcome = simulator.tick(&lab, at).await.unwrap();
            assert!(outcome.is_suppressed(), "tick {minute} was not suppressed");
        }

        assert_eq!(simulator.store().len(), 1);
        assert!(simulator.state(&lab).unwrap().last_persisted().is_some());
    }

    #[tokio::test]
    async fn consecutive_writes_differ_beyond_tolerance() {
        let mut simulator = simulator(SimulationParams::default(), 9);
        let tolerance = Tolerance::default();

        for minute in 0..300 {
            simulator
                .tick_all(monday_morning() + TimeDelta::minutes(minute))
                .await;
        }

        let written = simulator.store().snapshot();
        for room_id in simulator.room_ids() {
            let rows: Vec<&Reading> = written.iter().filter(|r| &r.room_id == room_id).collect();
            for pair in rows.windows(2) {
                assert!(!crate::aggregation::is_within_tolerance(
                    pair[0], pair[1], &tolerance
                ));
            }
        }
    }

    #[tokio::test]
    async fn unknown_room_is_rejected() {
        let mut simulator = simulator(SimulationParams::default(), 1);
        let missing: RoomId = "Auditorium".parse().unwrap();

        let result = simulator.tick(&missing, monday_morning()).await;
        assert!(matches!(result, Err(SimulationError::UnknownRoom(id)) if id == missing));
    }

    #[test]
    fn duplicate_rooms_are_ignored() {
        let mut simulator = simulator(SimulationParams::default(), 1);
        let added = simulator.add_room(Room {
            id: "Lab".parse().unwrap(),
            capacity: 10,
        });

        assert!(!added);
        assert_eq!(simulator.room_ids().count(), 3);
    }

    #[test]
    fn suppression_ratio_of_idle_simulator_is_zero() {
        assert_eq!(TickStats::default().suppression_ratio(), 0.0);
    }

    #[tokio::test]
    async fn every_detectable_change_is_written() {
        let tolerance = Tolerance {
            light_lux: 0.0,
            air_quality: 0.0,
        };
        let mut simulator =
            simulator_with(SimulationParams::default(), tolerance, MemoryStore::new(), 21);

        for minute in 0..200 {
            simulator
                .tick_all(monday_morning() + TimeDelta::minutes(minute))
                .await;
        }

        let stats = simulator.stats();
        assert_eq!(stats.ticks, 600);
        assert_eq!(stats.persisted, stats.ticks);
        assert_eq!(stats.suppressed, 0);
        assert_eq!(simulator.store().len(), 600);
    }

    #[tokio::test]
    async fn rejected_writes_are_counted_and_keep_state() {
        let mut simulator = simulator_with(
            SimulationParams::default(),
            Tolerance::default(),
            RejectingStore,
            8,
        );
        let lab: RoomId = "Lab".parse().unwrap();

        for minute in 0..10 {
            let at = monday_morning() + TimeDelta::minutes(minute);
            let outcome = simulator.tick(&lab, at).await.unwrap();
            assert!(matches!(
                outcome,
                TickOutcome::Failed(StoreError::Unavailable(_))
            ));
        }

        let stats = simulator.stats();
        assert_eq!(stats.failed, 10);
        assert_eq!(stats.persisted, 0);
        assert!(simulator.state(&lab).unwrap().last_persisted().is_none());
    }

    #[tokio::test]
    async fn accelerated_run_is_visible_to_report_window() {
        let mut simulator = simulator(SimulationParams::default(), 42);
        let now = monday_morning() + TimeDelta::hours(2);
        let mut clock = SimulatedClock::new(now, TimeDelta::hours(1), TimeDelta::seconds(60));

        for _ in 0..120 {
            simulator.tick_all(clock.advance(now)).await;
        }

        let stats = simulator.stats();
        let mut visible = 0;
        for room_id in simulator.room_ids() {
            visible += simulator
                .store()
                .query(room_id, Window::Last24Hours.range(now))
                .await
                .unwrap()
                .len();
        }

        assert!(stats.persisted > 0);
        assert_eq!(visible as u64, stats.persisted);
    }
}
