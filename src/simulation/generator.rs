use chrono::DateTime;
use chrono_tz::Tz;
use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::{
    config::{ConfigError, SimulationParams},
    sensor::{Reading, Room},
    simulation::occupancy_band,
};

/// Produces plausible readings as a random walk from the previous one.
#[derive(Debug, Clone)]
pub struct ReadingGenerator<R = StdRng> {
    params: SimulationParams,
    rng: R,
}

impl ReadingGenerator<StdRng> {
    /// A fixed `seed` makes the whole run reproducible.
    pub fn from_seed(params: SimulationParams, seed: Option<u64>) -> Result<Self, ConfigError> {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::new(params, rng)
    }
}

impl<R: Rng> ReadingGenerator<R> {
    pub fn new(params: SimulationParams, rng: R) -> Result<Self, ConfigError> {
        params.validate()?;
        Ok(Self { params, rng })
    }

    pub fn params(&self) -> &SimulationParams {
        &self.params
    }

    /// Generates the next reading for `room`.
    ///
    /// `previous` is the last *generated* reading, not the last persisted one.
    /// Values outside their physical range are clamped.
    pub fn generate(
        &mut self,
        room: &Room,
        previous: Option<&Reading>,
        at: DateTime<Tz>,
    ) -> Reading {
        let occupancy_count =
            self.next_occupancy(room.capacity, previous.map(|r| r.occupancy_count), &at);
        let people = f64::from(occupancy_count);
        let p = &self.params;

        let light_target = p.light_baseline_lux + p.light_per_person_lux * people;
        let light = smooth(
            previous.map(|r| r.light_intensity_lux),
            light_target,
            p.smoothing,
        ) + noise(&mut self.rng, p.light_noise_lux);

        let air_target = p.air_baseline + p.air_per_person * people;
        let air = smooth(
            previous.map(|r| r.air_quality_index),
            air_target,
            p.smoothing,
        ) + noise(&mut self.rng, p.air_noise);

        Reading {
            room_id: room.id.clone(),
            measured_at: at,
            occupancy_count,
            light_intensity_lux: light.clamp(0.0, p.light_max_lux),
            air_quality_index: air.clamp(p.air_min, p.air_max),
            smoke_detected: self.rng.gen_bool(p.smoke_probability),
        }
    }

    fn next_occupancy(&mut self, capacity: u32, previous: Option<u32>, at: &DateTime<Tz>) -> u32 {
        let Some(previous) = previous else {
            return self.step_target(capacity, at);
        };

        if self.rng.gen_bool(self.params.step_change_probability) {
            return self.step_target(capacity, at);
        }

        if !self.rng.gen_bool(self.params.walk_probability) {
            return previous.min(capacity);
        }

        let step = i64::from(self.params.walk_step);
        let walked = i64::from(previous) + self.rng.gen_range(-step..=step);

        walked.clamp(0, i64::from(capacity)) as u32
    }

    fn step_target(&mut self, capacity: u32, at: &DateTime<Tz>) -> u32 {
        let target = match occupancy_band(at) {
            Some(band) if self.rng.gen_bool(band.probability) => {
                self.rng.gen_range(band.min..=band.max)
            }
            _ => 0,
        };

        target.min(capacity)
    }
}

fn smooth(previous: Option<f64>, target: f64, smoothing: f64) -> f64 {
    match previous {
        Some(previous) => previous + smoothing * (target - previous),
        None => target,
    }
}

fn noise<R: Rng>(rng: &mut R, amplitude: f64) -> f64 {
    if amplitude <= 0.0 {
        return 0.0;
    }

    rng.gen_range(-amplitude..=amplitude)
}

#[cfg(test)]
mod tests {
    use chrono::{TimeDelta, TimeZone};
    use chrono_tz::Asia::Tokyo;

    use super::*;

    fn lab(capacity: u32) -> Room {
        Room {
            id: "Lab".parse().unwrap(),
            capacity,
        }
    }

    fn monday_morning() -> DateTime<Tz> {
        Tokyo.with_ymd_and_hms(2026, 10, 19, 9, 0, 0).unwrap()
    }

    #[test]
    fn seeded_generators_agree() {
        let room = lab(40);
        let mut a = ReadingGenerator::from_seed(SimulationParams::default(), Some(7)).unwrap();
        let mut b = ReadingGenerator::from_seed(SimulationParams::default(), Some(7)).unwrap();

        let mut prev_a: Option<Reading> = None;
        let mut prev_b: Option<Reading> = None;
        for minute in 0..100 {
            let at = monday_morning() + TimeDelta::minutes(minute);
            let ra = a.generate(&room, prev_a.as_ref(), at);
            let rb = b.generate(&room, prev_b.as_ref(), at);
            assert_eq!(ra, rb);
            prev_a = Some(ra);
            prev_b = Some(rb);
        }
    }

    #[test]
    fn values_stay_within_bounds() {
        let params = SimulationParams {
            walk_probability: 1.0,
            walk_step: 10,
            step_change_probability: 0.5,
            light_noise_lux: 500.0,
            air_noise: 3000.0,
            ..SimulationParams::default()
        };
        let room = lab(12);
        let mut generator = ReadingGenerator::from_seed(params.clone(), Some(1)).unwrap();

        let mut previous: Option<Reading> = None;
        for minute in 0..2_000 {
            let at = monday_morning() + TimeDelta::minutes(minute);
            let reading = generator.generate(&room, previous.as_ref(), at);

            assert!(reading.occupancy_count <= room.capacity);
            assert!((0.0..=params.light_max_lux).contains(&reading.light_intensity_lux));
            assert!((params.air_min..=params.air_max).contains(&reading.air_quality_index));

            previous = Some(reading);
        }
    }

    #[test]
    fn air_quality_tracks_occupancy() {
        let params = SimulationParams {
            walk_probability: 0.0,
            step_change_probability: 0.0,
            light_noise_lux: 0.0,
            air_noise: 0.0,
            smoothing: 1.0,
            smoke_probability: 0.0,
            ..SimulationParams::default()
        };
        let room = lab(40);
        let mut generator = ReadingGenerator::from_seed(params.clone(), Some(3)).unwrap();

        let crowded = Reading {
            room_id: room.id.clone(),
            measured_at: monday_morning(),
            occupancy_count: 20,
            light_intensity_lux: 0.0,
            air_quality_index: 0.0,
            smoke_detected: false,
        };
        let next = generator.generate(&room, Some(&crowded), monday_morning());

        assert_eq!(next.occupancy_count, 20);
        assert_eq!(
            next.air_quality_index,
            params.air_baseline + params.air_per_person * 20.0
        );
        assert_eq!(
            next.light_intensity_lux,
            params.light_baseline_lux + params.light_per_person_lux * 20.0
        );
    }

    #[test]
    fn occupancy_is_clamped_to_capacity() {
        let room = lab(3);
        let mut generator =
            ReadingGenerator::from_seed(SimulationParams::default(), Some(11)).unwrap();
        let overfull = Reading {
            room_id: room.id.clone(),
            measured_at: monday_morning(),
            occupancy_count: 50,
            light_intensity_lux: 100.0,
            air_quality_index: 400.0,
            smoke_detected: false,
        };

        let next = generator.generate(&room, Some(&overfull), monday_morning());
        assert!(next.occupancy_count <= 3);
    }

    #[test]
    fn rejects_out_of_range_params() {
        let params = SimulationParams {
            smoke_probability: 1.5,
            ..SimulationParams::default()
        };

        let result = ReadingGenerator::from_seed(params, Some(1));

        assert!(matches!(
            result,
            Err(ConfigError::InvalidProbability {
                name: "smoke-probability",
                ..
            })
        ));
    }

    #[test]
    fn rejects_inverted_bounds() {
        let params = SimulationParams {
            air_min: 900.0,
            air_max: 400.0,
            ..SimulationParams::default()
        };

        assert!(ReadingGenerator::from_seed(params, None).is_err());
    }
}
