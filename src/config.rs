use clap::Args;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{name} must be a probability in [0, 1], got {value}")]
    InvalidProbability { name: &'static str, value: f64 },

    #[error("{name} must be finite and non-negative, got {value}")]
    Negative { name: &'static str, value: f64 },

    #[error("{name}: lower bound {low} exceeds upper bound {high}")]
    InvertedBounds {
        name: &'static str,
        low: f64,
        high: f64,
    },
}

/// Per-field thresholds below which a change is not worth a write.
///
/// Occupancy and smoke are always compared exactly.
#[derive(Debug, Clone, Copy, PartialEq, Args)]
pub struct Tolerance {
    /// Largest light change (lux) that is still suppressed.
    #[arg(long = "light-epsilon", env = "LIGHT_EPSILON", default_value_t = 50.0)]
    pub light_lux: f64,

    /// Largest air quality change that is still suppressed.
    #[arg(long = "air-epsilon", env = "AIR_EPSILON", default_value_t = 25.0)]
    pub air_quality: f64,
}

impl Default for Tolerance {
    fn default() -> Self {
        Self {
            light_lux: 50.0,
            air_quality: 25.0,
        }
    }
}

impl Tolerance {
    pub fn validate(&self) -> Result<(), ConfigError> {
        non_negative("light-epsilon", self.light_lux)?;
        non_negative("air-epsilon", self.air_quality)?;
        Ok(())
    }
}

/// Random-walk parameters of the reading generator.
#[derive(Debug, Clone, PartialEq, Args)]
pub struct SimulationParams {
    /// Maximum number of people a room holds.
    #[arg(long, env = "ROOM_CAPACITY", default_value_t = 40)]
    pub capacity: u32,

    /// Chance per tick that occupancy drifts by up to `walk-step` people.
    #[arg(long, default_value_t = 0.2)]
    pub walk_probability: f64,

    #[arg(long, default_value_t = 1)]
    pub walk_step: u32,

    /// Chance per tick that occupancy jumps to a level drawn from the timetable.
    #[arg(long, default_value_t = 0.05)]
    pub step_change_probability: f64,

    /// Fraction of the distance to the occupancy-driven target covered per tick.
    #[arg(long, default_value_t = 0.3)]
    pub smoothing: f64,

    #[arg(long, default_value_t = 30.0)]
    pub light_baseline_lux: f64,

    #[arg(long, default_value_t = 12.0)]
    pub light_per_person_lux: f64,

    #[arg(long, default_value_t = 5.0)]
    pub light_noise_lux: f64,

    #[arg(long, default_value_t = 1000.0)]
    pub light_max_lux: f64,

    #[arg(long, default_value_t = 400.0)]
    pub air_baseline: f64,

    #[arg(long, default_value_t = 15.0)]
    pub air_per_person: f64,

    #[arg(long, default_value_t = 5.0)]
    pub air_noise: f64,

    #[arg(long, default_value_t = 300.0)]
    pub air_min: f64,

    #[arg(long, default_value_t = 5000.0)]
    pub air_max: f64,

    #[arg(long, default_value_t = 0.001)]
    pub smoke_probability: f64,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            capacity: 40,
            walk_probability: 0.2,
            walk_step: 1,
            step_change_probability: 0.05,
            smoothing: 0.3,
            light_baseline_lux: 30.0,
            light_per_person_lux: 12.0,
            light_noise_lux: 5.0,
            light_max_lux: 1000.0,
            air_baseline: 400.0,
            air_per_person: 15.0,
            air_noise: 5.0,
            air_min: 300.0,
            air_max: 5000.0,
            smoke_probability: 0.001,
        }
    }
}

impl SimulationParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        probability("walk-probability", self.walk_probability)?;
        probability("step-change-probability", self.step_change_probability)?;
        probability("smoothing", self.smoothing)?;
        probability("smoke-probability", self.smoke_probability)?;

        non_negative("light-baseline-lux", self.light_baseline_lux)?;
        non_negative("light-per-person-lux", self.light_per_person_lux)?;
        non_negative("light-noise-lux", self.light_noise_lux)?;
        non_negative("air-baseline", self.air_baseline)?;
        non_negative("air-per-person", self.air_per_person)?;
        non_negative("air-noise", self.air_noise)?;
        non_negative("air-min", self.air_min)?;

        bounds("light", 0.0, self.light_max_lux)?;
        bounds("air", self.air_min, self.air_max)?;

        Ok(())
    }
}

fn probability(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::InvalidProbability { name, value });
    }

    Ok(())
}

fn non_negative(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ConfigError::Negative { name, value });
    }

    Ok(())
}

fn bounds(name: &'static str, low: f64, high: f64) -> Result<(), ConfigError> {
    if !high.is_finite() || low > high {
        return Err(ConfigError::InvertedBounds { name, low, high });
    }

    Ok(())
}
