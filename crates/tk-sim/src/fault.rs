//! Level sensor fault injection.

use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::error::{SimError, SimResult};

/// Chance per tick that a healthy level sensor sticks.
pub const DEFAULT_FAULT_PROBABILITY: f64 = 0.01;

/// Source of uniform samples in `[0, 1)`.
pub trait RandomSource: Send {
    fn next_unit(&mut self) -> f64;
}

/// `RandomSource` backed by any `rand` generator.
pub struct RngSource<R> {
    rng: R,
}

impl<R: RngCore> RngSource<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RngSource<ChaCha8Rng> {
    /// Reproducible stream for a given seed.
    pub fn seeded(seed: u64) -> Self {
        Self::new(ChaCha8Rng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Self::new(ChaCha8Rng::from_entropy())
    }
}

impl<R: RngCore + Send> RandomSource for RngSource<R> {
    fn next_unit(&mut self) -> f64 {
        self.rng.gen_range(0.0..1.0)
    }
}

/// Replays a fixed list of draws, then repeats `fallback`.
#[derive(Clone, Debug)]
pub struct ScriptedSource {
    draws: VecDeque<f64>,
    fallback: f64,
}

impl ScriptedSource {
    pub fn new(draws: impl IntoIterator<Item = f64>, fallback: f64) -> Self {
        Self {
            draws: draws.into_iter().collect(),
            fallback,
        }
    }

    /// A source whose draws never fall below any probability < 1.
    pub fn never() -> Self {
        Self::new([], 1.0)
    }

    /// Fault on the `n`-th draw (0-based), never otherwise.
    pub fn fault_at(n: usize) -> Self {
        let mut draws = vec![1.0; n];
        draws.push(0.0);
        Self::new(draws, 1.0)
    }
}

impl RandomSource for ScriptedSource {
    fn next_unit(&mut self) -> f64 {
        self.draws.pop_front().unwrap_or(self.fallback)
    }
}

/// Level instrument health. Starts healthy; only an explicit reset heals it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorHealth {
    pub level_sensor_ok: bool,
}

impl SensorHealth {
    pub const fn healthy() -> Self {
        Self {
            level_sensor_ok: true,
        }
    }

    pub const fn faulted() -> Self {
        Self {
            level_sensor_ok: false,
        }
    }

    pub fn is_faulted(&self) -> bool {
        !self.level_sensor_ok
    }
}

impl Default for SensorHealth {
    fn default() -> Self {
        Self::healthy()
    }
}

/// What happens to the physical level while the sensor is faulted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultPolicy {
    /// Hold the level at its last value; temperature and pressure keep evolving.
    #[default]
    FreezeLevel,
    /// Keep integrating the level; only the recorded reading is masked.
    MaskOnly,
}

/// Per-tick stochastic fault process for the level sensor.
pub struct FaultInjector {
    probability: f64,
    source: Box<dyn RandomSource>,
}

impl FaultInjector {
    pub fn new(probability: f64, source: Box<dyn RandomSource>) -> SimResult<Self> {
        if !(0.0..=1.0).contains(&probability) {
            return Err(SimError::InvalidArg {
                what: "fault probability must be within [0, 1]",
            });
        }
        Ok(Self {
            probability,
            source,
        })
    }

    pub fn probability(&self) -> f64 {
        self.probability
    }

    /// Draw once and possibly fault a healthy sensor. Faulted stays faulted.
    pub fn maybe_fail(&mut self, health: SensorHealth) -> SensorHealth {
        let sample = self.source.next_unit();
        if health.level_sensor_ok && sample < self.probability {
            SensorHealth::faulted()
        } else {
            health
        }
    }

    /// Unconditionally healthy.
    pub fn reset(&self) -> SensorHealth {
        SensorHealth::healthy()
    }
}
