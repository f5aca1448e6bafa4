//! Process state snapshot.

use serde::{Deserialize, Serialize};
use tk_core::units::{Pressure, Ratio, Temperature, bar, degc, percent};
use tk_core::{Bounds, Real, TkResult};

/// Tank level, percent of capacity.
pub const LEVEL_BOUNDS: Bounds = Bounds::new(0.0, 100.0);
/// Liquid temperature, °C.
pub const TEMPERATURE_BOUNDS: Bounds = Bounds::new(0.0, 100.0);
/// Tank pressure, bar.
pub const PRESSURE_BOUNDS: Bounds = Bounds::new(0.0, 5.0);

/// Immutable snapshot of the physical process.
///
/// Values are kept in engineering units (%, °C, bar). Constructors and
/// `ProcessModel::step` keep every field inside its bounds.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProcessState {
    pub level: Real,
    pub temperature: Real,
    pub pressure: Real,
}

impl ProcessState {
    /// Create a state, rejecting non-finite or out-of-range values.
    pub fn new(level: Real, temperature: Real, pressure: Real) -> TkResult<Self> {
        Ok(Self {
            level: LEVEL_BOUNDS.ensure_contains(level, "level")?,
            temperature: TEMPERATURE_BOUNDS.ensure_contains(temperature, "temperature")?,
            pressure: PRESSURE_BOUNDS.ensure_contains(pressure, "pressure")?,
        })
    }

    /// Create a state, pinning each value to its bounds.
    pub fn saturating(level: Real, temperature: Real, pressure: Real) -> Self {
        Self {
            level: LEVEL_BOUNDS.saturate(level),
            temperature: TEMPERATURE_BOUNDS.saturate(temperature),
            pressure: PRESSURE_BOUNDS.saturate(pressure),
        }
    }

    pub fn is_within_bounds(&self) -> bool {
        LEVEL_BOUNDS.contains(self.level)
            && TEMPERATURE_BOUNDS.contains(self.temperature)
            && PRESSURE_BOUNDS.contains(self.pressure)
    }

    /// Same state with the level replaced (used when the level reading is held).
    pub fn with_level(self, level: Real) -> Self {
        Self {
            level: LEVEL_BOUNDS.saturate(level),
            ..self
        }
    }

    pub fn level_ratio(&self) -> Ratio {
        percent(self.level)
    }

    pub fn temperature_si(&self) -> Temperature {
        degc(self.temperature)
    }

    pub fn pressure_si(&self) -> Pressure {
        bar(self.pressure)
    }
}

impl Default for ProcessState {
    /// Half-full tank at room temperature and atmospheric pressure.
    fn default() -> Self {
        Self {
            level: 50.0,
            temperature: 25.0,
            pressure: 1.0,
        }
    }
}
