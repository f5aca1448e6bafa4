//! One-tick process transition.

use crate::inputs::ControlInputs;
use crate::state::{LEVEL_BOUNDS, PRESSURE_BOUNDS, ProcessState, TEMPERATURE_BOUNDS};
use serde::{Deserialize, Serialize};
use tk_core::Real;

/// Per-tick rates of the heater and pump effects.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProcessRates {
    /// Temperature rise per tick with the heater on (°C)
    pub heater_rise: Real,
    /// Temperature drop per tick with the heater off (°C)
    pub ambient_cooling: Real,
    /// Pressure rise per tick with the pump on (bar)
    pub pump_rise: Real,
    /// Pressure drop per tick with the pump off (bar)
    pub pressure_decay: Real,
}

impl Default for ProcessRates {
    fn default() -> Self {
        Self {
            heater_rise: 0.5,
            ambient_cooling: 0.2,
            pump_rise: 0.1,
            pressure_decay: 0.05,
        }
    }
}

/// Simplified tank dynamics.
///
/// `step` is pure and total: identical inputs give identical outputs, and every
/// field of the result is saturated to its bounds.
#[derive(Clone, Debug, Default)]
pub struct ProcessModel {
    pub rates: ProcessRates,
}

impl ProcessModel {
    pub fn new(rates: ProcessRates) -> Self {
        Self { rates }
    }

    /// Advance the process by one tick.
    pub fn step(&self, state: &ProcessState, inputs: &ControlInputs) -> ProcessState {
        ProcessState {
            level: self.next_level(state.level, inputs),
            temperature: self.next_temperature(state.temperature, inputs.heater_on),
            pressure: self.next_pressure(state.pressure, inputs.pump_on),
        }
    }

    pub fn next_level(&self, level: Real, inputs: &ControlInputs) -> Real {
        LEVEL_BOUNDS.saturate(level + inputs.net_flow())
    }

    pub fn next_temperature(&self, temperature: Real, heater_on: bool) -> Real {
        let delta = if heater_on {
            self.rates.heater_rise
        } else {
            -self.rates.ambient_cooling
        };
        TEMPERATURE_BOUNDS.saturate(temperature + delta)
    }

    pub fn next_pressure(&self, pressure: Real, pump_on: bool) -> Real {
        let delta = if pump_on {
            self.rates.pump_rise
        } else {
            -self.rates.pressure_decay
        };
        PRESSURE_BOUNDS.saturate(pressure + delta)
    }
}
