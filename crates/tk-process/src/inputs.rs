//! Operator control inputs.

use serde::{Deserialize, Serialize};
use tk_core::Real;
use tk_core::units::{VolumeRate, lps};

/// Operator-set inputs, applied on every tick.
///
/// Flow rates are in L/s. Their nominal range is [0, 10] but the model uses
/// whatever it is given; range hardening belongs at the command boundary.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ControlInputs {
    pub inflow_rate: Real,
    pub outflow_rate: Real,
    pub heater_on: bool,
    pub pump_on: bool,
}

impl ControlInputs {
    /// Net level change per tick.
    #[inline]
    pub fn net_flow(&self) -> Real {
        self.inflow_rate - self.outflow_rate
    }

    pub fn inflow_si(&self) -> VolumeRate {
        lps(self.inflow_rate)
    }

    pub fn outflow_si(&self) -> VolumeRate {
        lps(self.outflow_rate)
    }
}

impl Default for ControlInputs {
    /// Balanced 5 L/s in and out, heater and pump off.
    fn default() -> Self {
        Self {
            inflow_rate: 5.0,
            outflow_rate: 5.0,
            heater_on: false,
            pump_on: false,
        }
    }
}
