//! Operator commands accepted by the engine.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tk_core::{Bounds, ensure_finite};

use crate::error::{SimError, SimResult};

/// Mutations of the engine's owned context. Applied between ticks only.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Command {
    SetInflowRate(f64),
    SetOutflowRate(f64),
    SetHeater(bool),
    SetPump(bool),
    ResetSensor,
    ResetHistory,
    /// Force the level sensor into the faulted state (drills and tests).
    InjectSensorFault,
}

/// Range handling for flow setpoints at the command boundary.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CommandLimits {
    /// Pin flow setpoints to `flow_limits` instead of passing them through.
    pub clamp_flow_inputs: bool,
    /// Nominal flow range, L/s.
    pub flow_limits: Bounds,
}

impl Default for CommandLimits {
    fn default() -> Self {
        Self {
            clamp_flow_inputs: false,
            flow_limits: Bounds::new(0.0, 10.0),
        }
    }
}

impl CommandLimits {
    /// Validate a flow setpoint. Non-finite values are always rejected.
    pub fn flow(&self, value: f64, what: &'static str) -> SimResult<f64> {
        let value = ensure_finite(value, what)?;
        if self.clamp_flow_inputs {
            Ok(self.flow_limits.saturate(value))
        } else {
            Ok(value)
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let on_off = |b: bool| if b { "on" } else { "off" };
        match self {
            Command::SetInflowRate(v) => write!(f, "inflow {v}"),
            Command::SetOutflowRate(v) => write!(f, "outflow {v}"),
            Command::SetHeater(on) => write!(f, "heater {}", on_off(*on)),
            Command::SetPump(on) => write!(f, "pump {}", on_off(*on)),
            Command::ResetSensor => f.write_str("reset-sensor"),
            Command::ResetHistory => f.write_str("reset-history"),
            Command::InjectSensorFault => f.write_str("fault"),
        }
    }
}

fn parse_switch(word: Option<&str>, what: &str) -> SimResult<bool> {
    match word {
        Some("on" | "1" | "true") => Ok(true),
        Some("off" | "0" | "false") => Ok(false),
        other => Err(SimError::InvalidCommand {
            what: format!("{what} expects on|off, got {:?}", other.unwrap_or("")),
        }),
    }
}

fn parse_rate(word: Option<&str>, what: &str) -> SimResult<f64> {
    let word = word.ok_or_else(|| SimError::InvalidCommand {
        what: format!("{what} expects a rate in L/s"),
    })?;
    word.parse::<f64>().map_err(|_| SimError::InvalidCommand {
        what: format!("{what}: '{word}' is not a number"),
    })
}

/// Parses the operator console syntax, e.g. `inflow 7.5`, `heater on`, `reset-sensor`.
impl FromStr for Command {
    type Err = SimError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let verb = words.next().unwrap_or("").to_ascii_lowercase();
        let arg = words.next();
        let command = match verb.as_str() {
            "inflow" => Command::SetInflowRate(parse_rate(arg, "inflow")?),
            "outflow" => Command::SetOutflowRate(parse_rate(arg, "outflow")?),
            "heater" => Command::SetHeater(parse_switch(arg, "heater")?),
            "pump" => Command::SetPump(parse_switch(arg, "pump")?),
            "reset-sensor" => Command::ResetSensor,
            "reset-history" => Command::ResetHistory,
            "fault" => Command::InjectSensorFault,
            "" => {
                return Err(SimError::InvalidCommand {
                    what: "empty command".to_string(),
                });
            }
            other => {
                return Err(SimError::InvalidCommand {
                    what: format!("unknown command '{other}'"),
                });
            }
        };
        if let Some(extra) = words.next() {
            return Err(SimError::InvalidCommand {
                what: format!("unexpected argument '{extra}'"),
            });
        }
        Ok(command)
    }
}
