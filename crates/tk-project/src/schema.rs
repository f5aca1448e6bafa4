//! Configuration schema definitions.
//!
//! Every section has defaults, so an empty document is a valid configuration
//! reproducing the stock training setup.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    pub name: String,
    /// Clock period between ticks.
    pub tick_period_ms: u64,
    pub initial_state: InitialStateDef,
    pub initial_inputs: InitialInputsDef,
    pub process: ProcessDef,
    pub alarms: AlarmsDef,
    pub fault: FaultDef,
    pub history: HistoryDef,
    pub commands: CommandsDef,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            name: "Beverage tank level control".to_string(),
            tick_period_ms: 1000,
            initial_state: InitialStateDef::default(),
            initial_inputs: InitialInputsDef::default(),
            process: ProcessDef::default(),
            alarms: AlarmsDef::default(),
            fault: FaultDef::default(),
            history: HistoryDef::default(),
            commands: CommandsDef::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct InitialStateDef {
    pub level_pct: f64,
    pub temperature_c: f64,
    pub pressure_bar: f64,
}

impl Default for InitialStateDef {
    fn default() -> Self {
        Self {
            level_pct: 50.0,
            temperature_c: 25.0,
            pressure_bar: 1.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct InitialInputsDef {
    pub inflow_lps: f64,
    pub outflow_lps: f64,
    pub heater_on: bool,
    pub pump_on: bool,
}

impl Default for InitialInputsDef {
    fn default() -> Self {
        Self {
            inflow_lps: 5.0,
            outflow_lps: 5.0,
            heater_on: false,
            pump_on: false,
        }
    }
}

/// Per-tick rates of the heater and pump effects.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProcessDef {
    pub heater_rise_c: f64,
    pub ambient_cooling_c: f64,
    pub pump_rise_bar: f64,
    pub pressure_decay_bar: f64,
}

impl Default for ProcessDef {
    fn default() -> Self {
        Self {
            heater_rise_c: 0.5,
            ambient_cooling_c: 0.2,
            pump_rise_bar: 0.1,
            pressure_decay_bar: 0.05,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AlarmsDef {
    pub level_high_pct: f64,
    pub level_low_pct: f64,
    pub temperature_high_c: f64,
    pub pressure_high_bar: f64,
    pub rapid_change_pct: f64,
}

impl Default for AlarmsDef {
    fn default() -> Self {
        Self {
            level_high_pct: 80.0,
            level_low_pct: 20.0,
            temperature_high_c: 80.0,
            pressure_high_bar: 4.0,
            rapid_change_pct: 10.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum FaultPolicyDef {
    #[default]
    FreezeLevel,
    MaskOnly,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FaultDef {
    /// Chance per tick that a healthy level sensor sticks.
    pub probability: f64,
    /// Fixed seed for a reproducible fault sequence; entropy when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    pub policy: FaultPolicyDef,
}

impl Default for FaultDef {
    fn default() -> Self {
        Self {
            probability: 0.01,
            seed: None,
            policy: FaultPolicyDef::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HistoryDef {
    /// Directory holding the persisted history.
    pub dir: PathBuf,
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_records: Option<usize>,
    pub timestamp_format: String,
}

impl Default for HistoryDef {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(".tanksim"),
            key: "process_history".to_string(),
            max_records: None,
            timestamp_format: "%H:%M:%S".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CommandsDef {
    pub clamp_flow_inputs: bool,
    /// Nominal `[min, max]` flow setpoint range, L/s.
    pub flow_limits_lps: [f64; 2],
}

impl Default for CommandsDef {
    fn default() -> Self {
        Self {
            clamp_flow_inputs: false,
            flow_limits_lps: [0.0, 10.0],
        }
    }
}

impl HistoryDef {
    /// Resolve `dir` against the directory containing the config file.
    pub fn resolve_dir(&self, config_path: &std::path::Path) -> PathBuf {
        if self.dir.is_absolute() {
            return self.dir.clone();
        }
        match config_path.parent() {
            Some(parent) => parent.join(&self.dir),
            None => self.dir.clone(),
        }
    }
}
