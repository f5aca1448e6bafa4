//! Unlatched alarm derivation.
//!
//! Every flag is recomputed from the current tick only. The one piece of
//! history the evaluator needs, the previous tick's level, is passed in.

use serde::{Deserialize, Serialize};
use std::fmt;
use tk_process::ProcessState;

use crate::fault::SensorHealth;

/// Alarm trip points. Level limits and thresholds are inclusive except
/// `rapid_change`, which trips only on a strictly larger step.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AlarmThresholds {
    pub level_high: f64,
    pub level_low: f64,
    pub temperature_high: f64,
    pub pressure_high: f64,
    pub rapid_change: f64,
}

impl Default for AlarmThresholds {
    fn default() -> Self {
        Self {
            level_high: 80.0,
            level_low: 20.0,
            temperature_high: 80.0,
            pressure_high: 4.0,
            rapid_change: 10.0,
        }
    }
}

/// How loudly an alarm is shown to the operator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Alarm {
    LevelHigh,
    LevelLow,
    TemperatureHigh,
    PressureHigh,
    RapidChange,
    SensorFault,
}

impl Alarm {
    pub const ALL: [Alarm; 6] = [
        Alarm::LevelHigh,
        Alarm::LevelLow,
        Alarm::TemperatureHigh,
        Alarm::PressureHigh,
        Alarm::RapidChange,
        Alarm::SensorFault,
    ];

    pub fn severity(self) -> Severity {
        match self {
            Alarm::LevelLow | Alarm::RapidChange => Severity::Warning,
            Alarm::LevelHigh | Alarm::TemperatureHigh | Alarm::PressureHigh | Alarm::SensorFault => {
                Severity::Error
            }
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            Alarm::LevelHigh => "high tank level",
            Alarm::LevelLow => "low tank level",
            Alarm::TemperatureHigh => "high temperature",
            Alarm::PressureHigh => "high pressure",
            Alarm::RapidChange => "rapid tank level change",
            Alarm::SensorFault => "level sensor fault",
        }
    }
}

impl fmt::Display for Alarm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// The six alarm flags for one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlarmSet {
    pub level_high: bool,
    pub level_low: bool,
    pub temperature_high: bool,
    pub pressure_high: bool,
    pub rapid_change: bool,
    pub sensor_fault: bool,
}

impl AlarmSet {
    pub fn is_active(&self, alarm: Alarm) -> bool {
        match alarm {
            Alarm::LevelHigh => self.level_high,
            Alarm::LevelLow => self.level_low,
            Alarm::TemperatureHigh => self.temperature_high,
            Alarm::PressureHigh => self.pressure_high,
            Alarm::RapidChange => self.rapid_change,
            Alarm::SensorFault => self.sensor_fault,
        }
    }

    pub fn any(&self) -> bool {
        Alarm::ALL.iter().any(|&a| self.is_active(a))
    }

    /// Active alarms in display order.
    pub fn active(&self) -> Vec<Alarm> {
        Alarm::ALL
            .iter()
            .copied()
            .filter(|&a| self.is_active(a))
            .collect()
    }
}

/// Stateless evaluator over a fixed threshold table.
#[derive(Clone, Debug, Default)]
pub struct AlarmEvaluator {
    pub thresholds: AlarmThresholds,
}

impl AlarmEvaluator {
    pub fn new(thresholds: AlarmThresholds) -> Self {
        Self { thresholds }
    }

    pub fn evaluate(&self, state: &ProcessState, previous_level: f64, health: SensorHealth) -> AlarmSet {
        let t = &self.thresholds;
        AlarmSet {
            level_high: state.level >= t.level_high,
            level_low: state.level <= t.level_low,
            temperature_high: state.temperature >= t.temperature_high,
            pressure_high: state.pressure >= t.pressure_high,
            rapid_change: (state.level - previous_level).abs() > t.rapid_change,
            sensor_fault: !health.level_sensor_ok,
        }
    }
}
