//! Periodic simulation-and-alarm engine for the tank process.
//!
//! Provides:
//! - Level sensor fault injection with an injectable random source
//! - Unlatched alarm evaluation
//! - Operator commands
//! - `Engine`: one owned context sequencing model, faults, alarms and history per tick

pub mod alarms;
pub mod command;
pub mod engine;
pub mod error;
pub mod fault;

pub use alarms::{Alarm, AlarmEvaluator, AlarmSet, AlarmThresholds, Severity};
pub use command::{Command, CommandLimits};
pub use engine::{Engine, EngineContext, EngineSettings, Snapshot, advance};
pub use error::{SimError, SimResult};
pub use fault::{
    DEFAULT_FAULT_PROBABILITY, FaultInjector, FaultPolicy, RandomSource, RngSource,
    ScriptedSource, SensorHealth,
};
