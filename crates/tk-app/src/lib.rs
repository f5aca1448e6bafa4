//! Shared application service layer for tanksim.
//!
//! Turns a configuration into a running engine and drives it on a fixed-period
//! clock, so the CLI and any other front end share the same orchestration.

pub mod engine_service;
pub mod error;
pub mod runner;

pub use engine_service::{
    EngineSetup, build_engine, open_engine, open_history, settings_from_config,
};
pub use error::{AppError, AppResult};
pub use runner::{CommandSender, EngineHandle, EngineRunner, TickClock};
