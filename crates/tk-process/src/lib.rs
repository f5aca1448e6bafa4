//! Tank process model for tanksim.
//!
//! Provides:
//! - `ProcessState`: level / temperature / pressure snapshot, always inside bounds
//! - `ControlInputs`: operator-controlled inflow, outflow, heater and pump
//! - `ProcessModel`: pure, deterministic one-tick state transition

pub mod inputs;
pub mod model;
pub mod state;

pub use inputs::ControlInputs;
pub use model::{ProcessModel, ProcessRates};
pub use state::{LEVEL_BOUNDS, PRESSURE_BOUNDS, ProcessState, TEMPERATURE_BOUNDS};
