//! tk-core: shared foundation for tanksim.
//!
//! Contains:
//! - units (uom SI types + engineering-unit constructors)
//! - numeric (Real, Bounds, saturating clamp, float helpers)
//! - error (shared error types)

pub mod error;
pub mod numeric;
pub mod units;

pub use error::{TkError, TkResult};
pub use numeric::*;
