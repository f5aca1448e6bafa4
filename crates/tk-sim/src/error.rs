//! Error types for engine operations.

use thiserror::Error;

/// Errors raised while building the engine or applying commands.
///
/// Ticks themselves never fail.
#[derive(Error, Debug)]
pub enum SimError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Invalid command: {what}")]
    InvalidCommand { what: String },

    #[error("Persistence error: {message}")]
    Persistence { message: String },
}

pub type SimResult<T> = Result<T, SimError>;

impl From<tk_core::TkError> for SimError {
    fn from(e: tk_core::TkError) -> Self {
        SimError::InvalidCommand {
            what: e.to_string(),
        }
    }
}

impl From<tk_results::ResultsError> for SimError {
    fn from(e: tk_results::ResultsError) -> Self {
        SimError::Persistence {
            message: e.to_string(),
        }
    }
}
