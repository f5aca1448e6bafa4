//! tk-results: process history log and its persisted mirror.

pub mod history;
pub mod store;
pub mod types;

pub use history::{HistoryOptions, HistoryRecorder, LoadOutcome, load_or_empty, records_to_csv};
pub use store::{FileStore, HistoryStore, MemoryStore};
pub use types::*;

pub type ResultsResult<T> = Result<T, ResultsError>;

#[derive(thiserror::Error, Debug)]
pub enum ResultsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid storage key: {key}")]
    InvalidKey { key: String },

    #[error("Storage unavailable: {message}")]
    Unavailable { message: String },
}
