//! Error types for the tk-app service layer.

use std::path::PathBuf;

/// Application error type wrapping the backend crates' errors.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Failed to create history directory: {path}")]
    HistoryDir {
        path: PathBuf,
        source: tk_results::ResultsError,
    },

    #[error("Engine error: {0}")]
    Engine(String),

    #[error("History error: {0}")]
    History(String),

    #[error("Engine runner stopped: {message}")]
    Runner { message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for tk-app operations.
pub type AppResult<T> = Result<T, AppError>;

impl From<tk_project::ProjectError> for AppError {
    fn from(err: tk_project::ProjectError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<tk_sim::SimError> for AppError {
    fn from(err: tk_sim::SimError) -> Self {
        AppError::Engine(err.to_string())
    }
}

impl From<tk_results::ResultsError> for AppError {
    fn from(err: tk_results::ResultsError) -> Self {
        AppError::History(err.to_string())
    }
}

impl From<tk_core::TkError> for AppError {
    fn from(err: tk_core::TkError) -> Self {
        AppError::Engine(err.to_string())
    }
}
