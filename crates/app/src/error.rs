use engine::{EngineError, ErrorKind};
use thiserror::Error;

/// Errors surfaced by the command line front end.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Invalid argument: {0}")]
    Argument(String),
}

impl AppError {
    /// Process exit code: 2 for rejected input, 3 for a lost race, 1 otherwise.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Argument(_) => 2,
            Self::Engine(err) => match err.kind() {
                ErrorKind::Validation => 2,
                ErrorKind::ConcurrentModification => 3,
                ErrorKind::Invariant | ErrorKind::Store => 1,
            },
            _ => 1,
        }
    }
}
