//! Worker error types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkerError {
    #[error("Configuration error: {0}")]
    Config(&'static str),

    #[error("Stockfish error: {0}")]
    Stockfish(String),

    #[error("Engine worker is not running")]
    Disconnected,
}
