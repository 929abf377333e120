//! Session error types

use chess_core::ChessError;
use thiserror::Error;

use crate::phase::SessionPhase;

/// Rejection of an engine request. Engine answers, including failures the
/// engine reports itself, arrive as `Ok(EngineResult)` instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Engine worker error: {0}")]
    Worker(String),

    #[error("Engine worker disconnected")]
    Disconnected,
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Chess(#[from] ChessError),

    #[error("Not available during {0}")]
    WrongPhase(SessionPhase),
}
