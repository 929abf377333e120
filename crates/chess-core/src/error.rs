//! Chess-level error types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChessError {
    #[error("Invalid FEN '{fen}': {reason}")]
    InvalidFen { fen: String, reason: String },

    #[error("Malformed move: {0}")]
    MalformedMove(String),

    #[error("Illegal move {uci} in {fen}")]
    IllegalMove { uci: String, fen: String },

    #[error("Puzzle {0} has no solution moves")]
    EmptySolution(String),
}
