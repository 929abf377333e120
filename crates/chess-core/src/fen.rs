//! FEN strings as position identifiers.
//!
//! A `PuzzlePosition` is the key used for engine requests and caches. It is
//! never mutated once built; playing a move produces a new position.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};
use shakmaty::{fen::Fen, CastlingMode, Chess};

use crate::error::ChessError;

pub const STANDARD_START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// A board position in Forsyth-Edwards Notation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PuzzlePosition(String);

impl PuzzlePosition {
    /// Wrap a FEN string without checking it. Engine requests take the
    /// position as given; legality is the loader's concern.
    pub fn new(fen: impl Into<String>) -> Self {
        Self(fen.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PuzzlePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PuzzlePosition {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for PuzzlePosition {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PuzzlePosition {
    fn from(fen: &str) -> Self {
        Self::new(fen)
    }
}

impl From<String> for PuzzlePosition {
    fn from(fen: String) -> Self {
        Self::new(fen)
    }
}

pub(crate) fn to_chess(fen: &str) -> Result<Chess, ChessError> {
    let invalid = |reason: String| ChessError::InvalidFen {
        fen: fen.to_string(),
        reason,
    };
    let parsed: Fen = fen.trim().parse().map_err(|e| invalid(format!("{e}")))?;
    parsed
        .into_position::<Chess>(CastlingMode::Standard)
        .map_err(|e| invalid(format!("{e}")))
}
