//! Messages exchanged with the engine worker.
//!
//! On the wire a result is the flat object
//! `{success, move?, evaluation?, depth?, mateInN?, error?}`; in Rust it is a
//! tagged union so callers match instead of probing optional fields.

use serde::{Deserialize, Serialize};

/// Analysis request. Depth is fixed by the worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineRequest {
    pub fen: String,
}

impl EngineRequest {
    pub fn new(fen: impl Into<String>) -> Self {
        Self { fen: fen.into() }
    }
}

/// A successful engine search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineAnalysis {
    /// Best move in UCI notation
    pub best_move: String,
    /// Centipawn score from the side to move's perspective
    pub evaluation: Option<i32>,
    /// Depth the search reached
    pub depth: Option<u32>,
    /// Mate in N (positive = side to move mates, negative = gets mated)
    pub mate_in: Option<i32>,
}

/// Outcome of one analysis request. Produced once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "EngineMessage", into = "EngineMessage")]
pub enum EngineResult {
    Success(EngineAnalysis),
    Failure { error: String },
}

impl EngineResult {
    pub fn failure(error: impl Into<String>) -> Self {
        EngineResult::Failure {
            error: error.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, EngineResult::Success(_))
    }

    pub fn best_move(&self) -> Option<&str> {
        match self {
            EngineResult::Success(analysis) => Some(&analysis.best_move),
            EngineResult::Failure { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            EngineResult::Success(_) => None,
            EngineResult::Failure { error } => Some(error),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EngineMessage {
    success: bool,
    #[serde(rename = "move", default, skip_serializing_if = "Option::is_none")]
    best_move: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    evaluation: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    depth: Option<u32>,
    #[serde(rename = "mateInN", default, skip_serializing_if = "Option::is_none")]
    mate_in: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl From<EngineMessage> for EngineResult {
    fn from(msg: EngineMessage) -> Self {
        match (msg.success, msg.best_move) {
            (true, Some(best_move)) => EngineResult::Success(EngineAnalysis {
                best_move,
                evaluation: msg.evaluation,
                depth: msg.depth,
                mate_in: msg.mate_in,
            }),
            (true, None) => EngineResult::failure("missing best move"),
            (false, _) => EngineResult::failure(msg.error.unwrap_or_else(|| "unknown error".into())),
        }
    }
}

impl From<EngineResult> for EngineMessage {
    fn from(result: EngineResult) -> Self {
        match result {
            EngineResult::Success(a) => EngineMessage {
                success: true,
                best_move: Some(a.best_move),
                evaluation: a.evaluation,
                depth: a.depth,
                mate_in: a.mate_in,
                error: None,
            },
            EngineResult::Failure { error } => EngineMessage {
                success: false,
                best_move: None,
                evaluation: None,
                depth: None,
                mate_in: None,
                error: Some(error),
            },
        }
    }
}
