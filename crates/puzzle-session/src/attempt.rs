//! State of one attempt at one puzzle. Written only by the session controller.

use chess_core::{PuzzlePosition, PuzzleSetup};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mover {
    Solver,
    Opponent,
}

/// A move as it happened during the attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PuzzleMove {
    pub uci: String,
    pub san: String,
    pub by: Mover,
    /// Wrong solver moves are recorded but never played on the board
    pub correct: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PuzzleAttempt {
    puzzle_id: String,
    fen: PuzzlePosition,
    solution_moves: Vec<String>,
    solution_index: usize,
    move_history: Vec<PuzzleMove>,
    attempts_used: u32,
    showing_hint: bool,
}

impl PuzzleAttempt {
    pub fn new(setup: &PuzzleSetup) -> Self {
        Self {
            puzzle_id: setup.id.clone(),
            fen: setup.fen.clone(),
            solution_moves: setup.solution.clone(),
            solution_index: 0,
            move_history: Vec::new(),
            attempts_used: 0,
            showing_hint: false,
        }
    }

    pub fn puzzle_id(&self) -> &str {
        &self.puzzle_id
    }

    /// Position the attempt started from.
    pub fn fen(&self) -> &PuzzlePosition {
        &self.fen
    }

    pub fn solution_moves(&self) -> &[String] {
        &self.solution_moves
    }

    pub fn solution_index(&self) -> usize {
        self.solution_index
    }

    pub fn move_history(&self) -> &[PuzzleMove] {
        &self.move_history
    }

    pub fn attempts_used(&self) -> u32 {
        self.attempts_used
    }

    pub fn showing_hint(&self) -> bool {
        self.showing_hint
    }

    /// The move the solution expects next, from either side.
    pub fn expected_move(&self) -> Option<&str> {
        self.solution_moves.get(self.solution_index).map(String::as_str)
    }

    pub fn is_exhausted(&self) -> bool {
        self.solution_index >= self.solution_moves.len()
    }

    /// UCI strings of every move the solver submitted, right or wrong.
    pub fn solver_moves(&self) -> Vec<String> {
        self.move_history
            .iter()
            .filter(|m| m.by == Mover::Solver)
            .map(|m| m.uci.clone())
            .collect()
    }

    pub(crate) fn record_correct(&mut self, by: Mover, uci: String, san: String) {
        self.move_history.push(PuzzleMove {
            uci,
            san,
            by,
            correct: true,
        });
        self.solution_index = (self.solution_index + 1).min(self.solution_moves.len());
        self.showing_hint = false;
    }

    pub(crate) fn record_wrong(&mut self, uci: String, san: String) {
        self.move_history.push(PuzzleMove {
            uci,
            san,
            by: Mover::Solver,
            correct: false,
        });
        self.attempts_used += 1;
    }

    pub(crate) fn show_hint(&mut self) {
        self.showing_hint = true;
    }
}
