//! Puzzle definitions as delivered by the backend, and the solver-facing setup
//! derived from them.

use serde::{Deserialize, Deserializer, Serialize};

use crate::board::PuzzleBoard;
use crate::error::ChessError;
use crate::fen::PuzzlePosition;

/// A puzzle in the Lichess database shape.
///
/// `moves[0]` is the opponent's move that creates the tactic; the solver
/// replies from the resulting position.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LichessPuzzle {
    #[serde(alias = "PuzzleId", alias = "puzzleId")]
    pub id: String,
    pub fen: String,
    /// Accepts either a JSON array or the database's space-separated line.
    #[serde(deserialize_with = "deserialize_moves")]
    pub moves: Vec<String>,
    #[serde(default)]
    pub rating: Option<u32>,
    #[serde(default)]
    pub rating_deviation: Option<u32>,
    #[serde(default)]
    pub popularity: Option<i32>,
    #[serde(default)]
    pub nb_plays: Option<u32>,
    #[serde(default)]
    pub themes: Vec<String>,
    #[serde(default)]
    pub game_url: Option<String>,
    #[serde(default)]
    pub opening_tags: Vec<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MovesRepr {
    List(Vec<String>),
    Line(String),
}

fn deserialize_moves<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    Ok(match MovesRepr::deserialize(deserializer)? {
        MovesRepr::List(moves) => moves,
        MovesRepr::Line(line) => line.split_whitespace().map(String::from).collect(),
    })
}

impl LichessPuzzle {
    /// Play the opponent's setup move and return the position the solver
    /// starts from, with the remaining moves as the solution line.
    pub fn to_setup(&self) -> Result<PuzzleSetup, ChessError> {
        let (setup_move, solution) = self
            .moves
            .split_first()
            .ok_or_else(|| ChessError::EmptySolution(self.id.clone()))?;

        let mut board = PuzzleBoard::from_fen(&self.fen)?;
        board.play_uci(setup_move)?;

        let setup = PuzzleSetup {
            id: self.id.clone(),
            fen: board.fen(),
            solution: solution.to_vec(),
            rating: self.rating,
            themes: self.themes.clone(),
        };
        setup.validate()?;
        Ok(setup)
    }
}

/// A puzzle ready to be played: the solver is to move in `fen`, and
/// `solution` alternates solver and opponent moves starting with the solver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PuzzleSetup {
    pub id: String,
    pub fen: PuzzlePosition,
    pub solution: Vec<String>,
    #[serde(default)]
    pub rating: Option<u32>,
    #[serde(default)]
    pub themes: Vec<String>,
}

impl PuzzleSetup {
    pub fn new(id: impl Into<String>, fen: impl Into<PuzzlePosition>, solution: &[&str]) -> Self {
        Self {
            id: id.into(),
            fen: fen.into(),
            solution: solution.iter().map(|m| m.to_string()).collect(),
            rating: None,
            themes: Vec::new(),
        }
    }

    /// Check the position and the whole solution line, returning the start board.
    pub fn validate(&self) -> Result<PuzzleBoard, ChessError> {
        if self.solution.is_empty() {
            return Err(ChessError::EmptySolution(self.id.clone()));
        }
        let board = PuzzleBoard::from_fen(self.fen.as_str())?;
        board.validate_line(&self.solution)?;
        Ok(board)
    }

    /// Get solver's moves (even indices: 0, 2, 4, ...)
    pub fn solver_moves(&self) -> Vec<&str> {
        self.solution.iter().step_by(2).map(String::as_str).collect()
    }

    /// Get opponent's replies (odd indices: 1, 3, 5, ...)
    pub fn opponent_moves(&self) -> Vec<&str> {
        self.solution.iter().skip(1).step_by(2).map(String::as_str).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fen::STANDARD_START_FEN;

    #[test]
    fn test_moves_accept_line_or_list() {
        let from_line: LichessPuzzle = serde_json::from_str(
            r#"{"id":"abc12","fen":"x","moves":"e2e4 e7e5 g1f3","rating":1500,"themes":["opening"]}"#,
        )
        .unwrap();
        assert_eq!(from_line.moves, vec!["e2e4", "e7e5", "g1f3"]);

        let from_list: LichessPuzzle =
            serde_json::from_str(r#"{"id":"abc12","fen":"x","moves":["e2e4","e7e5"]}"#).unwrap();
        assert_eq!(from_list.moves, vec!["e2e4", "e7e5"]);
        assert!(from_list.themes.is_empty());
    }

    #[test]
    fn test_to_setup_plays_opponent_move() {
        let puzzle = LichessPuzzle {
            id: "p1".into(),
            fen: STANDARD_START_FEN.into(),
            moves: vec!["e2e4".into(), "e7e5".into(), "g1f3".into()],
            rating: Some(1200),
            rating_deviation: None,
            popularity: None,
            nb_plays: None,
            themes: vec!["opening".into()],
            game_url: None,
            opening_tags: vec![],
        };
        let setup = puzzle.to_setup().unwrap();
        assert_eq!(
            setup.fen.as_str(),
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1"
        );
        assert_eq!(setup.solution, vec!["e7e5", "g1f3"]);
        assert_eq!(setup.solver_moves(), vec!["e7e5"]);
        assert_eq!(setup.opponent_moves(), vec!["g1f3"]);
    }

    #[test]
    fn test_validate_rejects_empty_and_illegal_lines() {
        let empty = PuzzleSetup::new("empty", STANDARD_START_FEN, &[]);
        assert!(matches!(empty.validate(), Err(ChessError::EmptySolution(_))));

        let illegal = PuzzleSetup::new("bad", STANDARD_START_FEN, &["e2e4", "e2e4"]);
        assert!(matches!(
            illegal.validate(),
            Err(ChessError::IllegalMove { .. })
        ));
    }
}
