//! Move parsing and application on top of shakmaty.

pub use shakmaty::Move;
use shakmaty::{fen::Fen, san::SanPlus, uci::UciMove, CastlingMode, Chess, EnPassantMode, Position};

use crate::error::ChessError;
use crate::fen::{to_chess, PuzzlePosition};

/// A legal chess position that puzzle lines are played on.
#[derive(Debug, Clone)]
pub struct PuzzleBoard {
    pos: Chess,
}

impl Default for PuzzleBoard {
    fn default() -> Self {
        Self {
            pos: Chess::default(),
        }
    }
}

impl PuzzleBoard {
    pub fn from_fen(fen: &str) -> Result<Self, ChessError> {
        Ok(Self { pos: to_chess(fen)? })
    }

    pub fn fen(&self) -> PuzzlePosition {
        PuzzlePosition::new(Fen::from_position(&self.pos, EnPassantMode::Legal).to_string())
    }

    /// Parse a UCI move against this position.
    ///
    /// Input that is not UCI syntax is `MalformedMove`; well-formed moves the
    /// position does not allow are `IllegalMove`.
    pub fn parse_move(&self, uci: &str) -> Result<Move, ChessError> {
        let trimmed = uci.trim();
        let uci_move: UciMove = trimmed
            .parse()
            .map_err(|_| ChessError::MalformedMove(trimmed.to_string()))?;
        uci_move.to_move(&self.pos).map_err(|_| ChessError::IllegalMove {
            uci: trimmed.to_string(),
            fen: self.fen().to_string(),
        })
    }

    /// Apply a move previously returned by `parse_move` on this position.
    pub fn play(&mut self, mv: &Move) {
        self.pos.play_unchecked(*mv);
    }

    pub fn play_uci(&mut self, uci: &str) -> Result<Move, ChessError> {
        let mv = self.parse_move(uci)?;
        self.play(&mv);
        Ok(mv)
    }

    /// SAN with the check or mate suffix.
    pub fn san(&self, mv: &Move) -> String {
        SanPlus::from_move(self.pos.clone(), *mv).to_string()
    }

    pub fn uci(&self, mv: &Move) -> String {
        mv.to_uci(CastlingMode::Standard).to_string()
    }

    /// Check that every move of `line` is legal when played in order.
    pub fn validate_line<S: AsRef<str>>(&self, line: &[S]) -> Result<(), ChessError> {
        let mut board = self.clone();
        for uci in line {
            board.play_uci(uci.as_ref())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fen::STANDARD_START_FEN;

    #[test]
    fn test_parse_move_malformed_vs_illegal() {
        let board = PuzzleBoard::default();
        assert!(matches!(
            board.parse_move("zz99"),
            Err(ChessError::MalformedMove(_))
        ));
        assert!(matches!(
            board.parse_move("e2e5"),
            Err(ChessError::IllegalMove { .. })
        ));
        assert!(board.parse_move("e2e4").is_ok());
    }

    #[test]
    fn test_play_updates_fen() {
        let mut board = PuzzleBoard::from_fen(STANDARD_START_FEN).unwrap();
        let mv = board.play_uci("g1f3").unwrap();
        assert_eq!(board.uci(&mv), "g1f3");
        assert_eq!(
            board.fen().as_str(),
            "rnbqkbnr/pppppppp/8/8/8/5N2/PPPPPPPP/RNBQKB1R b KQkq - 1 1"
        );
    }

    #[test]
    fn test_san_marks_check() {
        let board = PuzzleBoard::from_fen("4k3/8/8/8/8/8/8/R3K3 w - - 0 1").unwrap();
        let mv = board.parse_move("a1a8").unwrap();
        assert_eq!(board.san(&mv), "Ra8+");
        let quiet = board.parse_move("a1a2").unwrap();
        assert_eq!(board.san(&quiet), "Ra2");
    }

    #[test]
    fn test_back_rank_mate() {
        let mut board = PuzzleBoard::from_fen("6k1/5ppp/8/8/8/8/5PPP/R5K1 w - - 0 1").unwrap();
        let mv = board.parse_move("a1a8").unwrap();
        assert_eq!(board.san(&mv), "Ra8#");
        board.play(&mv);
        // No legal replies once mated
        for reply in ["g8h8", "g8f8", "f7f6", "h7h6"] {
            assert!(board.parse_move(reply).is_err());
        }
    }

    #[test]
    fn test_validate_line() {
        let board = PuzzleBoard::default();
        assert!(board.validate_line(&["e2e4", "e7e5", "g1f3"]).is_ok());
        assert!(board.validate_line(&["e2e4", "e2e4"]).is_err());
    }
}
