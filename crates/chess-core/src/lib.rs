//! Chess primitives shared by the puzzle engine: positions, moves, and
//! puzzle definitions as delivered by the backend.

pub mod board;
pub mod error;
pub mod fen;
pub mod puzzle;

pub use board::{Move, PuzzleBoard};
pub use error::ChessError;
pub use fen::{PuzzlePosition, STANDARD_START_FEN};
pub use puzzle::{LichessPuzzle, PuzzleSetup};
