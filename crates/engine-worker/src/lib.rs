//! Background chess engine worker.
//!
//! One worker task owns one engine (normally a Stockfish process) and answers
//! `{fen}` analysis requests one at a time over a channel.

pub mod analyzer;
pub mod config;
pub mod error;
pub mod protocol;
pub mod stockfish;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod worker;

pub use analyzer::Analyzer;
pub use config::EngineConfig;
pub use error::WorkerError;
pub use protocol::{EngineAnalysis, EngineRequest, EngineResult};
pub use stockfish::StockfishEngine;
pub use worker::{EngineWorker, ReplyReceiver};
