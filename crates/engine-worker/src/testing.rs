//! Test utilities for code that talks to an engine worker.
//!
//! [`ScriptedAnalyzer`] answers from a per-FEN script instead of searching,
//! and records every request it receives so tests can count worker messages.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::analyzer::Analyzer;
use crate::error::WorkerError;
use crate::protocol::{EngineAnalysis, EngineResult};

/// What the analyzer does when asked about a position.
#[derive(Debug, Clone)]
pub enum Script {
    /// Answer with this result.
    Reply(EngineResult),
    /// Fail the transport for this request.
    Fail(WorkerError),
    /// Never answer.
    Hang,
}

/// A deterministic [`Analyzer`]. Clones share the script and the request log.
#[derive(Debug, Clone, Default)]
pub struct ScriptedAnalyzer {
    scripts: Arc<Mutex<HashMap<String, Script>>>,
    requests: Arc<Mutex<Vec<(String, u32)>>>,
    cancels: Arc<AtomicUsize>,
    shutdowns: Arc<AtomicUsize>,
}

impl ScriptedAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `fen` with a successful search for `best_move`.
    pub fn best_move(self, fen: &str, best_move: &str, evaluation: i32) -> Self {
        self.reply(
            fen,
            EngineResult::Success(EngineAnalysis {
                best_move: best_move.to_string(),
                evaluation: Some(evaluation),
                depth: Some(crate::config::DEFAULT_DEPTH),
                mate_in: None,
            }),
        )
    }

    pub fn reply(self, fen: &str, result: EngineResult) -> Self {
        self.script(fen, Script::Reply(result))
    }

    pub fn fail(self, fen: &str, error: WorkerError) -> Self {
        self.script(fen, Script::Fail(error))
    }

    pub fn hang(self, fen: &str) -> Self {
        self.script(fen, Script::Hang)
    }

    fn script(self, fen: &str, script: Script) -> Self {
        self.scripts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(fen.to_string(), script);
        self
    }

    /// FENs received so far, in arrival order.
    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(fen, _)| fen.clone())
            .collect()
    }

    /// Depths received so far, in arrival order.
    pub fn depths(&self) -> Vec<u32> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, depth)| *depth)
            .collect()
    }

    pub fn request_count(&self) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Searches the worker abandoned because their requester went away.
    pub fn cancel_count(&self) -> usize {
        self.cancels.load(Ordering::SeqCst)
    }

    pub fn shutdown_count(&self) -> usize {
        self.shutdowns.load(Ordering::SeqCst)
    }
}

impl Analyzer for ScriptedAnalyzer {
    async fn analyze(&mut self, fen: &str, depth: u32) -> Result<EngineResult, WorkerError> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((fen.to_string(), depth));

        let script = self
            .scripts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(fen)
            .cloned();

        match script {
            Some(Script::Reply(result)) => Ok(result),
            Some(Script::Fail(error)) => Err(error),
            Some(Script::Hang) => std::future::pending().await,
            None => Ok(EngineResult::failure("unscripted position")),
        }
    }

    async fn cancel(&mut self) {
        self.cancels.fetch_add(1, Ordering::SeqCst);
    }

    async fn shutdown(&mut self) {
        self.shutdowns.fetch_add(1, Ordering::SeqCst);
    }
}
