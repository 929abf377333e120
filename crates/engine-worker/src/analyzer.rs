//! The seam between the worker loop and whatever computes best moves.

use std::future::Future;

use crate::error::WorkerError;
use crate::protocol::EngineResult;

/// Something that can search a position to a fixed depth.
///
/// `Ok(EngineResult::Failure { .. })` is an answer the engine gave (no legal
/// moves, unusable position); `Err` means the transport to the engine broke.
pub trait Analyzer: Send + 'static {
    fn analyze(
        &mut self,
        fen: &str,
        depth: u32,
    ) -> impl Future<Output = Result<EngineResult, WorkerError>> + Send;

    /// Abandon the search in progress. Called after the worker drops an
    /// `analyze` future because nobody waits for its answer anymore.
    fn cancel(&mut self) -> impl Future<Output = ()> + Send {
        async {}
    }

    /// Release external resources. Called once when the worker loop ends.
    fn shutdown(&mut self) -> impl Future<Output = ()> + Send {
        async {}
    }
}
