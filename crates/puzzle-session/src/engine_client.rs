//! Best-move analysis without blocking the session.
//!
//! The client owns one background worker for its whole lifetime. Requests are
//! coalesced per FEN: while a position is being analyzed, every caller asking
//! about it gets a clone of the same pending future, and only one message
//! reaches the worker. The entry is evicted as soon as the answer arrives, so
//! a later request searches again.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};
use std::time::Duration;

use chess_core::PuzzlePosition;
use engine_worker::{Analyzer, EngineConfig, EngineRequest, EngineResult, EngineWorker, ReplyReceiver};
use futures::future::{self, BoxFuture, FutureExt, Shared};
use tracing::{debug, info, warn};

use crate::error::EngineError;

pub const NOT_INITIALIZED: &str = "not initialized";
pub const TIMEOUT: &str = "timeout";

type SharedAnalysis = Shared<BoxFuture<'static, Result<EngineResult, EngineError>>>;

/// An analysis in flight. Clones observe the same eventual result.
#[derive(Clone)]
pub struct PendingAnalysis {
    fen: PuzzlePosition,
    inner: SharedAnalysis,
}

impl PendingAnalysis {
    fn ready(fen: PuzzlePosition, result: EngineResult) -> Self {
        Self {
            fen,
            inner: future::ready(Ok(result)).boxed().shared(),
        }
    }

    pub fn fen(&self) -> &PuzzlePosition {
        &self.fen
    }

    /// Whether both handles wait on the same worker request.
    pub fn same_request(&self, other: &PendingAnalysis) -> bool {
        self.inner.ptr_eq(&other.inner)
    }
}

impl fmt::Debug for PendingAnalysis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingAnalysis")
            .field("fen", &self.fen)
            .finish_non_exhaustive()
    }
}

impl Future for PendingAnalysis {
    type Output = Result<EngineResult, EngineError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.inner.poll_unpin(cx)
    }
}

struct Entry {
    id: u64,
    analysis: PendingAnalysis,
}

type PendingMap = Arc<Mutex<HashMap<PuzzlePosition, Entry>>>;

fn lock(map: &PendingMap) -> MutexGuard<'_, HashMap<PuzzlePosition, Entry>> {
    map.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Engine access for one puzzle session.
pub struct EngineClient {
    worker: Option<EngineWorker>,
    pending: PendingMap,
    next_id: AtomicU64,
    timeout: Option<Duration>,
}

impl EngineClient {
    /// Spawn the session's worker. Must be called from within a tokio runtime.
    pub fn initialize<A: Analyzer>(analyzer: A, config: &EngineConfig) -> Self {
        let worker = EngineWorker::spawn(analyzer, config.depth);
        info!(
            depth = config.depth,
            timeout_ms = config.analysis_timeout.map(|t| t.as_millis() as u64),
            "Engine client initialized"
        );
        Self {
            worker: Some(worker),
            pending: PendingMap::default(),
            next_id: AtomicU64::new(0),
            timeout: config.analysis_timeout,
        }
    }

    /// A client without a worker; every request answers "not initialized".
    pub fn uninitialized() -> Self {
        Self {
            worker: None,
            pending: PendingMap::default(),
            next_id: AtomicU64::new(0),
            timeout: None,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.worker.as_ref().is_some_and(EngineWorker::is_running)
    }

    /// Number of positions currently being analyzed.
    pub fn pending_count(&self) -> usize {
        lock(&self.pending).len()
    }

    /// Ask for the best move in `fen`.
    ///
    /// Without a running worker this resolves immediately to a
    /// `"not initialized"` failure instead of an error.
    pub fn get_best_move(&self, fen: impl Into<PuzzlePosition>) -> PendingAnalysis {
        let fen = fen.into();
        let Some(worker) = self.worker.as_ref() else {
            return PendingAnalysis::ready(fen, EngineResult::failure(NOT_INITIALIZED));
        };

        let mut pending = lock(&self.pending);
        if let Some(entry) = pending.get(&fen) {
            debug!(%fen, "Joining in-flight analysis");
            return entry.analysis.clone();
        }

        let reply = match worker.post(EngineRequest::new(fen.as_str())) {
            Ok(reply) => reply,
            Err(e) => {
                warn!(%fen, error = %e, "Engine worker unavailable");
                return PendingAnalysis::ready(fen, EngineResult::failure(NOT_INITIALIZED));
            }
        };

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let map = Arc::clone(&self.pending);
        let key = fen.clone();
        let timeout = self.timeout;
        let inner = async move {
            let result = await_reply(reply, timeout).await;
            let mut pending = lock(&map);
            // Only evict our own entry
            if pending.get(&key).is_some_and(|entry| entry.id == id) {
                pending.remove(&key);
            }
            result
        }
        .boxed()
        .shared();

        let analysis = PendingAnalysis {
            fen: fen.clone(),
            inner,
        };
        debug!(%fen, id, "Analysis requested");
        pending.insert(
            fen,
            Entry {
                id,
                analysis: analysis.clone(),
            },
        );
        drop(pending);

        // Drive the request even if no caller polls it, so the entry is evicted
        tokio::spawn(analysis.clone().map(|_| ()));
        analysis
    }

    /// Terminate the worker and forget pending requests. Safe to call repeatedly.
    ///
    /// Requests still in flight resolve to `EngineError::Disconnected`.
    pub fn shutdown(&mut self) {
        if let Some(mut worker) = self.worker.take() {
            worker.terminate();
            info!("Engine client shut down");
        }
        lock(&self.pending).clear();
    }
}

impl Drop for EngineClient {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn await_reply(
    reply: ReplyReceiver,
    timeout: Option<Duration>,
) -> Result<EngineResult, EngineError> {
    let received = match timeout {
        Some(limit) => match tokio::time::timeout(limit, reply).await {
            Ok(received) => received,
            Err(_) => {
                warn!(timeout_ms = limit.as_millis() as u64, "Engine request timed out");
                return Ok(EngineResult::failure(TIMEOUT));
            }
        },
        None => reply.await,
    };

    match received {
        Ok(Ok(result)) => Ok(result),
        Ok(Err(e)) => Err(EngineError::Worker(e.to_string())),
        Err(_) => Err(EngineError::Disconnected),
    }
}
