//! The background worker task.
//!
//! Requests are queued on an unbounded channel and served strictly in arrival
//! order by one task that owns the analyzer. Each request carries its own
//! one-shot reply channel, so no message ids are needed.

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::analyzer::Analyzer;
use crate::error::WorkerError;
use crate::protocol::{EngineRequest, EngineResult};

/// Receives the worker's answer to one request.
pub type ReplyReceiver = oneshot::Receiver<Result<EngineResult, WorkerError>>;

struct Job {
    request: EngineRequest,
    reply: oneshot::Sender<Result<EngineResult, WorkerError>>,
}

/// Handle to a running worker task. Dropping it terminates the worker.
pub struct EngineWorker {
    tx: Option<mpsc::UnboundedSender<Job>>,
    task: Option<JoinHandle<()>>,
}

impl EngineWorker {
    /// Start a worker that searches every request to `depth`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<A: Analyzer>(mut analyzer: A, depth: u32) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<Job>();

        let task = tokio::spawn(async move {
            debug!(depth, "Engine worker started");
            while let Some(mut job) = rx.recv().await {
                if job.reply.is_closed() {
                    debug!(fen = %job.request.fen, "Skipping abandoned request");
                    continue;
                }
                // Stop searching as soon as the requester gives up
                let answer = tokio::select! {
                    result = analyzer.analyze(&job.request.fen, depth) => Some(result),
                    _ = job.reply.closed() => None,
                };
                let Some(result) = answer else {
                    debug!(fen = %job.request.fen, "Request abandoned mid-search");
                    analyzer.cancel().await;
                    continue;
                };
                if let Err(e) = &result {
                    warn!(fen = %job.request.fen, error = %e, "Engine request failed");
                }
                let _ = job.reply.send(result);
            }
            analyzer.shutdown().await;
            debug!("Engine worker stopped");
        });

        Self {
            tx: Some(tx),
            task: Some(task),
        }
    }

    pub fn is_running(&self) -> bool {
        self.tx.as_ref().is_some_and(|tx| !tx.is_closed())
    }

    /// Queue a request and return the channel its answer arrives on.
    pub fn post(&self, request: EngineRequest) -> Result<ReplyReceiver, WorkerError> {
        let tx = self.tx.as_ref().ok_or(WorkerError::Disconnected)?;
        let (reply, rx) = oneshot::channel();
        tx.send(Job { request, reply })
            .map_err(|_| WorkerError::Disconnected)?;
        Ok(rx)
    }

    /// Stop accepting requests and kill the task. Safe to call repeatedly.
    ///
    /// Queued and in-flight requests see their reply channel close.
    pub fn terminate(&mut self) {
        self.tx.take();
        if let Some(task) = self.task.take() {
            task.abort();
            debug!("Engine worker terminated");
        }
    }

    /// Close the queue and let the worker finish what it has, then shut the
    /// analyzer down cleanly.
    pub async fn join(mut self) {
        self.tx.take();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for EngineWorker {
    fn drop(&mut self) {
        self.terminate();
    }
}
