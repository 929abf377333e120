//! Engine configuration from environment variables

use std::env;
use std::time::Duration;

use crate::error::WorkerError;

/// Search depth used for every request when nothing else is configured.
pub const DEFAULT_DEPTH: u32 = 15;

#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Path to Stockfish binary
    pub stockfish_path: String,

    /// Fixed search depth for every analysis request
    pub depth: u32,

    /// Engine threads (UCI `Threads` option)
    pub threads: u32,

    /// Transposition table size in MB (UCI `Hash` option)
    pub hash_mb: u32,

    /// Requests still unanswered after this long resolve as a "timeout" failure
    pub analysis_timeout: Option<Duration>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            stockfish_path: "/usr/local/bin/stockfish".to_string(),
            depth: DEFAULT_DEPTH,
            threads: 1,
            hash_mb: 256,
            analysis_timeout: Some(Duration::from_secs(10)),
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, WorkerError> {
        let defaults = Self::default();

        let stockfish_path = env::var("STOCKFISH_PATH").unwrap_or(defaults.stockfish_path);

        let depth = env::var("ENGINE_DEPTH")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.depth);
        if depth == 0 {
            return Err(WorkerError::Config("ENGINE_DEPTH must be at least 1"));
        }

        let threads = env::var("ENGINE_THREADS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.threads);

        let hash_mb = env::var("ENGINE_HASH_MB")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.hash_mb);

        // 0 disables the timeout
        let analysis_timeout = match env::var("ENGINE_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
        {
            Some(0) => None,
            Some(ms) => Some(Duration::from_millis(ms)),
            None => defaults.analysis_timeout,
        };

        Ok(Self {
            stockfish_path,
            depth,
            threads,
            hash_mb,
            analysis_timeout,
        })
    }
}
