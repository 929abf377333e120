//! Stockfish engine wrapper using UCI protocol (async I/O)

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};

use tracing::{debug, warn};

use crate::analyzer::Analyzer;
use crate::config::EngineConfig;
use crate::error::WorkerError;
use crate::protocol::{EngineAnalysis, EngineResult};

/// Result of a single position evaluation
#[derive(Debug, Clone, Default)]
pub struct EvalResult {
    /// Centipawn score (from engine's perspective, i.e., side to move)
    pub cp: Option<i32>,
    /// Mate in N moves (positive = engine wins, negative = engine loses)
    pub mate: Option<i32>,
    /// Deepest completed iteration reported before `bestmove`
    pub depth: Option<u32>,
    /// Best move in UCI notation, `None` when the side to move has no moves
    pub best_move: Option<String>,
}

/// Stockfish engine instance
pub struct StockfishEngine {
    process: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    /// A `go` was sent and its `bestmove` not read yet
    searching: bool,
}

impl StockfishEngine {
    /// Spawn a new Stockfish process and initialize UCI
    pub async fn new(config: &EngineConfig) -> Result<Self, WorkerError> {
        let mut process = Command::new(&config.stockfish_path)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| WorkerError::Stockfish(format!("Failed to spawn Stockfish: {e}")))?;

        let stdin = process
            .stdin
            .take()
            .ok_or_else(|| WorkerError::Stockfish("Stockfish stdin unavailable".into()))?;
        let stdout = BufReader::new(
            process
                .stdout
                .take()
                .ok_or_else(|| WorkerError::Stockfish("Stockfish stdout unavailable".into()))?,
        );

        let mut engine = Self {
            process,
            stdin,
            stdout,
            searching: false,
        };

        // Initialize UCI
        engine.send("uci").await?;
        engine.wait_for("uciok").await?;

        engine
            .send(&format!("setoption name Threads value {}", config.threads))
            .await?;
        engine
            .send(&format!("setoption name Hash value {}", config.hash_mb))
            .await?;
        engine.send("isready").await?;
        engine.wait_for("readyok").await?;

        Ok(engine)
    }

    /// Send a command to Stockfish
    async fn send(&mut self, cmd: &str) -> Result<(), WorkerError> {
        debug!(cmd, "SF <");
        self.stdin
            .write_all(format!("{cmd}\n").as_bytes())
            .await
            .map_err(|e| WorkerError::Stockfish(format!("Failed to write to Stockfish: {e}")))?;
        self.stdin
            .flush()
            .await
            .map_err(|e| WorkerError::Stockfish(format!("Failed to flush stdin: {e}")))?;
        Ok(())
    }

    /// Read one trimmed line; EOF means the process died.
    async fn read_line(&mut self, line: &mut String) -> Result<(), WorkerError> {
        line.clear();
        let n = self
            .stdout
            .read_line(line)
            .await
            .map_err(|e| WorkerError::Stockfish(format!("Failed to read from Stockfish: {e}")))?;
        if n == 0 {
            return Err(WorkerError::Stockfish("Stockfish closed its output".into()));
        }
        Ok(())
    }

    /// Wait for a specific response line
    async fn wait_for(&mut self, expected: &str) -> Result<(), WorkerError> {
        let mut line = String::new();
        loop {
            self.read_line(&mut line).await?;
            let trimmed = line.trim();
            debug!(line = trimmed, "SF >");
            if trimmed == expected {
                return Ok(());
            }
        }
    }

    /// Search a position to a fixed depth and report the best move with score
    pub async fn evaluate(&mut self, fen: &str, depth: u32) -> Result<EvalResult, WorkerError> {
        // A search abandoned mid-read still owes us its bestmove line
        self.stop().await?;

        self.send(&format!("position fen {fen}")).await?;
        self.searching = true;
        self.send(&format!("go depth {depth}")).await?;

        let mut result = EvalResult::default();

        let mut line = String::new();
        loop {
            self.read_line(&mut line).await?;
            let trimmed = line.trim();

            if trimmed.starts_with("info") && trimmed.contains(" pv ") {
                if let Some(d) = parse_depth(trimmed) {
                    result.depth = Some(d);
                }
                if let Some(cp) = parse_cp(trimmed) {
                    result.cp = Some(cp);
                    result.mate = None;
                }
                if let Some(mate) = parse_mate(trimmed) {
                    result.mate = Some(mate);
                    result.cp = None;
                }
            } else if trimmed.starts_with("bestmove") {
                self.searching = false;
                result.best_move = parse_bestmove(trimmed);
                break;
            }
        }

        debug!(fen, best_move = ?result.best_move, cp = ?result.cp, mate = ?result.mate, "SF eval");
        Ok(result)
    }

    /// Abort the search in progress and discard its output up to `bestmove`.
    pub async fn stop(&mut self) -> Result<(), WorkerError> {
        if !self.searching {
            return Ok(());
        }
        self.send("stop").await?;
        let mut line = String::new();
        while self.searching {
            self.read_line(&mut line).await?;
            if line.trim_start().starts_with("bestmove") {
                self.searching = false;
            }
        }
        debug!("SF search stopped");
        Ok(())
    }

    /// Send quit command and wait for process to exit
    pub async fn quit(&mut self) {
        let _ = self.send("quit").await;
        let _ = self.process.wait().await;
    }
}

impl Drop for StockfishEngine {
    fn drop(&mut self) {
        // Best-effort synchronous kill in drop
        let _ = self.process.start_kill();
    }
}

impl Analyzer for StockfishEngine {
    async fn analyze(&mut self, fen: &str, depth: u32) -> Result<EngineResult, WorkerError> {
        let eval = self.evaluate(fen, depth).await?;
        Ok(match eval.best_move {
            Some(best_move) => EngineResult::Success(EngineAnalysis {
                best_move,
                evaluation: eval.cp,
                depth: eval.depth,
                mate_in: eval.mate,
            }),
            None => EngineResult::failure("no legal moves"),
        })
    }

    async fn cancel(&mut self) {
        if let Err(e) = self.stop().await {
            warn!(error = %e, "Failed to stop Stockfish search");
        }
    }

    async fn shutdown(&mut self) {
        self.quit().await;
    }
}

/// Value following `key` in a whitespace-separated info line
fn parse_field<T: std::str::FromStr>(line: &str, key: &str) -> Option<T> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    for (i, part) in parts.iter().enumerate() {
        if *part == key && i + 1 < parts.len() {
            return parts[i + 1].parse().ok();
        }
    }
    None
}

/// Parse centipawn score from info line
fn parse_cp(line: &str) -> Option<i32> {
    parse_field(line, "cp")
}

/// Parse mate score from info line
fn parse_mate(line: &str) -> Option<i32> {
    parse_field(line, "mate")
}

/// Parse search depth from info line
fn parse_depth(line: &str) -> Option<u32> {
    parse_field(line, "depth")
}

/// Parse the move from a `bestmove` line; `(none)` means no legal move
fn parse_bestmove(line: &str) -> Option<String> {
    line.split_whitespace()
        .nth(1)
        .filter(|mv| *mv != "(none)")
        .map(String::from)
}
