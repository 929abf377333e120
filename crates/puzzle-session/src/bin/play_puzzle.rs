//! Play a Lichess puzzle in the terminal.
//!
//! Usage: play-puzzle <puzzle.json>
//!
//! Commands: a UCI move (e.g. e2e4), hint, solution, next, analyze,
//! line <uci>, back, quit.

use std::time::Duration;

use anyhow::Context;
use chess_core::LichessPuzzle;
use engine_worker::{EngineConfig, StockfishEngine};
use puzzle_session::{
    EngineClient, LogReporter, MoveKind, PuzzleSession, SessionConfig, SessionPhase, SystemClock,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const TICK_INTERVAL: Duration = Duration::from_millis(100);

async fn connect_engine() -> EngineClient {
    let config = match EngineConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            warn!(error = %e, "Engine config invalid, analysis disabled");
            return EngineClient::uninitialized();
        }
    };
    match StockfishEngine::new(&config).await {
        Ok(engine) => EngineClient::initialize(engine, &config),
        Err(e) => {
            warn!(path = %config.stockfish_path, error = %e, "Stockfish unavailable, analysis disabled");
            EngineClient::uninitialized()
        }
    }
}

fn print_status(session: &PuzzleSession) {
    let grade = session.grade();
    println!(
        "[{}] grade {} | {:.1}s | wrong {} | {}",
        session.phase(),
        grade.grade,
        grade.elapsed_ms as f64 / 1000.0,
        grade.wrong_count,
        session.current_fen()
    );
}

/// Play opponent replies right away; there is no animation to wait for.
fn finish_animation(session: &mut PuzzleSession) {
    while session.phase() == SessionPhase::AnimEngine {
        match session.animation_complete() {
            Some(reply) => println!("Opponent plays {}", reply.san),
            None => break,
        }
    }
}

async fn handle(session: &mut PuzzleSession, line: &str) -> bool {
    let mut parts = line.split_whitespace();
    match (parts.next(), parts.next()) {
        (None, _) => {}
        (Some("quit"), _) => return false,
        (Some("hint"), _) => {
            session.request_hint();
            match session.hint_square() {
                Some(square) => println!("Move the piece on {square}"),
                None => println!("No hint available"),
            }
        }
        (Some("solution"), _) => {
            if session.show_solution() {
                println!("Solution: {}", session.attempt().solution_moves().join(" "));
            } else {
                println!("Finish the puzzle first");
            }
        }
        (Some("next"), _) => match session.next_solution_move() {
            Some(mv) => println!("{} ({:?})", mv.san, mv.by),
            None => println!("End of solution"),
        },
        (Some("analyze"), _) => match session.analyze().await {
            Ok(result) => match (result.best_move(), result.error()) {
                (Some(best), _) => println!("Engine suggests {best}"),
                (None, Some(error)) => println!("Analysis unavailable: {error}"),
                (None, None) => println!("Analysis unavailable"),
            },
            Err(e) => println!("Analysis failed: {e}"),
        },
        (Some("line"), Some(uci)) => match session.play_analysis_move(uci) {
            Ok(san) => println!("{san}"),
            Err(e) => println!("{e}"),
        },
        (Some("back"), _) => {
            session.leave_analysis();
        }
        (Some(uci), _) => {
            let result = session.submit_move(uci);
            println!("{}", result.message);
            if result.kind == Some(MoveKind::Correct) {
                finish_animation(session);
            }
        }
    }
    print_status(session);
    true
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env first so RUST_LOG from it reaches the filter
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let path = std::env::args()
        .nth(1)
        .context("usage: play-puzzle <puzzle.json>")?;
    let raw = std::fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;
    let puzzle: LichessPuzzle = serde_json::from_str(&raw).context("parsing puzzle JSON")?;
    let setup = puzzle.to_setup()?;

    let config = SessionConfig::from_env();
    let engine = connect_engine().await;
    let mut session = PuzzleSession::new(&setup, config, SystemClock::default())?
        .with_engine(engine)
        .with_reporter(LogReporter);

    info!(puzzle_id = %setup.id, rating = ?setup.rating, "Your move");
    print_status(&session);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut ticker = tokio::time::interval(TICK_INTERVAL);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if !handle(&mut session, line.trim()).await {
                    break;
                }
            }
            _ = ticker.tick() => {
                let before = session.phase();
                if let Some(grade) = session.tick() {
                    println!("Grade now {grade}");
                }
                if before != session.phase() {
                    println!("Time up!");
                    print_status(&session);
                }
            }
        }
    }

    session.shutdown();
    Ok(())
}
