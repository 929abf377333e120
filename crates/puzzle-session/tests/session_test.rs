//! Integration tests: full puzzle attempts through the session controller.
//!
//! Time comes from a `ManualClock` and analysis from a scripted analyzer, so
//! every grade and engine answer here is deterministic.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chess_core::{LichessPuzzle, PuzzleBoard, PuzzleSetup, STANDARD_START_FEN};
use engine_worker::testing::ScriptedAnalyzer;
use engine_worker::{EngineConfig, EngineResult};
use puzzle_session::engine_client::NOT_INITIALIZED;
use puzzle_session::{
    AttemptOutcome, EngineClient, Grade, ManualClock, MoveKind, Mover, OutcomeKind, PuzzleSession,
    SessionConfig, SessionError, SessionMode, SessionPhase, TimeAttackRun, WrongMovePolicy,
};

const BACK_RANK: &str = "6k1/5ppp/8/8/8/8/5PPP/R5K1 w - - 0 1";

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn opening_puzzle() -> PuzzleSetup {
    PuzzleSetup::new("open1", STANDARD_START_FEN, &["e2e4", "e7e5", "g1f3"])
}

fn back_rank_puzzle() -> PuzzleSetup {
    PuzzleSetup::new("mate1", BACK_RANK, &["a1a8"])
}

fn start(setup: &PuzzleSetup, config: SessionConfig) -> (PuzzleSession<ManualClock>, ManualClock) {
    let clock = ManualClock::new();
    let session = PuzzleSession::new(setup, config, clock.clone()).unwrap();
    (session, clock)
}

/// Reporter that keeps every outcome it is handed.
fn recorder() -> (Arc<Mutex<Vec<AttemptOutcome>>>, impl FnMut(&AttemptOutcome) + Send) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    (seen, move |outcome: &AttemptOutcome| {
        sink.lock().unwrap().push(outcome.clone())
    })
}

fn position_after(fen: &str, moves: &[&str]) -> String {
    let mut board = PuzzleBoard::from_fen(fen).unwrap();
    for uci in moves {
        board.play_uci(uci).unwrap();
    }
    board.fen().to_string()
}

// ---------------------------------------------------------------------------
// Solving
// ---------------------------------------------------------------------------

#[test]
fn test_matching_moves_solve_the_puzzle() {
    let (seen, reporter) = recorder();
    let (session, clock) = start(&opening_puzzle(), SessionConfig::default());
    let mut session = session.with_reporter(reporter);
    assert_eq!(session.phase(), SessionPhase::WaitUser);

    let result = session.submit_move("e2e4");
    assert_eq!(result.kind, Some(MoveKind::Correct));
    assert_eq!(session.phase(), SessionPhase::AnimEngine);

    // Moves are not accepted while the reply animates
    assert!(session.submit_move("g1f3").is_ignored());

    let reply = session.animation_complete().unwrap();
    assert_eq!(reply.uci, "e7e5");
    assert_eq!(reply.by, Mover::Opponent);
    assert_eq!(session.phase(), SessionPhase::WaitUser);

    clock.advance(Duration::from_secs(15));
    let result = session.submit_move("g1f3");
    assert_eq!(result.kind, Some(MoveKind::Correct));
    assert_eq!(session.phase(), SessionPhase::Success);
    assert_eq!(session.attempt().attempts_used(), 0);
    assert_eq!(
        session.current_fen().as_str(),
        position_after(STANDARD_START_FEN, &["e2e4", "e7e5", "g1f3"])
    );

    let outcome = session.outcome().unwrap();
    assert_eq!(outcome.kind, OutcomeKind::Solved);
    assert_eq!(outcome.grade.grade, Grade::A);
    assert_eq!(outcome.moves, vec!["e2e4", "g1f3"]);
    assert_eq!(seen.lock().unwrap().len(), 1);
}

#[test]
fn test_lichess_puzzle_setup_move_is_pre_applied() {
    let json = format!(
        r#"{{"PuzzleId":"lc1","fen":"{STANDARD_START_FEN}","moves":"e2e4 e7e5 g1f3 b8c6","rating":1200}}"#
    );
    let puzzle: LichessPuzzle = serde_json::from_str(&json).unwrap();
    let setup = puzzle.to_setup().unwrap();
    let (mut session, _) = start(&setup, SessionConfig::default());

    assert!(session.submit_move("e2e4").is_ignored());
    assert_eq!(session.submit_move("e7e5").kind, Some(MoveKind::Correct));
    assert_eq!(session.animation_complete().unwrap().uci, "g1f3");
    session.submit_move("b8c6");
    assert_eq!(session.phase(), SessionPhase::Success);
}

#[test]
fn test_grade_is_frozen_once_solved() {
    let (mut session, clock) = start(&back_rank_puzzle(), SessionConfig::default());
    clock.advance(Duration::from_secs(5));
    session.submit_move("a1a8");
    assert_eq!(session.grade().grade, Grade::S);

    clock.advance(Duration::from_secs(600));
    assert_eq!(session.tick(), None);
    assert_eq!(session.grade().grade, Grade::S);
    assert_eq!(session.elapsed_ms(), 5_000);
}

// ---------------------------------------------------------------------------
// Wrong moves
// ---------------------------------------------------------------------------

#[test]
fn test_wrong_move_fails_single_attempt_puzzle() {
    let (seen, reporter) = recorder();
    let (session, _) = start(&opening_puzzle(), SessionConfig::default());
    let mut session = session.with_reporter(reporter);

    let result = session.submit_move("d2d4");
    assert_eq!(result.kind, Some(MoveKind::Wrong));
    assert_eq!(session.phase(), SessionPhase::Fail);
    assert_eq!(session.attempt().attempts_used(), 1);
    assert_eq!(session.grade().wrong_count, 1);

    // The wrong move is recorded but never played
    assert_eq!(session.current_fen().as_str(), STANDARD_START_FEN);
    assert!(!session.attempt().move_history()[0].correct);

    assert!(session.submit_move("e2e4").is_ignored());
    let outcomes = seen.lock().unwrap();
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].kind, OutcomeKind::Failed);
}

#[test]
fn test_retry_policy_adds_penalty_and_continues() {
    let config = SessionConfig {
        wrong_move_policy: WrongMovePolicy::RetryWithPenalty,
        ..SessionConfig::default()
    };
    let (mut session, clock) = start(&opening_puzzle(), config);

    clock.advance(Duration::from_secs(11));
    assert_eq!(session.submit_move("d2d4").kind, Some(MoveKind::Wrong));
    assert_eq!(session.phase(), SessionPhase::WaitUser);
    // 11s elapsed + 2s penalty is past the S threshold of 12s
    assert_eq!(session.tick(), Some(Grade::A));

    session.submit_move("e2e4");
    session.animation_complete();
    session.submit_move("g1f3");
    assert_eq!(session.phase(), SessionPhase::Success);
    assert_eq!(session.attempt().attempts_used(), 1);
    assert_eq!(session.outcome().unwrap().moves, vec!["d2d4", "e2e4", "g1f3"]);
}

#[test]
fn test_reload_applies_new_penalty() {
    let (mut session, _) = start(&back_rank_puzzle(), SessionConfig::default());
    let config = SessionConfig {
        wrong_move_policy: WrongMovePolicy::RetryWithPenalty,
        penalty_per_wrong: Duration::from_secs(20),
        ..SessionConfig::default()
    };
    session.load_puzzle_with_config(&opening_puzzle(), config).unwrap();

    assert_eq!(session.submit_move("d2d4").kind, Some(MoveKind::Wrong));
    // 0s elapsed + 20s penalty lands between the A and B thresholds
    assert_eq!(session.grade().grade, Grade::B);
}

#[test]
fn test_unusable_input_changes_nothing() {
    let (mut session, _) = start(&opening_puzzle(), SessionConfig::default());
    for input in ["", "e2", "e2e9", "e2e5", "e1e2"] {
        let result = session.submit_move(input);
        assert!(result.is_ignored(), "{input} was judged");
    }
    assert_eq!(session.phase(), SessionPhase::WaitUser);
    assert_eq!(session.attempt().attempts_used(), 0);
    assert_eq!(session.attempt().solution_index(), 0);
    assert_eq!(session.grade().wrong_count, 0);
}

// ---------------------------------------------------------------------------
// Hints and time
// ---------------------------------------------------------------------------

#[test]
fn test_hint_is_idempotent() {
    let (mut session, _) = start(&opening_puzzle(), SessionConfig::default());
    session.request_hint();
    session.request_hint();
    assert!(session.attempt().showing_hint());
    assert_eq!(session.hint_square(), Some("e2"));
    assert_eq!(session.attempt().solution_index(), 0);
    assert_eq!(session.phase(), SessionPhase::WaitUser);
}

#[test]
fn test_resolved_phases_ignore_play() {
    let (mut session, _) = start(&back_rank_puzzle(), SessionConfig::default());
    session.submit_move("a1a8");
    assert_eq!(session.phase(), SessionPhase::Success);

    assert!(session.submit_move("g8h8").is_ignored());
    assert!(session.animation_complete().is_none());
    session.request_hint();
    assert_eq!(session.hint_square(), None);
    assert_eq!(session.phase(), SessionPhase::Success);
}

#[test]
fn test_time_limit_ends_attempt_once() {
    let (seen, reporter) = recorder();
    let config = SessionConfig {
        time_limit: Some(Duration::from_secs(10)),
        ..SessionConfig::default()
    };
    let (session, clock) = start(&opening_puzzle(), config);
    let mut session = session.with_reporter(reporter);

    clock.advance(Duration::from_secs(10));
    session.tick();
    session.tick();
    assert_eq!(session.phase(), SessionPhase::Fail);
    assert_eq!(seen.lock().unwrap().len(), 1);
}

#[test]
fn test_move_after_time_limit_is_not_judged() {
    let (seen, reporter) = recorder();
    let config = SessionConfig {
        time_limit: Some(Duration::from_secs(10)),
        ..SessionConfig::default()
    };
    let (session, clock) = start(&back_rank_puzzle(), config);
    let mut session = session.with_reporter(reporter);

    // No tick between the deadline and the move
    clock.advance(Duration::from_secs(10));
    assert!(session.submit_move("a1a8").is_ignored());
    assert_eq!(session.phase(), SessionPhase::Fail);
    assert_eq!(session.attempt().solution_index(), 0);

    session.tick();
    let outcomes = seen.lock().unwrap();
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].kind, OutcomeKind::Failed);
}

// ---------------------------------------------------------------------------
// Modes
// ---------------------------------------------------------------------------

#[test]
fn test_mode_selects_success_phase() {
    for (mode, phase, kind) in [
        (SessionMode::TimeAttack, SessionPhase::TaClear, OutcomeKind::TimeAttackClear),
        (SessionMode::Promotion, SessionPhase::PromoSuccess, OutcomeKind::PromotionPassed),
    ] {
        let config = SessionConfig {
            mode,
            ..SessionConfig::default()
        };
        let (mut session, _) = start(&back_rank_puzzle(), config);
        session.submit_move("a1a8");
        assert_eq!(session.phase(), phase);
        assert_eq!(session.outcome().unwrap().kind, kind);
    }
}

#[test]
fn test_time_attack_run_across_puzzles() {
    let base = SessionConfig::default();
    let mut run = TimeAttackRun::new(Duration::from_secs(30));
    let (mut session, clock) = start(&back_rank_puzzle(), run.session_config(&base));

    clock.advance(Duration::from_secs(8));
    session.submit_move("a1a8");
    assert_eq!(session.phase(), SessionPhase::TaClear);
    run.record(session.outcome().unwrap());
    assert_eq!(run.remaining(), Duration::from_secs(22));

    session
        .load_puzzle_with_config(&opening_puzzle(), run.session_config(&base))
        .unwrap();
    assert_eq!(session.phase(), SessionPhase::WaitUser);
    assert!(session.outcome().is_none());

    clock.advance(Duration::from_secs(22));
    session.tick();
    assert_eq!(session.phase(), SessionPhase::Fail);
    run.record(session.outcome().unwrap());
    assert!(run.is_over());
    assert_eq!(run.cleared(), &["mate1".to_string()]);
    assert_eq!(run.failed_puzzle(), Some("open1"));
}

// ---------------------------------------------------------------------------
// Solution playback
// ---------------------------------------------------------------------------

#[test]
fn test_solution_playback_after_failure() {
    let (mut session, _) = start(&opening_puzzle(), SessionConfig::default());
    assert!(!session.show_solution());

    session.submit_move("a2a3");
    assert!(session.show_solution());
    assert_eq!(session.phase(), SessionPhase::Solution);
    assert!(session.submit_move("e2e4").is_ignored());

    let played: Vec<_> = std::iter::from_fn(|| session.next_solution_move())
        .map(|mv| (mv.san, mv.by))
        .collect();
    assert_eq!(
        played,
        vec![
            ("e4".to_string(), Mover::Solver),
            ("e5".to_string(), Mover::Opponent),
            ("Nf3".to_string(), Mover::Solver),
        ]
    );
    assert_eq!(
        session.solution_position().unwrap().as_str(),
        position_after(STANDARD_START_FEN, &["e2e4", "e7e5", "g1f3"])
    );
}

// ---------------------------------------------------------------------------
// Analysis
// ---------------------------------------------------------------------------

#[test]
fn test_analysis_requires_decided_attempt() {
    let (mut session, _) = start(&opening_puzzle(), SessionConfig::default());
    assert!(!session.enter_analysis());
    assert!(matches!(
        session.play_analysis_move("e2e4"),
        Err(SessionError::WrongPhase(SessionPhase::WaitUser))
    ));
    assert_eq!(session.phase(), SessionPhase::WaitUser);
}

#[tokio::test]
async fn test_analysis_without_engine_reports_not_initialized() {
    let (mut session, _) = start(&back_rank_puzzle(), SessionConfig::default());
    session.submit_move("a1a8");

    let result = session.analyze().await.unwrap();
    assert_eq!(result.error(), Some(NOT_INITIALIZED));
    assert_eq!(session.phase(), SessionPhase::Analysis);
}

#[tokio::test]
async fn test_engine_failure_keeps_analysis_open() {
    let solved = position_after(BACK_RANK, &["a1a8"]);
    let analyzer = ScriptedAnalyzer::new().reply(&solved, EngineResult::failure("timeout"));
    let engine = EngineClient::initialize(analyzer.clone(), &EngineConfig::default());

    let (session, _) = start(&back_rank_puzzle(), SessionConfig::default());
    let mut session = session.with_engine(engine);
    session.submit_move("a1a8");

    let result = session.analyze().await.unwrap();
    assert_eq!(result, EngineResult::failure("timeout"));
    assert_eq!(session.phase(), SessionPhase::Analysis);
    assert_eq!(session.last_analysis(), Some(&result));
    assert_eq!(analyzer.requests(), vec![solved]);
}

#[tokio::test]
async fn test_analysis_line_and_return() {
    let (seen, reporter) = recorder();
    let failed_at = position_after(STANDARD_START_FEN, &[]);
    let after_d4 = position_after(STANDARD_START_FEN, &["d2d4"]);
    let analyzer = ScriptedAnalyzer::new()
        .best_move(&failed_at, "e2e4", 30)
        .best_move(&after_d4, "d7d5", -20);
    let engine = EngineClient::initialize(analyzer.clone(), &EngineConfig::default());

    let (session, _) = start(&opening_puzzle(), SessionConfig::default());
    let mut session = session.with_engine(engine).with_reporter(reporter);
    session.submit_move("d2d4");
    assert_eq!(session.phase(), SessionPhase::Fail);

    assert!(session.enter_analysis());
    let best = session.analyze().await.unwrap();
    assert_eq!(best.best_move(), Some("e2e4"));

    assert_eq!(session.play_analysis_move("d2d4").unwrap(), "d4");
    assert!(session.play_analysis_move("d2d5").is_err());
    assert_eq!(session.analysis_line().to_vec(), vec!["d2d4".to_string()]);
    let reply = session.analyze().await.unwrap();
    assert_eq!(reply.best_move(), Some("d7d5"));

    assert!(session.leave_analysis());
    assert_eq!(session.phase(), SessionPhase::Fail);
    assert_eq!(session.current_fen().as_str(), STANDARD_START_FEN);
    assert_eq!(seen.lock().unwrap().len(), 1);
    assert_eq!(analyzer.request_count(), 2);

    session.shutdown();
    assert!(!session.engine().is_initialized());
}
