//! The puzzle session controller.
//!
//! A `PuzzleSession` owns one attempt at a time and is the only writer of its
//! state. Correctness is always judged against the puzzle's curated solution
//! line; the engine is consulted only in `ANALYSIS`, after the attempt has been
//! decided. Animation delays are phases the rendering layer ends explicitly
//! with `animation_complete()`, so nothing in here waits on a timer.

use chess_core::{PuzzleBoard, PuzzlePosition, PuzzleSetup};
use engine_worker::EngineResult;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::attempt::{Mover, PuzzleAttempt, PuzzleMove};
use crate::clock::{Clock, SystemClock};
use crate::config::{SessionConfig, WrongMovePolicy};
use crate::engine_client::{EngineClient, PendingAnalysis};
use crate::error::{EngineError, SessionError};
use crate::grader::{Grade, GradeState, LiveGrader};
use crate::outcome::{AttemptOutcome, OutcomeKind, OutcomeReporter};
use crate::phase::{PhaseEvent, SessionPhase};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveKind {
    Correct,
    Wrong,
}

/// Answer to `submit_move`. `kind` is `None` when the move was not considered
/// at all (wrong phase, malformed or illegal input) and nothing changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoveResult {
    #[serde(rename = "type")]
    pub kind: Option<MoveKind>,
    pub message: String,
}

impl MoveResult {
    fn correct(message: impl Into<String>) -> Self {
        Self {
            kind: Some(MoveKind::Correct),
            message: message.into(),
        }
    }

    fn wrong(message: impl Into<String>) -> Self {
        Self {
            kind: Some(MoveKind::Wrong),
            message: message.into(),
        }
    }

    fn ignored(message: impl Into<String>) -> Self {
        Self {
            kind: None,
            message: message.into(),
        }
    }

    pub fn is_ignored(&self) -> bool {
        self.kind.is_none()
    }
}

/// Read-only replay of the solution from the start position.
struct Playback {
    board: PuzzleBoard,
    cursor: usize,
}

/// Engine exploration entered from a decided attempt.
struct AnalysisView {
    return_to: SessionPhase,
    board: PuzzleBoard,
    line: Vec<String>,
}

pub struct PuzzleSession<C: Clock = SystemClock> {
    config: SessionConfig,
    attempt: PuzzleAttempt,
    start_board: PuzzleBoard,
    board: PuzzleBoard,
    phase: SessionPhase,
    grader: LiveGrader<C>,
    engine: EngineClient,
    reporter: Option<Box<dyn OutcomeReporter>>,
    outcome: Option<AttemptOutcome>,
    playback: Option<Playback>,
    analysis: Option<AnalysisView>,
    last_analysis: Option<EngineResult>,
}

impl<C: Clock> PuzzleSession<C> {
    /// Load `setup` and start grading. The whole solution line is checked up
    /// front so a bad puzzle never produces a half-playable session.
    pub fn new(setup: &PuzzleSetup, config: SessionConfig, clock: C) -> Result<Self, SessionError> {
        let start_board = setup.validate()?;
        let mut grader =
            LiveGrader::new(clock, config.base_time).with_penalty(config.penalty_per_wrong);
        grader.start();

        info!(
            puzzle_id = %setup.id,
            plies = setup.solution.len(),
            mode = ?config.mode,
            "Puzzle loaded"
        );

        Ok(Self {
            attempt: PuzzleAttempt::new(setup),
            board: start_board.clone(),
            start_board,
            phase: SessionPhase::WaitUser,
            grader,
            engine: EngineClient::uninitialized(),
            reporter: None,
            outcome: None,
            playback: None,
            analysis: None,
            last_analysis: None,
            config,
        })
    }

    pub fn with_engine(mut self, engine: EngineClient) -> Self {
        self.engine = engine;
        self
    }

    pub fn with_reporter(mut self, reporter: impl OutcomeReporter + 'static) -> Self {
        self.reporter = Some(Box::new(reporter));
        self
    }

    pub fn on_grade_change(&mut self, listener: impl FnMut(Grade) + Send + 'static) {
        self.grader.on_grade_change(listener);
    }

    /// Replace the current attempt with a new puzzle. The engine worker is kept.
    pub fn load_puzzle(&mut self, setup: &PuzzleSetup) -> Result<(), SessionError> {
        let config = self.config.clone();
        self.load_puzzle_with_config(setup, config)
    }

    pub fn load_puzzle_with_config(
        &mut self,
        setup: &PuzzleSetup,
        config: SessionConfig,
    ) -> Result<(), SessionError> {
        let start_board = setup.validate()?;

        self.grader.set_base_time(config.base_time);
        self.grader.set_penalty(config.penalty_per_wrong);
        self.config = config;
        self.attempt = PuzzleAttempt::new(setup);
        self.board = start_board.clone();
        self.start_board = start_board;
        self.outcome = None;
        self.playback = None;
        self.analysis = None;
        self.last_analysis = None;
        self.apply(PhaseEvent::Reset);
        self.grader.start();

        info!(
            puzzle_id = %setup.id,
            plies = setup.solution.len(),
            mode = ?self.config.mode,
            "Puzzle loaded"
        );
        Ok(())
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn grade(&self) -> GradeState {
        self.grader.state()
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.grader.elapsed_ms()
    }

    pub fn attempt(&self) -> &PuzzleAttempt {
        &self.attempt
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Position on the attempt board (wrong moves are never played on it).
    pub fn current_fen(&self) -> PuzzlePosition {
        self.board.fen()
    }

    /// Set once the attempt is decided.
    pub fn outcome(&self) -> Option<&AttemptOutcome> {
        self.outcome.as_ref()
    }

    pub fn last_analysis(&self) -> Option<&EngineResult> {
        self.last_analysis.as_ref()
    }

    pub fn engine(&self) -> &EngineClient {
        &self.engine
    }

    /// Judge the solver's move against the solution.
    pub fn submit_move(&mut self, uci: &str) -> MoveResult {
        if self.phase != SessionPhase::WaitUser {
            debug!(phase = %self.phase, uci, "Move ignored");
            return MoveResult::ignored(format!("not accepting moves during {}", self.phase));
        }
        if self.expire_if_over() {
            return MoveResult::ignored("time up");
        }

        let mv = match self.board.parse_move(uci) {
            Ok(mv) => mv,
            Err(e) => {
                debug!(uci, error = %e, "Move rejected");
                return MoveResult::ignored(e.to_string());
            }
        };
        let Some(expected) = self.attempt.expected_move() else {
            return MoveResult::ignored("solution already complete");
        };
        let expected = match self.board.parse_move(expected) {
            Ok(expected) => expected,
            Err(e) => {
                warn!(puzzle_id = self.attempt.puzzle_id(), error = %e, "Solution move unplayable");
                return MoveResult::ignored(e.to_string());
            }
        };

        let uci = self.board.uci(&mv);
        let san = self.board.san(&mv);

        if mv == expected {
            self.board.play(&mv);
            self.attempt.record_correct(Mover::Solver, uci, san);
            let solved = self.attempt.is_exhausted();
            self.apply(PhaseEvent::CorrectMove { solved });
            if solved {
                MoveResult::correct("Puzzle solved!")
            } else {
                MoveResult::correct("Correct!")
            }
        } else {
            self.attempt.record_wrong(uci, san);
            self.grader.record_wrong();
            let fatal = self.config.wrong_move_policy == WrongMovePolicy::FailOnFirst;
            self.apply(PhaseEvent::WrongMove { fatal });
            if fatal {
                MoveResult::wrong("Wrong move. Puzzle failed.")
            } else {
                MoveResult::wrong("Wrong move. Try again.")
            }
        }
    }

    /// Finish the opponent's scripted reply and hand the turn back.
    pub fn animation_complete(&mut self) -> Option<PuzzleMove> {
        if self.phase != SessionPhase::AnimEngine {
            return None;
        }
        let expected = self.attempt.expected_move()?.to_string();
        let mv = match self.board.parse_move(&expected) {
            Ok(mv) => mv,
            Err(e) => {
                warn!(puzzle_id = self.attempt.puzzle_id(), error = %e, "Solution move unplayable");
                return None;
            }
        };

        let uci = self.board.uci(&mv);
        let san = self.board.san(&mv);
        self.board.play(&mv);
        self.attempt.record_correct(Mover::Opponent, uci, san);
        let solved = self.attempt.is_exhausted();
        self.apply(PhaseEvent::AnimationComplete { solved });
        self.attempt.move_history().last().cloned()
    }

    /// Show where the next solution move starts. Leaves progress untouched.
    pub fn request_hint(&mut self) {
        self.attempt.show_hint();
    }

    /// Origin square of the expected move while a hint is showing.
    pub fn hint_square(&self) -> Option<&str> {
        if !self.attempt.showing_hint() || self.phase != SessionPhase::WaitUser {
            return None;
        }
        self.attempt.expected_move().and_then(|mv| mv.get(0..2))
    }

    /// Advance the grading loop. Call from the host's timer or frame callback.
    pub fn tick(&mut self) -> Option<Grade> {
        if !self.phase.is_gradable() {
            return None;
        }
        if self.expire_if_over() {
            return None;
        }
        self.grader.tick()
    }

    /// Fail the attempt if its time limit has been reached.
    fn expire_if_over(&mut self) -> bool {
        let Some(limit) = self.config.time_limit else {
            return false;
        };
        if self.grader.elapsed_ms() < limit.as_millis() as u64 {
            return false;
        }
        info!(puzzle_id = self.attempt.puzzle_id(), "Time up");
        self.apply(PhaseEvent::TimeExpired);
        true
    }

    /// Start replaying the solution. Only available once the attempt is decided.
    pub fn show_solution(&mut self) -> bool {
        self.apply(PhaseEvent::ShowSolution);
        if self.phase != SessionPhase::Solution {
            return false;
        }
        self.playback = Some(Playback {
            board: self.start_board.clone(),
            cursor: 0,
        });
        true
    }

    /// Next move of the solution replay, or `None` once it is finished.
    pub fn next_solution_move(&mut self) -> Option<PuzzleMove> {
        if self.phase != SessionPhase::Solution {
            return None;
        }
        let playback = self.playback.as_mut()?;
        let uci = self.attempt.solution_moves().get(playback.cursor)?;
        let mv = playback.board.parse_move(uci).ok()?;
        let san = playback.board.san(&mv);
        playback.board.play(&mv);

        let by = if playback.cursor % 2 == 0 {
            Mover::Solver
        } else {
            Mover::Opponent
        };
        playback.cursor += 1;
        Some(PuzzleMove {
            uci: uci.clone(),
            san,
            by,
            correct: true,
        })
    }

    pub fn solution_position(&self) -> Option<PuzzlePosition> {
        self.playback.as_ref().map(|p| p.board.fen())
    }

    /// Switch to engine exploration of the current position.
    pub fn enter_analysis(&mut self) -> bool {
        let from = self.phase;
        self.apply(PhaseEvent::EnterAnalysis);
        if self.phase != SessionPhase::Analysis {
            return false;
        }
        if from == SessionPhase::Analysis {
            return true;
        }
        let board = match (&self.playback, from) {
            (Some(playback), SessionPhase::Solution) => playback.board.clone(),
            _ => self.board.clone(),
        };
        self.analysis = Some(AnalysisView {
            return_to: from,
            board,
            line: Vec::new(),
        });
        true
    }

    pub fn analysis_fen(&self) -> Option<PuzzlePosition> {
        self.analysis.as_ref().map(|a| a.board.fen())
    }

    /// Moves played on the analysis board so far.
    pub fn analysis_line(&self) -> &[String] {
        self.analysis
            .as_ref()
            .map(|a| a.line.as_slice())
            .unwrap_or(&[])
    }

    /// Start an engine request for the analysis position without waiting.
    pub fn request_analysis(&self) -> Option<PendingAnalysis> {
        if self.phase != SessionPhase::Analysis {
            return None;
        }
        let fen = self.analysis_fen()?;
        Some(self.engine.get_best_move(fen))
    }

    /// Ask the engine about the analysis position, entering analysis first if
    /// needed. An engine failure comes back as a normal result; the phase stays.
    pub async fn analyze(&mut self) -> Result<EngineResult, EngineError> {
        if !self.enter_analysis() {
            return Ok(EngineResult::failure(format!(
                "analysis unavailable during {}",
                self.phase
            )));
        }
        let Some(pending) = self.request_analysis() else {
            return Ok(EngineResult::failure("analysis unavailable"));
        };

        let result = pending.await;
        match &result {
            Ok(EngineResult::Failure { error }) => {
                warn!(error = %error, "Analysis unavailable; move judging is unaffected");
            }
            Ok(EngineResult::Success(analysis)) => {
                debug!(best_move = %analysis.best_move, eval = ?analysis.evaluation, "Analysis ready");
            }
            Err(e) => warn!(error = %e, "Analysis request failed"),
        }
        if let Ok(answer) = &result {
            self.last_analysis = Some(answer.clone());
        }
        result
    }

    /// Play a move on the analysis board to explore a line. Returns its SAN.
    pub fn play_analysis_move(&mut self, uci: &str) -> Result<String, SessionError> {
        let phase = self.phase;
        let analysis = self
            .analysis
            .as_mut()
            .filter(|_| phase == SessionPhase::Analysis)
            .ok_or(SessionError::WrongPhase(phase))?;
        let mv = analysis.board.parse_move(uci)?;
        let san = analysis.board.san(&mv);
        analysis.line.push(analysis.board.uci(&mv));
        analysis.board.play(&mv);
        Ok(san)
    }

    /// Return to the phase analysis was entered from.
    pub fn leave_analysis(&mut self) -> bool {
        let Some(view) = self.analysis.take() else {
            return false;
        };
        self.apply(PhaseEvent::LeaveAnalysis { to: view.return_to });
        true
    }

    /// Stop grading and release the engine worker.
    pub fn shutdown(&mut self) {
        self.grader.stop();
        self.engine.shutdown();
        debug!(puzzle_id = self.attempt.puzzle_id(), "Session shut down");
    }

    fn apply(&mut self, event: PhaseEvent) {
        let from = self.phase;
        let to = from.transition(event, self.config.mode);
        if from == to {
            return;
        }
        self.phase = to;
        debug!(%from, %to, ?event, "Phase transition");

        if from.is_gradable() && to.is_resolved() {
            self.resolve(to);
        }
    }

    fn resolve(&mut self, phase: SessionPhase) {
        let grade = self.grader.freeze();
        let Some(kind) = OutcomeKind::from_phase(phase) else {
            return;
        };
        let outcome = AttemptOutcome {
            puzzle_id: self.attempt.puzzle_id().to_string(),
            kind,
            grade,
            attempts_used: self.attempt.attempts_used(),
            moves: self.attempt.solver_moves(),
        };
        info!(
            puzzle_id = %outcome.puzzle_id,
            phase = %phase,
            grade = %grade.grade,
            elapsed_ms = grade.elapsed_ms,
            attempts = outcome.attempts_used,
            "Attempt resolved"
        );
        if let Some(reporter) = self.reporter.as_mut() {
            reporter.report(&outcome);
        }
        self.outcome = Some(outcome);
    }
}
