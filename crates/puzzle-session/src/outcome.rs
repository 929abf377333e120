//! Final attempt outcomes and where they are sent.
//!
//! Persisting outcomes is the backend's job; the session only hands each
//! decided attempt to an `OutcomeReporter` once.

use serde::Serialize;
use tracing::info;

use crate::grader::GradeState;
use crate::phase::SessionPhase;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    Solved,
    Failed,
    TimeAttackClear,
    PromotionPassed,
}

impl OutcomeKind {
    pub fn from_phase(phase: SessionPhase) -> Option<Self> {
        match phase {
            SessionPhase::Success => Some(OutcomeKind::Solved),
            SessionPhase::Fail => Some(OutcomeKind::Failed),
            SessionPhase::TaClear => Some(OutcomeKind::TimeAttackClear),
            SessionPhase::PromoSuccess => Some(OutcomeKind::PromotionPassed),
            _ => None,
        }
    }

    pub fn is_success(self) -> bool {
        self != OutcomeKind::Failed
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptOutcome {
    pub puzzle_id: String,
    pub kind: OutcomeKind,
    pub grade: GradeState,
    pub attempts_used: u32,
    /// Solver moves in the order they were submitted
    pub moves: Vec<String>,
}

pub trait OutcomeReporter: Send {
    fn report(&mut self, outcome: &AttemptOutcome);
}

impl<F> OutcomeReporter for F
where
    F: FnMut(&AttemptOutcome) + Send,
{
    fn report(&mut self, outcome: &AttemptOutcome) {
        self(outcome)
    }
}

/// Writes outcomes to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl OutcomeReporter for LogReporter {
    fn report(&mut self, outcome: &AttemptOutcome) {
        info!(
            puzzle_id = %outcome.puzzle_id,
            kind = ?outcome.kind,
            grade = %outcome.grade.grade,
            elapsed_ms = outcome.grade.elapsed_ms,
            wrong = outcome.grade.wrong_count,
            attempts = outcome.attempts_used,
            "Puzzle attempt finished"
        );
    }
}
