//! A time-attack run: consecutive puzzles sharing one time budget.

use std::time::Duration;

use tracing::info;

use crate::config::{SessionConfig, WrongMovePolicy};
use crate::outcome::{AttemptOutcome, OutcomeKind};
use crate::phase::SessionMode;

#[derive(Debug, Clone)]
pub struct TimeAttackRun {
    budget_ms: u64,
    spent_ms: u64,
    cleared: Vec<String>,
    failed: Option<String>,
}

impl TimeAttackRun {
    pub fn new(budget: Duration) -> Self {
        Self {
            budget_ms: budget.as_millis() as u64,
            spent_ms: 0,
            cleared: Vec::new(),
            failed: None,
        }
    }

    pub fn remaining(&self) -> Duration {
        Duration::from_millis(self.budget_ms.saturating_sub(self.spent_ms))
    }

    pub fn cleared(&self) -> &[String] {
        &self.cleared
    }

    pub fn failed_puzzle(&self) -> Option<&str> {
        self.failed.as_deref()
    }

    pub fn is_over(&self) -> bool {
        self.failed.is_some() || self.spent_ms >= self.budget_ms
    }

    /// Config for the next puzzle: time-attack mode, limited to what is left.
    pub fn session_config(&self, base: &SessionConfig) -> SessionConfig {
        SessionConfig {
            mode: SessionMode::TimeAttack,
            wrong_move_policy: WrongMovePolicy::FailOnFirst,
            time_limit: Some(self.remaining()),
            ..base.clone()
        }
    }

    /// Charge a finished puzzle against the budget.
    pub fn record(&mut self, outcome: &AttemptOutcome) {
        self.spent_ms = self.spent_ms.saturating_add(outcome.grade.elapsed_ms);
        match outcome.kind {
            OutcomeKind::TimeAttackClear | OutcomeKind::Solved => {
                self.cleared.push(outcome.puzzle_id.clone());
            }
            OutcomeKind::Failed => self.failed = Some(outcome.puzzle_id.clone()),
            OutcomeKind::PromotionPassed => {}
        }
        info!(
            puzzle_id = %outcome.puzzle_id,
            cleared = self.cleared.len(),
            remaining_ms = self.remaining().as_millis() as u64,
            over = self.is_over(),
            "Time attack progress"
        );
    }
}
