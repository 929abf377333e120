//! Session phases and the transition table between them.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which puzzle flow a session belongs to. Decides the success variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionMode {
    #[default]
    Standard,
    /// Several puzzles under one shared time budget
    TimeAttack,
    /// Promotion test toward the next level
    Promotion,
}

impl SessionMode {
    pub fn success_phase(self) -> SessionPhase {
        match self {
            SessionMode::Standard => SessionPhase::Success,
            SessionMode::TimeAttack => SessionPhase::TaClear,
            SessionMode::Promotion => SessionPhase::PromoSuccess,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionPhase {
    /// Waiting for the solver's move
    WaitUser,
    /// Scripted opponent reply being shown
    AnimEngine,
    Success,
    Fail,
    /// Time-attack clear
    TaClear,
    /// Read-only playback of the solution line
    Solution,
    /// Engine exploration after the attempt
    Analysis,
    PromoSuccess,
}

/// Inputs to the phase machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseEvent {
    CorrectMove { solved: bool },
    WrongMove { fatal: bool },
    AnimationComplete { solved: bool },
    TimeExpired,
    ShowSolution,
    EnterAnalysis,
    LeaveAnalysis { to: SessionPhase },
    Reset,
}

impl SessionPhase {
    /// The attempt has been decided (any success variant or failure).
    pub fn is_resolved(self) -> bool {
        matches!(
            self,
            SessionPhase::Success | SessionPhase::Fail | SessionPhase::TaClear | SessionPhase::PromoSuccess
        )
    }

    pub fn is_success(self) -> bool {
        matches!(
            self,
            SessionPhase::Success | SessionPhase::TaClear | SessionPhase::PromoSuccess
        )
    }

    /// The grader runs only while the attempt is live.
    pub fn is_gradable(self) -> bool {
        matches!(self, SessionPhase::WaitUser | SessionPhase::AnimEngine)
    }

    /// Next phase for `event`. Pairs that do not apply leave the phase as is.
    pub fn transition(self, event: PhaseEvent, mode: SessionMode) -> SessionPhase {
        use PhaseEvent as E;
        use SessionPhase as P;

        match (self, event) {
            (P::WaitUser, E::CorrectMove { solved: true }) => mode.success_phase(),
            (P::WaitUser, E::CorrectMove { solved: false }) => P::AnimEngine,
            (P::WaitUser, E::WrongMove { fatal: true }) => P::Fail,
            (P::WaitUser, E::WrongMove { fatal: false }) => P::WaitUser,
            (P::AnimEngine, E::AnimationComplete { solved: true }) => mode.success_phase(),
            (P::AnimEngine, E::AnimationComplete { solved: false }) => P::WaitUser,
            (P::WaitUser | P::AnimEngine, E::TimeExpired) => P::Fail,
            (p, E::ShowSolution) if p.is_resolved() => P::Solution,
            (p, E::EnterAnalysis) if p.is_resolved() || p == P::Solution => P::Analysis,
            (P::Analysis, E::LeaveAnalysis { to }) if to.is_resolved() || to == P::Solution => to,
            (_, E::Reset) => P::WaitUser,
            (p, _) => p,
        }
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionPhase::WaitUser => "WAIT_USER",
            SessionPhase::AnimEngine => "ANIM_ENGINE",
            SessionPhase::Success => "SUCCESS",
            SessionPhase::Fail => "FAIL",
            SessionPhase::TaClear => "TA_CLEAR",
            SessionPhase::Solution => "SOLUTION",
            SessionPhase::Analysis => "ANALYSIS",
            SessionPhase::PromoSuccess => "PROMO_SUCCESS",
        };
        f.write_str(name)
    }
}
