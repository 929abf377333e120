//! Session configuration from environment variables

use std::env;
use std::time::Duration;

use tracing::warn;

use crate::grader::DEFAULT_PENALTY_PER_WRONG;
use crate::phase::SessionMode;

/// What a wrong move does to the attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WrongMovePolicy {
    /// The first wrong move fails the puzzle
    #[default]
    FailOnFirst,
    /// Wrong moves cost a time penalty and the solver tries again
    RetryWithPenalty,
}

impl WrongMovePolicy {
    /// Read a `PUZZLE_POLICY` value. Unknown values fail on the first wrong move.
    pub fn from_setting(value: Option<&str>) -> Self {
        match value {
            Some("retry") => Self::RetryWithPenalty,
            Some("fail") | None => Self::FailOnFirst,
            Some(other) => {
                warn!(policy = other, "Unknown PUZZLE_POLICY, failing on first wrong move");
                Self::FailOnFirst
            }
        }
    }
}

#[derive(Clone, Debug)]
pub struct SessionConfig {
    pub mode: SessionMode,

    pub wrong_move_policy: WrongMovePolicy,

    /// Time that separates a D from an F
    pub base_time: Duration,

    /// Added to elapsed time for each wrong move when grading
    pub penalty_per_wrong: Duration,

    /// Fail the attempt once this much time has passed
    pub time_limit: Option<Duration>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            mode: SessionMode::Standard,
            wrong_move_policy: WrongMovePolicy::FailOnFirst,
            base_time: Duration::from_secs(60),
            penalty_per_wrong: DEFAULT_PENALTY_PER_WRONG,
            time_limit: None,
        }
    }
}

impl SessionConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let mode = match env::var("PUZZLE_MODE").as_deref() {
            Ok("time_attack") => SessionMode::TimeAttack,
            Ok("promotion") => SessionMode::Promotion,
            Ok("standard") | Err(_) => SessionMode::Standard,
            Ok(other) => {
                warn!(mode = other, "Unknown PUZZLE_MODE, using standard");
                SessionMode::Standard
            }
        };

        let wrong_move_policy = WrongMovePolicy::from_setting(env::var("PUZZLE_POLICY").ok().as_deref());

        let base_time = env::var("PUZZLE_BASE_TIME_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.base_time);

        let time_limit = env::var("PUZZLE_TIME_LIMIT_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|ms: &u64| *ms > 0)
            .map(Duration::from_millis);

        Self {
            mode,
            wrong_move_policy,
            base_time,
            penalty_per_wrong: defaults.penalty_per_wrong,
            time_limit,
        }
    }
}
