//! Client-side puzzle session engine.
//!
//! Drives one puzzle attempt through its phases, grades it live against the
//! clock, and offers engine analysis once the attempt is decided. Engine
//! requests for the same position are shared between callers.

pub mod attempt;
pub mod clock;
pub mod config;
pub mod engine_client;
pub mod error;
pub mod grader;
pub mod outcome;
pub mod phase;
pub mod session;
pub mod time_attack;

pub use attempt::{Mover, PuzzleAttempt, PuzzleMove};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{SessionConfig, WrongMovePolicy};
pub use engine_client::{EngineClient, PendingAnalysis};
pub use error::{EngineError, SessionError};
pub use grader::{compute_grade, Grade, GradeState, LiveGrader};
pub use outcome::{AttemptOutcome, LogReporter, OutcomeKind, OutcomeReporter};
pub use phase::{PhaseEvent, SessionMode, SessionPhase};
pub use session::{MoveKind, MoveResult, PuzzleSession};
pub use time_attack::TimeAttackRun;
