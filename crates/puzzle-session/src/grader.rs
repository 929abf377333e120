//! Live letter grade from elapsed time and mistakes.
//!
//! Each wrong move adds a fixed time penalty, so the grade can only get worse
//! as mistakes accumulate. The host drives `tick()` from its timer or frame
//! callback; the grader itself never schedules anything.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::clock::{Clock, SystemClock};

pub const DEFAULT_PENALTY_PER_WRONG: Duration = Duration::from_millis(2000);

/// Letter grades, best first. `Ord` follows declaration order, so a larger
/// value is a worse grade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Grade {
    S,
    A,
    B,
    C,
    D,
    F,
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self {
            Grade::S => "S",
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
        };
        f.write_str(letter)
    }
}

/// Upper bounds (exclusive) as a percentage of the base time.
const THRESHOLDS: [(u64, Grade); 5] = [
    (20, Grade::S),
    (30, Grade::A),
    (50, Grade::B),
    (70, Grade::C),
    (100, Grade::D),
];

/// Grade a penalized time against the base time. A zero base time grades F.
pub fn compute_grade(measure_ms: u64, base_time_ms: u64) -> Grade {
    if base_time_ms == 0 {
        return Grade::F;
    }
    let measure = u128::from(measure_ms) * 100;
    THRESHOLDS
        .iter()
        .find(|(percent, _)| measure < u128::from(base_time_ms) * u128::from(*percent))
        .map(|(_, grade)| *grade)
        .unwrap_or(Grade::F)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeState {
    pub grade: Grade,
    pub elapsed_ms: u64,
    pub wrong_count: u32,
}

pub type GradeListener = Box<dyn FnMut(Grade) + Send>;

pub struct LiveGrader<C: Clock = SystemClock> {
    clock: C,
    base_time_ms: u64,
    penalty_ms: u64,
    started_at: Option<u64>,
    wrong_count: u32,
    last_reported: Option<Grade>,
    frozen: Option<GradeState>,
    on_grade_change: Option<GradeListener>,
}

impl<C: Clock> LiveGrader<C> {
    pub fn new(clock: C, base_time: Duration) -> Self {
        Self {
            clock,
            base_time_ms: base_time.as_millis() as u64,
            penalty_ms: DEFAULT_PENALTY_PER_WRONG.as_millis() as u64,
            started_at: None,
            wrong_count: 0,
            last_reported: None,
            frozen: None,
            on_grade_change: None,
        }
    }

    pub fn with_penalty(mut self, penalty: Duration) -> Self {
        self.penalty_ms = penalty.as_millis() as u64;
        self
    }

    pub fn set_penalty(&mut self, penalty: Duration) {
        self.penalty_ms = penalty.as_millis() as u64;
    }

    pub fn set_base_time(&mut self, base_time: Duration) {
        self.base_time_ms = base_time.as_millis() as u64;
    }

    /// Called from `tick()` whenever the grade differs from the last one reported.
    pub fn on_grade_change(&mut self, listener: impl FnMut(Grade) + Send + 'static) {
        self.on_grade_change = Some(Box::new(listener));
    }

    /// Begin a new measurement from now. Mistakes and change tracking reset.
    pub fn start(&mut self) {
        self.started_at = Some(self.clock.now_ms());
        self.wrong_count = 0;
        self.last_reported = None;
        self.frozen = None;
    }

    pub fn is_running(&self) -> bool {
        self.started_at.is_some() && self.frozen.is_none()
    }

    pub fn record_wrong(&mut self) {
        if self.frozen.is_none() {
            self.wrong_count += 1;
        }
    }

    pub fn elapsed_ms(&self) -> u64 {
        if let Some(frozen) = self.frozen {
            return frozen.elapsed_ms;
        }
        match self.started_at {
            Some(start) => self.clock.now_ms().saturating_sub(start),
            None => 0,
        }
    }

    /// Elapsed time plus the penalty for every wrong move.
    pub fn measure_ms(&self) -> u64 {
        self.elapsed_ms()
            .saturating_add(u64::from(self.wrong_count).saturating_mul(self.penalty_ms))
    }

    pub fn state(&self) -> GradeState {
        if let Some(frozen) = self.frozen {
            return frozen;
        }
        GradeState {
            grade: compute_grade(self.measure_ms(), self.base_time_ms),
            elapsed_ms: self.elapsed_ms(),
            wrong_count: self.wrong_count,
        }
    }

    /// One loop iteration. Returns the new grade only when it changed.
    pub fn tick(&mut self) -> Option<Grade> {
        if !self.is_running() {
            return None;
        }
        let grade = self.state().grade;
        if self.last_reported == Some(grade) {
            return None;
        }
        self.last_reported = Some(grade);
        if let Some(listener) = self.on_grade_change.as_mut() {
            listener(grade);
        }
        Some(grade)
    }

    /// Stop measuring and keep the current state for good.
    pub fn freeze(&mut self) -> GradeState {
        if let Some(frozen) = self.frozen {
            return frozen;
        }
        let state = self.state();
        self.frozen = Some(state);
        state
    }

    /// Cancel the loop; later ticks do nothing until the next `start()`.
    pub fn stop(&mut self) {
        if self.is_running() {
            self.freeze();
        }
    }
}
