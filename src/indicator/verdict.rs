// src/indicator/verdict.rs

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerdictState {
    Pass,
    Fail,
    Skipped,
}

impl VerdictState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pass => "PASS",
            Self::Fail => "FAIL",
            Self::Skipped => "SKIPPED",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Verdict {
    pub state: VerdictState,
    pub reason: String,
    pub detected_count: u32,
}

impl Verdict {
    pub fn is_fail(&self) -> bool {
        self.state == VerdictState::Fail
    }
}

/// Reason strings an indicator reports for each verdict.
#[derive(Debug, Clone, Copy)]
pub struct VerdictText {
    pub fail: &'static str,
    pub pass: &'static str,
    pub skipped: &'static str,
}

/// Count-vs-condition rule shared by Verdict and ShouldStopScenario.
/// Conditions below 0.5 (zero or negative) never trigger.
pub fn exceeds_condition(count: u32, condition: f64) -> bool {
    condition >= 0.5 && f64::from(count) >= condition
}
