//! Test case model

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single (input, expected output) pair a submission is judged against
///
/// Inputs and expected outputs are arbitrary JSON values. The harness hands
/// `input` to the candidate's `solution` function and compares its return
/// value against `expected`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCase {
    pub input: Value,
    pub expected: Value,
    /// Wall-clock limit for this case; the judge default applies when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_limit_ms: Option<u64>,
    /// Absolute tolerance for numeric comparison; exact match when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tolerance: Option<f64>,
}

impl TestCase {
    /// Create an exact-match test case without its own time limit
    pub fn new(input: Value, expected: Value) -> Self {
        Self {
            input,
            expected,
            time_limit_ms: None,
            tolerance: None,
        }
    }

    /// Set a per-case time limit
    pub fn with_time_limit_ms(mut self, time_limit_ms: u64) -> Self {
        self.time_limit_ms = Some(time_limit_ms);
        self
    }

    /// Set a numeric comparison tolerance
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = Some(tolerance);
        self
    }
}
