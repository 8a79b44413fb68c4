//! Verdict model

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Overall judged outcome of a submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictStatus {
    Correct,
    Incorrect,
    RuntimeError,
    TimedOut,
    CompileError,
}

impl VerdictStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Correct => "correct",
            Self::Incorrect => "incorrect",
            Self::RuntimeError => "runtime_error",
            Self::TimedOut => "timed_out",
            Self::CompileError => "compile_error",
        }
    }

    pub fn is_correct(&self) -> bool {
        matches!(self, Self::Correct)
    }
}

impl FromStr for VerdictStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "correct" => Ok(Self::Correct),
            "incorrect" => Ok(Self::Incorrect),
            "runtime_error" => Ok(Self::RuntimeError),
            "timed_out" => Ok(Self::TimedOut),
            "compile_error" => Ok(Self::CompileError),
            other => Err(format!("Invalid verdict status: {}", other)),
        }
    }
}

impl std::fmt::Display for VerdictStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a single test case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseStatus {
    Passed,
    /// Ran to completion with a wrong answer
    Failed,
    RuntimeError,
    TimedOut,
    /// Not run because the submission budget was exhausted or compilation failed
    Skipped,
}

impl CaseStatus {
    /// Overall status this case forces when it is the first non-pass
    pub fn verdict_status(&self) -> Option<VerdictStatus> {
        match self {
            Self::Passed => None,
            Self::Failed => Some(VerdictStatus::Incorrect),
            Self::RuntimeError => Some(VerdictStatus::RuntimeError),
            Self::TimedOut | Self::Skipped => Some(VerdictStatus::TimedOut),
        }
    }
}

/// Result of running one test case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseResult {
    /// Position of the test case in the challenge
    pub index: usize,
    pub status: CaseStatus,
    pub runtime_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl CaseResult {
    pub fn passed(index: usize, runtime_ms: u64) -> Self {
        Self {
            index,
            status: CaseStatus::Passed,
            runtime_ms,
            message: None,
        }
    }

    pub fn failed(index: usize, runtime_ms: u64, message: impl Into<String>) -> Self {
        Self {
            index,
            status: CaseStatus::Failed,
            runtime_ms,
            message: Some(message.into()),
        }
    }

    pub fn runtime_error(index: usize, runtime_ms: u64, message: impl Into<String>) -> Self {
        Self {
            index,
            status: CaseStatus::RuntimeError,
            runtime_ms,
            message: Some(message.into()),
        }
    }

    pub fn timed_out(index: usize, runtime_ms: u64) -> Self {
        Self {
            index,
            status: CaseStatus::TimedOut,
            runtime_ms,
            message: Some(format!("Exceeded time limit after {} ms", runtime_ms)),
        }
    }

    pub fn skipped(index: usize) -> Self {
        Self {
            index,
            status: CaseStatus::Skipped,
            runtime_ms: 0,
            message: None,
        }
    }

    pub fn is_passed(&self) -> bool {
        self.status == CaseStatus::Passed
    }
}

/// Final, immutable outcome of judging a submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub submission_id: Uuid,
    pub status: VerdictStatus,
    pub cases: Vec<CaseResult>,
    /// Sum of per-case runtimes
    pub runtime_ms: u64,
    pub passed: usize,
    pub total: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compile_output: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A user's correctly solved challenge, used to build the leaderboard
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SolvedChallenge {
    pub user_id: Uuid,
    pub challenge_id: Uuid,
    pub difficulty: super::Difficulty,
}
