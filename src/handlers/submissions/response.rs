//! Submission response DTOs

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::{CaseResult, FailureReason, Submission, Verdict};

/// Create submission response
#[derive(Debug, Serialize)]
pub struct CreateSubmissionResponse {
    pub id: Uuid,
    pub message: String,
    pub state: String,
    /// Earlier in-flight submission for the same challenge that was replaced
    #[serde(skip_serializing_if = "Option::is_none")]
    pub superseded: Option<Uuid>,
}

/// Submission response
#[derive(Debug, Serialize)]
pub struct SubmissionResponse {
    pub id: Uuid,
    pub challenge_id: Uuid,
    pub user_id: Uuid,
    pub language: String,
    pub state: String,
    pub failure_reason: Option<FailureReason>,
    pub submitted_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl From<Submission> for SubmissionResponse {
    fn from(submission: Submission) -> Self {
        Self {
            id: submission.id,
            challenge_id: submission.challenge_id,
            user_id: submission.user_id,
            language: submission.language.to_string(),
            state: submission.state.to_string(),
            failure_reason: submission.failure_reason,
            submitted_at: submission.created_at,
            started_at: submission.claimed_at,
            finished_at: submission.finished_at,
        }
    }
}

/// Submission list response
#[derive(Debug, Serialize)]
pub struct SubmissionsListResponse {
    pub submissions: Vec<SubmissionResponse>,
    pub total: i64,
    pub page: u32,
    pub per_page: u32,
}

/// Judged verdict of a submission
#[derive(Debug, Serialize)]
pub struct VerdictResponse {
    pub submission_id: Uuid,
    pub status: String,
    pub passed: usize,
    pub total: usize,
    pub runtime_ms: u64,
    pub test_results: Vec<CaseResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compilation_output: Option<String>,
    pub judged_at: DateTime<Utc>,
}

impl From<Verdict> for VerdictResponse {
    fn from(verdict: Verdict) -> Self {
        Self {
            submission_id: verdict.submission_id,
            status: verdict.status.to_string(),
            passed: verdict.passed,
            total: verdict.total,
            runtime_ms: verdict.runtime_ms,
            test_results: verdict.cases,
            compilation_output: verdict.compile_output,
            judged_at: verdict.created_at,
        }
    }
}
