//! Submission model

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::submission_states;

use super::Language;

/// A user's attempt at a challenge
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    pub id: Uuid,
    pub challenge_id: Uuid,
    pub user_id: Uuid,
    pub language: Language,
    #[serde(skip_serializing)]
    pub source_code: String,
    pub state: SubmissionState,
    pub failure_reason: Option<FailureReason>,
    pub created_at: DateTime<Utc>,
    pub claimed_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

/// Data required to create a submission
#[derive(Debug, Clone)]
pub struct NewSubmission {
    pub challenge_id: Uuid,
    pub user_id: Uuid,
    pub language: Language,
    pub source_code: String,
}

impl NewSubmission {
    /// Turn the request into a Queued submission with a fresh id
    pub fn into_submission(self) -> Submission {
        Submission {
            id: Uuid::new_v4(),
            challenge_id: self.challenge_id,
            user_id: self.user_id,
            language: self.language,
            source_code: self.source_code,
            state: SubmissionState::Queued,
            failure_reason: None,
            created_at: Utc::now(),
            claimed_at: None,
            finished_at: None,
        }
    }
}

/// Filter for listing submissions
#[derive(Debug, Clone, Default)]
pub struct SubmissionFilter {
    pub user_id: Option<Uuid>,
    pub challenge_id: Option<Uuid>,
    pub state: Option<SubmissionState>,
    pub limit: i64,
    pub offset: i64,
}

impl SubmissionFilter {
    pub fn matches(&self, submission: &Submission) -> bool {
        self.user_id.is_none_or(|id| id == submission.user_id)
            && self.challenge_id.is_none_or(|id| id == submission.challenge_id)
            && self.state.is_none_or(|state| state == submission.state)
    }
}

/// Submission lifecycle
///
/// Queued → Running → {Completed, Failed}, and Queued → Failed.
/// Completed and Failed are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionState {
    Queued,
    Running,
    Completed,
    Failed,
}

impl SubmissionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => submission_states::QUEUED,
            Self::Running => submission_states::RUNNING,
            Self::Completed => submission_states::COMPLETED,
            Self::Failed => submission_states::FAILED,
        }
    }

    /// Queued or Running
    pub fn is_in_flight(&self) -> bool {
        matches!(self, Self::Queued | Self::Running)
    }

    pub fn is_terminal(&self) -> bool {
        !self.is_in_flight()
    }

    /// Whether the state machine allows moving from `self` to `next`
    pub fn can_transition_to(&self, next: SubmissionState) -> bool {
        matches!(
            (self, next),
            (Self::Queued, Self::Running)
                | (Self::Queued, Self::Failed)
                | (Self::Running, Self::Completed)
                | (Self::Running, Self::Failed)
        )
    }
}

impl FromStr for SubmissionState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            submission_states::QUEUED => Ok(Self::Queued),
            submission_states::RUNNING => Ok(Self::Running),
            submission_states::COMPLETED => Ok(Self::Completed),
            submission_states::FAILED => Ok(Self::Failed),
            other => Err(format!("Invalid submission state: {}", other)),
        }
    }
}

impl std::fmt::Display for SubmissionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a submission ended in Failed instead of receiving a verdict
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum FailureReason {
    /// A newer submission for the same challenge replaced it
    Superseded,
    /// The sandbox could not be launched; safe to resubmit
    SandboxProvision(String),
    /// Stayed Running past the submission timeout plus grace period
    Stuck,
    Internal(String),
}

impl FailureReason {
    /// Stored kind identifier
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Superseded => "superseded",
            Self::SandboxProvision(_) => "sandbox_provision",
            Self::Stuck => "stuck",
            Self::Internal(_) => "internal",
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            Self::SandboxProvision(message) | Self::Internal(message) => Some(message),
            Self::Superseded | Self::Stuck => None,
        }
    }

    /// Rebuild a reason from its stored kind and message
    pub fn from_parts(kind: &str, message: Option<String>) -> Option<Self> {
        let message = message.unwrap_or_default();
        match kind {
            "superseded" => Some(Self::Superseded),
            "sandbox_provision" => Some(Self::SandboxProvision(message)),
            "stuck" => Some(Self::Stuck),
            "internal" => Some(Self::Internal(message)),
            _ => None,
        }
    }
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Superseded => write!(f, "superseded by a newer submission"),
            Self::SandboxProvision(message) => write!(f, "sandbox provisioning failed: {}", message),
            Self::Stuck => write!(f, "judging did not finish in time"),
            Self::Internal(message) => write!(f, "internal error: {}", message),
        }
    }
}
