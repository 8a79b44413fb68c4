//! Storage abstraction for the judging pipeline
//!
//! Every state transition is a compare-and-set on the current state, so two
//! actors racing on one submission (a worker and a superseding enqueue, or a
//! worker and the watchdog) can never both win.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        Challenge, ChallengeFilter, FailureReason, NewChallenge, NewSubmission, SolvedChallenge,
        Submission, SubmissionFilter, SubmissionState, Verdict,
    },
};

/// Result of recording a verdict
#[derive(Debug, Clone, PartialEq)]
pub enum RecordOutcome {
    /// The verdict was stored and the submission moved to Completed
    Recorded(Verdict),
    /// A verdict already existed; the stored one is returned unchanged
    AlreadyRecorded(Verdict),
    /// The submission is not Running (superseded or failed meanwhile)
    NotRunning(SubmissionState),
}

/// Persistent state of challenges, submissions and verdicts
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait JudgeStore: Send + Sync {
    // Challenges

    async fn create_challenge(&self, new: NewChallenge) -> AppResult<Challenge>;

    async fn find_challenge(&self, id: Uuid) -> AppResult<Option<Challenge>>;

    async fn list_challenges(&self, filter: &ChallengeFilter) -> AppResult<Vec<Challenge>>;

    /// Delete a challenge together with its submissions and verdicts
    async fn delete_challenge(&self, id: Uuid) -> AppResult<bool>;

    // Submissions

    /// Persist a new submission in state Queued
    async fn create_submission(&self, new: NewSubmission) -> AppResult<Submission>;

    async fn find_submission(&self, id: Uuid) -> AppResult<Option<Submission>>;

    /// Page of submissions, newest first, and the total matching count
    async fn list_submissions(&self, filter: &SubmissionFilter)
    -> AppResult<(Vec<Submission>, i64)>;

    /// The Queued or Running submission for a (user, challenge) pair, if any
    async fn find_in_flight(&self, user_id: Uuid, challenge_id: Uuid)
    -> AppResult<Option<Submission>>;

    /// Queued and Running submissions of one challenge, oldest first
    async fn list_in_flight_for_challenge(&self, challenge_id: Uuid) -> AppResult<Vec<Submission>>;

    /// Queued → Running; `None` when the submission is no longer Queued
    async fn claim_submission(&self, id: Uuid) -> AppResult<Option<Submission>>;

    /// Queued|Running → Failed; `false` when already terminal
    async fn fail_submission(&self, id: Uuid, reason: &FailureReason) -> AppResult<bool>;

    /// All Queued submissions in creation order
    async fn list_queued(&self) -> AppResult<Vec<Submission>>;

    /// Queued submissions created before the cutoff
    async fn list_queued_before(&self, cutoff: DateTime<Utc>) -> AppResult<Vec<Submission>>;

    /// Running submissions claimed before the cutoff
    async fn list_running_before(&self, cutoff: DateTime<Utc>) -> AppResult<Vec<Submission>>;

    // Verdicts

    /// Insert the verdict once and move the submission Running → Completed atomically
    async fn record_verdict(&self, verdict: Verdict) -> AppResult<RecordOutcome>;

    async fn find_verdict(&self, submission_id: Uuid) -> AppResult<Option<Verdict>>;

    /// Distinct (user, challenge) pairs with a Correct verdict
    async fn list_solved(&self) -> AppResult<Vec<SolvedChallenge>>;
}
