//! PostgreSQL-backed store

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        Challenge, ChallengeFilter, FailureReason, NewChallenge, NewSubmission, SolvedChallenge,
        Submission, SubmissionFilter, SubmissionState, Verdict,
    },
};

use super::{
    repositories::{ChallengeRepository, SubmissionRepository, VerdictRepository},
    store::{JudgeStore, RecordOutcome},
};

/// Store persisting to PostgreSQL through the repositories
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl JudgeStore for PgStore {
    async fn create_challenge(&self, new: NewChallenge) -> AppResult<Challenge> {
        ChallengeRepository::create(&self.pool, &new.into_challenge()).await
    }

    async fn find_challenge(&self, id: Uuid) -> AppResult<Option<Challenge>> {
        ChallengeRepository::find_by_id(&self.pool, id).await
    }

    async fn list_challenges(&self, filter: &ChallengeFilter) -> AppResult<Vec<Challenge>> {
        ChallengeRepository::list(&self.pool, filter).await
    }

    async fn delete_challenge(&self, id: Uuid) -> AppResult<bool> {
        ChallengeRepository::delete(&self.pool, id).await
    }

    async fn create_submission(&self, new: NewSubmission) -> AppResult<Submission> {
        SubmissionRepository::create(&self.pool, &new.into_submission())
            .await
            .map_err(|e| match e {
                AppError::Conflict(_) => AppError::Conflict(
                    "An in-flight submission already exists for this challenge".to_string(),
                ),
                other => other,
            })
    }

    async fn find_submission(&self, id: Uuid) -> AppResult<Option<Submission>> {
        SubmissionRepository::find_by_id(&self.pool, id).await
    }

    async fn list_submissions(
        &self,
        filter: &SubmissionFilter,
    ) -> AppResult<(Vec<Submission>, i64)> {
        SubmissionRepository::list(&self.pool, filter).await
    }

    async fn find_in_flight(
        &self,
        user_id: Uuid,
        challenge_id: Uuid,
    ) -> AppResult<Option<Submission>> {
        SubmissionRepository::find_in_flight(&self.pool, user_id, challenge_id).await
    }

    async fn list_in_flight_for_challenge(&self, challenge_id: Uuid) -> AppResult<Vec<Submission>> {
        SubmissionRepository::list_in_flight_by_challenge(&self.pool, challenge_id).await
    }

    async fn claim_submission(&self, id: Uuid) -> AppResult<Option<Submission>> {
        SubmissionRepository::claim(&self.pool, id).await
    }

    async fn fail_submission(&self, id: Uuid, reason: &FailureReason) -> AppResult<bool> {
        SubmissionRepository::fail(&self.pool, id, reason).await
    }

    async fn list_queued(&self) -> AppResult<Vec<Submission>> {
        SubmissionRepository::list_by_state_before(&self.pool, SubmissionState::Queued, Utc::now())
            .await
    }

    async fn list_queued_before(&self, cutoff: DateTime<Utc>) -> AppResult<Vec<Submission>> {
        SubmissionRepository::list_by_state_before(&self.pool, SubmissionState::Queued, cutoff).await
    }

    async fn list_running_before(&self, cutoff: DateTime<Utc>) -> AppResult<Vec<Submission>> {
        SubmissionRepository::list_by_state_before(&self.pool, SubmissionState::Running, cutoff)
            .await
    }

    async fn record_verdict(&self, verdict: Verdict) -> AppResult<RecordOutcome> {
        let mut tx = self.pool.begin().await?;

        let state = SubmissionRepository::state_for_update(&mut tx, verdict.submission_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Submission not found".to_string()))?;

        if let Some(existing) = VerdictRepository::find_in_tx(&mut tx, verdict.submission_id).await? {
            tx.rollback().await?;
            return Ok(RecordOutcome::AlreadyRecorded(existing));
        }

        if state != SubmissionState::Running {
            tx.rollback().await?;
            return Ok(RecordOutcome::NotRunning(state));
        }

        let stored = VerdictRepository::insert_once(&mut tx, &verdict)
            .await?
            .ok_or_else(|| AppError::Conflict("Verdict already recorded".to_string()))?;
        SubmissionRepository::complete(&mut tx, verdict.submission_id).await?;

        tx.commit().await?;

        Ok(RecordOutcome::Recorded(stored))
    }

    async fn find_verdict(&self, submission_id: Uuid) -> AppResult<Option<Verdict>> {
        VerdictRepository::find_by_submission(&self.pool, submission_id).await
    }

    async fn list_solved(&self) -> AppResult<Vec<SolvedChallenge>> {
        VerdictRepository::list_solved(&self.pool).await
    }
}
