//! Submission repository

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::{
    constants::submission_states,
    error::{AppError, AppResult},
    models::{FailureReason, Submission, SubmissionFilter, SubmissionState},
};

/// Raw submission row
#[derive(Debug, FromRow)]
struct SubmissionRow {
    id: Uuid,
    challenge_id: Uuid,
    user_id: Uuid,
    language: String,
    source_code: String,
    status: String,
    failure_kind: Option<String>,
    failure_message: Option<String>,
    created_at: DateTime<Utc>,
    claimed_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
}

impl SubmissionRow {
    fn into_submission(self) -> AppResult<Submission> {
        let failure_reason = self
            .failure_kind
            .as_deref()
            .and_then(|kind| FailureReason::from_parts(kind, self.failure_message.clone()));

        Ok(Submission {
            id: self.id,
            challenge_id: self.challenge_id,
            user_id: self.user_id,
            language: self
                .language
                .parse()
                .map_err(|e: crate::models::UnsupportedLanguage| AppError::Database(e.to_string()))?,
            source_code: self.source_code,
            state: self.status.parse().map_err(AppError::Database)?,
            failure_reason,
            created_at: self.created_at,
            claimed_at: self.claimed_at,
            finished_at: self.finished_at,
        })
    }
}

fn into_submissions(rows: Vec<SubmissionRow>) -> AppResult<Vec<Submission>> {
    rows.into_iter().map(SubmissionRow::into_submission).collect()
}

/// Repository for submission database operations
pub struct SubmissionRepository;

impl SubmissionRepository {
    /// Insert a Queued submission
    ///
    /// Fails with `Conflict` when the (user, challenge) pair already has an
    /// in-flight submission.
    pub async fn create(pool: &PgPool, submission: &Submission) -> AppResult<Submission> {
        let row = sqlx::query_as::<_, SubmissionRow>(
            r#"
            INSERT INTO submissions (id, challenge_id, user_id, language, source_code, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(submission.id)
        .bind(submission.challenge_id)
        .bind(submission.user_id)
        .bind(submission.language.as_str())
        .bind(&submission.source_code)
        .bind(submission_states::QUEUED)
        .bind(submission.created_at)
        .fetch_one(pool)
        .await?;

        row.into_submission()
    }

    /// Find submission by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> AppResult<Option<Submission>> {
        let row = sqlx::query_as::<_, SubmissionRow>(r#"SELECT * FROM submissions WHERE id = $1"#)
            .bind(id)
            .fetch_optional(pool)
            .await?;

        row.map(SubmissionRow::into_submission).transpose()
    }

    /// List submissions, newest first, with the total matching count
    pub async fn list(
        pool: &PgPool,
        filter: &SubmissionFilter,
    ) -> AppResult<(Vec<Submission>, i64)> {
        let state = filter.state.map(|s| s.as_str());

        let rows = sqlx::query_as::<_, SubmissionRow>(
            r#"
            SELECT * FROM submissions
            WHERE ($1::UUID IS NULL OR user_id = $1)
              AND ($2::UUID IS NULL OR challenge_id = $2)
              AND ($3::TEXT IS NULL OR status = $3)
            ORDER BY created_at DESC
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(filter.user_id)
        .bind(filter.challenge_id)
        .bind(state)
        .bind(filter.limit)
        .bind(filter.offset)
        .fetch_all(pool)
        .await?;

        let total: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM submissions
            WHERE ($1::UUID IS NULL OR user_id = $1)
              AND ($2::UUID IS NULL OR challenge_id = $2)
              AND ($3::TEXT IS NULL OR status = $3)
            "#,
        )
        .bind(filter.user_id)
        .bind(filter.challenge_id)
        .bind(state)
        .fetch_one(pool)
        .await?;

        Ok((into_submissions(rows)?, total.0))
    }

    /// Find the in-flight submission for a (user, challenge) pair
    pub async fn find_in_flight(
        pool: &PgPool,
        user_id: Uuid,
        challenge_id: Uuid,
    ) -> AppResult<Option<Submission>> {
        let row = sqlx::query_as::<_, SubmissionRow>(
            r#"
            SELECT * FROM submissions
            WHERE user_id = $1 AND challenge_id = $2 AND status IN ('queued', 'running')
            "#,
        )
        .bind(user_id)
        .bind(challenge_id)
        .fetch_optional(pool)
        .await?;

        row.map(SubmissionRow::into_submission).transpose()
    }

    pub async fn list_in_flight_by_challenge(
        pool: &PgPool,
        challenge_id: Uuid,
    ) -> AppResult<Vec<Submission>> {
        let rows = sqlx::query_as::<_, SubmissionRow>(
            r#"
            SELECT * FROM submissions
            WHERE challenge_id = $1 AND status IN ('queued', 'running')
            ORDER BY created_at ASC
            "#,
        )
        .bind(challenge_id)
        .fetch_all(pool)
        .await?;

        into_submissions(rows)
    }

    /// Compare-and-set Queued → Running
    pub async fn claim(pool: &PgPool, id: Uuid) -> AppResult<Option<Submission>> {
        let row = sqlx::query_as::<_, SubmissionRow>(
            r#"
            UPDATE submissions
            SET status = 'running', claimed_at = NOW()
            WHERE id = $1 AND status = 'queued'
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        row.map(SubmissionRow::into_submission).transpose()
    }

    /// Compare-and-set Queued|Running → Failed
    pub async fn fail(pool: &PgPool, id: Uuid, reason: &FailureReason) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE submissions
            SET status = 'failed', failure_kind = $2, failure_message = $3, finished_at = NOW()
            WHERE id = $1 AND status IN ('queued', 'running')
            "#,
        )
        .bind(id)
        .bind(reason.kind())
        .bind(reason.message())
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Compare-and-set Running → Completed inside a verdict transaction
    pub async fn complete(tx: &mut Transaction<'_, Postgres>, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE submissions
            SET status = 'completed', finished_at = NOW()
            WHERE id = $1 AND status = 'running'
            "#,
        )
        .bind(id)
        .execute(&mut **tx)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Current state of a submission inside a verdict transaction
    pub async fn state_for_update(
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
    ) -> AppResult<Option<SubmissionState>> {
        let status: Option<(String,)> =
            sqlx::query_as(r#"SELECT status FROM submissions WHERE id = $1 FOR UPDATE"#)
                .bind(id)
                .fetch_optional(&mut **tx)
                .await?;

        status
            .map(|(s,)| s.parse().map_err(AppError::Database))
            .transpose()
    }

    /// Submissions in a given state created (or claimed) before a cutoff, oldest first
    pub async fn list_by_state_before(
        pool: &PgPool,
        state: SubmissionState,
        cutoff: DateTime<Utc>,
    ) -> AppResult<Vec<Submission>> {
        let rows = sqlx::query_as::<_, SubmissionRow>(
            r#"
            SELECT * FROM submissions
            WHERE status = $1 AND COALESCE(claimed_at, created_at) < $2
            ORDER BY created_at ASC
            "#,
        )
        .bind(state.as_str())
        .bind(cutoff)
        .fetch_all(pool)
        .await?;

        into_submissions(rows)
    }
}
