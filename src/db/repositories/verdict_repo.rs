//! Verdict repository

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{CaseResult, SolvedChallenge, Verdict},
};

/// Raw verdict row
#[derive(Debug, FromRow)]
struct VerdictRow {
    submission_id: Uuid,
    status: String,
    cases: sqlx::types::Json<Vec<CaseResult>>,
    runtime_ms: i64,
    passed: i32,
    total: i32,
    compile_output: Option<String>,
    created_at: DateTime<Utc>,
}

impl VerdictRow {
    fn into_verdict(self) -> AppResult<Verdict> {
        Ok(Verdict {
            submission_id: self.submission_id,
            status: self.status.parse().map_err(AppError::Database)?,
            cases: self.cases.0,
            runtime_ms: self.runtime_ms.max(0) as u64,
            passed: self.passed.max(0) as usize,
            total: self.total.max(0) as usize,
            compile_output: self.compile_output,
            created_at: self.created_at,
        })
    }
}

/// Raw solved-challenge row
#[derive(Debug, FromRow)]
struct SolvedRow {
    user_id: Uuid,
    challenge_id: Uuid,
    difficulty: String,
}

/// Repository for verdict database operations
pub struct VerdictRepository;

impl VerdictRepository {
    /// Insert a verdict unless one exists; `None` when it already existed
    pub async fn insert_once(
        tx: &mut Transaction<'_, Postgres>,
        verdict: &Verdict,
    ) -> AppResult<Option<Verdict>> {
        let row = sqlx::query_as::<_, VerdictRow>(
            r#"
            INSERT INTO verdicts (
                submission_id, status, cases, runtime_ms, passed, total, compile_output, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (submission_id) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(verdict.submission_id)
        .bind(verdict.status.as_str())
        .bind(sqlx::types::Json(&verdict.cases))
        .bind(verdict.runtime_ms as i64)
        .bind(verdict.passed as i32)
        .bind(verdict.total as i32)
        .bind(verdict.compile_output.as_deref())
        .bind(verdict.created_at)
        .fetch_optional(&mut **tx)
        .await?;

        row.map(VerdictRow::into_verdict).transpose()
    }

    /// Find the verdict of a submission
    pub async fn find_by_submission(pool: &PgPool, submission_id: Uuid) -> AppResult<Option<Verdict>> {
        let row = sqlx::query_as::<_, VerdictRow>(
            r#"SELECT * FROM verdicts WHERE submission_id = $1"#,
        )
        .bind(submission_id)
        .fetch_optional(pool)
        .await?;

        row.map(VerdictRow::into_verdict).transpose()
    }

    /// Find the verdict of a submission inside a transaction
    pub async fn find_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        submission_id: Uuid,
    ) -> AppResult<Option<Verdict>> {
        let row = sqlx::query_as::<_, VerdictRow>(
            r#"SELECT * FROM verdicts WHERE submission_id = $1"#,
        )
        .bind(submission_id)
        .fetch_optional(&mut **tx)
        .await?;

        row.map(VerdictRow::into_verdict).transpose()
    }

    /// Distinct (user, challenge) pairs with a correct verdict
    pub async fn list_solved(pool: &PgPool) -> AppResult<Vec<SolvedChallenge>> {
        let rows = sqlx::query_as::<_, SolvedRow>(
            r#"
            SELECT DISTINCT s.user_id, s.challenge_id, c.difficulty
            FROM verdicts v
            JOIN submissions s ON s.id = v.submission_id
            JOIN challenges c ON c.id = s.challenge_id
            WHERE v.status = 'correct'
            "#,
        )
        .fetch_all(pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(SolvedChallenge {
                    user_id: row.user_id,
                    challenge_id: row.challenge_id,
                    difficulty: row.difficulty.parse().map_err(AppError::Database)?,
                })
            })
            .collect()
    }
}
