//! Challenge repository

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{Challenge, ChallengeFilter, TestCase},
};

/// Raw challenge row
#[derive(Debug, FromRow)]
struct ChallengeRow {
    id: Uuid,
    title: String,
    difficulty: String,
    description: String,
    tags: Vec<String>,
    solution_template: String,
    test_cases: sqlx::types::Json<Vec<TestCase>>,
    sample_count: i32,
    is_ai_generated: bool,
    author_id: Option<Uuid>,
    created_at: DateTime<Utc>,
}

impl ChallengeRow {
    fn into_challenge(self) -> AppResult<Challenge> {
        let row = self;

        Ok(Challenge {
            id: row.id,
            title: row.title,
            difficulty: row.difficulty.parse().map_err(AppError::Database)?,
            description: row.description,
            tags: row.tags,
            solution_template: row.solution_template,
            test_cases: row.test_cases.0.into(),
            sample_count: row.sample_count.max(0) as usize,
            is_ai_generated: row.is_ai_generated,
            author_id: row.author_id,
            created_at: row.created_at,
        })
    }
}

/// Repository for challenge database operations
pub struct ChallengeRepository;

impl ChallengeRepository {
    /// Insert a challenge
    pub async fn create(pool: &PgPool, challenge: &Challenge) -> AppResult<Challenge> {
        let row = sqlx::query_as::<_, ChallengeRow>(
            r#"
            INSERT INTO challenges (
                id, title, difficulty, description, tags, solution_template,
                test_cases, sample_count, is_ai_generated, author_id, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(challenge.id)
        .bind(&challenge.title)
        .bind(challenge.difficulty.as_str())
        .bind(&challenge.description)
        .bind(&challenge.tags)
        .bind(&challenge.solution_template)
        .bind(sqlx::types::Json(challenge.test_cases.to_vec()))
        .bind(challenge.sample_count as i32)
        .bind(challenge.is_ai_generated)
        .bind(challenge.author_id)
        .bind(challenge.created_at)
        .fetch_one(pool)
        .await?;

        row.into_challenge()
    }

    /// Find challenge by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> AppResult<Option<Challenge>> {
        let row = sqlx::query_as::<_, ChallengeRow>(r#"SELECT * FROM challenges WHERE id = $1"#)
            .bind(id)
            .fetch_optional(pool)
            .await?;

        row.map(ChallengeRow::into_challenge).transpose()
    }

    /// List challenges, newest first
    pub async fn list(pool: &PgPool, filter: &ChallengeFilter) -> AppResult<Vec<Challenge>> {
        let rows = sqlx::query_as::<_, ChallengeRow>(
            r#"
            SELECT * FROM challenges
            WHERE ($1::TEXT IS NULL OR difficulty = $1)
              AND ($2::TEXT IS NULL OR EXISTS (
                    SELECT 1 FROM unnest(tags) AS t WHERE lower(t) = lower($2)
                  ))
            ORDER BY created_at DESC
            "#,
        )
        .bind(filter.difficulty.map(|d| d.as_str()))
        .bind(filter.tag.as_deref())
        .fetch_all(pool)
        .await?;

        rows.into_iter().map(ChallengeRow::into_challenge).collect()
    }

    /// Delete a challenge; submissions and verdicts cascade
    pub async fn delete(pool: &PgPool, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query(r#"DELETE FROM challenges WHERE id = $1"#)
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
