//! Challenge service

use uuid::Uuid;

use crate::{
    authorization::{Permission, Role},
    db::JudgeStore,
    error::{AppError, AppResult},
    handlers::challenges::request::{CreateChallengeRequest, ListChallengesQuery},
    judge::Pipeline,
    models::{Challenge, ChallengeFilter, Difficulty, NewChallenge},
    utils::{normalize_tags, validate_challenge_title, validate_time_limit, validate_tolerance},
};

/// Challenge service for business logic
pub struct ChallengeService;

impl ChallengeService {
    /// Publish a new challenge
    pub async fn create_challenge(
        store: &dyn JudgeStore,
        author_id: Uuid,
        role: Role,
        payload: CreateChallengeRequest,
    ) -> AppResult<Challenge> {
        role.require(Permission::AuthorChallenge)?;

        let title = validate_challenge_title(&payload.title)
            .map_err(|e| AppError::Validation(e.to_string()))?;
        let tags =
            normalize_tags(&payload.tags).map_err(|e| AppError::Validation(e.to_string()))?;

        if payload.test_cases.is_empty() {
            return Err(AppError::Validation(
                "A challenge needs at least one test case".to_string(),
            ));
        }
        for (index, case) in payload.test_cases.iter().enumerate() {
            if let Some(ms) = case.time_limit_ms {
                validate_time_limit(ms)
                    .map_err(|e| AppError::Validation(format!("Test case {}: {}", index, e)))?;
            }
            if let Some(tolerance) = case.tolerance {
                validate_tolerance(tolerance)
                    .map_err(|e| AppError::Validation(format!("Test case {}: {}", index, e)))?;
            }
        }

        let sample_count = payload.sample_count.unwrap_or(1);
        if sample_count > payload.test_cases.len() {
            return Err(AppError::Validation(
                "sample_count exceeds the number of test cases".to_string(),
            ));
        }

        let challenge = store
            .create_challenge(NewChallenge {
                title,
                difficulty: payload.difficulty,
                description: payload.description,
                tags,
                solution_template: payload.solution_template,
                test_cases: payload.test_cases,
                sample_count,
                is_ai_generated: payload.is_ai_generated,
                author_id: Some(author_id),
            })
            .await?;

        tracing::info!(
            challenge_id = %challenge.id,
            author_id = %author_id,
            test_cases = challenge.test_cases.len(),
            "Challenge published"
        );

        Ok(challenge)
    }

    /// List challenges matching the query
    pub async fn list_challenges(
        store: &dyn JudgeStore,
        query: &ListChallengesQuery,
    ) -> AppResult<Vec<Challenge>> {
        let difficulty = query
            .difficulty
            .as_deref()
            .map(str::parse::<Difficulty>)
            .transpose()
            .map_err(AppError::Validation)?;

        let filter = ChallengeFilter {
            difficulty,
            tag: query.tag.as_deref().map(|t| t.trim().to_lowercase()),
        };

        store.list_challenges(&filter).await
    }

    /// Get challenge by ID
    pub async fn get_challenge(store: &dyn JudgeStore, id: Uuid) -> AppResult<Challenge> {
        store
            .find_challenge(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Challenge not found".to_string()))
    }

    /// Delete a challenge with its submissions and verdicts
    ///
    /// Submissions still being judged are failed and their workers aborted.
    pub async fn delete_challenge(pipeline: &Pipeline, role: Role, id: Uuid) -> AppResult<()> {
        role.require(Permission::DeleteChallenge)?;

        if !pipeline.delete_challenge(id).await? {
            return Err(AppError::NotFound("Challenge not found".to_string()));
        }

        tracing::info!(challenge_id = %id, "Challenge deleted");
        Ok(())
    }
}
