//! Submission service

use uuid::Uuid;

use crate::{
    authorization::{Permission, Role},
    constants::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE},
    db::JudgeStore,
    error::{AppError, AppResult},
    handlers::submissions::request::{CreateSubmissionRequest, ListSubmissionsQuery},
    judge::{Enqueued, Pipeline},
    models::{
        FailureReason, Language, NewSubmission, Submission, SubmissionFilter, SubmissionState,
        Verdict,
    },
    utils::validate_source_code,
};

/// Submission service for business logic
pub struct SubmissionService;

impl SubmissionService {
    /// Validate a submission and hand it to the judging pipeline
    ///
    /// Nothing is persisted when validation fails.
    pub async fn create_submission(
        pipeline: &Pipeline,
        user_id: Uuid,
        payload: CreateSubmissionRequest,
    ) -> AppResult<Enqueued> {
        validate_source_code(&payload.source_code, pipeline.config().max_source_code_bytes)
            .map_err(AppError::Validation)?;

        let language = match payload.language.as_deref() {
            Some(language) => language
                .parse::<Language>()
                .map_err(|e| AppError::Validation(e.to_string()))?,
            None => Language::default(),
        };

        if pipeline
            .store()
            .find_challenge(payload.challenge_id)
            .await?
            .is_none()
        {
            return Err(AppError::Validation(format!(
                "Challenge {} does not exist",
                payload.challenge_id
            )));
        }

        pipeline
            .enqueue(NewSubmission {
                challenge_id: payload.challenge_id,
                user_id,
                language,
                source_code: payload.source_code,
            })
            .await
    }

    /// List submissions visible to the caller
    pub async fn list_submissions(
        store: &dyn JudgeStore,
        user_id: Uuid,
        role: Role,
        query: &ListSubmissionsQuery,
    ) -> AppResult<(Vec<Submission>, i64)> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query.per_page.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);

        let owner = if role.can(Permission::ViewAllSubmissions) {
            query.user_id
        } else {
            match query.user_id {
                Some(other) if other != user_id => {
                    role.require(Permission::ViewAllSubmissions)?;
                    Some(other)
                }
                _ => Some(user_id),
            }
        };

        let state = query
            .state
            .as_deref()
            .map(str::parse::<SubmissionState>)
            .transpose()
            .map_err(AppError::Validation)?;

        let filter = SubmissionFilter {
            user_id: owner,
            challenge_id: query.challenge_id,
            state,
            limit: i64::from(per_page),
            offset: (i64::from(page) - 1) * i64::from(per_page),
        };

        store.list_submissions(&filter).await
    }

    /// Get a submission the caller may see
    pub async fn get_submission(
        store: &dyn JudgeStore,
        user_id: Uuid,
        role: Role,
        id: Uuid,
    ) -> AppResult<Submission> {
        let submission = store
            .find_submission(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Submission not found".to_string()))?;

        if submission.user_id != user_id {
            role.require(Permission::ViewAllSubmissions)?;
        }

        Ok(submission)
    }

    /// Get the verdict of a judged submission
    pub async fn get_verdict(
        store: &dyn JudgeStore,
        user_id: Uuid,
        role: Role,
        id: Uuid,
    ) -> AppResult<Verdict> {
        let submission = Self::get_submission(store, user_id, role, id).await?;

        match store.find_verdict(submission.id).await? {
            Some(verdict) => Ok(verdict),
            None if submission.state.is_in_flight() => Err(AppError::NotFound(format!(
                "Submission is still {}",
                submission.state
            ))),
            // Infrastructure failure: surfaced so the caller can resubmit
            None => match submission.failure_reason {
                Some(FailureReason::SandboxProvision(message)) => {
                    Err(AppError::SandboxProvision(message))
                }
                Some(reason) => Err(AppError::NotFound(format!(
                    "Submission failed without a verdict: {}",
                    reason
                ))),
                None => Err(AppError::NotFound("Verdict not found".to_string())),
            },
        }
    }
}
