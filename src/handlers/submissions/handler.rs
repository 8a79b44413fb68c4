//! Submission handler implementations

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    constants::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE},
    error::AppResult,
    middleware::auth::AuthenticatedUser,
    services::SubmissionService,
    state::AppState,
};

use super::{
    request::{CreateSubmissionRequest, ListSubmissionsQuery},
    response::{
        CreateSubmissionResponse, SubmissionResponse, SubmissionsListResponse, VerdictResponse,
    },
};

/// Create a new submission
///
/// Accepted synchronously; judging happens in the background.
pub async fn create_submission(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Json(payload): Json<CreateSubmissionRequest>,
) -> AppResult<(StatusCode, Json<CreateSubmissionResponse>)> {
    payload.validate()?;

    let enqueued =
        SubmissionService::create_submission(state.pipeline(), auth_user.id, payload).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(CreateSubmissionResponse {
            id: enqueued.submission.id,
            message: "Submission received and queued for judging".to_string(),
            state: enqueued.submission.state.to_string(),
            superseded: enqueued.superseded,
        }),
    ))
}

/// List submissions
pub async fn list_submissions(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Query(query): Query<ListSubmissionsQuery>,
) -> AppResult<Json<SubmissionsListResponse>> {
    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);

    let (submissions, total) =
        SubmissionService::list_submissions(state.store(), auth_user.id, auth_user.role, &query)
            .await?;

    Ok(Json(SubmissionsListResponse {
        submissions: submissions.into_iter().map(SubmissionResponse::from).collect(),
        total,
        page,
        per_page,
    }))
}

/// Get submission by ID
pub async fn get_submission(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<SubmissionResponse>> {
    let submission =
        SubmissionService::get_submission(state.store(), auth_user.id, auth_user.role, id).await?;
    Ok(Json(submission.into()))
}

/// Get the verdict of a judged submission
pub async fn get_verdict(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<VerdictResponse>> {
    let verdict =
        SubmissionService::get_verdict(state.store(), auth_user.id, auth_user.role, id).await?;
    Ok(Json(verdict.into()))
}
