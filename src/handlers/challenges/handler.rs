//! Challenge handler implementations

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::AppResult, middleware::auth::AuthenticatedUser, services::ChallengeService,
    state::AppState,
};

use super::{
    request::{CreateChallengeRequest, ListChallengesQuery},
    response::{ChallengeResponse, ChallengeSummary, ChallengesListResponse},
};

/// List challenges
pub async fn list_challenges(
    State(state): State<AppState>,
    Query(query): Query<ListChallengesQuery>,
) -> AppResult<Json<ChallengesListResponse>> {
    let challenges = ChallengeService::list_challenges(state.store(), &query).await?;

    Ok(Json(ChallengesListResponse {
        total: challenges.len(),
        challenges: challenges.iter().map(ChallengeSummary::from).collect(),
    }))
}

/// Get challenge by ID (sample cases only)
pub async fn get_challenge(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ChallengeResponse>> {
    let challenge = ChallengeService::get_challenge(state.store(), id).await?;
    Ok(Json(challenge.into()))
}

/// Publish a new challenge
pub async fn create_challenge(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Json(payload): Json<CreateChallengeRequest>,
) -> AppResult<(StatusCode, Json<ChallengeResponse>)> {
    payload.validate()?;

    let challenge =
        ChallengeService::create_challenge(state.store(), auth_user.id, auth_user.role, payload)
            .await?;

    Ok((StatusCode::CREATED, Json(challenge.into())))
}

/// Delete a challenge
pub async fn delete_challenge(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    ChallengeService::delete_challenge(state.pipeline(), auth_user.role, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
