//! Leaderboard handlers

pub mod response;

pub use response::*;

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};

use crate::{
    constants::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE},
    error::AppResult,
    services::LeaderboardService,
    state::AppState,
};

/// Current standings
async fn get_leaderboard(
    State(state): State<AppState>,
    Query(query): Query<LeaderboardQuery>,
) -> AppResult<Json<LeaderboardResponse>> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_PAGE_SIZE as usize)
        .clamp(1, MAX_PAGE_SIZE as usize);

    let entries = LeaderboardService::leaderboard(state.store(), limit).await?;
    Ok(Json(LeaderboardResponse { entries }))
}

/// Leaderboard routes
pub fn routes() -> Router<AppState> {
    Router::new().route("/", get(get_leaderboard))
}
