//! HTTP Request Handlers
//!
//! This module contains all HTTP request handlers organized by domain.

pub mod challenges;
pub mod health;
pub mod leaderboard;
pub mod submissions;

use axum::{middleware, Router};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    constants::API_BASE_PATH,
    middleware::{auth::auth_middleware, logging::logging_middleware},
    state::AppState,
};

/// Create all API routes
pub fn routes(state: &AppState) -> Router<AppState> {
    let auth = || middleware::from_fn_with_state(state.clone(), auth_middleware);

    Router::new()
        .merge(health::routes())
        .nest(
            "/challenges",
            challenges::public_routes().merge(challenges::authoring_routes().route_layer(auth())),
        )
        .nest("/submissions", submissions::routes().route_layer(auth()))
        .nest("/leaderboard", leaderboard::routes())
}

/// Build the complete application router
pub fn app(state: AppState) -> Router {
    Router::new()
        .nest(API_BASE_PATH, routes(&state))
        .layer(middleware::from_fn(logging_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
