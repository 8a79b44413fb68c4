//! Challenge catalogue handlers

mod handler;
pub mod request;
pub mod response;

pub use handler::*;
pub use request::*;
pub use response::*;

use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::state::AppState;

/// Public challenge routes
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handler::list_challenges))
        .route("/{id}", get(handler::get_challenge))
}

/// Challenge authoring routes (authenticated)
pub fn authoring_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handler::create_challenge))
        .route("/{id}", delete(handler::delete_challenge))
}
