//! Application state management
//!
//! This module contains the shared application state that is passed
//! to all request handlers via Axum's State extractor.

use std::sync::Arc;

use crate::{config::JwtConfig, db::JudgeStore, judge::Pipeline};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

/// Inner state (wrapped in Arc for cheap cloning)
struct AppStateInner {
    /// Judging pipeline, which also owns the store
    pipeline: Pipeline,

    /// Bearer token verification settings
    jwt: JwtConfig,
}

impl AppState {
    /// Create a new application state
    pub fn new(pipeline: Pipeline, jwt: JwtConfig) -> Self {
        Self {
            inner: Arc::new(AppStateInner { pipeline, jwt }),
        }
    }

    /// Get a reference to the store
    pub fn store(&self) -> &dyn JudgeStore {
        self.inner.pipeline.store().as_ref()
    }

    /// Get a reference to the judging pipeline
    pub fn pipeline(&self) -> &Pipeline {
        &self.inner.pipeline
    }

    /// Get a reference to the JWT settings
    pub fn jwt(&self) -> &JwtConfig {
        &self.inner.jwt
    }
}
