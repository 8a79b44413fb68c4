//! Challenge Judge - judging service for a coding-challenge platform
//!
//! Accepts code submissions for published challenges, judges them in an
//! isolated sandbox against the challenge's test cases, records an immutable
//! verdict and notifies the submitter.
//!
//! # Features
//!
//! - JavaScript and Python submissions
//! - Docker or local-process sandboxes with memory, CPU and time limits
//! - Per-user fair queueing with supersede of stale submissions
//! - Verdict events over an in-process channel and Redis
//!
//! # Architecture
//!
//! The application follows a layered architecture:
//! - **Handlers**: HTTP request handlers (thin layer)
//! - **Services**: Business logic
//! - **Judge**: Queue, workers, sandboxes, aggregation and notification
//! - **Db**: Store trait with PostgreSQL and in-memory backends
//! - **Models**: Domain models

pub mod authorization;
pub mod config;
pub mod constants;
pub mod db;
pub mod error;
pub mod handlers;
pub mod judge;
pub mod middleware;
pub mod models;
pub mod services;
pub mod state;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, AppResult};
pub use state::AppState;
