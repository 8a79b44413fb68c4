//! Application-wide constants
//!
//! This module contains all constant values used throughout the application.
//! Constants are grouped by their purpose for better organization.

// =============================================================================
// SERVER DEFAULTS
// =============================================================================

/// Default server host address
pub const DEFAULT_SERVER_HOST: &str = "0.0.0.0";

/// Default server port
pub const DEFAULT_SERVER_PORT: u16 = 8080;

// =============================================================================
// DATABASE DEFAULTS
// =============================================================================

/// Default maximum database connections in the pool
pub const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 20;

// =============================================================================
// JUDGE DEFAULTS
// =============================================================================

/// Default number of concurrent judge workers
pub const DEFAULT_WORKER_COUNT: usize = 4;

/// Default wall-clock limit for a single test case, in milliseconds
pub const DEFAULT_CASE_TIME_LIMIT_MS: u64 = 2_000;

/// Default wall-clock budget for a whole submission, in milliseconds
pub const DEFAULT_SUBMISSION_TIMEOUT_MS: u64 = 20_000;

/// Maximum per-case time limit a challenge may declare, in milliseconds
pub const MAX_CASE_TIME_LIMIT_MS: u64 = 30_000;

/// Smallest per-case time limit a challenge may declare
pub const MIN_CASE_TIME_LIMIT_MS: u64 = 100;

/// Default maximum source code size in bytes (64 KB)
pub const DEFAULT_MAX_SOURCE_CODE_BYTES: usize = 64 * 1024;

/// Output captured from a sandboxed run is truncated past this many bytes
pub const MAX_CAPTURED_OUTPUT_BYTES: usize = 1024 * 1024;

/// Error messages stored in verdicts are cut to this many characters
pub const MAX_STORED_MESSAGE_CHARS: usize = 500;

/// How often the liveness watchdog scans for stuck submissions
pub const DEFAULT_WATCHDOG_INTERVAL_SECS: u64 = 15;

/// Extra time granted beyond the submission timeout before a submission is considered stuck
pub const DEFAULT_WATCHDOG_GRACE_SECS: u64 = 30;

// =============================================================================
// SANDBOX DEFAULTS
// =============================================================================

/// Default memory ceiling per sandbox in megabytes
pub const DEFAULT_SANDBOX_MEMORY_LIMIT_MB: u64 = 256;

/// Default CPU limit per sandbox (number of cores)
pub const DEFAULT_SANDBOX_CPU_LIMIT: f64 = 1.0;

/// Default maximum number of processes inside a sandbox
pub const DEFAULT_SANDBOX_PIDS_LIMIT: i64 = 64;

/// Output file size ceiling inside the process sandbox, in bytes
pub const SANDBOX_FILE_SIZE_LIMIT_BYTES: u64 = 16 * 1024 * 1024;

/// Prefix of the line on which a harness reports the solution's return value
pub const RESULT_MARKER: &str = "@@judge-result@@";

/// Sandbox backend identifiers
pub mod sandbox_backends {
    pub const DOCKER: &str = "docker";
    pub const PROCESS: &str = "process";
}

/// Store backend identifiers
pub mod store_backends {
    pub const POSTGRES: &str = "postgres";
    pub const MEMORY: &str = "memory";
}

// =============================================================================
// SUPPORTED LANGUAGES
// =============================================================================

/// Language identifiers
pub mod languages {
    pub const JAVASCRIPT: &str = "javascript";
    pub const PYTHON: &str = "python";
}

/// Container images for each language
pub mod container_images {
    pub const JAVASCRIPT: &str = "node:20-alpine";
    pub const PYTHON: &str = "python:3.12-alpine";
}

// =============================================================================
// USER ROLES
// =============================================================================

/// User role identifiers
pub mod roles {
    pub const ADMIN: &str = "admin";
    pub const AUTHOR: &str = "author";
    pub const PARTICIPANT: &str = "participant";
}

// =============================================================================
// SUBMISSION STATES
// =============================================================================

/// Submission lifecycle states as stored in the database
pub mod submission_states {
    pub const QUEUED: &str = "queued";
    pub const RUNNING: &str = "running";
    pub const COMPLETED: &str = "completed";
    pub const FAILED: &str = "failed";
}

// =============================================================================
// LEADERBOARD
// =============================================================================

/// Points awarded per distinct solved challenge
pub mod points {
    pub const EASY: i64 = 10;
    pub const MEDIUM: i64 = 20;
    pub const HARD: i64 = 40;
}

// =============================================================================
// NOTIFICATIONS
// =============================================================================

/// Redis channel verdict events are published on
pub const EVENTS_CHANNEL: &str = "judge:events";

/// Capacity of the in-process event broadcast channel
pub const EVENT_BUFFER_SIZE: usize = 1024;

// =============================================================================
// API VERSIONING
// =============================================================================

/// API base path
pub const API_BASE_PATH: &str = "/api/v1";

// =============================================================================
// PAGINATION
// =============================================================================

/// Default page size for paginated results
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Maximum page size for paginated results
pub const MAX_PAGE_SIZE: u32 = 100;

// =============================================================================
// VALIDATION
// =============================================================================

/// Maximum challenge title length
pub const MAX_CHALLENGE_TITLE_LENGTH: u64 = 256;

/// Maximum challenge description length
pub const MAX_CHALLENGE_DESCRIPTION_LENGTH: u64 = 65535;

/// Maximum number of tags on a challenge
pub const MAX_CHALLENGE_TAGS: u64 = 16;

/// Maximum number of test cases on a challenge
pub const MAX_TEST_CASES: u64 = 200;
