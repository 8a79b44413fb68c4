//! Submission request DTOs

use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

/// Create submission request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateSubmissionRequest {
    /// Challenge to submit for
    pub challenge_id: Uuid,

    /// Programming language (defaults to JavaScript)
    #[validate(length(min = 1, max = 20))]
    pub language: Option<String>,

    /// Source code defining `solution(input)`; the size limit is configured
    pub source_code: String,
}

/// List submissions query parameters
#[derive(Debug, Default, Deserialize)]
pub struct ListSubmissionsQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub challenge_id: Option<Uuid>,
    /// Only honoured for callers allowed to view every submission
    pub user_id: Option<Uuid>,
    pub state: Option<String>,
}
