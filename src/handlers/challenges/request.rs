//! Challenge request DTOs

use serde::Deserialize;
use validator::Validate;

use crate::{
    constants::{
        MAX_CHALLENGE_DESCRIPTION_LENGTH, MAX_CHALLENGE_TAGS, MAX_CHALLENGE_TITLE_LENGTH,
        MAX_TEST_CASES,
    },
    models::{Difficulty, TestCase},
};

/// Publish challenge request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateChallengeRequest {
    #[validate(length(min = 1, max = MAX_CHALLENGE_TITLE_LENGTH))]
    pub title: String,

    pub difficulty: Difficulty,

    #[serde(default)]
    #[validate(length(max = MAX_CHALLENGE_DESCRIPTION_LENGTH))]
    pub description: String,

    #[serde(default)]
    #[validate(length(max = MAX_CHALLENGE_TAGS))]
    pub tags: Vec<String>,

    /// Starter code shown to participants
    #[serde(default)]
    pub solution_template: String,

    #[validate(length(min = 1, max = MAX_TEST_CASES))]
    pub test_cases: Vec<TestCase>,

    /// Leading test cases shown publicly (defaults to one)
    pub sample_count: Option<usize>,

    /// Set by the generator service for AI-authored challenges
    #[serde(default)]
    pub is_ai_generated: bool,
}

/// List challenges query parameters
#[derive(Debug, Default, Deserialize)]
pub struct ListChallengesQuery {
    pub difficulty: Option<String>,
    pub tag: Option<String>,
}
