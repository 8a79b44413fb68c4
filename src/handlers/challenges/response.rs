//! Challenge response DTOs

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::models::Challenge;

/// Challenge as listed in the catalogue
#[derive(Debug, Serialize)]
pub struct ChallengeSummary {
    pub id: Uuid,
    pub title: String,
    pub difficulty: String,
    pub points: i64,
    pub tags: Vec<String>,
    pub is_ai_generated: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&Challenge> for ChallengeSummary {
    fn from(challenge: &Challenge) -> Self {
        Self {
            id: challenge.id,
            title: challenge.title.clone(),
            difficulty: challenge.difficulty.to_string(),
            points: challenge.difficulty.points(),
            tags: challenge.tags.clone(),
            is_ai_generated: challenge.is_ai_generated,
            created_at: challenge.created_at,
        }
    }
}

/// Challenge list response
#[derive(Debug, Serialize)]
pub struct ChallengesListResponse {
    pub challenges: Vec<ChallengeSummary>,
    pub total: usize,
}

/// Public sample case
#[derive(Debug, Serialize)]
pub struct SampleCase {
    pub input: Value,
    pub expected: Value,
}

/// Full challenge; hidden test cases are only counted
#[derive(Debug, Serialize)]
pub struct ChallengeResponse {
    #[serde(flatten)]
    pub summary: ChallengeSummary,
    pub description: String,
    pub solution_template: String,
    pub samples: Vec<SampleCase>,
    pub test_case_count: usize,
}

impl From<Challenge> for ChallengeResponse {
    fn from(challenge: Challenge) -> Self {
        Self {
            summary: ChallengeSummary::from(&challenge),
            samples: challenge
                .samples()
                .iter()
                .map(|case| SampleCase {
                    input: case.input.clone(),
                    expected: case.expected.clone(),
                })
                .collect(),
            test_case_count: challenge.test_cases.len(),
            description: challenge.description,
            solution_template: challenge.solution_template,
        }
    }
}
