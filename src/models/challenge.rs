//! Challenge model

use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::points;

use super::TestCase;

/// A published challenge
///
/// Challenges are immutable once created. The test case list is shared
/// read-only between the catalogue and every worker judging against it.
#[derive(Debug, Clone)]
pub struct Challenge {
    pub id: Uuid,
    pub title: String,
    pub difficulty: Difficulty,
    pub description: String,
    pub tags: Vec<String>,
    pub solution_template: String,
    pub test_cases: Arc<[TestCase]>,
    /// Leading test cases whose input and expected output are public
    pub sample_count: usize,
    pub is_ai_generated: bool,
    pub author_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Challenge {
    /// Public sample cases
    pub fn samples(&self) -> &[TestCase] {
        let visible = self.sample_count.min(self.test_cases.len());
        &self.test_cases[..visible]
    }

    /// Whether the challenge carries the given tag (case-insensitive)
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }
}

/// Data required to publish a challenge
#[derive(Debug, Clone)]
pub struct NewChallenge {
    pub title: String,
    pub difficulty: Difficulty,
    pub description: String,
    pub tags: Vec<String>,
    pub solution_template: String,
    pub test_cases: Vec<TestCase>,
    pub sample_count: usize,
    pub is_ai_generated: bool,
    pub author_id: Option<Uuid>,
}

impl NewChallenge {
    /// Turn the draft into a challenge with a fresh id
    pub fn into_challenge(self) -> Challenge {
        Challenge {
            id: Uuid::new_v4(),
            title: self.title,
            difficulty: self.difficulty,
            description: self.description,
            tags: self.tags,
            solution_template: self.solution_template,
            test_cases: self.test_cases.into(),
            sample_count: self.sample_count,
            is_ai_generated: self.is_ai_generated,
            author_id: self.author_id,
            created_at: Utc::now(),
        }
    }
}

/// Filter for listing challenges
#[derive(Debug, Clone, Default)]
pub struct ChallengeFilter {
    pub difficulty: Option<Difficulty>,
    pub tag: Option<String>,
}

impl ChallengeFilter {
    pub fn matches(&self, challenge: &Challenge) -> bool {
        self.difficulty.is_none_or(|d| d == challenge.difficulty)
            && self.tag.as_deref().is_none_or(|t| challenge.has_tag(t))
    }
}

/// Challenge difficulty levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }

    /// Leaderboard points for solving a challenge of this difficulty
    pub fn points(&self) -> i64 {
        match self {
            Self::Easy => points::EASY,
            Self::Medium => points::MEDIUM,
            Self::Hard => points::HARD,
        }
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "easy" => Ok(Self::Easy),
            "medium" => Ok(Self::Medium),
            "hard" => Ok(Self::Hard),
            other => Err(format!("Invalid difficulty: {}", other)),
        }
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn draft() -> NewChallenge {
        NewChallenge {
            title: "Add two numbers".to_string(),
            difficulty: Difficulty::Easy,
            description: "Return a + b".to_string(),
            tags: vec!["Math".to_string()],
            solution_template: "function solution(input) {}".to_string(),
            test_cases: vec![
                TestCase::new(json!([2, 2]), json!(4)),
                TestCase::new(json!([1, 2]), json!(3)),
            ],
            sample_count: 5,
            is_ai_generated: false,
            author_id: None,
        }
    }

    #[test]
    fn test_samples_are_capped_by_case_count() {
        let challenge = draft().into_challenge();
        assert_eq!(challenge.samples().len(), 2);
    }

    #[test]
    fn test_filter_matches_difficulty_and_tag() {
        let challenge = draft().into_challenge();

        let by_tag = ChallengeFilter {
            difficulty: None,
            tag: Some("math".to_string()),
        };
        assert!(by_tag.matches(&challenge));

        let by_difficulty = ChallengeFilter {
            difficulty: Some(Difficulty::Hard),
            tag: None,
        };
        assert!(!by_difficulty.matches(&challenge));
    }

    #[test]
    fn test_points_per_difficulty() {
        assert_eq!(Difficulty::Easy.points(), 10);
        assert_eq!(Difficulty::Medium.points(), 20);
        assert_eq!(Difficulty::Hard.points(), 40);
        assert_eq!("Medium".parse::<Difficulty>().unwrap(), Difficulty::Medium);
    }
}
