//! Leaderboard response DTOs

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One ranked user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub user_id: Uuid,
    /// Distinct challenges solved
    pub solved: usize,
    pub points: i64,
}

/// Leaderboard response
#[derive(Debug, Serialize)]
pub struct LeaderboardResponse {
    pub entries: Vec<LeaderboardEntry>,
}

/// Leaderboard query parameters
#[derive(Debug, Default, Deserialize)]
pub struct LeaderboardQuery {
    pub limit: Option<usize>,
}
