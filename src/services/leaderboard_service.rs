//! Leaderboard service

use std::collections::HashMap;

use uuid::Uuid;

use crate::{
    db::JudgeStore,
    error::AppResult,
    handlers::leaderboard::response::LeaderboardEntry,
    models::SolvedChallenge,
};

/// Leaderboard service for business logic
pub struct LeaderboardService;

impl LeaderboardService {
    /// Current standings, best first
    pub async fn leaderboard(
        store: &dyn JudgeStore,
        limit: usize,
    ) -> AppResult<Vec<LeaderboardEntry>> {
        let solved = store.list_solved().await?;
        let mut entries = Self::rank(&solved);
        entries.truncate(limit);
        Ok(entries)
    }

    /// Rank users by points, then solved count, then user id
    ///
    /// Each (user, challenge) pair counts once however many correct
    /// submissions it has.
    pub fn rank(solved: &[SolvedChallenge]) -> Vec<LeaderboardEntry> {
        let mut seen = std::collections::HashSet::new();
        let mut totals: HashMap<Uuid, (usize, i64)> = HashMap::new();

        for entry in solved {
            if !seen.insert((entry.user_id, entry.challenge_id)) {
                continue;
            }
            let total = totals.entry(entry.user_id).or_default();
            total.0 += 1;
            total.1 += entry.difficulty.points();
        }

        let mut ranked: Vec<_> = totals.into_iter().collect();
        ranked.sort_by(|(a_id, (a_solved, a_points)), (b_id, (b_solved, b_points))| {
            b_points
                .cmp(a_points)
                .then(b_solved.cmp(a_solved))
                .then(a_id.cmp(b_id))
        });

        ranked
            .into_iter()
            .enumerate()
            .map(|(i, (user_id, (solved, points)))| LeaderboardEntry {
                rank: i + 1,
                user_id,
                solved,
                points,
            })
            .collect()
    }
}
