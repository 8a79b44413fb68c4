//! Business logic services

pub mod challenge_service;
pub mod leaderboard_service;
pub mod submission_service;

pub use challenge_service::ChallengeService;
pub use leaderboard_service::LeaderboardService;
pub use submission_service::SubmissionService;
