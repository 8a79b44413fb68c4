//! Database repositories

pub mod challenge_repo;
pub mod submission_repo;
pub mod verdict_repo;

pub use challenge_repo::ChallengeRepository;
pub use submission_repo::SubmissionRepository;
pub use verdict_repo::VerdictRepository;
