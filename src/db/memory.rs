//! In-memory store for development and tests

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        Challenge, ChallengeFilter, FailureReason, NewChallenge, NewSubmission, SolvedChallenge,
        Submission, SubmissionFilter, SubmissionState, Verdict,
    },
};

use super::store::{JudgeStore, RecordOutcome};

/// Store keeping everything in process memory
///
/// A single lock guards all tables, which makes every multi-record
/// operation atomic.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

#[derive(Default)]
struct Tables {
    challenges: HashMap<Uuid, Challenge>,
    submissions: HashMap<Uuid, Submission>,
    verdicts: HashMap<Uuid, Verdict>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> AppResult<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| AppError::Database("memory store lock poisoned".to_string()))
    }
}

fn sorted_by_creation(mut submissions: Vec<Submission>) -> Vec<Submission> {
    submissions.sort_by_key(|s| s.created_at);
    submissions
}

#[async_trait]
impl JudgeStore for MemoryStore {
    async fn create_challenge(&self, new: NewChallenge) -> AppResult<Challenge> {
        let challenge = new.into_challenge();
        self.tables()?
            .challenges
            .insert(challenge.id, challenge.clone());
        Ok(challenge)
    }

    async fn find_challenge(&self, id: Uuid) -> AppResult<Option<Challenge>> {
        Ok(self.tables()?.challenges.get(&id).cloned())
    }

    async fn list_challenges(&self, filter: &ChallengeFilter) -> AppResult<Vec<Challenge>> {
        let mut challenges: Vec<Challenge> = self
            .tables()?
            .challenges
            .values()
            .filter(|c| filter.matches(c))
            .cloned()
            .collect();
        challenges.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(challenges)
    }

    async fn delete_challenge(&self, id: Uuid) -> AppResult<bool> {
        let mut tables = self.tables()?;
        if tables.challenges.remove(&id).is_none() {
            return Ok(false);
        }

        let orphaned: Vec<Uuid> = tables
            .submissions
            .values()
            .filter(|s| s.challenge_id == id)
            .map(|s| s.id)
            .collect();
        for submission_id in orphaned {
            tables.submissions.remove(&submission_id);
            tables.verdicts.remove(&submission_id);
        }

        Ok(true)
    }

    async fn create_submission(&self, new: NewSubmission) -> AppResult<Submission> {
        let mut tables = self.tables()?;

        let duplicate = tables.submissions.values().any(|s| {
            s.user_id == new.user_id && s.challenge_id == new.challenge_id && s.state.is_in_flight()
        });
        if duplicate {
            return Err(AppError::Conflict(
                "An in-flight submission already exists for this challenge".to_string(),
            ));
        }

        let submission = new.into_submission();
        tables.submissions.insert(submission.id, submission.clone());
        Ok(submission)
    }

    async fn find_submission(&self, id: Uuid) -> AppResult<Option<Submission>> {
        Ok(self.tables()?.submissions.get(&id).cloned())
    }

    async fn list_submissions(
        &self,
        filter: &SubmissionFilter,
    ) -> AppResult<(Vec<Submission>, i64)> {
        let mut matching: Vec<Submission> = self
            .tables()?
            .submissions
            .values()
            .filter(|s| filter.matches(s))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = matching.len() as i64;
        let page = matching
            .into_iter()
            .skip(filter.offset.max(0) as usize)
            .take(filter.limit.max(0) as usize)
            .collect();

        Ok((page, total))
    }

    async fn find_in_flight(
        &self,
        user_id: Uuid,
        challenge_id: Uuid,
    ) -> AppResult<Option<Submission>> {
        Ok(self
            .tables()?
            .submissions
            .values()
            .find(|s| {
                s.user_id == user_id && s.challenge_id == challenge_id && s.state.is_in_flight()
            })
            .cloned())
    }

    async fn list_in_flight_for_challenge(&self, challenge_id: Uuid) -> AppResult<Vec<Submission>> {
        let in_flight = self
            .tables()?
            .submissions
            .values()
            .filter(|s| s.challenge_id == challenge_id && s.state.is_in_flight())
            .cloned()
            .collect();
        Ok(sorted_by_creation(in_flight))
    }

    async fn claim_submission(&self, id: Uuid) -> AppResult<Option<Submission>> {
        let mut tables = self.tables()?;
        match tables.submissions.get_mut(&id) {
            Some(submission) if submission.state == SubmissionState::Queued => {
                submission.state = SubmissionState::Running;
                submission.claimed_at = Some(Utc::now());
                Ok(Some(submission.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn fail_submission(&self, id: Uuid, reason: &FailureReason) -> AppResult<bool> {
        let mut tables = self.tables()?;
        match tables.submissions.get_mut(&id) {
            Some(submission) if submission.state.is_in_flight() => {
                submission.state = SubmissionState::Failed;
                submission.failure_reason = Some(reason.clone());
                submission.finished_at = Some(Utc::now());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn list_queued(&self) -> AppResult<Vec<Submission>> {
        let queued = self
            .tables()?
            .submissions
            .values()
            .filter(|s| s.state == SubmissionState::Queued)
            .cloned()
            .collect();
        Ok(sorted_by_creation(queued))
    }

    async fn list_queued_before(&self, cutoff: DateTime<Utc>) -> AppResult<Vec<Submission>> {
        let stale = self
            .tables()?
            .submissions
            .values()
            .filter(|s| s.state == SubmissionState::Queued && s.created_at < cutoff)
            .cloned()
            .collect();
        Ok(sorted_by_creation(stale))
    }

    async fn list_running_before(&self, cutoff: DateTime<Utc>) -> AppResult<Vec<Submission>> {
        let stale = self
            .tables()?
            .submissions
            .values()
            .filter(|s| {
                s.state == SubmissionState::Running && s.claimed_at.is_some_and(|t| t < cutoff)
            })
            .cloned()
            .collect();
        Ok(sorted_by_creation(stale))
    }

    async fn record_verdict(&self, verdict: Verdict) -> AppResult<RecordOutcome> {
        let mut tables = self.tables()?;

        if let Some(existing) = tables.verdicts.get(&verdict.submission_id) {
            return Ok(RecordOutcome::AlreadyRecorded(existing.clone()));
        }

        let submission = tables
            .submissions
            .get_mut(&verdict.submission_id)
            .ok_or_else(|| AppError::NotFound("Submission not found".to_string()))?;

        if submission.state != SubmissionState::Running {
            return Ok(RecordOutcome::NotRunning(submission.state));
        }

        submission.state = SubmissionState::Completed;
        submission.finished_at = Some(Utc::now());
        tables.verdicts.insert(verdict.submission_id, verdict.clone());

        Ok(RecordOutcome::Recorded(verdict))
    }

    async fn find_verdict(&self, submission_id: Uuid) -> AppResult<Option<Verdict>> {
        Ok(self.tables()?.verdicts.get(&submission_id).cloned())
    }

    async fn list_solved(&self) -> AppResult<Vec<SolvedChallenge>> {
        let tables = self.tables()?;
        let mut seen = HashSet::new();

        let solved = tables
            .verdicts
            .values()
            .filter(|v| v.status.is_correct())
            .filter_map(|v| tables.submissions.get(&v.submission_id))
            .filter_map(|s| {
                let challenge = tables.challenges.get(&s.challenge_id)?;
                Some(SolvedChallenge {
                    user_id: s.user_id,
                    challenge_id: challenge.id,
                    difficulty: challenge.difficulty,
                })
            })
            .filter(|solved| seen.insert((solved.user_id, solved.challenge_id)))
            .collect();

        Ok(solved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Difficulty, Language, TestCase, VerdictStatus};
    use serde_json::json;
    use tokio_test::assert_ok;

    async fn seeded() -> (MemoryStore, Challenge) {
        let store = MemoryStore::new();
        let challenge = store
            .create_challenge(NewChallenge {
                title: "Sum".to_string(),
                difficulty: Difficulty::Medium,
                description: "Add".to_string(),
                tags: vec![],
                solution_template: String::new(),
                test_cases: vec![TestCase::new(json!([2, 2]), json!(4))],
                sample_count: 1,
                is_ai_generated: false,
                author_id: None,
            })
            .await
            .unwrap();
        (store, challenge)
    }

    fn new_submission(challenge_id: Uuid, user_id: Uuid) -> NewSubmission {
        NewSubmission {
            challenge_id,
            user_id,
            language: Language::JavaScript,
            source_code: "function solution(i) { return 4 }".to_string(),
        }
    }

    fn verdict_for(submission_id: Uuid, status: VerdictStatus) -> Verdict {
        Verdict {
            submission_id,
            status,
            cases: vec![],
            runtime_ms: 3,
            passed: 0,
            total: 0,
            compile_output: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_claim_is_exclusive() {
        let (store, challenge) = seeded().await;
        let submission = store
            .create_submission(new_submission(challenge.id, Uuid::new_v4()))
            .await
            .unwrap();

        let first = assert_ok!(store.claim_submission(submission.id).await);
        let second = assert_ok!(store.claim_submission(submission.id).await);

        assert_eq!(first.map(|s| s.state), Some(SubmissionState::Running));
        assert!(second.is_none());
    }

    #[tokio::test]
    async fn test_second_in_flight_submission_conflicts() {
        let (store, challenge) = seeded().await;
        let user = Uuid::new_v4();

        store
            .create_submission(new_submission(challenge.id, user))
            .await
            .unwrap();
        let err = store
            .create_submission(new_submission(challenge.id, user))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_record_verdict_once() {
        let (store, challenge) = seeded().await;
        let submission = store
            .create_submission(new_submission(challenge.id, Uuid::new_v4()))
            .await
            .unwrap();
        store.claim_submission(submission.id).await.unwrap();

        let first = store
            .record_verdict(verdict_for(submission.id, VerdictStatus::Correct))
            .await
            .unwrap();
        let second = store
            .record_verdict(verdict_for(submission.id, VerdictStatus::Incorrect))
            .await
            .unwrap();

        let RecordOutcome::Recorded(stored) = first else {
            panic!("expected first verdict to be recorded");
        };
        assert_eq!(second, RecordOutcome::AlreadyRecorded(stored));

        let after = store.find_submission(submission.id).await.unwrap().unwrap();
        assert_eq!(after.state, SubmissionState::Completed);
    }

    #[tokio::test]
    async fn test_verdict_for_failed_submission_is_discarded() {
        let (store, challenge) = seeded().await;
        let submission = store
            .create_submission(new_submission(challenge.id, Uuid::new_v4()))
            .await
            .unwrap();
        store.claim_submission(submission.id).await.unwrap();
        store
            .fail_submission(submission.id, &FailureReason::Superseded)
            .await
            .unwrap();

        let outcome = store
            .record_verdict(verdict_for(submission.id, VerdictStatus::Correct))
            .await
            .unwrap();

        assert_eq!(outcome, RecordOutcome::NotRunning(SubmissionState::Failed));
        assert!(store.find_verdict(submission.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_terminal_submission_cannot_fail_again() {
        let (store, challenge) = seeded().await;
        let submission = store
            .create_submission(new_submission(challenge.id, Uuid::new_v4()))
            .await
            .unwrap();

        assert!(store.fail_submission(submission.id, &FailureReason::Stuck).await.unwrap());
        assert!(!store.fail_submission(submission.id, &FailureReason::Superseded).await.unwrap());

        let after = store.find_submission(submission.id).await.unwrap().unwrap();
        assert_eq!(after.failure_reason, Some(FailureReason::Stuck));
    }

    #[tokio::test]
    async fn test_solved_pairs_are_distinct() {
        let (store, challenge) = seeded().await;
        let user = Uuid::new_v4();

        for _ in 0..2 {
            let submission = store
                .create_submission(new_submission(challenge.id, user))
                .await
                .unwrap();
            store.claim_submission(submission.id).await.unwrap();
            store
                .record_verdict(verdict_for(submission.id, VerdictStatus::Correct))
                .await
                .unwrap();
        }

        let solved = store.list_solved().await.unwrap();
        assert_eq!(solved.len(), 1);
        assert_eq!(solved[0].difficulty, Difficulty::Medium);
    }
}
