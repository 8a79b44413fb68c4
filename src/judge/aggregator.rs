//! Result aggregation
//!
//! Folds per-case results into a [`Verdict`], records it exactly once and
//! notifies the submitter.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    db::{JudgeStore, RecordOutcome},
    error::AppResult,
    models::{CaseResult, FailureReason, Submission, Verdict, VerdictStatus},
};

use super::{
    executor::ExecutionOutcome,
    notifier::{EventOutcome, JudgeEvent, Notifier},
};

/// Build the verdict for an execution outcome
///
/// Correct iff every case passed; otherwise the first non-passing case in
/// test case order decides the status. A compile error marks every case
/// skipped.
pub fn aggregate(submission_id: Uuid, outcome: &ExecutionOutcome) -> Verdict {
    let (status, cases, compile_output) = match outcome {
        ExecutionOutcome::CompileError { output, case_count } => (
            VerdictStatus::CompileError,
            (0..*case_count).map(CaseResult::skipped).collect(),
            Some(output.clone()),
        ),
        ExecutionOutcome::Ran(cases) => {
            let status = cases
                .iter()
                .find_map(|case| case.status.verdict_status())
                .unwrap_or(VerdictStatus::Correct);
            (status, cases.clone(), None)
        }
    };

    Verdict {
        submission_id,
        status,
        runtime_ms: cases.iter().map(|case| case.runtime_ms).sum(),
        passed: cases.iter().filter(|case| case.is_passed()).count(),
        total: cases.len(),
        cases,
        compile_output,
        created_at: Utc::now(),
    }
}

/// Records terminal outcomes and emits notifications
#[derive(Clone)]
pub struct Aggregator {
    store: Arc<dyn JudgeStore>,
    notifier: Notifier,
}

impl Aggregator {
    pub fn new(store: Arc<dyn JudgeStore>, notifier: Notifier) -> Self {
        Self { store, notifier }
    }

    /// Record the verdict for a judged submission
    ///
    /// Idempotent: when a verdict already exists it is returned unchanged and
    /// no second notification goes out. Returns `None` when the submission
    /// left Running before the verdict could be recorded.
    pub async fn finalize(
        &self,
        submission: &Submission,
        outcome: &ExecutionOutcome,
    ) -> AppResult<Option<Verdict>> {
        let verdict = aggregate(submission.id, outcome);

        match self.store.record_verdict(verdict).await? {
            RecordOutcome::Recorded(verdict) => {
                info!(
                    submission_id = %submission.id,
                    user_id = %submission.user_id,
                    status = %verdict.status,
                    passed = verdict.passed,
                    total = verdict.total,
                    runtime_ms = verdict.runtime_ms,
                    "Verdict recorded"
                );
                self.notifier
                    .notify(JudgeEvent {
                        submission_id: submission.id,
                        user_id: submission.user_id,
                        challenge_id: submission.challenge_id,
                        outcome: EventOutcome::VerdictReady {
                            verdict: verdict.clone(),
                        },
                    })
                    .await;
                Ok(Some(verdict))
            }
            RecordOutcome::AlreadyRecorded(verdict) => Ok(Some(verdict)),
            RecordOutcome::NotRunning(state) => {
                warn!(
                    submission_id = %submission.id,
                    state = %state,
                    "Discarding verdict for submission that is no longer running"
                );
                Ok(None)
            }
        }
    }

    /// Move a submission to Failed and notify; `false` when already terminal
    pub async fn fail(&self, submission: &Submission, reason: FailureReason) -> AppResult<bool> {
        if !self.store.fail_submission(submission.id, &reason).await? {
            return Ok(false);
        }

        info!(
            submission_id = %submission.id,
            user_id = %submission.user_id,
            reason = %reason,
            "Submission failed"
        );
        self.notifier
            .notify(JudgeEvent {
                submission_id: submission.id,
                user_id: submission.user_id,
                challenge_id: submission.challenge_id,
                outcome: EventOutcome::Failed { reason },
            })
            .await;

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::models::{
        CaseStatus, Difficulty, Language, NewChallenge, NewSubmission, SubmissionState, TestCase,
    };
    use serde_json::json;

    fn ran(cases: Vec<CaseResult>) -> ExecutionOutcome {
        ExecutionOutcome::Ran(cases)
    }

    #[test]
    fn test_all_passed_is_correct() {
        let verdict = aggregate(
            Uuid::new_v4(),
            &ran(vec![CaseResult::passed(0, 10), CaseResult::passed(1, 15)]),
        );

        assert_eq!(verdict.status, VerdictStatus::Correct);
        assert_eq!((verdict.passed, verdict.total), (2, 2));
        assert_eq!(verdict.runtime_ms, 25);
    }

    #[test]
    fn test_first_non_pass_decides() {
        let verdict = aggregate(
            Uuid::new_v4(),
            &ran(vec![
                CaseResult::passed(0, 1),
                CaseResult::timed_out(1, 2000),
                CaseResult::failed(2, 3, "expected 1, got 2"),
            ]),
        );
        assert_eq!(verdict.status, VerdictStatus::TimedOut);
        assert_eq!(verdict.passed, 1);

        let verdict = aggregate(
            Uuid::new_v4(),
            &ran(vec![
                CaseResult::runtime_error(0, 1, "boom"),
                CaseResult::failed(1, 1, "expected 1, got 2"),
            ]),
        );
        assert_eq!(verdict.status, VerdictStatus::RuntimeError);
    }

    #[test]
    fn test_skipped_counts_as_timed_out() {
        let verdict = aggregate(
            Uuid::new_v4(),
            &ran(vec![CaseResult::passed(0, 1), CaseResult::skipped(1)]),
        );
        assert_eq!(verdict.status, VerdictStatus::TimedOut);
    }

    #[test]
    fn test_compile_error_skips_every_case() {
        let verdict = aggregate(
            Uuid::new_v4(),
            &ExecutionOutcome::CompileError {
                output: "SyntaxError".to_string(),
                case_count: 3,
            },
        );

        assert_eq!(verdict.status, VerdictStatus::CompileError);
        assert_eq!(verdict.total, 3);
        assert!(verdict.cases.iter().all(|c| c.status == CaseStatus::Skipped));
        assert_eq!(verdict.compile_output.as_deref(), Some("SyntaxError"));
    }

    #[test]
    fn test_aggregation_is_deterministic() {
        let id = Uuid::new_v4();
        let outcome = ran(vec![CaseResult::passed(0, 4), CaseResult::failed(1, 5, "x")]);

        let (first, second) = (aggregate(id, &outcome), aggregate(id, &outcome));

        assert_eq!(first.status, second.status);
        assert_eq!(first.cases, second.cases);
        assert_eq!(first.runtime_ms, second.runtime_ms);
    }

    async fn running_submission(store: &MemoryStore) -> Submission {
        let challenge = store
            .create_challenge(NewChallenge {
                title: "Add".to_string(),
                difficulty: Difficulty::Easy,
                description: String::new(),
                tags: vec![],
                solution_template: String::new(),
                test_cases: vec![TestCase::new(json!([2, 2]), json!(4))],
                sample_count: 1,
                is_ai_generated: false,
                author_id: None,
            })
            .await
            .unwrap();
        let submission = store
            .create_submission(NewSubmission {
                challenge_id: challenge.id,
                user_id: Uuid::new_v4(),
                language: Language::JavaScript,
                source_code: "function solution(i) { return 4; }".to_string(),
            })
            .await
            .unwrap();
        store.claim_submission(submission.id).await.unwrap().unwrap()
    }

    #[tokio::test]
    async fn test_finalize_records_once_and_notifies_once() {
        let store = Arc::new(MemoryStore::new());
        let notifier = Notifier::new();
        let mut events = notifier.subscribe();
        let aggregator = Aggregator::new(store.clone(), notifier);

        let submission = running_submission(&store).await;
        let outcome = ran(vec![CaseResult::passed(0, 3)]);

        let first = aggregator.finalize(&submission, &outcome).await.unwrap().unwrap();
        let second = aggregator.finalize(&submission, &outcome).await.unwrap().unwrap();

        assert_eq!(first, second);
        assert_eq!(first.status, VerdictStatus::Correct);
        assert!(events.try_recv().is_ok());
        assert!(events.try_recv().is_err());

        let stored = store.find_submission(submission.id).await.unwrap().unwrap();
        assert_eq!(stored.state, SubmissionState::Completed);
    }

    #[tokio::test]
    async fn test_fail_is_terminal() {
        let store = Arc::new(MemoryStore::new());
        let aggregator = Aggregator::new(store.clone(), Notifier::new());
        let submission = running_submission(&store).await;

        assert!(aggregator
            .fail(&submission, FailureReason::SandboxProvision("no image".to_string()))
            .await
            .unwrap());
        assert!(!aggregator.fail(&submission, FailureReason::Stuck).await.unwrap());

        // A late verdict is discarded
        let late = aggregator
            .finalize(&submission, &ran(vec![CaseResult::passed(0, 1)]))
            .await
            .unwrap();
        assert_eq!(late, None);
    }
}
