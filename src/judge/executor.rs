//! Sandboxed executor
//!
//! Runs one submission's program against every test case of its challenge:
//! provision a session, syntax check once, then one run per case under a
//! wall-clock limit. A case that times out does not stop the others unless
//! the submission-wide budget is exhausted too, in which case every
//! remaining case is skipped.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::{
    config::JudgeConfig,
    constants::MAX_STORED_MESSAGE_CHARS,
    models::{CaseResult, Submission, TestCase},
};

use super::{
    compare::{describe_mismatch, outputs_match},
    languages::{parse_result_line, LanguageHandler},
    sandbox::{RunOutput, Sandbox, SandboxError, SandboxSession},
};

/// Time limits for one submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionLimits {
    /// Per-case limit when the test case declares none
    pub default_case_time_limit: Duration,
    /// Budget for all cases together
    pub submission_timeout: Duration,
}

impl From<&JudgeConfig> for ExecutionLimits {
    fn from(config: &JudgeConfig) -> Self {
        Self {
            default_case_time_limit: config.default_case_time_limit(),
            submission_timeout: config.submission_timeout(),
        }
    }
}

/// What the executor observed
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionOutcome {
    /// Syntax check failed; no case ran
    CompileError { output: String, case_count: usize },
    /// One result per test case, in test case order
    Ran(Vec<CaseResult>),
}

/// Reasons the executor produced no outcome
#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    #[error("sandbox provisioning failed: {0}")]
    Provision(String),

    #[error("sandbox failed during execution: {0}")]
    Sandbox(String),

    #[error("execution cancelled")]
    Cancelled,
}

impl From<SandboxError> for ExecutionError {
    fn from(err: SandboxError) -> Self {
        match err {
            SandboxError::Provision(message) => Self::Provision(message),
            SandboxError::Execution(message) => Self::Sandbox(message),
        }
    }
}

/// Runs submissions inside a sandbox
#[derive(Clone)]
pub struct Executor {
    sandbox: Arc<dyn Sandbox>,
}

impl Executor {
    pub fn new(sandbox: Arc<dyn Sandbox>) -> Self {
        Self { sandbox }
    }

    /// Judge `submission` against `test_cases`
    ///
    /// Aborts with [`ExecutionError::Cancelled`] between or during cases once
    /// `cancel` fires. The session is always cleaned up.
    pub async fn execute(
        &self,
        submission: &Submission,
        test_cases: &[TestCase],
        limits: ExecutionLimits,
        cancel: &CancellationToken,
    ) -> Result<ExecutionOutcome, ExecutionError> {
        let handler = LanguageHandler::for_language(submission.language);
        let program = handler.wrap(&submission.source_code);

        let mut session = tokio::select! {
            provisioned = self.sandbox.provision(submission.id, submission.language, &program) => provisioned?,
            _ = cancel.cancelled() => return Err(ExecutionError::Cancelled),
        };

        let outcome = run_session(session.as_mut(), test_cases, limits, cancel).await;

        if let Err(e) = session.cleanup().await {
            warn!(submission_id = %submission.id, error = %e, "Failed to clean up sandbox");
        }

        outcome
    }
}

async fn run_session(
    session: &mut dyn SandboxSession,
    test_cases: &[TestCase],
    limits: ExecutionLimits,
    cancel: &CancellationToken,
) -> Result<ExecutionOutcome, ExecutionError> {
    let checked = tokio::select! {
        checked = session.check() => checked?,
        _ = cancel.cancelled() => return Err(ExecutionError::Cancelled),
    };
    if !checked.success() {
        let output = format!("{}{}", checked.stdout, checked.stderr);
        return Ok(ExecutionOutcome::CompileError {
            output: truncate_message(output.trim()),
            case_count: test_cases.len(),
        });
    }

    let deadline = Instant::now() + limits.submission_timeout;
    let mut results = Vec::with_capacity(test_cases.len());

    for (index, case) in test_cases.iter().enumerate() {
        if cancel.is_cancelled() {
            return Err(ExecutionError::Cancelled);
        }

        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            results.extend((index..test_cases.len()).map(CaseResult::skipped));
            break;
        }

        let case_limit = case
            .time_limit_ms
            .map(Duration::from_millis)
            .unwrap_or(limits.default_case_time_limit);
        let budget = case_limit.min(remaining);

        let input = serde_json::to_string(&case.input)
            .map_err(|e| ExecutionError::Sandbox(format!("failed to encode input: {}", e)))?;

        let started = Instant::now();
        let run = tokio::select! {
            run = tokio::time::timeout(budget, session.run(&input, case_limit)) => run,
            _ = cancel.cancelled() => return Err(ExecutionError::Cancelled),
        };
        let runtime_ms = started.elapsed().as_millis() as u64;

        match run {
            Err(_elapsed) => {
                debug!(case = index, runtime_ms, "Test case timed out");
                results.push(CaseResult::timed_out(index, runtime_ms));

                // The submission budget ran out, not just this case's limit
                if budget < case_limit {
                    results.extend((index + 1..test_cases.len()).map(CaseResult::skipped));
                    break;
                }
            }
            Ok(output) => results.push(judge_case(index, case, &output?, runtime_ms)),
        }
    }

    Ok(ExecutionOutcome::Ran(results))
}

/// Classify one finished run
fn judge_case(index: usize, case: &TestCase, output: &RunOutput, runtime_ms: u64) -> CaseResult {
    if !output.success() {
        return CaseResult::runtime_error(index, runtime_ms, truncate_message(&output.failure_summary()));
    }

    match parse_result_line(&output.stdout) {
        Ok(actual) if outputs_match(&actual, &case.expected, case.tolerance) => {
            CaseResult::passed(index, runtime_ms)
        }
        Ok(actual) => CaseResult::failed(index, runtime_ms, describe_mismatch(&actual, &case.expected)),
        Err(e) => CaseResult::runtime_error(index, runtime_ms, e.to_string()),
    }
}

fn truncate_message(message: &str) -> String {
    if message.chars().count() <= MAX_STORED_MESSAGE_CHARS {
        message.to_string()
    } else {
        let cut: String = message.chars().take(MAX_STORED_MESSAGE_CHARS).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::RESULT_MARKER;
    use crate::judge::sandbox::MockSandbox;
    use crate::models::{CaseStatus, Language, NewSubmission};
    use async_trait::async_trait;
    use serde_json::json;
    use uuid::Uuid;

    /// Behaviour of the scripted program for every run
    #[derive(Clone, Copy)]
    enum Script {
        Return(i64),
        Throw,
        Hang,
        SyntaxError,
    }

    struct ScriptedSession(Script);

    #[async_trait]
    impl SandboxSession for ScriptedSession {
        async fn check(&mut self) -> Result<RunOutput, SandboxError> {
            Ok(match self.0 {
                Script::SyntaxError => RunOutput {
                    stderr: "SyntaxError: Unexpected token".to_string(),
                    exit_code: Some(1),
                    ..Default::default()
                },
                _ => RunOutput {
                    exit_code: Some(0),
                    ..Default::default()
                },
            })
        }

        async fn run(&mut self, _input: &str, _limit: Duration) -> Result<RunOutput, SandboxError> {
            match self.0 {
                Script::Return(value) => Ok(RunOutput {
                    stdout: format!("{}{}\n", RESULT_MARKER, value),
                    exit_code: Some(0),
                    ..Default::default()
                }),
                Script::Throw => Ok(RunOutput {
                    stderr: "Error: boom".to_string(),
                    exit_code: Some(1),
                    ..Default::default()
                }),
                Script::Hang => std::future::pending().await,
                Script::SyntaxError => unreachable!("syntax errors never run"),
            }
        }

        async fn cleanup(self: Box<Self>) -> Result<(), SandboxError> {
            Ok(())
        }
    }

    fn scripted(script: Script) -> Executor {
        let mut sandbox = MockSandbox::new();
        sandbox
            .expect_provision()
            .returning(move |_, _, _| Ok(Box::new(ScriptedSession(script))));
        Executor::new(Arc::new(sandbox))
    }

    fn submission() -> Submission {
        NewSubmission {
            challenge_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            language: Language::JavaScript,
            source_code: "function solution(input) { return input[0] + input[1]; }".to_string(),
        }
        .into_submission()
    }

    fn limits() -> ExecutionLimits {
        ExecutionLimits {
            default_case_time_limit: Duration::from_secs(2),
            submission_timeout: Duration::from_secs(20),
        }
    }

    fn two_plus_two() -> Vec<TestCase> {
        vec![TestCase::new(json!([2, 2]), json!(4))]
    }

    async fn run(script: Script, cases: &[TestCase], limits: ExecutionLimits) -> ExecutionOutcome {
        scripted(script)
            .execute(&submission(), cases, limits, &CancellationToken::new())
            .await
            .unwrap()
    }

    fn statuses(outcome: &ExecutionOutcome) -> Vec<CaseStatus> {
        match outcome {
            ExecutionOutcome::Ran(results) => results.iter().map(|r| r.status).collect(),
            other => panic!("expected cases to run, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_correct_and_wrong_answers() {
        let outcome = run(Script::Return(4), &two_plus_two(), limits()).await;
        assert_eq!(statuses(&outcome), vec![CaseStatus::Passed]);

        let outcome = run(Script::Return(5), &two_plus_two(), limits()).await;
        assert_eq!(statuses(&outcome), vec![CaseStatus::Failed]);
        let ExecutionOutcome::Ran(results) = outcome else { unreachable!() };
        assert_eq!(results[0].message.as_deref(), Some("expected 4, got 5"));
    }

    #[tokio::test]
    async fn test_crash_is_runtime_error() {
        let outcome = run(Script::Throw, &two_plus_two(), limits()).await;
        assert_eq!(statuses(&outcome), vec![CaseStatus::RuntimeError]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hang_times_out_at_case_limit() {
        let outcome = run(Script::Hang, &two_plus_two(), limits()).await;

        let ExecutionOutcome::Ran(results) = outcome else {
            panic!("expected cases to run");
        };
        assert_eq!(results[0].status, CaseStatus::TimedOut);
        assert!((2000..2050).contains(&results[0].runtime_ms));
    }

    #[tokio::test(start_paused = true)]
    async fn test_case_timeouts_continue_within_budget() {
        let cases = vec![
            TestCase::new(json!(1), json!(1)).with_time_limit_ms(100),
            TestCase::new(json!(2), json!(2)).with_time_limit_ms(100),
        ];
        let outcome = run(Script::Hang, &cases, limits()).await;

        assert_eq!(
            statuses(&outcome),
            vec![CaseStatus::TimedOut, CaseStatus::TimedOut]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_budget_skips_remaining_cases() {
        let cases: Vec<_> = (0..4).map(|i| TestCase::new(json!(i), json!(i))).collect();
        let tight = ExecutionLimits {
            default_case_time_limit: Duration::from_secs(2),
            submission_timeout: Duration::from_secs(3),
        };

        let outcome = run(Script::Hang, &cases, tight).await;

        assert_eq!(
            statuses(&outcome),
            vec![
                CaseStatus::TimedOut,
                CaseStatus::TimedOut,
                CaseStatus::Skipped,
                CaseStatus::Skipped
            ]
        );
    }

    #[tokio::test]
    async fn test_syntax_error_runs_no_case() {
        let outcome = run(Script::SyntaxError, &two_plus_two(), limits()).await;

        assert_eq!(
            outcome,
            ExecutionOutcome::CompileError {
                output: "SyntaxError: Unexpected token".to_string(),
                case_count: 1,
            }
        );
    }

    #[tokio::test]
    async fn test_provision_failure_surfaces() {
        let mut sandbox = MockSandbox::new();
        sandbox
            .expect_provision()
            .times(1)
            .returning(|_, _, _| Err(SandboxError::Provision("image not found".to_string())));
        let executor = Executor::new(Arc::new(sandbox));

        let err = executor
            .execute(&submission(), &two_plus_two(), limits(), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, ExecutionError::Provision(m) if m == "image not found"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_aborts_running_case() {
        let executor = scripted(Script::Hang);
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(500)).await;
            trigger.cancel();
        });

        let err = executor
            .execute(&submission(), &two_plus_two(), limits(), &cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, ExecutionError::Cancelled));
    }

    #[test]
    fn test_truncate_message() {
        let long = "e".repeat(MAX_STORED_MESSAGE_CHARS + 1);
        assert!(truncate_message(&long).ends_with("..."));
        assert_eq!(truncate_message("short"), "short");
    }
}
