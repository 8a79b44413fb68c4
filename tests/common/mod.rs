//! Shared fixtures for integration tests
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::broadcast;
use uuid::Uuid;

use challenge_judge::{
    config::JudgeConfig,
    constants::RESULT_MARKER,
    db::{JudgeStore, MemoryStore},
    judge::{JudgeEvent, Notifier, Pipeline, RunOutput, Sandbox, SandboxError, SandboxSession},
    models::{Challenge, Difficulty, Language, NewChallenge, TestCase},
};

/// Sandbox that interprets a few recognisable snippets instead of running code
///
/// - `SYNTAX ERROR` fails the syntax check
/// - `while (true)` never returns
/// - `throw new Error` exits non-zero
/// - `return <n>` prints `n` as the result
pub struct ScriptedSandbox;

#[async_trait]
impl Sandbox for ScriptedSandbox {
    async fn provision(
        &self,
        _submission_id: Uuid,
        _language: Language,
        program: &str,
    ) -> Result<Box<dyn SandboxSession>, SandboxError> {
        Ok(Box::new(ScriptedSession {
            program: program.to_string(),
        }))
    }
}

struct ScriptedSession {
    program: String,
}

#[async_trait]
impl SandboxSession for ScriptedSession {
    async fn check(&mut self) -> Result<RunOutput, SandboxError> {
        if self.program.contains("SYNTAX ERROR") {
            return Ok(RunOutput {
                stderr: "SyntaxError: Unexpected identifier".to_string(),
                exit_code: Some(1),
                ..Default::default()
            });
        }
        Ok(RunOutput {
            exit_code: Some(0),
            ..Default::default()
        })
    }

    async fn run(&mut self, _input: &str, _limit: Duration) -> Result<RunOutput, SandboxError> {
        if self.program.contains("while (true)") {
            std::future::pending::<()>().await;
        }
        if self.program.contains("throw new Error") {
            return Ok(RunOutput {
                stderr: "Error: boom".to_string(),
                exit_code: Some(1),
                ..Default::default()
            });
        }

        let value: String = self
            .program
            .split_once("return ")
            .map(|(_, rest)| rest.chars().take_while(|c| c.is_ascii_digit()).collect())
            .unwrap_or_default();

        Ok(RunOutput {
            stdout: format!("{}{}\n", RESULT_MARKER, if value.is_empty() { "null" } else { value.as_str() }),
            exit_code: Some(0),
            ..Default::default()
        })
    }

    async fn cleanup(self: Box<Self>) -> Result<(), SandboxError> {
        Ok(())
    }
}

/// Sandbox whose provisioning always fails
pub struct BrokenSandbox;

#[async_trait]
impl Sandbox for BrokenSandbox {
    async fn provision(
        &self,
        _submission_id: Uuid,
        _language: Language,
        _program: &str,
    ) -> Result<Box<dyn SandboxSession>, SandboxError> {
        Err(SandboxError::Provision("docker daemon unreachable".to_string()))
    }
}

pub fn judge_config() -> JudgeConfig {
    JudgeConfig {
        worker_count: 2,
        default_case_time_limit_ms: 2_000,
        submission_timeout_ms: 20_000,
        ..Default::default()
    }
}

pub struct Fixture {
    pub store: Arc<MemoryStore>,
    pub pipeline: Pipeline,
    pub events: broadcast::Receiver<JudgeEvent>,
}

pub fn fixture(sandbox: Arc<dyn Sandbox>) -> Fixture {
    let store = Arc::new(MemoryStore::new());
    let notifier = Notifier::new();
    let events = notifier.subscribe();
    let pipeline = Pipeline::new(store.clone(), sandbox, notifier, judge_config());
    Fixture {
        store,
        pipeline,
        events,
    }
}

/// Publish the `{2+2 -> 4}` challenge
pub async fn add_challenge(store: &dyn JudgeStore) -> Challenge {
    store
        .create_challenge(NewChallenge {
            title: "Add two numbers".to_string(),
            difficulty: Difficulty::Easy,
            description: "Return the sum of the two numbers".to_string(),
            tags: vec!["math".to_string()],
            solution_template: "function solution(input) {\n}\n".to_string(),
            test_cases: vec![TestCase::new(json!([2, 2]), json!(4))],
            sample_count: 1,
            is_ai_generated: false,
            author_id: None,
        })
        .await
        .unwrap()
}

/// Wait for the next event about `submission_id`
pub async fn next_event_for(
    events: &mut broadcast::Receiver<JudgeEvent>,
    submission_id: Uuid,
) -> JudgeEvent {
    tokio::time::timeout(Duration::from_secs(60), async {
        loop {
            let event = events.recv().await.unwrap();
            if event.submission_id == submission_id {
                return event;
            }
        }
    })
    .await
    .expect("no judge event before the deadline")
}
