//! Isolated execution environments
//!
//! A [`Sandbox`] provisions one [`SandboxSession`] per submission. The
//! session holds the wrapped program, runs the syntax check once, then runs
//! the program once per test case. Sessions must be cleaned up explicitly.

pub mod docker;
pub mod process;

use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    constants::{MAX_CAPTURED_OUTPUT_BYTES, RESULT_MARKER},
    models::Language,
};

pub use docker::DockerSandbox;
pub use process::ProcessSandbox;

/// Captured result of one process run inside a sandbox
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOutput {
    pub stdout: String,
    pub stderr: String,
    /// `None` when the process was killed by a signal
    pub exit_code: Option<i64>,
}

impl RunOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Short description of an unsuccessful run
    pub fn failure_summary(&self) -> String {
        let status = match self.exit_code {
            Some(code) => format!("exited with status {}", code),
            None => "killed by signal".to_string(),
        };
        let detail = self.stderr.trim();
        if detail.is_empty() {
            status
        } else {
            format!("{}: {}", status, detail)
        }
    }
}

/// Sandbox failures
///
/// Provisioning failures are infrastructure problems; the submission is
/// failed and may be retried. Execution failures happen after provisioning
/// (the sandbox itself broke, not the candidate code).
#[derive(Debug, thiserror::Error)]
pub enum SandboxError {
    #[error("sandbox provisioning failed: {0}")]
    Provision(String),

    #[error("sandbox execution failed: {0}")]
    Execution(String),
}

/// Isolation backend
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Sandbox: Send + Sync {
    /// Create an isolated session holding `program`
    async fn provision(
        &self,
        submission_id: Uuid,
        language: Language,
        program: &str,
    ) -> Result<Box<dyn SandboxSession>, SandboxError>;
}

/// One submission's isolated environment
#[async_trait]
pub trait SandboxSession: Send {
    /// Syntax check the program; a non-zero exit is a compile error
    async fn check(&mut self) -> Result<RunOutput, SandboxError>;

    /// Run the program with `input` on stdin
    ///
    /// `time_limit` is enforced by the caller too; backends use it to kill
    /// what the caller cannot reach (processes inside a container).
    async fn run(&mut self, input: &str, time_limit: Duration) -> Result<RunOutput, SandboxError>;

    /// Tear down the environment
    async fn cleanup(self: Box<Self>) -> Result<(), SandboxError>;
}

/// Decode captured bytes, keeping at most [`MAX_CAPTURED_OUTPUT_BYTES`]
pub(crate) fn capture_output(bytes: &[u8]) -> String {
    let kept = &bytes[..bytes.len().min(MAX_CAPTURED_OUTPUT_BYTES)];
    String::from_utf8_lossy(kept).into_owned()
}

/// Like [`capture_output`], but the last result line always survives
///
/// The harness prints the result after everything the candidate logged, so
/// a plain cut would drop it from chatty solutions.
pub(crate) fn capture_stdout(bytes: &[u8]) -> String {
    if bytes.len() <= MAX_CAPTURED_OUTPUT_BYTES {
        return String::from_utf8_lossy(bytes).into_owned();
    }

    let marker = RESULT_MARKER.as_bytes();
    let Some(start) = bytes.windows(marker.len()).rposition(|w| w == marker) else {
        return capture_output(bytes);
    };

    let tail = &bytes[start..];
    let head_len = MAX_CAPTURED_OUTPUT_BYTES
        .saturating_sub(tail.len() + 1)
        .min(start);

    let mut kept = Vec::with_capacity(head_len + 1 + tail.len());
    kept.extend_from_slice(&bytes[..head_len]);
    kept.push(b'\n');
    kept.extend_from_slice(tail);
    String::from_utf8_lossy(&kept).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_summary() {
        let crashed = RunOutput {
            stdout: String::new(),
            stderr: "TypeError: x is undefined\n".to_string(),
            exit_code: Some(1),
        };
        assert_eq!(
            crashed.failure_summary(),
            "exited with status 1: TypeError: x is undefined"
        );

        let killed = RunOutput {
            exit_code: None,
            ..Default::default()
        };
        assert_eq!(killed.failure_summary(), "killed by signal");
    }

    #[test]
    fn test_capture_stdout_keeps_result_line_of_chatty_run() {
        let mut stdout = vec![b'x'; MAX_CAPTURED_OUTPUT_BYTES + 100 * 1024];
        stdout.extend_from_slice(format!("\n{}4\n", RESULT_MARKER).as_bytes());

        let captured = capture_stdout(&stdout);

        assert!(captured.len() <= MAX_CAPTURED_OUTPUT_BYTES);
        assert_eq!(
            crate::judge::languages::parse_result_line(&captured),
            Ok(serde_json::json!(4))
        );
    }

    #[test]
    fn test_capture_stdout_without_marker_truncates() {
        let big = vec![b'a'; MAX_CAPTURED_OUTPUT_BYTES + 10];
        assert_eq!(capture_stdout(&big).len(), MAX_CAPTURED_OUTPUT_BYTES);

        let small = format!("hello\n{}[1]\n", RESULT_MARKER);
        assert_eq!(capture_stdout(small.as_bytes()), small);
    }

    #[test]
    fn test_capture_output_truncates() {
        let big = vec![b'a'; MAX_CAPTURED_OUTPUT_BYTES + 10];
        assert_eq!(capture_output(&big).len(), MAX_CAPTURED_OUTPUT_BYTES);
    }
}
