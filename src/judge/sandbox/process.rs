//! Local process sandbox backend
//!
//! Runs the program as a child process in a fresh temporary directory with a
//! cleared environment and resource limits applied before `exec`. This is
//! weaker isolation than containers (no network or filesystem namespace) and
//! is meant for development machines that have `node` and `python3`
//! installed but no Docker daemon.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;
use tokio::{io::AsyncWriteExt, process::Command};
use tracing::debug;
use uuid::Uuid;

use crate::{
    config::SandboxConfig,
    constants::SANDBOX_FILE_SIZE_LIMIT_BYTES,
    judge::languages::LanguageHandler,
    models::Language,
};

use super::{capture_output, capture_stdout, RunOutput, Sandbox, SandboxError, SandboxSession};

const SAFE_PATH: &str = "/usr/local/bin:/usr/bin:/bin";

/// Resource ceilings applied to every child
#[derive(Debug, Clone, Copy)]
struct ProcessLimits {
    /// Address space in bytes, when the runtime tolerates it
    address_space: Option<u64>,
    cpu_seconds: u64,
    file_size: u64,
    processes: u64,
}

/// Sandbox running programs as local child processes
#[derive(Debug, Clone)]
pub struct ProcessSandbox {
    config: SandboxConfig,
}

impl ProcessSandbox {
    pub fn new(config: SandboxConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Sandbox for ProcessSandbox {
    async fn provision(
        &self,
        submission_id: Uuid,
        language: Language,
        program: &str,
    ) -> Result<Box<dyn SandboxSession>, SandboxError> {
        let workdir = tempfile::Builder::new()
            .prefix(&format!("judge-{}-", submission_id))
            .tempdir()
            .map_err(|e| SandboxError::Provision(format!("failed to create scratch dir: {}", e)))?;

        let handler = LanguageHandler::for_language(language);
        tokio::fs::write(workdir.path().join(handler.source_file()), program)
            .await
            .map_err(|e| SandboxError::Provision(format!("failed to write program: {}", e)))?;

        debug!(submission_id = %submission_id, path = %workdir.path().display(), "Scratch directory ready");

        Ok(Box::new(ProcessSession {
            workdir,
            handler,
            memory_limit_mb: self.config.memory_limit_mb,
            pids_limit: self.config.pids_limit.max(1) as u64,
        }))
    }
}

/// One submission's scratch directory
struct ProcessSession {
    workdir: TempDir,
    handler: LanguageHandler,
    memory_limit_mb: u64,
    pids_limit: u64,
}

impl ProcessSession {
    fn limits(&self, time_limit: Duration) -> ProcessLimits {
        let address_space = self
            .handler
            .limits_address_space()
            .then(|| self.memory_limit_mb * 1024 * 1024);

        ProcessLimits {
            address_space,
            // CPU limit is a backstop for the wall-clock timeout
            cpu_seconds: time_limit.as_secs() + 1,
            file_size: SANDBOX_FILE_SIZE_LIMIT_BYTES,
            processes: self.pids_limit,
        }
    }

    async fn spawn(
        &self,
        args: &[String],
        stdin: Option<&str>,
        limits: ProcessLimits,
    ) -> Result<RunOutput, SandboxError> {
        let (program, rest) = args
            .split_first()
            .ok_or_else(|| SandboxError::Execution("empty command".to_string()))?;

        let mut cmd = Command::new(program);
        cmd.args(rest)
            .current_dir(self.workdir.path())
            .env_clear()
            .env("PATH", SAFE_PATH)
            .env("HOME", self.workdir.path())
            .env("LANG", "C.UTF-8")
            .stdin(if stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        apply_limits(&mut cmd, limits);

        let mut child = cmd
            .spawn()
            .map_err(|e| SandboxError::Execution(format!("failed to start {}: {}", program, e)))?;

        if let Some(input) = stdin {
            if let Some(mut pipe) = child.stdin.take() {
                // A program that exits without reading its input closes the pipe
                if let Err(e) = pipe.write_all(input.as_bytes()).await {
                    debug!(error = %e, "Child closed stdin early");
                }
            }
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| SandboxError::Execution(format!("failed to wait for child: {}", e)))?;

        Ok(RunOutput {
            stdout: capture_stdout(&output.stdout),
            stderr: capture_output(&output.stderr),
            exit_code: output.status.code().map(i64::from),
        })
    }
}

#[async_trait]
impl SandboxSession for ProcessSession {
    async fn check(&mut self) -> Result<RunOutput, SandboxError> {
        let limits = self.limits(Duration::from_secs(10));
        self.spawn(&self.handler.check_command(), None, limits).await
    }

    async fn run(&mut self, input: &str, time_limit: Duration) -> Result<RunOutput, SandboxError> {
        let limits = self.limits(time_limit);
        let args = self.handler.run_command(self.memory_limit_mb);
        self.spawn(&args, Some(input), limits).await
    }

    async fn cleanup(self: Box<Self>) -> Result<(), SandboxError> {
        self.workdir
            .close()
            .map_err(|e| SandboxError::Execution(format!("failed to remove scratch dir: {}", e)))
    }
}

#[cfg(unix)]
fn apply_limits(cmd: &mut Command, limits: ProcessLimits) {
    use nix::sys::resource::{setrlimit, Resource};

    let set = |resource: Resource, value: u64| {
        setrlimit(resource, value, value)
            .map_err(|e| std::io::Error::other(format!("setrlimit failed: {}", e)))
    };

    // SAFETY: the closure only calls setrlimit, which is async-signal-safe
    unsafe {
        cmd.pre_exec(move || {
            if let Some(bytes) = limits.address_space {
                set(Resource::RLIMIT_AS, bytes)?;
            }
            set(Resource::RLIMIT_CPU, limits.cpu_seconds)?;
            set(Resource::RLIMIT_FSIZE, limits.file_size)?;
            set(Resource::RLIMIT_CORE, 0)?;
            #[cfg(any(target_os = "linux", target_os = "android"))]
            set(Resource::RLIMIT_NPROC, limits.processes)?;
            Ok(())
        });
    }
}

#[cfg(not(unix))]
fn apply_limits(_cmd: &mut Command, _limits: ProcessLimits) {}
