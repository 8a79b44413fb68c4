//! Docker sandbox backend
//!
//! One container per submission: no network, memory ceiling with swap equal
//! to memory, CPU quota and a process limit. `/workspace` is the only
//! scratch area the program writes to. Files are streamed into `cat` over
//! the stdin of an `exec`, so their size is not bounded by argv limits.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use bollard::{
    container::LogOutput,
    exec::{CreateExecOptions, StartExecResults},
    models::{ContainerCreateBody, HostConfig},
    query_parameters::{CreateContainerOptionsBuilder, RemoveContainerOptionsBuilder},
    Docker,
};
use futures::StreamExt;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
    config::SandboxConfig,
    judge::languages::LanguageHandler,
    models::Language,
};

use super::{capture_output, capture_stdout, RunOutput, Sandbox, SandboxError, SandboxSession};

const WORKDIR: &str = "/workspace";
const INPUT_FILE: &str = "/workspace/input.json";

/// Grace added to the in-container kill timer on top of the case limit
const KILL_GRACE: Duration = Duration::from_millis(500);

/// Docker-backed sandbox
#[derive(Clone)]
pub struct DockerSandbox {
    docker: Docker,
    config: SandboxConfig,
}

impl DockerSandbox {
    pub fn new(docker: Docker, config: SandboxConfig) -> Self {
        Self { docker, config }
    }

    /// Connect to the local Docker daemon and verify it answers
    pub async fn connect(config: SandboxConfig) -> Result<Self, bollard::errors::Error> {
        let docker = Docker::connect_with_socket_defaults()?;
        let version = docker.version().await?;
        tracing::info!(
            "Connected to Docker version: {}",
            version.version.unwrap_or_default()
        );
        Ok(Self::new(docker, config))
    }

    fn image_for(&self, language: Language) -> &str {
        match language {
            Language::JavaScript => &self.config.javascript_image,
            Language::Python => &self.config.python_image,
        }
    }

    fn host_config(&self) -> HostConfig {
        let memory_bytes = (self.config.memory_limit_mb * 1024 * 1024) as i64;
        let cpu_period: i64 = 100_000;

        HostConfig {
            memory: Some(memory_bytes),
            memory_swap: Some(memory_bytes),
            cpu_period: Some(cpu_period),
            cpu_quota: Some((cpu_period as f64 * self.config.cpu_limit) as i64),
            network_mode: Some("none".to_string()),
            pids_limit: Some(self.config.pids_limit),
            readonly_rootfs: Some(false),
            ..Default::default()
        }
    }

    async fn create_container(
        &self,
        submission_id: Uuid,
        language: Language,
    ) -> Result<String, bollard::errors::Error> {
        let container_name = format!("judge-{}", submission_id);

        let options = CreateContainerOptionsBuilder::default()
            .name(&container_name)
            .build();

        let body = ContainerCreateBody {
            image: Some(self.image_for(language).to_string()),
            tty: Some(true),
            open_stdin: Some(true),
            host_config: Some(self.host_config()),
            working_dir: Some(WORKDIR.to_string()),
            env: Some(vec!["LANG=C.UTF-8".to_string()]),
            labels: Some(HashMap::from([(
                "judge.submission".to_string(),
                submission_id.to_string(),
            )])),
            ..Default::default()
        };

        let container = self.docker.create_container(Some(options), body).await?;

        self.docker
            .start_container(
                &container.id,
                None::<bollard::query_parameters::StartContainerOptions>,
            )
            .await?;

        Ok(container.id)
    }
}

#[async_trait]
impl Sandbox for DockerSandbox {
    async fn provision(
        &self,
        submission_id: Uuid,
        language: Language,
        program: &str,
    ) -> Result<Box<dyn SandboxSession>, SandboxError> {
        let container_id = self
            .create_container(submission_id, language)
            .await
            .map_err(|e| SandboxError::Provision(e.to_string()))?;

        debug!(submission_id = %submission_id, container_id = %container_id, "Container started");

        let session = DockerSession {
            docker: self.docker.clone(),
            container_id,
            handler: LanguageHandler::for_language(language),
            memory_limit_mb: self.config.memory_limit_mb,
        };

        let path = format!("{}/{}", WORKDIR, session.handler.source_file());
        let written = session.write_file(&path, program.as_bytes()).await;
        if let Err(e) = written {
            // Do not leak the container when the copy fails
            let message = e.to_string();
            if let Err(cleanup_err) = Box::new(session).cleanup().await {
                warn!(error = %cleanup_err, "Failed to remove container after provisioning error");
            }
            return Err(SandboxError::Provision(message));
        }

        Ok(Box::new(session))
    }
}

/// A running container holding one submission
struct DockerSession {
    docker: Docker,
    container_id: String,
    handler: LanguageHandler,
    memory_limit_mb: u64,
}

impl DockerSession {
    /// Write a file into the container
    async fn write_file(&self, path: &str, content: &[u8]) -> Result<(), SandboxError> {
        let output = self.exec(&write_command(path), Some(content)).await?;
        if !output.success() {
            return Err(SandboxError::Execution(format!(
                "failed to write {}: {}",
                path,
                output.failure_summary()
            )));
        }

        Ok(())
    }

    /// Execute a shell command in the container
    async fn exec_shell(&self, cmd: &str) -> Result<RunOutput, SandboxError> {
        self.exec(cmd, None).await
    }

    /// Execute a shell command, feeding `stdin` to it when given
    async fn exec(&self, cmd: &str, stdin: Option<&[u8]>) -> Result<RunOutput, SandboxError> {
        let exec = self
            .docker
            .create_exec(
                &self.container_id,
                CreateExecOptions {
                    cmd: Some(vec!["/bin/sh", "-c", cmd]),
                    attach_stdin: Some(stdin.is_some()),
                    attach_stdout: Some(true),
                    attach_stderr: Some(true),
                    working_dir: Some(WORKDIR),
                    ..Default::default()
                },
            )
            .await
            .map_err(docker_error)?;

        let started = self
            .docker
            .start_exec(&exec.id, None)
            .await
            .map_err(docker_error)?;

        let mut stdout = Vec::new();
        let mut stderr = Vec::new();

        if let StartExecResults::Attached { mut output, mut input } = started {
            if let Some(bytes) = stdin {
                input.write_all(bytes).await.map_err(stdin_error)?;
                // EOF for the command reading stdin
                input.shutdown().await.map_err(stdin_error)?;
            }

            while let Some(msg) = output.next().await {
                match msg.map_err(docker_error)? {
                    LogOutput::StdOut { message } | LogOutput::Console { message } => {
                        stdout.extend_from_slice(&message);
                    }
                    LogOutput::StdErr { message } => {
                        stderr.extend_from_slice(&message);
                    }
                    _ => {}
                }
            }
        }

        let inspect = self
            .docker
            .inspect_exec(&exec.id)
            .await
            .map_err(docker_error)?;

        Ok(RunOutput {
            stdout: capture_stdout(&stdout),
            stderr: capture_output(&stderr),
            exit_code: normalize_exit_code(inspect.exit_code),
        })
    }
}

#[async_trait]
impl SandboxSession for DockerSession {
    async fn check(&mut self) -> Result<RunOutput, SandboxError> {
        self.exec_shell(&shell_join(&self.handler.check_command())).await
    }

    async fn run(&mut self, input: &str, time_limit: Duration) -> Result<RunOutput, SandboxError> {
        self.write_file(INPUT_FILE, input.as_bytes()).await?;

        // Whole seconds: busybox `timeout` may lack fractional support
        let kill_after = (time_limit + KILL_GRACE).as_secs_f64().ceil() as u64;
        let cmd = format!(
            "timeout -s KILL {} {} < {}",
            kill_after,
            shell_join(&self.handler.run_command(self.memory_limit_mb)),
            INPUT_FILE
        );

        self.exec_shell(&cmd).await
    }

    async fn cleanup(self: Box<Self>) -> Result<(), SandboxError> {
        let options = RemoveContainerOptionsBuilder::default().force(true).build();

        self.docker
            .remove_container(&self.container_id, Some(options))
            .await
            .map_err(docker_error)
    }
}

fn docker_error(err: bollard::errors::Error) -> SandboxError {
    SandboxError::Execution(err.to_string())
}

fn stdin_error(err: std::io::Error) -> SandboxError {
    SandboxError::Execution(format!("failed to stream stdin: {}", err))
}

/// Shell command storing its stdin at `path`
fn write_command(path: &str) -> String {
    format!("cat > {}", shell_join(&[path.to_string()]))
}

/// Commands inside the container report signal deaths as 128 + signal
fn normalize_exit_code(code: Option<i64>) -> Option<i64> {
    match code {
        // SIGKILL from `timeout -s KILL` or the OOM killer
        Some(137) => None,
        other => other,
    }
}

/// Join arguments into a shell command line, quoting where needed
fn shell_join(args: &[String]) -> String {
    args.iter()
        .map(|arg| {
            if arg
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || "-_./=".contains(c))
            {
                arg.clone()
            } else {
                format!("'{}'", arg.replace('\'', "'\\''"))
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shell_join_quotes_unsafe_arguments() {
        let args = vec![
            "node".to_string(),
            "--max-old-space-size=256".to_string(),
            "it's here".to_string(),
        ];
        assert_eq!(
            shell_join(&args),
            "node --max-old-space-size=256 'it'\\''s here'"
        );
    }

    #[test]
    fn test_write_command_does_not_carry_content() {
        assert_eq!(write_command(INPUT_FILE), "cat > /workspace/input.json");
        assert_eq!(
            write_command("/workspace/it's.py"),
            "cat > '/workspace/it'\\''s.py'"
        );
    }

    #[tokio::test]
    async fn test_large_input_reaches_the_program() {
        let Ok(docker) = Docker::connect_with_socket_defaults() else {
            return;
        };
        if docker.ping().await.is_err() {
            return;
        }

        let sandbox = DockerSandbox::new(docker, SandboxConfig::default());
        let handler = LanguageHandler::for_language(Language::Python);
        let program = handler.wrap("def solution(input):\n    return len(input)\n");
        // Image missing locally: nothing to judge against
        let Ok(mut session) = sandbox
            .provision(Uuid::new_v4(), Language::Python, &program)
            .await
        else {
            return;
        };

        // Well past the 128 KiB single-argument limit
        let input = serde_json::to_string(&vec![123_456; 40_000]).unwrap();
        assert!(input.len() > 200 * 1024);

        let output = session.run(&input, Duration::from_secs(10)).await;
        session.cleanup().await.unwrap();

        let output = output.unwrap();
        assert!(output.success(), "{}", output.failure_summary());
        assert_eq!(
            crate::judge::languages::parse_result_line(&output.stdout),
            Ok(serde_json::json!(40_000))
        );
    }

    #[test]
    fn test_killed_exit_code_is_a_signal() {
        assert_eq!(normalize_exit_code(Some(137)), None);
        assert_eq!(normalize_exit_code(Some(1)), Some(1));
        assert_eq!(normalize_exit_code(None), None);
    }

    #[tokio::test]
    async fn test_host_config_limits() {
        let docker = Docker::connect_with_socket_defaults();
        // Construction does not contact the daemon
        let Ok(docker) = docker else { return };

        let sandbox = DockerSandbox::new(
            docker,
            SandboxConfig {
                memory_limit_mb: 128,
                cpu_limit: 0.5,
                pids_limit: 32,
                ..Default::default()
            },
        );
        let host = sandbox.host_config();

        assert_eq!(host.memory, Some(128 * 1024 * 1024));
        assert_eq!(host.memory_swap, host.memory);
        assert_eq!(host.cpu_quota, Some(50_000));
        assert_eq!(host.network_mode.as_deref(), Some("none"));
        assert_eq!(host.pids_limit, Some(32));
        assert_eq!(sandbox.image_for(Language::Python), "python:3.12-alpine");
    }
}
