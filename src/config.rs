//! Application configuration management
//!
//! This module handles loading and validating configuration from environment variables.
//! All configuration is loaded at startup and validated before the application runs.

use std::env;
use std::str::FromStr;
use std::sync::LazyLock;
use std::time::Duration;

use crate::constants::{
    container_images, sandbox_backends, store_backends, DEFAULT_CASE_TIME_LIMIT_MS,
    DEFAULT_DATABASE_MAX_CONNECTIONS, DEFAULT_MAX_SOURCE_CODE_BYTES, DEFAULT_SANDBOX_CPU_LIMIT,
    DEFAULT_SANDBOX_MEMORY_LIMIT_MB, DEFAULT_SANDBOX_PIDS_LIMIT, DEFAULT_SERVER_HOST,
    DEFAULT_SERVER_PORT, DEFAULT_SUBMISSION_TIMEOUT_MS, DEFAULT_WATCHDOG_GRACE_SECS,
    DEFAULT_WATCHDOG_INTERVAL_SECS, DEFAULT_WORKER_COUNT,
};

/// Global application configuration (lazily initialized)
pub static CONFIG: LazyLock<Config> = LazyLock::new(|| {
    Config::from_env().expect("Failed to load configuration from environment")
});

/// Main application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub jwt: JwtConfig,
    pub sandbox: SandboxConfig,
    pub judge: JudgeConfig,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub rust_log: String,
}

/// Which store keeps challenges, submissions and verdicts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub backend: StoreBackend,
    /// Required when `backend` is `Postgres`
    pub url: Option<String>,
    pub max_connections: u32,
}

/// Redis configuration (optional; enables event publishing)
#[derive(Debug, Clone)]
pub struct RedisConfig {
    pub url: Option<String>,
}

/// JWT verification configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
}

/// Which isolation mechanism runs submitted code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SandboxBackend {
    Docker,
    Process,
}

/// Sandbox resource limits and images
#[derive(Debug, Clone)]
pub struct SandboxConfig {
    pub backend: SandboxBackend,
    pub javascript_image: String,
    pub python_image: String,
    /// Memory ceiling in megabytes
    pub memory_limit_mb: u64,
    /// CPU limit (number of cores)
    pub cpu_limit: f64,
    /// Maximum processes inside the sandbox
    pub pids_limit: i64,
}

/// Judging pipeline configuration
#[derive(Debug, Clone)]
pub struct JudgeConfig {
    pub worker_count: usize,
    /// Per test case wall-clock limit used when a test case declares none
    pub default_case_time_limit_ms: u64,
    /// Wall-clock budget for all test cases of one submission
    pub submission_timeout_ms: u64,
    pub max_source_code_bytes: usize,
    pub watchdog_interval_secs: u64,
    pub watchdog_grace_secs: u64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Ok(Self {
            server: ServerConfig::from_env()?,
            database: DatabaseConfig::from_env()?,
            redis: RedisConfig::from_env()?,
            jwt: JwtConfig::from_env()?,
            sandbox: SandboxConfig::from_env()?,
            judge: JudgeConfig::from_env()?,
        })
    }
}

impl ServerConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            host: env::var("SERVER_HOST").unwrap_or_else(|_| DEFAULT_SERVER_HOST.to_string()),
            port: parse_var("SERVER_PORT", DEFAULT_SERVER_PORT)?,
            rust_log: env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

impl FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            store_backends::POSTGRES => Ok(Self::Postgres),
            store_backends::MEMORY => Ok(Self::Memory),
            _ => Err(ConfigError::InvalidValue("STORE_BACKEND".to_string())),
        }
    }
}

impl DatabaseConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let backend: StoreBackend = env::var("STORE_BACKEND")
            .unwrap_or_else(|_| store_backends::POSTGRES.to_string())
            .parse()?;
        let url = env::var("DATABASE_URL").ok();

        if backend == StoreBackend::Postgres && url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL".to_string()));
        }

        Ok(Self {
            backend,
            url,
            max_connections: parse_var("DATABASE_MAX_CONNECTIONS", DEFAULT_DATABASE_MAX_CONNECTIONS)?,
        })
    }
}

impl RedisConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            url: env::var("REDIS_URL").ok().filter(|url| !url.is_empty()),
        })
    }
}

impl JwtConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            secret: env::var("JWT_SECRET").map_err(|_| ConfigError::Missing("JWT_SECRET".to_string()))?,
        })
    }
}

impl FromStr for SandboxBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            sandbox_backends::DOCKER => Ok(Self::Docker),
            sandbox_backends::PROCESS => Ok(Self::Process),
            _ => Err(ConfigError::InvalidValue("SANDBOX_BACKEND".to_string())),
        }
    }
}

impl SandboxConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            backend: env::var("SANDBOX_BACKEND")
                .unwrap_or_else(|_| sandbox_backends::DOCKER.to_string())
                .parse()?,
            javascript_image: env::var("SANDBOX_IMAGE_JAVASCRIPT")
                .unwrap_or_else(|_| container_images::JAVASCRIPT.to_string()),
            python_image: env::var("SANDBOX_IMAGE_PYTHON")
                .unwrap_or_else(|_| container_images::PYTHON.to_string()),
            memory_limit_mb: parse_var("SANDBOX_MEMORY_LIMIT_MB", DEFAULT_SANDBOX_MEMORY_LIMIT_MB)?,
            cpu_limit: parse_var("SANDBOX_CPU_LIMIT", DEFAULT_SANDBOX_CPU_LIMIT)?,
            pids_limit: parse_var("SANDBOX_PIDS_LIMIT", DEFAULT_SANDBOX_PIDS_LIMIT)?,
        })
    }
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            backend: SandboxBackend::Docker,
            javascript_image: container_images::JAVASCRIPT.to_string(),
            python_image: container_images::PYTHON.to_string(),
            memory_limit_mb: DEFAULT_SANDBOX_MEMORY_LIMIT_MB,
            cpu_limit: DEFAULT_SANDBOX_CPU_LIMIT,
            pids_limit: DEFAULT_SANDBOX_PIDS_LIMIT,
        }
    }
}

impl JudgeConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            worker_count: parse_var("WORKER_COUNT", DEFAULT_WORKER_COUNT)?,
            default_case_time_limit_ms: parse_var("DEFAULT_CASE_TIME_LIMIT_MS", DEFAULT_CASE_TIME_LIMIT_MS)?,
            submission_timeout_ms: parse_var("SUBMISSION_TIMEOUT_MS", DEFAULT_SUBMISSION_TIMEOUT_MS)?,
            max_source_code_bytes: parse_var("MAX_SOURCE_CODE_BYTES", DEFAULT_MAX_SOURCE_CODE_BYTES)?,
            watchdog_interval_secs: parse_var("WATCHDOG_INTERVAL_SECS", DEFAULT_WATCHDOG_INTERVAL_SECS)?,
            watchdog_grace_secs: parse_var("WATCHDOG_GRACE_SECS", DEFAULT_WATCHDOG_GRACE_SECS)?,
        };

        if config.worker_count == 0 {
            return Err(ConfigError::InvalidValue("WORKER_COUNT".to_string()));
        }

        Ok(config)
    }

    /// Per-case limit applied when a test case declares none
    pub fn default_case_time_limit(&self) -> Duration {
        Duration::from_millis(self.default_case_time_limit_ms)
    }

    /// Budget for all test cases of one submission
    pub fn submission_timeout(&self) -> Duration {
        Duration::from_millis(self.submission_timeout_ms)
    }

    /// Age after which a Running submission is considered stuck
    pub fn stuck_after(&self) -> Duration {
        self.submission_timeout() + Duration::from_secs(self.watchdog_grace_secs)
    }
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self {
            worker_count: DEFAULT_WORKER_COUNT,
            default_case_time_limit_ms: DEFAULT_CASE_TIME_LIMIT_MS,
            submission_timeout_ms: DEFAULT_SUBMISSION_TIMEOUT_MS,
            max_source_code_bytes: DEFAULT_MAX_SOURCE_CODE_BYTES,
            watchdog_interval_secs: DEFAULT_WATCHDOG_INTERVAL_SECS,
            watchdog_grace_secs: DEFAULT_WATCHDOG_GRACE_SECS,
        }
    }
}

/// Parse an optional environment variable, falling back to a default
fn parse_var<T>(name: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(name.to_string())),
        Err(_) => Ok(default),
    }
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(String),

    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}
