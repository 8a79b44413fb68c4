//! Language harnesses for syntax checking and execution
//!
//! Candidate code only defines a `solution(input)` function. The harness is
//! appended after it: it reads the JSON input from stdin, calls `solution`
//! and prints the JSON-encoded return value on a line starting with
//! [`RESULT_MARKER`], so stray prints from the candidate cannot be mistaken
//! for the answer.

pub mod javascript;
pub mod python;

use serde_json::Value;

use crate::{constants::RESULT_MARKER, models::Language};

/// Placeholder replaced by [`RESULT_MARKER`] inside harness templates
const MARKER_PLACEHOLDER: &str = "__RESULT_MARKER__";

/// Language handler for syntax checking and execution
#[derive(Debug, Clone)]
pub struct LanguageHandler {
    language: Language,
    source_file: &'static str,
    interpreter: &'static str,
    check_args: &'static [&'static str],
    harness: &'static str,
    /// Whether RLIMIT_AS can be applied without breaking the runtime
    limits_address_space: bool,
}

impl LanguageHandler {
    /// Get handler for a specific language
    pub fn for_language(language: Language) -> Self {
        match language {
            Language::JavaScript => javascript::handler(),
            Language::Python => python::handler(),
        }
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// File the wrapped program is written to, relative to the work directory
    pub fn source_file(&self) -> &'static str {
        self.source_file
    }

    /// Candidate code followed by the harness
    pub fn wrap(&self, code: &str) -> String {
        let harness = self.harness.replace(MARKER_PLACEHOLDER, RESULT_MARKER);
        format!("{}\n\n{}", code.trim_end(), harness)
    }

    /// Syntax check command
    pub fn check_command(&self) -> Vec<String> {
        let mut cmd = vec![self.interpreter.to_string()];
        cmd.extend(self.check_args.iter().map(|a| a.to_string()));
        cmd.push(self.source_file.to_string());
        cmd
    }

    /// Run command for one test case
    pub fn run_command(&self, memory_limit_mb: u64) -> Vec<String> {
        let mut cmd = vec![self.interpreter.to_string()];
        if self.language == Language::JavaScript {
            cmd.push(format!("--max-old-space-size={}", memory_limit_mb));
        }
        cmd.push(self.source_file.to_string());
        cmd
    }

    pub fn limits_address_space(&self) -> bool {
        self.limits_address_space
    }
}

/// Why no usable result could be read from a run's stdout
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResultLineError {
    #[error("solution produced no result")]
    Missing,

    #[error("solution result is not valid JSON: {0}")]
    Malformed(String),
}

/// Extract the value reported on the last result line
pub fn parse_result_line(stdout: &str) -> Result<Value, ResultLineError> {
    let line = stdout
        .lines()
        .rev()
        .find_map(|line| line.strip_prefix(RESULT_MARKER))
        .ok_or(ResultLineError::Missing)?;

    serde_json::from_str(line.trim()).map_err(|e| ResultLineError::Malformed(e.to_string()))
}
