//! Submission language model

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::languages;

/// Languages a submission can be written in
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    JavaScript,
    Python,
}

impl Language {
    /// Get language as its stored identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::JavaScript => languages::JAVASCRIPT,
            Self::Python => languages::PYTHON,
        }
    }
}

impl FromStr for Language {
    type Err = UnsupportedLanguage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            languages::JAVASCRIPT | "js" | "node" => Ok(Self::JavaScript),
            languages::PYTHON | "py" | "python3" => Ok(Self::Python),
            _ => Err(UnsupportedLanguage(s.to_string())),
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a language identifier is not supported
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unsupported language: {0}")]
pub struct UnsupportedLanguage(pub String);
