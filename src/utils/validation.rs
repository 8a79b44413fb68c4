//! Input validation utilities

use crate::constants::{
    MAX_CASE_TIME_LIMIT_MS, MAX_CHALLENGE_TAGS, MAX_CHALLENGE_TITLE_LENGTH, MIN_CASE_TIME_LIMIT_MS,
};

/// Validate submitted source code against the configured size limit
pub fn validate_source_code(code: &str, max_bytes: usize) -> Result<(), String> {
    if code.trim().is_empty() {
        return Err("Source code cannot be empty".to_string());
    }
    if code.len() > max_bytes {
        return Err(format!(
            "Source code exceeds maximum size of {} bytes",
            max_bytes
        ));
    }
    Ok(())
}

/// Sanitize string input (remove control characters, trim whitespace)
pub fn sanitize_string(input: &str) -> String {
    input
        .chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .collect::<String>()
        .trim()
        .to_string()
}

/// Validate and sanitize a challenge title
pub fn validate_challenge_title(title: &str) -> Result<String, &'static str> {
    let sanitized = sanitize_string(title);
    if sanitized.is_empty() {
        return Err("Challenge title cannot be empty");
    }
    if sanitized.chars().count() > MAX_CHALLENGE_TITLE_LENGTH as usize {
        return Err("Challenge title must be at most 256 characters");
    }
    Ok(sanitized)
}

/// Normalize tags: trimmed, lowercase, deduplicated, order kept
pub fn normalize_tags(tags: &[String]) -> Result<Vec<String>, &'static str> {
    let mut normalized: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = sanitize_string(tag).to_lowercase();
        if tag.is_empty() {
            return Err("Tags cannot be empty");
        }
        if tag.len() > 32 {
            return Err("Tags must be at most 32 characters");
        }
        if !normalized.contains(&tag) {
            normalized.push(tag);
        }
    }
    if normalized.len() > MAX_CHALLENGE_TAGS as usize {
        return Err("Too many tags");
    }
    Ok(normalized)
}

/// Validate a per-case time limit (in milliseconds)
pub fn validate_time_limit(ms: u64) -> Result<(), &'static str> {
    if ms < MIN_CASE_TIME_LIMIT_MS {
        return Err("Time limit must be at least 100ms");
    }
    if ms > MAX_CASE_TIME_LIMIT_MS {
        return Err("Time limit must be at most 30 seconds");
    }
    Ok(())
}

/// Validate a float comparison tolerance
pub fn validate_tolerance(tolerance: f64) -> Result<(), &'static str> {
    if !tolerance.is_finite() || tolerance < 0.0 {
        return Err("Tolerance must be a non-negative number");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_source_code() {
        assert!(validate_source_code("function solution(i) {}", 1024).is_ok());
        assert!(validate_source_code("", 1024).is_err());
        assert!(validate_source_code("   \n", 1024).is_err());
        assert!(validate_source_code(&"x".repeat(1025), 1024).is_err());
    }

    #[test]
    fn test_validate_challenge_title() {
        assert_eq!(validate_challenge_title("  Two Sum \u{7}").unwrap(), "Two Sum");
        assert!(validate_challenge_title("   ").is_err());
        assert!(validate_challenge_title(&"t".repeat(257)).is_err());
    }

    #[test]
    fn test_normalize_tags() {
        let tags = vec!["Arrays".to_string(), " arrays ".to_string(), "DP".to_string()];
        assert_eq!(normalize_tags(&tags).unwrap(), vec!["arrays", "dp"]);
        assert!(normalize_tags(&["".to_string()]).is_err());
    }

    #[test]
    fn test_validate_time_limit() {
        assert!(validate_time_limit(2000).is_ok());
        assert!(validate_time_limit(50).is_err());
        assert!(validate_time_limit(30_001).is_err());
    }

    #[test]
    fn test_validate_tolerance() {
        assert!(validate_tolerance(1e-6).is_ok());
        assert!(validate_tolerance(-1.0).is_err());
        assert!(validate_tolerance(f64::NAN).is_err());
    }
}
