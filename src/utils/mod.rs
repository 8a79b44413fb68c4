//! Utility functions

pub mod validation;

pub use validation::{
    normalize_tags, sanitize_string, validate_challenge_title, validate_source_code,
    validate_time_limit, validate_tolerance,
};
