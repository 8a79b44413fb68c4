//! Domain models
//!
//! This module contains all domain models used throughout the application.

pub mod challenge;
pub mod language;
pub mod submission;
pub mod test_case;
pub mod verdict;

pub use challenge::*;
pub use language::*;
pub use submission::*;
pub use test_case::*;
pub use verdict::*;
