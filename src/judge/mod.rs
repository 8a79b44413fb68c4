//! Judging pipeline
//!
//! Submissions flow queue → worker → executor → aggregator. The executor
//! runs candidate code inside a [`sandbox::Sandbox`]; the aggregator turns
//! per-case results into a verdict, persists it and notifies listeners.

pub mod aggregator;
pub mod compare;
pub mod executor;
pub mod languages;
pub mod notifier;
pub mod pipeline;
pub mod queue;
pub mod sandbox;
pub mod watchdog;
pub mod worker;

pub use aggregator::{aggregate, Aggregator};
pub use executor::{ExecutionError, ExecutionLimits, ExecutionOutcome, Executor};
pub use notifier::{EventOutcome, JudgeEvent, Notifier};
pub use pipeline::{Enqueued, Pipeline};
pub use queue::{FairQueue, QueuedJob};
pub use sandbox::{DockerSandbox, ProcessSandbox, RunOutput, Sandbox, SandboxError, SandboxSession};
