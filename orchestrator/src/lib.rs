//! Orchestrator library for running the feed curation pipeline
//!
//! Runs the ordered pipeline stages as child processes and retries the whole
//! sequence with capped exponential backoff until one attempt completes.

pub mod core;
pub mod error;
pub mod orchestrator;
pub mod services;
pub mod traits;

// Re-export commonly used types
pub use core::{status_line, RetryPolicy, RunRecord, RunStatus};
pub use error::{OrchestratorError, OrchestratorResult};
pub use orchestrator::Orchestrator;
pub use traits::{MockStageRunner, StageExit, StageRunner};
