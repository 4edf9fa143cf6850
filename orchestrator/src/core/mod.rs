//! Core orchestrator business logic

pub mod retry_policy;
pub mod run_record;

pub use retry_policy::RetryPolicy;
pub use run_record::{status_line, RunRecord, RunStatus};
