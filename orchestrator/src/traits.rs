//! Trait definitions with mockall annotations for testing

use std::time::Duration;

use shared::StageId;
use crate::error::OrchestratorResult;

/// How a stage process ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageExit {
    /// Exit code, `None` when the process was killed by a signal
    pub code: Option<i32>,
    pub duration: Duration,
}

impl StageExit {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Stage execution abstraction for dependency injection
///
/// The real implementation launches one `pipeline <stage>` child process per
/// call and waits for it to exit.
#[mockall::automock]
#[async_trait::async_trait]
pub trait StageRunner: Send + Sync {
    /// Run `stage` to completion as part of `attempt` (1-based)
    ///
    /// `Err` means the stage could not be launched at all; a stage that ran
    /// and failed is `Ok` with a non-zero exit.
    async fn run_stage(&self, stage: StageId, attempt: u32) -> OrchestratorResult<StageExit>;
}
