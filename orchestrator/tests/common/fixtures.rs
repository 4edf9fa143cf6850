//! Test fixtures for orchestrator tests

use std::time::Duration;

use orchestrator::{RetryPolicy, StageExit};

/// Common test data
pub struct TestFixtures;

impl TestFixtures {
    pub const DEFAULT_ATTEMPTS: u32 = 10;

    /// Retry policy with no waiting between attempts
    pub fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::immediate(max_attempts)
    }

    pub fn exit(code: i32) -> StageExit {
        StageExit {
            code: Some(code),
            duration: Duration::from_millis(5),
        }
    }

    pub fn killed() -> StageExit {
        StageExit {
            code: None,
            duration: Duration::from_millis(5),
        }
    }
}
