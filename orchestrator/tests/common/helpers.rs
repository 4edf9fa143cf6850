//! Test helpers for orchestrator tests

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use orchestrator::{OrchestratorError, OrchestratorResult, RunRecord, RunStatus, StageExit, StageRunner};
use shared::StageId;

use super::fixtures::TestFixtures;

/// How a scripted stage behaves on one attempt
#[derive(Debug, Clone, Copy)]
pub enum ScriptedOutcome {
    Exit(i32),
    Killed,
    LaunchFailure,
}

/// Stage runner that replays a script and records every call
#[derive(Default)]
pub struct ScriptedRunner {
    script: HashMap<(StageId, u32), ScriptedOutcome>,
    calls: Mutex<Vec<(StageId, u32)>>,
}

impl ScriptedRunner {
    /// Every stage succeeds unless scripted otherwise
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(mut self, stage: StageId, attempt: u32, outcome: ScriptedOutcome) -> Self {
        self.script.insert((stage, attempt), outcome);
        self
    }

    /// `stage` fails with a non-zero exit on each of `attempts`
    pub fn failing(mut self, stage: StageId, attempts: impl IntoIterator<Item = u32>) -> Self {
        for attempt in attempts {
            self.script.insert((stage, attempt), ScriptedOutcome::Exit(1));
        }
        self
    }

    pub fn calls(&self) -> Vec<(StageId, u32)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn stages_run_in(&self, attempt: u32) -> Vec<StageId> {
        self.calls()
            .into_iter()
            .filter(|(_, a)| *a == attempt)
            .map(|(stage, _)| stage)
            .collect()
    }
}

#[async_trait]
impl StageRunner for ScriptedRunner {
    async fn run_stage(&self, stage: StageId, attempt: u32) -> OrchestratorResult<StageExit> {
        self.calls.lock().unwrap().push((stage, attempt));
        match self.script.get(&(stage, attempt)) {
            None => Ok(TestFixtures::exit(0)),
            Some(ScriptedOutcome::Exit(code)) => Ok(TestFixtures::exit(*code)),
            Some(ScriptedOutcome::Killed) => Ok(TestFixtures::killed()),
            Some(ScriptedOutcome::LaunchFailure) => Err(OrchestratorError::StageLaunchError {
                stage,
                message: "No such file or directory".to_string(),
            }),
        }
    }
}

/// Test helper functions
pub struct TestHelpers;

impl TestHelpers {
    pub fn statuses(records: &[RunRecord], attempt: u32) -> Vec<(StageId, RunStatus)> {
        records
            .iter()
            .filter(|r| r.attempt_number == attempt)
            .map(|r| (r.stage, r.status))
            .collect()
    }
}
