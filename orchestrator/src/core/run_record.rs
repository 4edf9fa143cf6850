//! Per-stage run bookkeeping

use chrono::{DateTime, Utc};
use serde::Serialize;
use shared::StageId;

use crate::error::{OrchestratorError, OrchestratorResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
}

/// One stage within one attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunRecord {
    pub attempt_number: u32,
    /// Position in the full stage order
    pub stage_index: usize,
    pub stage: StageId,
    pub status: RunStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl RunRecord {
    pub fn pending(attempt_number: u32, stage: StageId) -> Self {
        Self {
            attempt_number,
            stage_index: stage.index(),
            stage,
            status: RunStatus::Pending,
            started_at: None,
            ended_at: None,
        }
    }

    pub fn start(&mut self) {
        self.status = RunStatus::Running;
        self.started_at = Some(Utc::now());
    }

    pub fn finish(&mut self, succeeded: bool) {
        self.status = if succeeded { RunStatus::Succeeded } else { RunStatus::Failed };
        self.ended_at = Some(Utc::now());
    }
}

/// Final one-line report of a run
pub fn status_line(result: &OrchestratorResult<u32>) -> String {
    match result {
        Ok(1) => "SUCCESS: all stages completed on the first attempt".to_string(),
        Ok(attempts) => format!("SUCCESS: all stages completed after {attempts} attempts"),
        Err(OrchestratorError::RetriesExhausted { attempts, stage, attempt }) => {
            format!("FAILED: gave up after {attempts} attempts (stage {stage} failed on attempt {attempt})")
        }
        Err(OrchestratorError::Interrupted) => "FAILED: run interrupted".to_string(),
        Err(e) => format!("FAILED: {e}"),
    }
}
