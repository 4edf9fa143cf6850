//! Orchestrator-specific error types

use thiserror::Error;
use shared::StageId;

#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("Failed to launch stage {stage}: {message}")]
    StageLaunchError { stage: StageId, message: String },

    #[error("Stage {stage} failed on attempt {attempt} (exit code {exit_code:?})")]
    StageFailed {
        stage: StageId,
        attempt: u32,
        exit_code: Option<i32>,
    },

    #[error("Run failed after {attempts} attempts; last failure at stage {stage} on attempt {attempt}")]
    RetriesExhausted {
        attempts: u32,
        stage: StageId,
        attempt: u32,
    },

    #[error("Run interrupted")]
    Interrupted,

    #[error("Configuration error: {field}")]
    ConfigurationError { field: String },

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl OrchestratorError {
    pub fn config(field: impl Into<String>) -> Self {
        Self::ConfigurationError { field: field.into() }
    }
}

pub type OrchestratorResult<T> = Result<T, OrchestratorError>;
