//! Pipeline error types

use shared::{ReactionState, SharedError};
use thiserror::Error;

/// Result type for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Pipeline error types
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Collaborator failure during {operation}: {message}")]
    CollaboratorError { operation: String, message: String },

    #[error("Classification service error: {message}")]
    ClassificationServiceError { message: String },

    #[error(
        "Incomplete verdicts: expected {expected}, received {received} (missing {missing:?}, unexpected {unexpected:?})"
    )]
    IncompleteVerdictError {
        expected: usize,
        received: usize,
        missing: Vec<String>,
        unexpected: Vec<String>,
    },

    #[error("Action on {url} not confirmed: expected {expected}, observed {observed}")]
    ActionConfirmationError {
        url: String,
        expected: ReactionState,
        observed: ReactionState,
    },

    #[error("Query policy not satisfied: {reason}")]
    QueryPolicyError { reason: String },

    #[error("Artifact error: {0}")]
    ArtifactError(#[from] SharedError),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl PipelineError {
    pub fn collaborator(operation: &str, message: impl std::fmt::Display) -> Self {
        Self::CollaboratorError {
            operation: operation.to_string(),
            message: message.to_string(),
        }
    }

    pub fn classification(message: impl std::fmt::Display) -> Self {
        Self::ClassificationServiceError {
            message: message.to_string(),
        }
    }

    pub fn config(message: impl std::fmt::Display) -> Self {
        Self::ConfigError {
            message: message.to_string(),
        }
    }

    /// Process exit code reported to the orchestrator
    pub fn exit_code(&self) -> u8 {
        match self {
            PipelineError::ConfigError { .. } => 2,
            PipelineError::ArtifactError(_) | PipelineError::IoError(_) => 3,
            PipelineError::CollaboratorError { .. } | PipelineError::ActionConfirmationError { .. } => 4,
            PipelineError::ClassificationServiceError { .. } => 5,
            PipelineError::IncompleteVerdictError { .. } => 6,
            PipelineError::QueryPolicyError { .. } => 7,
        }
    }
}
