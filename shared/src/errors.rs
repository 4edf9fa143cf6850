//! Shared error types for the feed curation pipeline

use std::path::PathBuf;
use thiserror::Error;

use crate::types::StageId;

#[derive(Error, Debug)]
pub enum SharedError {
    #[error("Artifact for stage '{stage}' not found at {path} (run the previous stage first)")]
    MissingArtifact { stage: StageId, path: PathBuf },

    #[error("Artifact I/O failed on {path}: {source}")]
    ArtifactIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization failed: {message}")]
    SerializationError { message: String },

    #[error("Deserialization of {path} failed: {message}")]
    DeserializationError { path: PathBuf, message: String },

    #[error("Unknown stage: {input}")]
    InvalidStage { input: String },
}

pub type SharedResult<T> = Result<T, SharedError>;
