//! Artifact store
//!
//! Persists stage artifacts as pretty JSON under one work directory. Writes
//! are atomic: the document is serialized completely, written to a temporary
//! sibling and renamed over the target, so an interrupted stage never leaves a
//! half-written artifact behind.

use std::path::{Path, PathBuf};
use tokio::fs;

use crate::artifacts::Artifact;
use crate::errors::{SharedError, SharedResult};
use crate::process_debug;
use crate::types::{ProcessId, StageId};

/// File-backed store for stage artifacts and audit blobs
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Location of the artifact written by `stage`
    pub fn path_for(&self, stage: StageId) -> PathBuf {
        self.root.join(stage.artifact_file())
    }

    /// Read the artifact of type `A`
    pub async fn read<A: Artifact>(&self) -> SharedResult<A> {
        let path = self.path_for(A::STAGE);
        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(SharedError::MissingArtifact { stage: A::STAGE, path });
            }
            Err(source) => return Err(SharedError::ArtifactIo { path, source }),
        };

        serde_json::from_str(&content).map_err(|e| SharedError::DeserializationError {
            path,
            message: e.to_string(),
        })
    }

    /// Replace the artifact of type `A` wholesale
    pub async fn write<A: Artifact>(&self, artifact: &A) -> SharedResult<PathBuf> {
        let content = serde_json::to_vec_pretty(artifact).map_err(|e| SharedError::SerializationError {
            message: e.to_string(),
        })?;

        let path = self.path_for(A::STAGE);
        self.write_atomic(&path, &content).await?;
        process_debug!(ProcessId::current(), "💾 Wrote {} artifact: {}", A::STAGE, path.display());
        Ok(path)
    }

    /// Write an opaque blob (e.g. a screenshot) relative to the store root
    pub async fn write_blob(&self, relative: impl AsRef<Path>, content: &[u8]) -> SharedResult<PathBuf> {
        let path = self.root.join(relative);
        self.write_atomic(&path, content).await?;
        Ok(path)
    }

    async fn write_atomic(&self, path: &Path, content: &[u8]) -> SharedResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| io_error(parent, e))?;
        }

        let mut tmp_name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        tmp_name.push(".tmp");
        let tmp_path = path.with_file_name(tmp_name);

        fs::write(&tmp_path, content).await.map_err(|e| io_error(&tmp_path, e))?;
        if let Err(e) = fs::rename(&tmp_path, path).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(io_error(path, e));
        }
        Ok(())
    }
}

fn io_error(path: &Path, source: std::io::Error) -> SharedError {
    SharedError::ArtifactIo {
        path: path.to_path_buf(),
        source,
    }
}
