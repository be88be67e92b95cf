use crate::error::{Result, WorkflowError};
use crate::io;
use crate::paths;
use crate::types::StageKey;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Artifact
// ---------------------------------------------------------------------------

/// A persisted document produced by a stage instance. Immutable once
/// validated; re-runs supersede (replace) rather than mutate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artifact {
    pub key: StageKey,
    pub path: PathBuf,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// ArtifactStore
// ---------------------------------------------------------------------------

/// Filesystem-backed store rooted at the project directory. Writes are
/// atomic per artifact: either fully written or not present.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path_for(&self, key: &StageKey) -> PathBuf {
        paths::artifact_path(&self.root, key)
    }

    /// Store content for a stage instance, replacing any prior artifact
    /// at the same key. Overwrite confirmation is the caller's concern.
    pub fn put(&self, key: &StageKey, content: &str) -> Result<Artifact> {
        let path = self.path_for(key);
        io::atomic_write(&path, content.as_bytes())
            .map_err(|e| WorkflowError::Storage(format!("cannot write {}: {e}", path.display())))?;
        Ok(Artifact {
            key: *key,
            path,
            content: content.to_string(),
            created_at: Utc::now(),
        })
    }

    pub fn get(&self, key: &StageKey) -> Result<Artifact> {
        let path = self.path_for(key);
        if !path.exists() {
            return Err(WorkflowError::ArtifactNotFound(key.to_string()));
        }
        let content = std::fs::read_to_string(&path)?;
        let created_at = created_at(&path);
        Ok(Artifact {
            key: *key,
            path,
            content,
            created_at,
        })
    }

    /// Never errors; an unreadable path simply reports absent.
    pub fn exists(&self, key: &StageKey) -> bool {
        self.path_for(key).exists()
    }

    /// Remove a superseded artifact. Removing an absent artifact is a
    /// no-op.
    pub fn discard(&self, key: &StageKey) -> Result<()> {
        let path = self.path_for(key);
        if path.exists() {
            std::fs::remove_file(&path)?;
        }
        Ok(())
    }
}

fn created_at(path: &Path) -> DateTime<Utc> {
    std::fs::metadata(path)
        .and_then(|m| m.modified())
        .map(DateTime::<Utc>::from)
        .unwrap_or_else(|_| Utc::now())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
