use crate::error::{Result, WorkflowError};
use crate::paths;
use crate::rules::ValidationReport;
use crate::types::{StageKey, StageStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

// ---------------------------------------------------------------------------
// Supporting types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageRecord {
    pub key: StageKey,
    pub status: StageStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report: Option<ValidationReport>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub key: StageKey,
    pub status: StageStatus,
    pub outcome: String,
    pub timestamp: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// WorkflowState
// ---------------------------------------------------------------------------

/// Per-stage completion status plus an append-only audit trail. Owned
/// exclusively by the engine; nothing else mutates it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowState {
    #[serde(default = "default_version")]
    pub version: u32,
    pub project: String,
    /// Current sprint index. Starts at 1, only advance_sprint increments,
    /// never decremented.
    pub sprint: u32,
    pub stages: Vec<StageRecord>,
    pub history: Vec<HistoryEntry>,
    pub last_updated: DateTime<Utc>,
}

fn default_version() -> u32 {
    1
}

impl WorkflowState {
    pub fn new(project: impl Into<String>) -> Self {
        Self {
            version: 1,
            project: project.into(),
            sprint: 1,
            stages: Vec::new(),
            history: Vec::new(),
            last_updated: Utc::now(),
        }
    }

    // ---------------------------------------------------------------------------
    // Persistence
    // ---------------------------------------------------------------------------

    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::state_path(root);
        if !path.exists() {
            return Err(WorkflowError::NotInitialized);
        }
        let data = std::fs::read_to_string(&path)?;
        let state: WorkflowState = serde_yaml::from_str(&data)?;
        Ok(state)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::state_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    // ---------------------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------------------

    pub fn status_of(&self, key: &StageKey) -> StageStatus {
        self.stages
            .iter()
            .find(|r| r.key == *key)
            .map(|r| r.status)
            .unwrap_or(StageStatus::NotStarted)
    }

    pub fn record_of(&self, key: &StageKey) -> Option<&StageRecord> {
        self.stages.iter().find(|r| r.key == *key)
    }

    pub fn in_progress(&self) -> Option<&StageRecord> {
        self.stages
            .iter()
            .find(|r| r.status == StageStatus::InProgress)
    }

    pub fn last_entry(&self) -> Option<&HistoryEntry> {
        self.history.last()
    }

    // ---------------------------------------------------------------------------
    // Mutations
    // ---------------------------------------------------------------------------

    /// Upsert the stage record and append to history.
    pub fn record(
        &mut self,
        key: StageKey,
        status: StageStatus,
        report: Option<ValidationReport>,
        outcome: &str,
    ) {
        let now = Utc::now();
        match self.stages.iter_mut().find(|r| r.key == key) {
            Some(record) => {
                record.status = status;
                record.report = report;
                record.updated_at = now;
            }
            None => self.stages.push(StageRecord {
                key,
                status,
                report,
                updated_at: now,
            }),
        }
        self.history.push(HistoryEntry {
            key,
            status,
            outcome: outcome.to_string(),
            timestamp: now,
        });
        // Trim history to last 500 entries
        if self.history.len() > 500 {
            self.history.drain(..self.history.len() - 500);
        }
        self.last_updated = now;
    }

    pub fn advance_sprint(&mut self) -> u32 {
        self.sprint += 1;
        self.last_updated = Utc::now();
        self.sprint
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
