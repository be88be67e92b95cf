use crate::rules::RuleFailure;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("not initialized: run 'prodflow init'")]
    NotInitialized,

    #[error("stage '{stage}' blocked: prerequisite '{missing}' is not completed")]
    Prerequisite { stage: String, missing: String },

    #[error("stage '{stage}' failed validation: {}", format_failures(.failures))]
    Validation {
        stage: String,
        failures: Vec<RuleFailure>,
    },

    #[error("storage error: {0}")]
    Storage(String),

    #[error("out-of-order sprint operation: {0}")]
    Sequence(String),

    #[error("collaborator error: {0}")]
    Collaborator(String),

    #[error("stage '{0}' is already in progress")]
    StageInProgress(String),

    #[error("artifact not found: {0}")]
    ArtifactNotFound(String),

    #[error("artifact already exists for '{0}': re-run with --force to overwrite")]
    ArtifactExists(String),

    #[error("invalid stage: {0}")]
    InvalidStage(String),

    #[error("stage '{0}' requires a sprint index")]
    SprintIndexRequired(String),

    #[error("stage '{0}' does not take a sprint index")]
    SprintIndexForbidden(String),

    #[error("invalid project name '{0}': must be lowercase alphanumeric with hyphens")]
    InvalidProjectName(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

fn format_failures(failures: &[RuleFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("{} ({})", f.rule, f.reason))
        .collect::<Vec<_>>()
        .join("; ")
}

pub type Result<T> = std::result::Result<T, WorkflowError>;
