use crate::error::{Result, WorkflowError};
use crate::types::StageKey;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const PRODFLOW_DIR: &str = ".prodflow";
pub const DOCS_DIR: &str = ".prodflow/docs";
pub const SPRINTS_DIR: &str = ".prodflow/sprints";

pub const CONFIG_FILE: &str = ".prodflow/config.yaml";
pub const STATE_FILE: &str = ".prodflow/state.yaml";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn prodflow_dir(root: &Path) -> PathBuf {
    root.join(PRODFLOW_DIR)
}

pub fn docs_dir(root: &Path) -> PathBuf {
    root.join(DOCS_DIR)
}

pub fn sprint_dir(root: &Path, sprint: u32) -> PathBuf {
    root.join(SPRINTS_DIR).join(format!("v{sprint}"))
}

/// Location of the document a stage instance produces.
///
/// One-shot stages live under `.prodflow/docs/`, sprint-scoped stages
/// under `.prodflow/sprints/v<N>/`.
pub fn artifact_path(root: &Path, key: &StageKey) -> PathBuf {
    match key.sprint {
        Some(n) => sprint_dir(root, n).join(key.stage.document_name()),
        None => docs_dir(root).join(key.stage.document_name()),
    }
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn state_path(root: &Path) -> PathBuf {
    root.join(STATE_FILE)
}

// ---------------------------------------------------------------------------
// Project-name validation
// ---------------------------------------------------------------------------

static NAME_RE: OnceLock<Regex> = OnceLock::new();

fn name_re() -> &'static Regex {
    NAME_RE.get_or_init(|| Regex::new(r"^[a-z0-9][a-z0-9\-]*[a-z0-9]$|^[a-z0-9]$").unwrap())
}

pub fn validate_project_name(name: &str) -> Result<()> {
    if name.is_empty() || name.len() > 64 || !name_re().is_match(name) {
        return Err(WorkflowError::InvalidProjectName(name.to_string()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Stage;

    #[test]
    fn valid_project_names() {
        for name in ["my-product", "a", "shop-v2", "x1"] {
            validate_project_name(name).unwrap_or_else(|_| panic!("expected valid: {name}"));
        }
    }

    #[test]
    fn invalid_project_names() {
        for name in ["", "-leading", "trailing-", "has spaces", "UPPER", "a_b"] {
            assert!(validate_project_name(name).is_err(), "expected invalid: {name}");
        }
    }

    #[test]
    fn one_shot_artifacts_live_under_docs() {
        let root = Path::new("/tmp/proj");
        assert_eq!(
            artifact_path(root, &StageKey::one_shot(Stage::Prd)),
            PathBuf::from("/tmp/proj/.prodflow/docs/prd.md")
        );
    }

    #[test]
    fn sprint_artifacts_live_under_sprint_dir() {
        let root = Path::new("/tmp/proj");
        assert_eq!(
            artifact_path(root, &StageKey::sprint_scoped(Stage::SprintPlan, 2)),
            PathBuf::from("/tmp/proj/.prodflow/sprints/v2/sprint-plan.md")
        );
    }
}
