use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Stage
// ---------------------------------------------------------------------------

/// One named step in the product-development lifecycle.
///
/// The first three stages run once per workflow instance; the rest repeat
/// once per sprint index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    Prd,
    Architecture,
    RepoInit,
    SprintPlan,
    SprintTech,
    IssueGeneration,
    Implementation,
    Review,
}

impl Stage {
    pub fn all() -> &'static [Stage] {
        &[
            Stage::Prd,
            Stage::Architecture,
            Stage::RepoInit,
            Stage::SprintPlan,
            Stage::SprintTech,
            Stage::IssueGeneration,
            Stage::Implementation,
            Stage::Review,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Prd => "prd",
            Stage::Architecture => "architecture",
            Stage::RepoInit => "repo-init",
            Stage::SprintPlan => "sprint-plan",
            Stage::SprintTech => "sprint-tech",
            Stage::IssueGeneration => "issue-generation",
            Stage::Implementation => "implementation",
            Stage::Review => "review",
        }
    }

    /// True for stages that repeat once per sprint.
    pub fn is_sprint_scoped(self) -> bool {
        matches!(
            self,
            Stage::SprintPlan
                | Stage::SprintTech
                | Stage::IssueGeneration
                | Stage::Implementation
                | Stage::Review
        )
    }

    /// Filename of the document this stage produces.
    pub fn document_name(self) -> &'static str {
        match self {
            Stage::Prd => "prd.md",
            Stage::Architecture => "architecture.md",
            Stage::RepoInit => "repo-init.md",
            Stage::SprintPlan => "sprint-plan.md",
            Stage::SprintTech => "sprint-tech.md",
            Stage::IssueGeneration => "issues.md",
            Stage::Implementation => "implementation.md",
            Stage::Review => "review.md",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Stage {
    type Err = crate::error::WorkflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "prd" => Ok(Stage::Prd),
            "architecture" | "arch" => Ok(Stage::Architecture),
            "repo-init" => Ok(Stage::RepoInit),
            "sprint-plan" => Ok(Stage::SprintPlan),
            "sprint-tech" => Ok(Stage::SprintTech),
            "issue-generation" => Ok(Stage::IssueGeneration),
            "implementation" => Ok(Stage::Implementation),
            "review" => Ok(Stage::Review),
            _ => Err(crate::error::WorkflowError::InvalidStage(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// StageKey
// ---------------------------------------------------------------------------

/// Identity of one stage *instance*: a stage plus, for sprint-scoped
/// stages, the sprint index it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StageKey {
    pub stage: Stage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sprint: Option<u32>,
}

impl StageKey {
    /// Build a key, enforcing that sprint-scoped stages carry an index
    /// and one-shot stages do not.
    pub fn new(stage: Stage, sprint: Option<u32>) -> crate::error::Result<Self> {
        match (stage.is_sprint_scoped(), sprint) {
            (true, None) => Err(crate::error::WorkflowError::SprintIndexRequired(
                stage.to_string(),
            )),
            (false, Some(_)) => Err(crate::error::WorkflowError::SprintIndexForbidden(
                stage.to_string(),
            )),
            _ => Ok(Self { stage, sprint }),
        }
    }

    pub fn one_shot(stage: Stage) -> Self {
        debug_assert!(!stage.is_sprint_scoped());
        Self {
            stage,
            sprint: None,
        }
    }

    pub fn sprint_scoped(stage: Stage, sprint: u32) -> Self {
        debug_assert!(stage.is_sprint_scoped());
        Self {
            stage,
            sprint: Some(sprint),
        }
    }
}

impl fmt::Display for StageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.sprint {
            Some(n) => write!(f, "{}@{}", self.stage, n),
            None => write!(f, "{}", self.stage),
        }
    }
}

// ---------------------------------------------------------------------------
// StageStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    NotStarted,
    InProgress,
    Completed,
    Failed,
}

impl fmt::Display for StageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StageStatus::NotStarted => "not_started",
            StageStatus::InProgress => "in_progress",
            StageStatus::Completed => "completed",
            StageStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// RuleSeverity
// ---------------------------------------------------------------------------

/// Required rules block stage completion; warnings are reported only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleSeverity {
    Required,
    Warning,
}

impl fmt::Display for RuleSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RuleSeverity::Required => "required",
            RuleSeverity::Warning => "warning",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn stage_ordering_matches_lifecycle() {
        assert!(Stage::Prd < Stage::Architecture);
        assert!(Stage::RepoInit < Stage::SprintPlan);
        assert!(Stage::Implementation < Stage::Review);
    }

    #[test]
    fn stage_roundtrip() {
        for stage in Stage::all() {
            let parsed = Stage::from_str(stage.as_str()).unwrap();
            assert_eq!(*stage, parsed);
        }
    }

    #[test]
    fn stage_arch_alias() {
        assert_eq!(Stage::from_str("arch").unwrap(), Stage::Architecture);
    }

    #[test]
    fn invalid_stage_rejected() {
        assert!(Stage::from_str("deploy").is_err());
        assert!(Stage::from_str("").is_err());
    }

    #[test]
    fn sprint_scoped_split() {
        assert!(!Stage::Prd.is_sprint_scoped());
        assert!(!Stage::RepoInit.is_sprint_scoped());
        assert!(Stage::SprintPlan.is_sprint_scoped());
        assert!(Stage::Review.is_sprint_scoped());
    }

    #[test]
    fn stage_key_enforces_sprint_index() {
        assert!(StageKey::new(Stage::SprintPlan, None).is_err());
        assert!(StageKey::new(Stage::Prd, Some(1)).is_err());
        assert!(StageKey::new(Stage::Prd, None).is_ok());
        assert!(StageKey::new(Stage::Review, Some(2)).is_ok());
    }

    #[test]
    fn stage_key_display() {
        assert_eq!(StageKey::one_shot(Stage::Prd).to_string(), "prd");
        assert_eq!(
            StageKey::sprint_scoped(Stage::SprintPlan, 3).to_string(),
            "sprint-plan@3"
        );
    }
}
