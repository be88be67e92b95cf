use crate::error::{Result, WorkflowError};
use crate::rules::{default_checklist, ValidationChecklist};
use crate::types::Stage;

// ---------------------------------------------------------------------------
// StageDefinition
// ---------------------------------------------------------------------------

/// Declares a stage's direct prerequisites (in declaration order; error
/// messages name the first missing one) and the checklist gating its
/// completion.
#[derive(Debug, Clone)]
pub struct StageDefinition {
    pub stage: Stage,
    pub prerequisites: Vec<Stage>,
    pub checklist: ValidationChecklist,
}

// ---------------------------------------------------------------------------
// StageGraph
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct StageGraph {
    definitions: Vec<StageDefinition>,
}

impl StageGraph {
    /// The canonical lifecycle:
    /// prd → architecture → repo-init → sprint-plan → sprint-tech →
    /// issue-generation → implementation → review.
    ///
    /// Cross-sprint ordering (sprint-plan(N+1) requires review(N)) is
    /// enforced by the engine via the sprint counter, not encoded here.
    pub fn standard() -> Self {
        let def = |stage: Stage, prerequisites: Vec<Stage>| StageDefinition {
            stage,
            prerequisites,
            checklist: default_checklist(stage),
        };
        let graph = Self {
            definitions: vec![
                def(Stage::Prd, vec![]),
                def(Stage::Architecture, vec![Stage::Prd]),
                def(Stage::RepoInit, vec![Stage::Prd, Stage::Architecture]),
                def(
                    Stage::SprintPlan,
                    vec![Stage::Prd, Stage::Architecture, Stage::RepoInit],
                ),
                def(Stage::SprintTech, vec![Stage::SprintPlan]),
                def(Stage::IssueGeneration, vec![Stage::SprintPlan, Stage::SprintTech]),
                def(Stage::Implementation, vec![Stage::IssueGeneration]),
                def(Stage::Review, vec![Stage::Implementation]),
            ],
        };
        debug_assert!(graph.validate().is_ok());
        graph
    }

    pub fn new(definitions: Vec<StageDefinition>) -> Result<Self> {
        let graph = Self { definitions };
        graph.validate()?;
        Ok(graph)
    }

    pub fn definitions(&self) -> &[StageDefinition] {
        &self.definitions
    }

    pub fn definition(&self, stage: Stage) -> Option<&StageDefinition> {
        self.definitions.iter().find(|d| d.stage == stage)
    }

    /// Reject graphs where any stage is its own prerequisite, directly
    /// or transitively.
    pub fn validate(&self) -> Result<()> {
        for def in &self.definitions {
            let mut visited = Vec::new();
            if self.reaches(def.stage, def.stage, &mut visited) {
                return Err(WorkflowError::InvalidStage(format!(
                    "prerequisite cycle through '{}'",
                    def.stage
                )));
            }
        }
        Ok(())
    }

    fn reaches(&self, from: Stage, target: Stage, visited: &mut Vec<Stage>) -> bool {
        let Some(def) = self.definition(from) else {
            return false;
        };
        for &p in &def.prerequisites {
            if p == target {
                return true;
            }
            if !visited.contains(&p) {
                visited.push(p);
                if self.reaches(p, target, visited) {
                    return true;
                }
            }
        }
        false
    }

    /// All prerequisites of `stage`, transitively, in deterministic
    /// declaration order: each stage's direct list is walked in order,
    /// depth-first, keeping the first occurrence of each stage.
    pub fn transitive_prerequisites(&self, stage: Stage) -> Vec<Stage> {
        let mut out = Vec::new();
        self.collect(stage, &mut out);
        out
    }

    fn collect(&self, stage: Stage, out: &mut Vec<Stage>) {
        let Some(def) = self.definition(stage) else {
            return;
        };
        for &p in &def.prerequisites {
            if !out.contains(&p) {
                out.push(p);
                self.collect(p, out);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
