use crate::config::Config;
use crate::error::Result;
use crate::types::Stage;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ContentGenerator
// ---------------------------------------------------------------------------

/// Everything a generator may consult when drafting a stage document.
#[derive(Debug, Clone)]
pub struct PromptContext<'a> {
    pub stage: Stage,
    pub sprint: Option<u32>,
    pub project: &'a str,
    pub config: &'a Config,
}

/// Boundary to the external content-generation step (an AI assistant, a
/// template expander, a human). The engine treats the output as an
/// opaque candidate body: always validated, never trusted.
pub trait ContentGenerator {
    fn generate(&self, ctx: &PromptContext<'_>) -> Result<String>;
}

// ---------------------------------------------------------------------------
// TemplateGenerator
// ---------------------------------------------------------------------------

/// Default generator: emits a per-stage skeleton with the structural
/// headings the stage checklist scans for, plus placeholder prose for a
/// human or agent to replace.
#[derive(Debug, Clone, Default)]
pub struct TemplateGenerator;

impl ContentGenerator for TemplateGenerator {
    fn generate(&self, ctx: &PromptContext<'_>) -> Result<String> {
        let project = ctx.project;
        let sprint = ctx.sprint.unwrap_or(1);
        let body = match ctx.stage {
            Stage::Prd => format!(
                "# {project} Product Requirements\n\n\
                 ## Problem\n\nDescribe the user problem this product solves.\n\n\
                 ## Success Metrics\n\nList measurable outcomes.\n"
            ),
            Stage::Architecture => format!(
                "# {project} Architecture\n\n\
                 ## Components\n\nName each component and its responsibility.\n\n\
                 ## Tech Stack\n\nLanguages, frameworks, infrastructure.\n"
            ),
            Stage::RepoInit => format!(
                "# {project} Repository Setup\n\n\
                 ## Structure\n\nDirectory layout, tooling, CI entry points.\n"
            ),
            Stage::SprintPlan => format!(
                "# Sprint {sprint} Plan\n\n\
                 ## Goal\n\nOne sentence describing what this sprint ships.\n\n\
                 ### Feature: rename-me\n\nScope and acceptance criteria.\n\n\
                 ## Capacity\n\nWho is working and how much.\n"
            ),
            Stage::SprintTech => format!(
                "# Sprint {sprint} Technical Notes\n\n\
                 ## Technical Design\n\nHow the planned features will be built.\n\n\
                 ## Risks\n\nKnown unknowns and mitigations.\n"
            ),
            Stage::IssueGeneration => format!(
                "# Sprint {sprint} Issues\n\n\
                 ### Issue: rename-me\n\nEstimate: 1d\n\nWhat to build and how to verify it.\n"
            ),
            Stage::Implementation => format!(
                "# Sprint {sprint} Implementation\n\n\
                 ## Summary\n\nWhat was built, per issue.\n\n\
                 ## Test Notes\n\nCoverage and manual checks.\n"
            ),
            Stage::Review => format!(
                "# Sprint {sprint} Review\n\n\
                 ## Verdict\n\nShip / hold, with reasons.\n\n\
                 ## Follow-ups\n\nCarry-over work for the next sprint.\n"
            ),
        };
        Ok(body)
    }
}

// ---------------------------------------------------------------------------
// IssueTracker
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketId(pub String);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: TicketId,
    pub title: String,
    pub open: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketSpec {
    pub title: String,
    pub body: String,
}

/// Boundary to an external ticketing service. Failures here are always
/// recoverable; the engine never lets them corrupt workflow state.
pub trait IssueTracker {
    fn create_ticket(&self, spec: &TicketSpec) -> Result<TicketId>;
    fn list_open(&self) -> Result<Vec<Ticket>>;
}

/// Extract one ticket per `### Issue:` entry from a validated
/// issue-generation document. The body runs until the next heading of
/// equal or higher level.
pub fn parse_ticket_specs(content: &str) -> Vec<TicketSpec> {
    let mut specs: Vec<TicketSpec> = Vec::new();
    let mut current: Option<TicketSpec> = None;
    for line in content.lines() {
        let trimmed = line.trim_start();
        let lower = trimmed.to_ascii_lowercase();
        if let Some(rest) = lower.strip_prefix("### issue:") {
            if let Some(spec) = current.take() {
                specs.push(spec);
            }
            let offset = trimmed.len() - rest.len();
            current = Some(TicketSpec {
                title: trimmed[offset..].trim().to_string(),
                body: String::new(),
            });
        } else if trimmed.starts_with("##") || trimmed.starts_with("# ") {
            if let Some(spec) = current.take() {
                specs.push(spec);
            }
        } else if let Some(spec) = current.as_mut() {
            if !spec.body.is_empty() || !trimmed.is_empty() {
                spec.body.push_str(line);
                spec.body.push('\n');
            }
        }
    }
    if let Some(spec) = current.take() {
        specs.push(spec);
    }
    for spec in &mut specs {
        spec.body = spec.body.trim_end().to_string();
    }
    specs
}

// ---------------------------------------------------------------------------
// Test doubles
// ---------------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod doubles {
    use super::*;
    use crate::error::WorkflowError;
    use std::cell::RefCell;

    /// Returns fixed content, or a collaborator error when `content` is
    /// None.
    pub struct StaticGenerator {
        pub content: Option<String>,
    }

    impl StaticGenerator {
        pub fn ok(content: impl Into<String>) -> Self {
            Self {
                content: Some(content.into()),
            }
        }

        pub fn failing() -> Self {
            Self { content: None }
        }
    }

    impl ContentGenerator for StaticGenerator {
        fn generate(&self, _ctx: &PromptContext<'_>) -> Result<String> {
            match &self.content {
                Some(c) => Ok(c.clone()),
                None => Err(WorkflowError::Collaborator(
                    "generator unavailable".to_string(),
                )),
            }
        }
    }

    #[derive(Default)]
    pub struct RecordingTracker {
        pub created: RefCell<Vec<TicketSpec>>,
        pub fail: bool,
    }

    impl IssueTracker for RecordingTracker {
        fn create_ticket(&self, spec: &TicketSpec) -> Result<TicketId> {
            if self.fail {
                return Err(WorkflowError::Collaborator("tracker down".to_string()));
            }
            let mut created = self.created.borrow_mut();
            created.push(spec.clone());
            Ok(TicketId(format!("T-{}", created.len())))
        }

        fn list_open(&self) -> Result<Vec<Ticket>> {
            Ok(self
                .created
                .borrow()
                .iter()
                .enumerate()
                .map(|(i, s)| Ticket {
                    id: TicketId(format!("T-{}", i + 1)),
                    title: s.title.clone(),
                    open: true,
                })
                .collect())
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
