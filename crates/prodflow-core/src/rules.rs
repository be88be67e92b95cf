use crate::types::{RuleSeverity, Stage};
use regex::Regex;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// RuleCheck
// ---------------------------------------------------------------------------

/// A pure predicate over artifact text. Deterministic, no side effects:
/// the same content always yields the same outcome.
#[derive(Debug, Clone)]
pub enum RuleCheck {
    /// Content contains at least one non-whitespace character.
    NonEmpty,
    /// A Markdown heading line matches the pattern.
    HeadingPresent { pattern: Regex },
    /// At least `min` Markdown heading lines match the pattern.
    MinSections { pattern: Regex, min: usize },
    /// Any line matches the pattern.
    ContainsPattern { pattern: Regex },
}

fn heading_lines(content: &str) -> impl Iterator<Item = &str> {
    content.lines().filter(|l| l.trim_start().starts_with('#'))
}

impl RuleCheck {
    /// Evaluate against `content`, returning pass/fail and a reason.
    pub fn evaluate(&self, content: &str) -> (bool, String) {
        match self {
            RuleCheck::NonEmpty => {
                if content.trim().is_empty() {
                    (false, "document is empty".to_string())
                } else {
                    (true, "document has content".to_string())
                }
            }
            RuleCheck::HeadingPresent { pattern } => {
                if heading_lines(content).any(|l| pattern.is_match(l)) {
                    (true, format!("found heading matching '{pattern}'"))
                } else {
                    (false, format!("no heading matches '{pattern}'"))
                }
            }
            RuleCheck::MinSections { pattern, min } => {
                let count = heading_lines(content).filter(|l| pattern.is_match(l)).count();
                if count >= *min {
                    (true, format!("found {count} section(s) matching '{pattern}'"))
                } else {
                    (
                        false,
                        format!("found {count} section(s) matching '{pattern}', need at least {min}"),
                    )
                }
            }
            RuleCheck::ContainsPattern { pattern } => {
                if content.lines().any(|l| pattern.is_match(l)) {
                    (true, format!("found line matching '{pattern}'"))
                } else {
                    (false, format!("no line matches '{pattern}'"))
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// ValidationRule
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ValidationRule {
    pub name: &'static str,
    pub severity: RuleSeverity,
    pub check: RuleCheck,
}

impl ValidationRule {
    pub fn required(name: &'static str, check: RuleCheck) -> Self {
        Self {
            name,
            severity: RuleSeverity::Required,
            check,
        }
    }

    pub fn warning(name: &'static str, check: RuleCheck) -> Self {
        Self {
            name,
            severity: RuleSeverity::Warning,
            check,
        }
    }
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleOutcome {
    pub rule: String,
    pub severity: RuleSeverity,
    pub passed: bool,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleFailure {
    pub rule: String,
    pub reason: String,
}

/// Full result of one checklist evaluation, one outcome per rule in
/// declaration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub outcomes: Vec<RuleOutcome>,
}

impl ValidationReport {
    /// True when no required rule failed. Warnings never block.
    pub fn passed(&self) -> bool {
        self.required_failures().is_empty()
    }

    pub fn required_failures(&self) -> Vec<RuleFailure> {
        self.outcomes
            .iter()
            .filter(|o| !o.passed && o.severity == RuleSeverity::Required)
            .map(|o| RuleFailure {
                rule: o.rule.clone(),
                reason: o.reason.clone(),
            })
            .collect()
    }

    pub fn warnings(&self) -> Vec<&RuleOutcome> {
        self.outcomes
            .iter()
            .filter(|o| !o.passed && o.severity == RuleSeverity::Warning)
            .collect()
    }
}

// ---------------------------------------------------------------------------
// ValidationChecklist
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ValidationChecklist {
    pub rules: Vec<ValidationRule>,
}

impl ValidationChecklist {
    pub fn new(rules: Vec<ValidationRule>) -> Self {
        Self { rules }
    }

    /// Run every rule, with no short-circuit, so the caller sees the
    /// full failure list in one pass.
    pub fn evaluate(&self, content: &str) -> ValidationReport {
        let outcomes = self
            .rules
            .iter()
            .map(|rule| {
                let (passed, reason) = rule.check.evaluate(content);
                RuleOutcome {
                    rule: rule.name.to_string(),
                    severity: rule.severity,
                    passed,
                    reason,
                }
            })
            .collect();
        ValidationReport { outcomes }
    }
}

// ---------------------------------------------------------------------------
// Per-stage defaults
// ---------------------------------------------------------------------------

fn re(pattern: &str) -> Regex {
    // Patterns below are literals, known valid at compile time.
    Regex::new(pattern).unwrap()
}

fn heading(pattern: &str) -> RuleCheck {
    RuleCheck::HeadingPresent { pattern: re(pattern) }
}

fn sections(pattern: &str, min: usize) -> RuleCheck {
    RuleCheck::MinSections {
        pattern: re(pattern),
        min,
    }
}

/// The checklist gating each stage's completion. Rule names are stable
/// strings surfaced in reports and error messages.
pub fn default_checklist(stage: Stage) -> ValidationChecklist {
    use ValidationRule as R;
    let rules = match stage {
        Stage::Prd => vec![
            R::required("non-empty", RuleCheck::NonEmpty),
            R::required("has-title", heading(r"^#\s+\S")),
            R::required("problem-statement", heading(r"(?i)^##\s+problem")),
            R::warning("success-metrics", heading(r"(?i)^##\s+(success|metrics)")),
        ],
        Stage::Architecture => vec![
            R::required("non-empty", RuleCheck::NonEmpty),
            R::required("has-title", heading(r"^#\s+\S")),
            R::required("components-section", heading(r"(?i)^##\s+components?")),
            R::warning("tech-stack", heading(r"(?i)^##\s+(tech|stack)")),
        ],
        Stage::RepoInit => vec![
            R::required("non-empty", RuleCheck::NonEmpty),
            R::required("has-title", heading(r"^#\s+\S")),
            R::warning("structure-section", heading(r"(?i)^##\s+structure")),
        ],
        Stage::SprintPlan => vec![
            R::required("goal-statement", heading(r"(?i)^##\s+goal")),
            R::required("feature-entries", sections(r"(?i)^###\s+feature:", 1)),
            R::warning("capacity-note", heading(r"(?i)^##\s+capacity")),
        ],
        Stage::SprintTech => vec![
            R::required("non-empty", RuleCheck::NonEmpty),
            R::required("design-section", heading(r"(?i)^##\s+(technical\s+)?design")),
            R::warning("risks-section", heading(r"(?i)^##\s+risks?")),
        ],
        Stage::IssueGeneration => vec![
            R::required("issue-entries", sections(r"(?i)^###\s+issue:", 1)),
            R::warning("estimates-present", RuleCheck::ContainsPattern {
                pattern: re(r"(?i)estimate:"),
            }),
        ],
        Stage::Implementation => vec![
            R::required("non-empty", RuleCheck::NonEmpty),
            R::required("summary-section", heading(r"(?i)^##\s+summary")),
            R::warning("test-notes", heading(r"(?i)^##\s+test")),
        ],
        Stage::Review => vec![
            R::required("non-empty", RuleCheck::NonEmpty),
            R::required("verdict-section", heading(r"(?i)^##\s+verdict")),
            R::warning("follow-ups", heading(r"(?i)^##\s+follow")),
        ],
    };
    ValidationChecklist::new(rules)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checklist_runs_every_rule() {
        let checklist = default_checklist(Stage::SprintPlan);
        let report = checklist.evaluate("");
        // All rules reported, not just the first failure.
        assert_eq!(report.outcomes.len(), checklist.rules.len());
    }

    #[test]
    fn outcomes_in_declaration_order() {
        let checklist = default_checklist(Stage::SprintPlan);
        let report = checklist.evaluate("");
        let names: Vec<&str> = report.outcomes.iter().map(|o| o.rule.as_str()).collect();
        assert_eq!(names, vec!["goal-statement", "feature-entries", "capacity-note"]);
    }

    #[test]
    fn evaluation_is_idempotent() {
        let checklist = default_checklist(Stage::Prd);
        let content = "# My Product\n\n## Problem\nUsers cannot log in.\n";
        let a = checklist.evaluate(content);
        let b = checklist.evaluate(content);
        assert_eq!(a, b);
    }

    #[test]
    fn goal_without_features_fails_only_feature_rule() {
        let checklist = default_checklist(Stage::SprintPlan);
        let content = "## Goal\nShip login.\n";
        let report = checklist.evaluate(content);
        assert!(!report.passed());
        let failures = report.required_failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].rule, "feature-entries");
        assert!(failures[0].reason.contains("need at least 1"));
    }

    #[test]
    fn sprint_plan_passes_with_goal_and_feature() {
        let checklist = default_checklist(Stage::SprintPlan);
        let content = "## Goal\nShip login.\n\n### Feature: login form\nBuild it.\n";
        let report = checklist.evaluate(content);
        assert!(report.passed(), "failures: {:?}", report.required_failures());
    }

    #[test]
    fn warnings_do_not_block() {
        let checklist = default_checklist(Stage::SprintPlan);
        let content = "## Goal\nShip login.\n\n### Feature: login form\n";
        let report = checklist.evaluate(content);
        assert!(report.passed());
        // capacity-note warning fired but did not block
        assert_eq!(report.warnings().len(), 1);
        assert_eq!(report.warnings()[0].rule, "capacity-note");
    }

    #[test]
    fn min_sections_counts_only_headings() {
        let check = sections(r"(?i)^###\s+feature:", 2);
        let content = "### Feature: a\nfeature: not a heading\n### Feature: b\n";
        let (passed, reason) = check.evaluate(content);
        assert!(passed, "{reason}");
    }

    #[test]
    fn non_empty_rejects_whitespace() {
        let (passed, _) = RuleCheck::NonEmpty.evaluate("  \n\t\n");
        assert!(!passed);
    }

    #[test]
    fn every_stage_has_a_default_checklist() {
        for stage in Stage::all() {
            let checklist = default_checklist(*stage);
            assert!(!checklist.rules.is_empty(), "no rules for {stage}");
            assert!(
                checklist
                    .rules
                    .iter()
                    .any(|r| r.severity == RuleSeverity::Required),
                "no required rule for {stage}"
            );
        }
    }

    #[test]
    fn report_serializes_to_json() {
        let report = default_checklist(Stage::Review).evaluate("## Verdict\nShip it.\n");
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("verdict-section"));
        let parsed: ValidationReport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, report);
    }
}
