use crate::output::{print_json, print_report};
use anyhow::Context;
use prodflow_core::{
    engine::WorkflowEngine,
    rules::ValidationReport,
    types::{Stage, StageKey},
};
use std::path::Path;
use std::str::FromStr;

/// Re-validate stored documents without mutating workflow state, and
/// probe for the external tools the workflow leans on.
pub fn run(root: &Path, stage: Option<&str>, json: bool) -> anyhow::Result<()> {
    let engine = WorkflowEngine::open(root).context("failed to open project")?;

    let targets: Vec<Stage> = match stage {
        Some(s) => vec![Stage::from_str(s)?],
        None => Stage::all().to_vec(),
    };

    // Sprint-scoped documents exist for every sprint up to the current
    // counter, not just the current one.
    let mut results: Vec<(StageKey, ValidationReport)> = Vec::new();
    for stage in targets {
        let sprints: Vec<Option<u32>> = if stage.is_sprint_scoped() {
            (1..=engine.state().sprint).map(Some).collect()
        } else {
            vec![None]
        };
        for sprint in sprints {
            let key = match engine.resolve_key(stage, sprint) {
                Ok(k) => k,
                Err(_) => continue,
            };
            if !engine.store().exists(&key) {
                continue;
            }
            results.push(engine.check_stage(stage, sprint)?);
        }
    }

    let all_passed = results.iter().all(|(_, r)| r.passed());

    if json {
        #[derive(serde::Serialize)]
        struct CheckEntry {
            stage: String,
            passed: bool,
            report: ValidationReport,
        }

        #[derive(serde::Serialize)]
        struct CheckOutput {
            passed: bool,
            documents: Vec<CheckEntry>,
            git: bool,
            gh: bool,
        }

        let output = CheckOutput {
            passed: all_passed,
            documents: results
                .into_iter()
                .map(|(key, report)| CheckEntry {
                    stage: key.to_string(),
                    passed: report.passed(),
                    report,
                })
                .collect(),
            git: which::which("git").is_ok(),
            gh: which::which("gh").is_ok(),
        };
        if !output.passed {
            print_json(&output)?;
            anyhow::bail!("one or more documents failed validation");
        }
        return print_json(&output);
    }

    if results.is_empty() {
        println!("No stored documents to check yet.");
    }
    for (key, report) in &results {
        println!("{key}: {}", if report.passed() { "pass" } else { "FAIL" });
        print_report(report);
    }

    println!();
    for tool in ["git", "gh"] {
        match which::which(tool) {
            Ok(path) => println!("  found:   {tool} ({})", path.display()),
            Err(_) => println!("  missing: {tool}"),
        }
    }

    if !all_passed {
        anyhow::bail!("one or more documents failed validation");
    }
    Ok(())
}
