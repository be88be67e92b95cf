use crate::output::{print_json, print_table};
use anyhow::Context;
use prodflow_core::{
    engine::WorkflowEngine,
    state::WorkflowState,
    types::{Stage, StageKey, StageStatus},
};
use std::path::Path;

/// Every stage instance the workflow knows about so far: the one-shot
/// stages plus each sprint's stages up to the current counter.
fn known_keys(state: &WorkflowState) -> Vec<StageKey> {
    let mut keys = Vec::new();
    for stage in Stage::all() {
        if !stage.is_sprint_scoped() {
            keys.push(StageKey::one_shot(*stage));
        }
    }
    for sprint in 1..=state.sprint {
        for stage in Stage::all() {
            if stage.is_sprint_scoped() {
                keys.push(StageKey::sprint_scoped(*stage, sprint));
            }
        }
    }
    keys
}

pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let engine = WorkflowEngine::open(root).context("failed to open project")?;
    let state = engine.state();

    if json {
        #[derive(serde::Serialize)]
        struct StageRow {
            stage: String,
            status: StageStatus,
        }

        #[derive(serde::Serialize)]
        struct StatusOutput<'a> {
            project: &'a str,
            sprint: u32,
            stages: Vec<StageRow>,
            last_outcome: Option<&'a str>,
        }

        let stages = known_keys(state)
            .iter()
            .map(|k| StageRow {
                stage: k.to_string(),
                status: state.status_of(k),
            })
            .collect();
        let output = StatusOutput {
            project: &state.project,
            sprint: state.sprint,
            stages,
            last_outcome: state.last_entry().map(|e| e.outcome.as_str()),
        };
        return print_json(&output);
    }

    println!("Project: {}", state.project);
    println!("Sprint:  {}", state.sprint);
    println!();

    let rows: Vec<Vec<String>> = known_keys(state)
        .iter()
        .map(|k| {
            vec![
                k.to_string(),
                state.status_of(k).to_string(),
                k.stage.document_name().to_string(),
            ]
        })
        .collect();
    print_table(&["stage", "status", "document"], rows);

    if let Some(entry) = state.last_entry() {
        println!();
        println!(
            "Last action: {} -> {} ({})",
            entry.key, entry.status, entry.outcome
        );
    }
    Ok(())
}
