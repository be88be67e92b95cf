use crate::output::print_json;
use anyhow::Context;
use prodflow_core::engine::WorkflowEngine;
use std::path::Path;

pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let mut engine = WorkflowEngine::open(root).context("failed to open project")?;
    let sprint = engine.advance_sprint()?;

    if json {
        #[derive(serde::Serialize)]
        struct AdvanceOutput {
            sprint: u32,
        }
        return print_json(&AdvanceOutput { sprint });
    }

    println!("Advanced to sprint {sprint}.");
    println!("Next: run 'prodflow plan-sprint' to plan it.");
    Ok(())
}
