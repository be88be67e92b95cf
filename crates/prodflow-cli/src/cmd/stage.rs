use crate::output::{print_json, print_report};
use anyhow::Context;
use prodflow_core::{collaborator::TicketId, engine::WorkflowEngine, types::Stage};
use std::path::Path;
use std::str::FromStr;

pub fn run(
    root: &Path,
    stage: Stage,
    sprint: Option<u32>,
    force: bool,
    json: bool,
) -> anyhow::Result<()> {
    let mut engine = WorkflowEngine::open(root).context("failed to open project")?;
    let outcome = engine.run_stage(stage, sprint, force)?;

    if json {
        return print_json(&outcome);
    }

    println!("Stage {}: {}", outcome.key, outcome.status);
    if let Some(report) = &outcome.report {
        print_report(report);
    }
    if !outcome.tickets.is_empty() {
        println!("Created {} ticket(s):", outcome.tickets.len());
        for ticket in &outcome.tickets {
            println!("  {}", ticket.0);
        }
    }
    if let Some(err) = &outcome.ticket_error {
        println!("Ticket sync incomplete (stage still completed): {err}");
        println!("Run 'prodflow sync-tickets' once the tracker is reachable.");
    }
    println!(
        "Document: {}",
        engine.store().path_for(&outcome.key).display()
    );
    Ok(())
}

pub fn sync_tickets(root: &Path, sprint: Option<u32>, json: bool) -> anyhow::Result<()> {
    let engine = WorkflowEngine::open(root).context("failed to open project")?;
    let tickets = engine.sync_tickets(sprint)?;

    if json {
        #[derive(serde::Serialize)]
        struct SyncOutput {
            tickets: Vec<TicketId>,
        }
        return print_json(&SyncOutput { tickets });
    }

    println!("Created {} ticket(s) from the stored issues document:", tickets.len());
    for ticket in &tickets {
        println!("  {}", ticket.0);
    }
    Ok(())
}

pub fn abandon(root: &Path, stage: &str, sprint: Option<u32>) -> anyhow::Result<()> {
    let stage = Stage::from_str(stage)?;
    let mut engine = WorkflowEngine::open(root).context("failed to open project")?;
    engine.abandon(stage, sprint)?;
    println!("Stage {stage} marked failed (abandoned).");
    Ok(())
}
