use crate::output::{print_json, print_table};
use prodflow_core::{stage::StageGraph, types::Stage};
use std::path::Path;

pub fn run(_root: &Path, json: bool) -> anyhow::Result<()> {
    let graph = StageGraph::standard();

    if json {
        #[derive(serde::Serialize)]
        struct StageEntry {
            stage: Stage,
            document: &'static str,
            sprint_scoped: bool,
            prerequisites: Vec<Stage>,
        }

        let stages: Vec<StageEntry> = graph
            .definitions()
            .iter()
            .map(|d| StageEntry {
                stage: d.stage,
                document: d.stage.document_name(),
                sprint_scoped: d.stage.is_sprint_scoped(),
                prerequisites: d.prerequisites.clone(),
            })
            .collect();
        return print_json(&stages);
    }

    let rows: Vec<Vec<String>> = graph
        .definitions()
        .iter()
        .map(|d| {
            let prereqs = d
                .prerequisites
                .iter()
                .map(|p| p.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            vec![
                d.stage.to_string(),
                d.stage.document_name().to_string(),
                if d.stage.is_sprint_scoped() {
                    "per-sprint".to_string()
                } else {
                    "once".to_string()
                },
                prereqs,
            ]
        })
        .collect();
    print_table(&["stage", "document", "cadence", "requires"], rows);
    Ok(())
}
