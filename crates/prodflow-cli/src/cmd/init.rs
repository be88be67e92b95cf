use anyhow::Context;
use prodflow_core::{engine::WorkflowEngine, paths};
use std::path::Path;

pub fn run(root: &Path, name: Option<&str>, force: bool) -> anyhow::Result<()> {
    let project_name = match name {
        Some(n) => n.to_string(),
        None => root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "project".to_string()),
    };

    println!("Initializing prodflow in: {}", root.display());

    let config_existed = paths::config_path(root).exists();
    let state_existed = paths::state_path(root).exists();

    WorkflowEngine::init(root, &project_name, force)
        .with_context(|| format!("failed to initialize project '{project_name}'"))?;

    let describe = |existed: bool| {
        if force || !existed {
            "created"
        } else {
            "exists: "
        }
    };
    println!("  {} {}", describe(config_existed), paths::CONFIG_FILE);
    println!("  {} {}", describe(state_existed), paths::STATE_FILE);
    println!("\nNext: run 'prodflow prd' to draft the product requirements.");
    Ok(())
}
