mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use prodflow_core::types::Stage;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "prodflow",
    about = "Workflow gate engine: drive a product through PRD, architecture, and sprint cycles with validated stage gates",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from .prodflow/ or .git/)
    #[arg(long, global = true, env = "PRODFLOW_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize prodflow in the current project
    Init {
        /// Project name (defaults to the root directory name)
        name: Option<String>,

        /// Reset config and state even if they already exist
        #[arg(long, short = 'f')]
        force: bool,
    },

    /// Run the product-requirements stage
    Prd {
        /// Overwrite a completed stage's document
        #[arg(long, short = 'f')]
        force: bool,
    },

    /// Run the architecture stage
    Arch {
        #[arg(long, short = 'f')]
        force: bool,
    },

    /// Run the repository-setup stage
    RepoInit {
        #[arg(long, short = 'f')]
        force: bool,
    },

    /// Run the sprint-planning stage
    PlanSprint {
        /// Sprint index (default: current sprint)
        #[arg(long)]
        sprint: Option<u32>,

        #[arg(long, short = 'f')]
        force: bool,
    },

    /// Run the sprint technical-design stage
    SprintTech {
        #[arg(long)]
        sprint: Option<u32>,

        #[arg(long, short = 'f')]
        force: bool,
    },

    /// Run the issue-generation stage and sync tickets
    CreateIssues {
        #[arg(long)]
        sprint: Option<u32>,

        #[arg(long, short = 'f')]
        force: bool,
    },

    /// Run the implementation stage
    Dev {
        #[arg(long)]
        sprint: Option<u32>,

        #[arg(long, short = 'f')]
        force: bool,
    },

    /// Run the sprint-review stage
    Review {
        #[arg(long)]
        sprint: Option<u32>,

        #[arg(long, short = 'f')]
        force: bool,
    },

    /// Re-sync tickets from the stored issues document without regenerating it
    SyncTickets {
        #[arg(long)]
        sprint: Option<u32>,
    },

    /// Advance the sprint counter (requires a completed review)
    Advance,

    /// Abandon an in-progress stage, marking it failed
    Abandon {
        /// Stage name (e.g. prd, sprint-plan)
        stage: String,

        #[arg(long)]
        sprint: Option<u32>,
    },

    /// Show project, sprint, and per-stage status
    Status,

    /// Re-validate stored documents and check required tools
    Check {
        /// Limit to one stage (default: all stored documents)
        stage: Option<String>,
    },

    /// List stages with their documents and prerequisites
    List,

    /// Show version information
    Version,
}

fn stage_command(
    root: &std::path::Path,
    stage: Stage,
    sprint: Option<u32>,
    force: bool,
    json: bool,
) -> anyhow::Result<()> {
    cmd::stage::run(root, stage, sprint, force, json)
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .init();

    let root_path = cli.root.as_deref();
    let root = root::resolve_root(root_path);
    let json = cli.json;

    let result = match cli.command {
        Commands::Init { name, force } => cmd::init::run(&root, name.as_deref(), force),
        Commands::Prd { force } => stage_command(&root, Stage::Prd, None, force, json),
        Commands::Arch { force } => stage_command(&root, Stage::Architecture, None, force, json),
        Commands::RepoInit { force } => stage_command(&root, Stage::RepoInit, None, force, json),
        Commands::PlanSprint { sprint, force } => {
            stage_command(&root, Stage::SprintPlan, sprint, force, json)
        }
        Commands::SprintTech { sprint, force } => {
            stage_command(&root, Stage::SprintTech, sprint, force, json)
        }
        Commands::CreateIssues { sprint, force } => {
            stage_command(&root, Stage::IssueGeneration, sprint, force, json)
        }
        Commands::Dev { sprint, force } => {
            stage_command(&root, Stage::Implementation, sprint, force, json)
        }
        Commands::Review { sprint, force } => {
            stage_command(&root, Stage::Review, sprint, force, json)
        }
        Commands::SyncTickets { sprint } => cmd::stage::sync_tickets(&root, sprint, json),
        Commands::Advance => cmd::advance::run(&root, json),
        Commands::Abandon { stage, sprint } => cmd::stage::abandon(&root, &stage, sprint),
        Commands::Status => cmd::status::run(&root, json),
        Commands::Check { stage } => cmd::check::run(&root, stage.as_deref(), json),
        Commands::List => cmd::list::run(&root, json),
        Commands::Version => {
            println!("prodflow {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
