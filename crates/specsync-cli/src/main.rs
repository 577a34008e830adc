mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::{
    docs::DocsSubcommand, phase::PhaseSubcommand, project::ProjectSubcommand,
    tracker::TrackerSubcommand, workflow::WorkflowSubcommand,
};
use specsync_core::types::{Phase, PreflightScope};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "specsync",
    about = "Sync .kiro spec documents to Confluence and Jira, and gate each phase on their state",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from .kiro/ or .git/)
    #[arg(long, global = true, env = "SPECSYNC_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check credentials, project metadata, and remote reachability
    Preflight {
        /// confluence | jira | all
        #[arg(default_value = "all")]
        scope: PreflightScope,
    },

    /// Validate one phase of a feature against its documents and spec.json
    Validate { feature: String, phase: Phase },

    /// Run or approve a phase
    Phase {
        #[command(subcommand)]
        subcommand: PhaseSubcommand,
    },

    /// Publish documents to Confluence
    Docs {
        #[command(subcommand)]
        subcommand: DocsSubcommand,
    },

    /// Create the epic and stories in Jira
    Tracker {
        #[command(subcommand)]
        subcommand: TrackerSubcommand,
    },

    /// Run the multi-stage workflow
    Workflow {
        #[command(subcommand)]
        subcommand: WorkflowSubcommand,
    },

    /// Estimate effort from the task table in design.md
    Estimate {
        feature: String,
        /// Also write estimate.md next to the feature documents
        #[arg(long)]
        write: bool,
    },

    /// Inspect .kiro/project.json
    Project {
        #[command(subcommand)]
        subcommand: ProjectSubcommand,
    },
}

impl Commands {
    fn talks_to_remote(&self) -> bool {
        match self {
            Commands::Preflight { .. } | Commands::Tracker { .. } | Commands::Workflow { .. } => {
                true
            }
            Commands::Phase { subcommand } => matches!(subcommand, PhaseSubcommand::Run { .. }),
            Commands::Docs { subcommand } => matches!(subcommand, DocsSubcommand::Sync { .. }),
            Commands::Validate { .. } | Commands::Estimate { .. } | Commands::Project { .. } => {
                false
            }
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.command.talks_to_remote() {
        tracing::Level::INFO
    } else {
        tracing::Level::WARN
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Preflight { scope } => cmd::preflight::run(&root, scope, cli.json),
        Commands::Validate { feature, phase } => {
            cmd::validate::run(&root, &feature, phase, cli.json)
        }
        Commands::Phase { subcommand } => cmd::phase::run(&root, subcommand, cli.json),
        Commands::Docs { subcommand } => cmd::docs::run(&root, subcommand, cli.json),
        Commands::Tracker { subcommand } => cmd::tracker::run(&root, subcommand, cli.json),
        Commands::Workflow { subcommand } => cmd::workflow::run(&root, subcommand, cli.json),
        Commands::Estimate { feature, write } => {
            cmd::estimate::run(&root, &feature, write, cli.json)
        }
        Commands::Project { subcommand } => cmd::project::run(&root, subcommand, cli.json),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
