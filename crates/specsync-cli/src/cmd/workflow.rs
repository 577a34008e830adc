use super::Remote;
use crate::output::{print_json, print_table};
use anyhow::Context;
use clap::Subcommand;
use specsync_core::types::Stage;
use specsync_core::workflow::{WorkflowConfig, WorkflowOrchestrator};
use std::path::{Path, PathBuf};

#[derive(Subcommand)]
pub enum WorkflowSubcommand {
    /// Run stages in order, stopping at the first failure
    Run {
        /// Feature to run (required unless --config names one)
        #[arg(long)]
        feature: Option<String>,
        /// YAML workflow file
        #[arg(long)]
        config: Option<PathBuf>,
        /// Comma-separated stage list, overriding the configured stages
        #[arg(long, value_delimiter = ',')]
        stages: Vec<Stage>,
    },
    /// Print the standard workflow as YAML
    Template { feature: String },
}

pub fn run(root: &Path, subcmd: WorkflowSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        WorkflowSubcommand::Run {
            feature,
            config,
            stages,
        } => run_workflow(root, feature, config.as_deref(), stages, json),
        WorkflowSubcommand::Template { feature } => template(&feature),
    }
}

fn resolve_config(
    feature: Option<String>,
    config: Option<&Path>,
    stages: Vec<Stage>,
) -> anyhow::Result<WorkflowConfig> {
    let mut cfg = match (config, feature.as_deref()) {
        (Some(path), _) => WorkflowConfig::load(path)
            .with_context(|| format!("failed to load workflow config {}", path.display()))?,
        (None, Some(feature)) => WorkflowConfig::standard(feature),
        (None, None) => anyhow::bail!("either --feature or --config is required"),
    };
    if let Some(feature) = feature {
        cfg.feature = feature;
    }
    if !stages.is_empty() {
        cfg.stages = stages;
    }
    super::check_feature(&cfg.feature)?;
    Ok(cfg)
}

fn run_workflow(
    root: &Path,
    feature: Option<String>,
    config: Option<&Path>,
    stages: Vec<Stage>,
    json: bool,
) -> anyhow::Result<()> {
    let cfg = resolve_config(feature, config, stages)?;
    let remote = Remote::load(root)?;
    let report = WorkflowOrchestrator::new(root, &remote.env, cfg, &remote.docs, &remote.tracker)
        .run()?;

    if json {
        return print_json(&report);
    }

    let rows = report
        .stages
        .iter()
        .map(|s| vec![s.stage.to_string(), s.detail.clone()])
        .collect();
    print_table(&["STAGE", "RESULT"], rows);

    let pending: Vec<_> = report.pending_approvals().collect();
    if !pending.is_empty() {
        println!("\nApprovals requested:");
        for a in pending {
            println!("  {}: {}", a.stage, a.approvers.join(", "));
        }
    }
    println!("\nWorkflow completed for '{}'.", report.feature);
    Ok(())
}

fn template(feature: &str) -> anyhow::Result<()> {
    super::check_feature(feature)?;
    let yaml = serde_yaml::to_string(&WorkflowConfig::standard(feature))?;
    print!("{yaml}");
    Ok(())
}
