use super::Remote;
use crate::output::{print_json, print_table};
use anyhow::Context;
use clap::Subcommand;
use specsync_core::project::ProjectMetadata;
use specsync_core::sync::{StoryOutcome, TrackerSyncer};
use std::path::Path;

#[derive(Subcommand)]
pub enum TrackerSubcommand {
    /// Create the epic and one story per task in tasks.md
    Sync { feature: String },
    /// Point every story of the feature at its recorded epic
    LinkEpic { feature: String },
}

pub fn run(root: &Path, subcmd: TrackerSubcommand, json: bool) -> anyhow::Result<()> {
    let feature = match &subcmd {
        TrackerSubcommand::Sync { feature } | TrackerSubcommand::LinkEpic { feature } => feature,
    };
    super::check_feature(feature)?;

    let remote = Remote::load(root)?;
    let settings = remote.env.atlassian()?;
    let project = ProjectMetadata::load(root)?;
    let syncer = TrackerSyncer::new(root, &project, &settings, &remote.tracker);

    match subcmd {
        TrackerSubcommand::Sync { feature } => {
            let report = syncer
                .sync_tasks(&feature)
                .with_context(|| format!("failed to sync tasks for '{feature}'"))?;
            if json {
                return print_json(&report);
            }
            let epic_note = if report.epic_reused { "existing" } else { "new" };
            println!("Epic: {} ({epic_note})", report.epic_key);
            let rows = report
                .outcomes
                .iter()
                .map(|o| {
                    let (status, detail) = match o {
                        StoryOutcome::Created { key, .. } => ("created", key.clone()),
                        StoryOutcome::Reused { key, .. } => ("exists", key.clone()),
                        StoryOutcome::Failed { error, .. } => ("failed", error.clone()),
                    };
                    vec![status.to_string(), o.title().to_string(), detail]
                })
                .collect();
            print_table(&["STATUS", "STORY", "KEY"], rows);
            println!(
                "\n{} created, {} existing, {} failed of {}",
                report.created(),
                report.reused(),
                report.failed(),
                report.total()
            );
        }
        TrackerSubcommand::LinkEpic { feature } => {
            let report = syncer
                .link_epic(&feature)
                .with_context(|| format!("failed to link stories for '{feature}'"))?;
            if json {
                return print_json(&report);
            }
            let rows = report
                .outcomes
                .iter()
                .map(|o| {
                    vec![
                        o.key.clone(),
                        o.error.clone().unwrap_or_else(|| "linked".to_string()),
                    ]
                })
                .collect();
            print_table(&["STORY", "RESULT"], rows);
            println!(
                "\n{}/{} stories linked to {} via {}",
                report.linked(),
                report.outcomes.len(),
                report.epic_key,
                report.field
            );
        }
    }
    Ok(())
}
