use super::Remote;
use crate::output::print_json;
use anyhow::Context;
use clap::Subcommand;
use specsync_core::markup;
use specsync_core::project::ProjectMetadata;
use specsync_core::sync::DocSyncer;
use specsync_core::types::Phase;
use std::path::{Path, PathBuf};

#[derive(Subcommand)]
pub enum DocsSubcommand {
    /// Create or update the wiki page for a phase document
    Sync {
        feature: String,
        #[arg(default_value = "requirements")]
        phase: Phase,
    },
    /// Print the storage-format markup for a Markdown file
    Render { file: PathBuf },
}

pub fn run(root: &Path, subcmd: DocsSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        DocsSubcommand::Sync { feature, phase } => sync(root, &feature, phase, json),
        DocsSubcommand::Render { file } => render(&file),
    }
}

fn sync(root: &Path, feature: &str, phase: Phase, json: bool) -> anyhow::Result<()> {
    super::check_feature(feature)?;
    let remote = Remote::load(root)?;
    let settings = remote.env.atlassian()?;
    let project = ProjectMetadata::load(root)?;

    let outcome = DocSyncer::new(root, &project, &settings, &remote.docs)
        .sync_document(feature, phase)
        .with_context(|| format!("failed to sync {phase} for '{feature}'"))?;

    if json {
        print_json(&outcome)?;
    } else {
        println!("Page {} ({}): {}", outcome.action, outcome.page_id, outcome.title);
        if let Some(url) = &outcome.url {
            println!("  {url}");
        }
    }
    Ok(())
}

fn render(file: &Path) -> anyhow::Result<()> {
    let markdown = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    println!("{}", markup::to_storage(&markdown));
    Ok(())
}
