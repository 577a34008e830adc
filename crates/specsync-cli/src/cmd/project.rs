use crate::output::{print_json, print_table};
use anyhow::Context;
use clap::Subcommand;
use specsync_core::paths;
use specsync_core::project::ProjectMetadata;
use specsync_core::spec_state::SpecState;
use specsync_core::types::Phase;
use std::path::Path;

#[derive(Subcommand)]
pub enum ProjectSubcommand {
    /// Print the project descriptor
    Show,
    /// List features under .kiro/specs with their approved phases
    Features,
}

pub fn run(root: &Path, subcmd: ProjectSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        ProjectSubcommand::Show => show(root, json),
        ProjectSubcommand::Features => features(root, json),
    }
}

fn show(root: &Path, json: bool) -> anyhow::Result<()> {
    let meta = ProjectMetadata::load(root)?;
    if json {
        print_json(&meta)?;
    } else {
        println!("{}", meta.format_info());
    }
    Ok(())
}

fn features(root: &Path, json: bool) -> anyhow::Result<()> {
    let specs = root.join(paths::SPECS_DIR);
    let mut names = Vec::new();
    if specs.is_dir() {
        for entry in std::fs::read_dir(&specs)
            .with_context(|| format!("failed to read {}", specs.display()))?
        {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
    }
    names.sort();

    let rows: Vec<(String, Vec<Phase>)> = names
        .into_iter()
        .map(|name| {
            // A missing or malformed spec.json counts as nothing approved.
            let approved = SpecState::load(root, &name)
                .map(|state| {
                    Phase::all()
                        .iter()
                        .copied()
                        .filter(|&p| state.is_complete(p))
                        .collect()
                })
                .unwrap_or_default();
            (name, approved)
        })
        .collect();

    if json {
        let items: Vec<_> = rows
            .iter()
            .map(|(name, approved)| serde_json::json!({ "feature": name, "approved": approved }))
            .collect();
        return print_json(&items);
    }

    if rows.is_empty() {
        println!("No features under {}.", paths::SPECS_DIR);
        return Ok(());
    }
    let table = rows
        .into_iter()
        .map(|(name, approved)| {
            let phases: Vec<&str> = approved.iter().map(|p| p.as_str()).collect();
            vec![
                name,
                if phases.is_empty() {
                    "-".to_string()
                } else {
                    phases.join(", ")
                },
            ]
        })
        .collect();
    print_table(&["FEATURE", "APPROVED"], table);
    Ok(())
}
