use super::Remote;
use crate::output::{print_json, print_table};
use anyhow::Context;
use clap::Subcommand;
use specsync_core::runner::PhaseRunner;
use specsync_core::spec_state::SpecState;
use specsync_core::types::Phase;
use specsync_core::validate;
use std::path::Path;

#[derive(Subcommand)]
pub enum PhaseSubcommand {
    /// Sync the phase's document to its remote, then validate the phase
    Run { feature: String, phase: Phase },
    /// Mark a phase complete in spec.json once it validates
    Approve { feature: String, phase: Phase },
    /// Show completion and remote references for every phase
    Status { feature: String },
}

pub fn run(root: &Path, subcmd: PhaseSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        PhaseSubcommand::Run { feature, phase } => run_phase(root, &feature, phase, json),
        PhaseSubcommand::Approve { feature, phase } => approve(root, &feature, phase, json),
        PhaseSubcommand::Status { feature } => status(root, &feature, json),
    }
}

fn run_phase(root: &Path, feature: &str, phase: Phase, json: bool) -> anyhow::Result<()> {
    super::check_feature(feature)?;
    let remote = Remote::load(root)?;
    let result =
        PhaseRunner::new(root, &remote.env, &remote.docs, &remote.tracker).run_phase(feature, phase);

    if json {
        print_json(&result)?;
    } else {
        println!("{}", result.summary());
    }

    if !result.success {
        anyhow::bail!("phase {phase} did not complete for '{feature}'");
    }
    Ok(())
}

fn approve(root: &Path, feature: &str, phase: Phase, json: bool) -> anyhow::Result<()> {
    super::check_feature(feature)?;
    let result = validate::validate(root, feature, phase);
    if !result.valid {
        if !json {
            super::validate::print_result(feature, &result);
        }
        anyhow::bail!(
            "cannot approve {phase} for '{feature}': {}",
            result.errors.join("; ")
        );
    }

    let mut state = SpecState::load(root, feature)?;
    state.set_complete(phase, true);
    state
        .save(root, feature)
        .with_context(|| format!("failed to record approval for '{feature}'"))?;

    if json {
        print_json(&serde_json::json!({
            "feature": feature,
            "phase": phase,
            "completed": true,
        }))?;
    } else {
        println!("Approved {phase} for '{feature}'.");
    }
    Ok(())
}

fn status(root: &Path, feature: &str, json: bool) -> anyhow::Result<()> {
    super::check_feature(feature)?;
    let state = SpecState::load(root, feature)?;

    if json {
        print_json(&state)?;
        return Ok(());
    }

    let rows = Phase::all()
        .iter()
        .map(|&phase| {
            let remote = match phase {
                Phase::Tasks => match (state.epic_key(), state.story_counts()) {
                    (Some(epic), Some(c)) => format!("{epic} ({}/{} stories)", c.created, c.total),
                    (Some(epic), None) => epic.to_string(),
                    _ => "-".to_string(),
                },
                _ => state.page_id(phase).unwrap_or("-").to_string(),
            };
            vec![
                phase.to_string(),
                if state.is_complete(phase) { "yes" } else { "no" }.to_string(),
                remote,
            ]
        })
        .collect();
    print_table(&["PHASE", "APPROVED", "REMOTE"], rows);
    Ok(())
}
