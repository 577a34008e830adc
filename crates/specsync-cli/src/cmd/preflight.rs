use super::Remote;
use crate::output::print_json;
use specsync_core::preflight::PreflightChecker;
use specsync_core::types::PreflightScope;
use std::path::Path;

pub fn run(root: &Path, scope: PreflightScope, json: bool) -> anyhow::Result<()> {
    let remote = Remote::load(root)?;
    let report =
        PreflightChecker::new(root, &remote.env, &remote.docs, &remote.tracker).check(scope);

    if json {
        print_json(&report)?;
    } else {
        for e in &report.errors {
            println!("error:   {e}");
        }
        for w in &report.warnings {
            println!("warning: {w}");
        }
        if report.valid {
            println!("Preflight ({scope}) passed.");
        }
    }

    if !report.valid {
        anyhow::bail!("preflight ({scope}) failed with {} error(s)", report.errors.len());
    }
    Ok(())
}
