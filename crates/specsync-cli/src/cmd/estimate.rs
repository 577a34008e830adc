use crate::output::print_json;
use anyhow::Context;
use specsync_core::estimate::Estimate;
use specsync_core::{io, paths};
use std::path::Path;

pub fn run(root: &Path, feature: &str, write: bool, json: bool) -> anyhow::Result<()> {
    super::check_feature(feature)?;
    let estimate = Estimate::load(root, feature)?;
    let markdown = estimate.to_markdown();

    if write {
        let path = paths::feature_dir(root, feature).join("estimate.md");
        io::atomic_write(&path, markdown.as_bytes())
            .with_context(|| format!("failed to write {}", path.display()))?;
        if !json {
            println!("Wrote {}", path.display());
        }
    }

    if json {
        print_json(&estimate)?;
    } else if !write {
        print!("{markdown}");
    }
    Ok(())
}
