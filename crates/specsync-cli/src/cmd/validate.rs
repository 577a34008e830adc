use crate::output::print_json;
use specsync_core::types::Phase;
use specsync_core::validate::{self, ValidationResult};
use std::path::Path;

pub fn run(root: &Path, feature: &str, phase: Phase, json: bool) -> anyhow::Result<()> {
    super::check_feature(feature)?;
    let result = validate::validate(root, feature, phase);

    if json {
        print_json(&result)?;
    } else {
        print_result(feature, &result);
    }

    if !result.valid {
        anyhow::bail!("{phase} validation failed for '{feature}'");
    }
    Ok(())
}

pub(crate) fn print_result(feature: &str, result: &ValidationResult) {
    println!("{feature} / {}", result.phase);
    for e in &result.errors {
        println!("  error:   {e}");
    }
    for w in &result.warnings {
        println!("  warning: {w}");
    }
    if result.valid {
        println!("  valid");
    }
}
