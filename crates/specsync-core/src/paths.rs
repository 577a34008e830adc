use crate::error::{Result, SyncError};
use crate::types::Phase;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const KIRO_DIR: &str = ".kiro";
pub const SPECS_DIR: &str = ".kiro/specs";

pub const PROJECT_FILE: &str = ".kiro/project.json";
pub const SPEC_STATE_FILE: &str = "spec.json";
pub const ENV_FILE: &str = ".env";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn project_path(root: &Path) -> PathBuf {
    root.join(PROJECT_FILE)
}

pub fn env_path(root: &Path) -> PathBuf {
    root.join(ENV_FILE)
}

pub fn feature_dir(root: &Path, feature: &str) -> PathBuf {
    root.join(SPECS_DIR).join(feature)
}

pub fn document_path(root: &Path, feature: &str, phase: Phase) -> PathBuf {
    feature_dir(root, feature).join(phase.filename())
}

pub fn spec_state_path(root: &Path, feature: &str) -> PathBuf {
    feature_dir(root, feature).join(SPEC_STATE_FILE)
}

/// Repository-relative path of a feature document, as linked from remote
/// artifacts back to the source of truth.
pub fn document_repo_path(feature: &str, phase: Phase) -> String {
    format!("{SPECS_DIR}/{feature}/{}", phase.filename())
}

// ---------------------------------------------------------------------------
// Slug validation
// ---------------------------------------------------------------------------

static SLUG_RE: OnceLock<Regex> = OnceLock::new();

fn slug_re() -> &'static Regex {
    SLUG_RE.get_or_init(|| Regex::new(r"^[a-z0-9][a-z0-9\-]*[a-z0-9]$|^[a-z0-9]$").unwrap())
}

pub fn validate_slug(slug: &str) -> Result<()> {
    if slug.is_empty() || slug.len() > 64 || !slug_re().is_match(slug) {
        return Err(SyncError::InvalidSlug(slug.to_string()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_slugs() {
        for slug in ["calculator-app", "a", "demo", "x1"] {
            validate_slug(slug).unwrap_or_else(|_| panic!("expected valid: {slug}"));
        }
    }

    #[test]
    fn invalid_slugs() {
        for slug in ["", "-lead", "trail-", "has spaces", "UPPER", "../escape"] {
            assert!(validate_slug(slug).is_err(), "expected invalid: {slug}");
        }
    }

    #[test]
    fn path_helpers() {
        let root = Path::new("/tmp/proj");
        assert_eq!(
            project_path(root),
            PathBuf::from("/tmp/proj/.kiro/project.json")
        );
        assert_eq!(
            document_path(root, "demo", Phase::Design),
            PathBuf::from("/tmp/proj/.kiro/specs/demo/design.md")
        );
        assert_eq!(
            spec_state_path(root, "demo"),
            PathBuf::from("/tmp/proj/.kiro/specs/demo/spec.json")
        );
        assert_eq!(
            document_repo_path("demo", Phase::Tasks),
            ".kiro/specs/demo/tasks.md"
        );
    }
}
