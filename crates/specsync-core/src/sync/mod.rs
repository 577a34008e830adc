//! Idempotent create-or-update of remote artifacts from feature documents.
//!
//! Both syncers search before they create and record the resulting remote
//! ids in the feature's `spec.json`.

pub mod docs;
pub mod tracker;

pub use docs::{DocSyncer, PageAction, PageSyncOutcome};
pub use tracker::{EpicLinkReport, LinkOutcome, StoryOutcome, TrackerSyncReport, TrackerSyncer};

use crate::paths;
use crate::project::ProjectMetadata;
use crate::types::Phase;

/// Label added to every page this tool manages.
pub const SYNC_LABEL: &str = "github-sync";

/// Web link to a feature document on the repository's main branch.
pub(crate) fn document_url(project: &ProjectMetadata, feature: &str, phase: Phase) -> String {
    format!(
        "{}/blob/main/{}",
        project.repository_base(),
        paths::document_repo_path(feature, phase)
    )
}

/// Web link to a feature's spec directory.
pub(crate) fn feature_url(project: &ProjectMetadata, feature: &str) -> String {
    format!(
        "{}/tree/main/{}/{feature}",
        project.repository_base(),
        paths::SPECS_DIR
    )
}
