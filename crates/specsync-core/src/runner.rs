//! Runs one phase end to end: prerequisites, remote sync, validation.

use crate::config::EnvConfig;
use crate::error::{Result, SyncError};
use crate::paths;
use crate::preflight::PreflightChecker;
use crate::project::ProjectMetadata;
use crate::remote::{DocsApi, TrackerApi};
use crate::sync::{DocSyncer, TrackerSyncer};
use crate::types::{Phase, PreflightScope};
use crate::validate::{self, ValidationResult};
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhaseRunResult {
    pub phase: Phase,
    pub success: bool,
    /// The wiki page was created or updated.
    pub docs_created: bool,
    /// The tracker epic and stories were synced.
    pub tracker_created: bool,
    pub validation_passed: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_url: Option<String>,
}

impl PhaseRunResult {
    fn aborted(phase: Phase, errors: Vec<String>) -> Self {
        Self {
            phase,
            success: false,
            docs_created: false,
            tracker_created: false,
            validation_passed: false,
            errors,
            warnings: Vec::new(),
            page_url: None,
        }
    }

    /// Human-readable checklist for the terminal.
    pub fn summary(&self) -> String {
        let mark = |ok: bool| if ok { "ok  " } else { "FAIL" };
        let mut lines = vec![format!("Phase: {}", self.phase)];
        match self.phase {
            Phase::Requirements | Phase::Design => {
                lines.push(format!("  [{}] wiki page", mark(self.docs_created)));
            }
            Phase::Tasks => {
                lines.push(format!("  [{}] tracker epic and stories", mark(self.tracker_created)));
            }
        }
        lines.push(format!("  [{}] validation", mark(self.validation_passed)));

        for e in &self.errors {
            lines.push(format!("  error: {e}"));
        }
        for w in &self.warnings {
            lines.push(format!("  warning: {w}"));
        }
        if let Some(url) = &self.page_url {
            lines.push(format!("  page: {url}"));
        }
        if self.success {
            match self.phase {
                Phase::Requirements | Phase::Design => {
                    lines.push("Phase complete. Ask the approvers to review the wiki page.".into())
                }
                Phase::Tasks => lines.push("Phase complete. Implementation can start.".into()),
            }
        } else {
            lines.push("Phase incomplete; fix the errors above and run again.".into());
        }
        lines.join("\n")
    }
}

pub struct PhaseRunner<'a> {
    root: &'a Path,
    env: &'a EnvConfig,
    docs: &'a dyn DocsApi,
    tracker: &'a dyn TrackerApi,
}

impl<'a> PhaseRunner<'a> {
    pub fn new(
        root: &'a Path,
        env: &'a EnvConfig,
        docs: &'a dyn DocsApi,
        tracker: &'a dyn TrackerApi,
    ) -> Self {
        Self {
            root,
            env,
            docs,
            tracker,
        }
    }

    pub fn run_phase(&self, feature: &str, phase: Phase) -> PhaseRunResult {
        tracing::info!(feature, %phase, "running phase");

        if phase == Phase::Tasks {
            let report = PreflightChecker::new(self.root, self.env, self.docs, self.tracker)
                .check(PreflightScope::Tracker);
            if !report.valid {
                tracing::warn!(errors = report.errors.len(), "preflight failed");
                return PhaseRunResult::aborted(phase, report.errors);
            }
        }

        let doc = paths::document_path(self.root, feature, phase);
        if !doc.is_file() {
            let err = SyncError::DocumentNotFound { phase, path: doc };
            return PhaseRunResult::aborted(phase, vec![err.to_string()]);
        }

        let mut errors = Vec::new();
        let mut page_url = None;
        let synced = match self.sync(feature, phase) {
            Ok(url) => {
                page_url = url;
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "remote sync failed");
                errors.push(format!("remote sync failed: {e}"));
                false
            }
        };

        let ValidationResult {
            valid,
            errors: validation_errors,
            warnings,
            ..
        } = validate::validate(self.root, feature, phase);
        errors.extend(validation_errors);

        let docs_created = synced && phase != Phase::Tasks;
        let tracker_created = synced && phase == Phase::Tasks;
        PhaseRunResult {
            phase,
            success: valid && synced,
            docs_created,
            tracker_created,
            validation_passed: valid,
            errors,
            warnings,
            page_url,
        }
    }

    /// Returns the page URL for document phases.
    fn sync(&self, feature: &str, phase: Phase) -> Result<Option<String>> {
        let project = ProjectMetadata::load(self.root)?;
        let settings = self.env.atlassian()?;
        match phase {
            Phase::Requirements | Phase::Design => {
                let outcome = DocSyncer::new(self.root, &project, &settings, self.docs)
                    .sync_document(feature, phase)?;
                Ok(outcome.url)
            }
            Phase::Tasks => {
                let report = TrackerSyncer::new(self.root, &project, &settings, self.tracker)
                    .sync_tasks(feature)?;
                if report.failed() > 0 {
                    tracing::warn!(failed = report.failed(), "some stories were not created");
                }
                Ok(None)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
