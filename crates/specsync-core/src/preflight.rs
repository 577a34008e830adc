//! Pre-flight checks run before any remote write.
//!
//! Order matters: credentials first, then the project descriptor, then the
//! remote space and project. A failure in either of the first two steps ends
//! the check since the later steps cannot run without them.

use crate::config::{self, EnvConfig};
use crate::project::ProjectMetadata;
use crate::remote::{DocsApi, RemoteError, TrackerApi};
use crate::types::PreflightScope;
use serde::Serialize;
use std::path::Path;

const API_TOKEN_URL: &str = "https://id.atlassian.com/manage-profile/security/api-tokens";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PreflightReport {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

pub struct PreflightChecker<'a> {
    root: &'a Path,
    env: &'a EnvConfig,
    docs: &'a dyn DocsApi,
    tracker: &'a dyn TrackerApi,
}

impl<'a> PreflightChecker<'a> {
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

    pub fn check(&self, scope: PreflightScope) -> PreflightReport {
        tracing::info!(%scope, "running preflight checks");
        let mut report = PreflightReport::default();

        self.check_credentials(&mut report);
        if !report.errors.is_empty() {
            return finish(report);
        }

        let meta = match ProjectMetadata::load(self.root) {
            Ok(meta) => meta,
            Err(e) => {
                report.errors.push(e.to_string());
                return finish(report);
            }
        };

        if scope.includes_docs() {
            let key = self.env.space_key();
            match self.docs.get_space(key) {
                Ok(space) => tracing::info!(key, name = %space.name, "wiki space found"),
                Err(e) => classify(
                    &mut report,
                    e,
                    format!(
                        "wiki space '{key}' does not exist (create it or set {} in .env)",
                        config::CONFLUENCE_SPACE
                    ),
                    "wiki",
                ),
            }
        }

        if scope.includes_tracker() {
            let key = meta.jira_project_key.as_str();
            match self.tracker.get_project(key) {
                Ok(project) => tracing::info!(key, name = %project.name, "tracker project found"),
                Err(e) => classify(
                    &mut report,
                    e,
                    format!(
                        "tracker project '{key}' does not exist (create it or fix jiraProjectKey in .kiro/project.json)"
                    ),
                    "tracker",
                ),
            }
        }

        finish(report)
    }

    fn check_credentials(&self, report: &mut PreflightReport) {
        if self.env.source.is_none() {
            report.errors.push(format!(
                ".env not found in {} (copy .env.example to .env and set {}; API tokens: {API_TOKEN_URL})",
                self.root.display(),
                config::REQUIRED_KEYS.join(", ")
            ));
            return;
        }
        let missing = self.env.missing_required();
        if !missing.is_empty() {
            report.errors.push(format!(
                "missing required settings in .env: {} (API tokens: {API_TOKEN_URL})",
                missing.join(", ")
            ));
            return;
        }
        if self.env.get(config::CONFLUENCE_SPACE).is_none() {
            report.warnings.push(format!(
                "{} is not set; using default space '{}'",
                config::CONFLUENCE_SPACE,
                config::DEFAULT_SPACE
            ));
        }
    }
}

fn classify(report: &mut PreflightReport, err: RemoteError, not_found: String, service: &str) {
    if err.is_not_found() {
        report.errors.push(not_found);
    } else if err.is_unauthorized() {
        report.errors.push(format!(
            "{service} authentication failed; check ATLASSIAN_EMAIL and ATLASSIAN_API_TOKEN ({API_TOKEN_URL})"
        ));
    } else {
        tracing::warn!(service, error = %err, "existence check inconclusive");
        report.warnings.push(format!("{service} existence check failed: {err}"));
    }
}

fn finish(mut report: PreflightReport) -> PreflightReport {
    report.valid = report.errors.is_empty();
    report
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
