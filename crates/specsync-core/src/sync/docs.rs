use super::{document_url, SYNC_LABEL};
use crate::config::AtlassianConfig;
use crate::error::{Result, SyncError};
use crate::markup::{self, PageTemplate};
use crate::paths;
use crate::project::ProjectMetadata;
use crate::remote::DocsApi;
use crate::spec_state::SpecState;
use crate::types::Phase;
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PageAction {
    Created,
    Updated,
}

impl std::fmt::Display for PageAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            PageAction::Created => "created",
            PageAction::Updated => "updated",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageSyncOutcome {
    pub phase: Phase,
    pub page_id: String,
    pub title: String,
    pub url: Option<String>,
    pub action: PageAction,
}

/// Publishes feature documents as wiki pages.
pub struct DocSyncer<'a> {
    root: &'a Path,
    project: &'a ProjectMetadata,
    settings: &'a AtlassianConfig,
    docs: &'a dyn DocsApi,
}

impl<'a> DocSyncer<'a> {
    pub fn new(
        root: &'a Path,
        project: &'a ProjectMetadata,
        settings: &'a AtlassianConfig,
        docs: &'a dyn DocsApi,
    ) -> Self {
        Self {
            root,
            project,
            settings,
            docs,
        }
    }

    pub fn page_title(&self, feature: &str, phase: Phase) -> String {
        format!(
            "[{}] {feature} {}",
            self.project.project_name,
            phase.title_label()
        )
    }

    fn labels(&self, feature: &str, phase: Phase) -> Vec<String> {
        let mut labels = self.project.confluence_labels.clone();
        labels.push(phase.as_str().to_string());
        labels.push(feature.to_string());
        labels.push(SYNC_LABEL.to_string());
        labels
    }

    /// Render a document to the full page body without touching the wiki.
    pub fn render(&self, feature: &str, phase: Phase) -> Result<String> {
        let path = paths::document_path(self.root, feature, phase);
        if !path.is_file() {
            return Err(SyncError::DocumentNotFound { phase, path });
        }
        let markdown = std::fs::read_to_string(&path)?;
        let source_url = document_url(self.project, feature, phase);
        let template = PageTemplate {
            source_url: &source_url,
            project_name: Some(&self.project.project_name),
            approvers: &self.project.stakeholders,
        };
        Ok(template.render(&markup::to_storage(&markdown)))
    }

    pub fn sync_document(&self, feature: &str, phase: Phase) -> Result<PageSyncOutcome> {
        let body = self.render(feature, phase)?;
        let title = self.page_title(feature, phase);
        let space = self.settings.space.as_str();
        let labels = self.labels(feature, phase);

        // Load before writing remotely so a corrupt state file aborts early.
        let mut state = SpecState::load_or_default(self.root, feature)?;

        let (page, action) = match self.docs.find_page(space, &title)? {
            Some(existing) => {
                tracing::info!(%title, id = %existing.id, "updating existing page");
                let page = self
                    .docs
                    .update_page(&existing.id, &title, &body, existing.version)?;
                self.docs.add_labels(&page.id, &labels)?;
                (page, PageAction::Updated)
            }
            None => {
                tracing::info!(%title, space, "creating page");
                let page = self.docs.create_page(space, &title, &body, &labels)?;
                (page, PageAction::Created)
            }
        };

        state.record_page(space, phase, page.id.clone());
        state.save(self.root, feature)?;

        let url = page
            .web_path
            .as_deref()
            .map(|p| format!("{}/wiki{p}", self.settings.url));
        tracing::info!(id = %page.id, url = url.as_deref().unwrap_or("-"), ?action, "page synced");

        Ok(PageSyncOutcome {
            phase,
            page_id: page.id,
            title,
            url,
            action,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
