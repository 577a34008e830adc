//! In-memory wiki and tracker used by unit tests.

use crate::config::{self, AtlassianConfig, EnvConfig};
use crate::paths;
use crate::project::ProjectMetadata;
use crate::remote::{
    DocsApi, IssueRef, PageRef, ProjectInfo, RemoteError, RemoteResult, SpaceInfo, TrackerApi,
};
use serde_json::Value;
use std::cell::{Cell, RefCell};
use std::path::{Path, PathBuf};

pub const PROJECT_JSON: &str = r#"{
    "projectId": "michi",
    "projectName": "Michi",
    "jiraProjectKey": "MP",
    "confluenceLabels": ["project:michi"],
    "stakeholders": ["PM", "Lead"],
    "repository": "https://github.com/acme/michi"
}"#;

pub fn write_project(root: &Path) -> ProjectMetadata {
    std::fs::create_dir_all(root.join(paths::KIRO_DIR)).unwrap();
    std::fs::write(paths::project_path(root), PROJECT_JSON).unwrap();
    ProjectMetadata::parse(PROJECT_JSON).unwrap()
}

pub fn write_doc(root: &Path, feature: &str, file: &str, content: &str) {
    let dir = paths::feature_dir(root, feature);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join(file), content).unwrap();
}

pub fn env() -> EnvConfig {
    EnvConfig::from_pairs(
        Some(PathBuf::from(".env")),
        [
            (config::ATLASSIAN_URL, "https://acme.atlassian.net"),
            (config::ATLASSIAN_EMAIL, "dev@acme.test"),
            (config::ATLASSIAN_API_TOKEN, "secret"),
            (config::CONFLUENCE_SPACE, "PRD"),
        ],
    )
}

pub fn settings() -> AtlassianConfig {
    env().atlassian().unwrap()
}

fn status(service: &'static str, status: u16) -> RemoteError {
    RemoteError::Status {
        service,
        status,
        body: String::new(),
    }
}

// ---------------------------------------------------------------------------
// FakeDocs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct StoredPage {
    space: String,
    page: PageRef,
    body: String,
    labels: Vec<String>,
}

#[derive(Default)]
pub struct FakeDocs {
    spaces: Vec<String>,
    pages: RefCell<Vec<StoredPage>>,
    calls: Cell<usize>,
    fail_search: Cell<bool>,
    fail_writes: Cell<bool>,
    next_id: Cell<u32>,
}

impl FakeDocs {
    pub fn with_space(key: &str) -> Self {
        Self {
            spaces: vec![key.to_string()],
            ..Self::default()
        }
    }

    pub fn fail_search(&self) {
        self.fail_search.set(true);
    }

    pub fn fail_writes(&self) {
        self.fail_writes.set(true);
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }

    pub fn pages(&self) -> Vec<PageRef> {
        self.pages.borrow().iter().map(|p| p.page.clone()).collect()
    }

    pub fn last_body(&self) -> Option<String> {
        self.pages.borrow().last().map(|p| p.body.clone())
    }

    pub fn labels_of(&self, id: &str) -> Vec<String> {
        self.pages
            .borrow()
            .iter()
            .find(|p| p.page.id == id)
            .map(|p| p.labels.clone())
            .unwrap_or_default()
    }

    fn tick(&self) {
        self.calls.set(self.calls.get() + 1);
    }
}

impl DocsApi for FakeDocs {
    fn get_space(&self, key: &str) -> RemoteResult<SpaceInfo> {
        self.tick();
        if self.spaces.iter().any(|s| s == key) {
            Ok(SpaceInfo {
                key: key.to_string(),
                name: format!("{key} space"),
            })
        } else {
            Err(status("confluence", 404))
        }
    }

    fn find_page(&self, space: &str, title: &str) -> RemoteResult<Option<PageRef>> {
        self.tick();
        if self.fail_search.get() {
            return Err(status("confluence", 500));
        }
        Ok(self
            .pages
            .borrow()
            .iter()
            .find(|p| p.space == space && p.page.title == title)
            .map(|p| p.page.clone()))
    }

    fn create_page(
        &self,
        space: &str,
        title: &str,
        body: &str,
        labels: &[String],
    ) -> RemoteResult<PageRef> {
        self.tick();
        if self.fail_writes.get() {
            return Err(status("confluence", 403));
        }
        let id = self.next_id.get() + 100;
        self.next_id.set(self.next_id.get() + 1);
        let page = PageRef {
            id: id.to_string(),
            title: title.to_string(),
            version: 1,
            web_path: Some(format!("/pages/{id}")),
        };
        self.pages.borrow_mut().push(StoredPage {
            space: space.to_string(),
            page: page.clone(),
            body: body.to_string(),
            labels: labels.to_vec(),
        });
        Ok(page)
    }

    fn update_page(
        &self,
        page_id: &str,
        title: &str,
        body: &str,
        current_version: u32,
    ) -> RemoteResult<PageRef> {
        self.tick();
        if self.fail_writes.get() {
            return Err(status("confluence", 403));
        }
        let mut pages = self.pages.borrow_mut();
        let stored = pages
            .iter_mut()
            .find(|p| p.page.id == page_id)
            .ok_or_else(|| status("confluence", 404))?;
        stored.page.title = title.to_string();
        stored.page.version = current_version + 1;
        stored.body = body.to_string();
        Ok(stored.page.clone())
    }

    fn add_labels(&self, page_id: &str, labels: &[String]) -> RemoteResult<()> {
        self.tick();
        let mut pages = self.pages.borrow_mut();
        if let Some(stored) = pages.iter_mut().find(|p| p.page.id == page_id) {
            for label in labels {
                if !stored.labels.contains(label) {
                    stored.labels.push(label.clone());
                }
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// FakeTracker
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct StoredIssue {
    pub key: String,
    pub fields: Value,
}

impl StoredIssue {
    fn is_epic(&self) -> bool {
        self.fields["issuetype"]["name"] == "Epic"
    }

    fn summary(&self) -> &str {
        self.fields["summary"].as_str().unwrap_or_default()
    }

    fn has_label(&self, label: &str) -> bool {
        self.fields["labels"]
            .as_array()
            .is_some_and(|ls| ls.iter().any(|l| l == label))
    }
}

#[derive(Default)]
pub struct FakeTracker {
    projects: Vec<String>,
    project_status: Option<u16>,
    issues: RefCell<Vec<StoredIssue>>,
    failing_searches: RefCell<Vec<String>>,
    failing_creates: RefCell<Vec<String>>,
    calls: Cell<usize>,
}

impl FakeTracker {
    pub fn with_project(key: &str) -> Self {
        Self {
            projects: vec![key.to_string()],
            ..Self::default()
        }
    }

    /// Every `get_project` answers with this HTTP status.
    pub fn failing_with(status: u16) -> Self {
        Self {
            project_status: Some(status),
            ..Self::default()
        }
    }

    pub fn fail_search_containing(&self, fragment: &str) {
        self.failing_searches.borrow_mut().push(fragment.to_string());
    }

    pub fn fail_create_for(&self, summary: &str) {
        self.failing_creates.borrow_mut().push(summary.to_string());
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }

    pub fn issue_count(&self) -> usize {
        self.issues.borrow().len()
    }

    pub fn issue(&self, key: &str) -> Option<StoredIssue> {
        self.issues.borrow().iter().find(|i| i.key == key).cloned()
    }

    fn tick(&self) {
        self.calls.set(self.calls.get() + 1);
    }
}

/// Text between the first pair of double quotes after `marker`.
fn quoted_after<'a>(jql: &'a str, marker: &str) -> Option<&'a str> {
    let rest = &jql[jql.find(marker)? + marker.len()..];
    let start = rest.find('"')? + 1;
    let len = rest[start..].find('"')?;
    Some(&rest[start..start + len])
}

impl TrackerApi for FakeTracker {
    fn get_project(&self, key: &str) -> RemoteResult<ProjectInfo> {
        self.tick();
        if let Some(code) = self.project_status {
            return Err(status("jira", code));
        }
        if self.projects.iter().any(|p| p == key) {
            Ok(ProjectInfo {
                key: key.to_string(),
                name: format!("{key} project"),
            })
        } else {
            Err(status("jira", 404))
        }
    }

    fn search_issues(&self, jql: &str) -> RemoteResult<Vec<IssueRef>> {
        self.tick();
        if self.failing_searches.borrow().iter().any(|f| jql.contains(f.as_str())) {
            return Err(status("jira", 500));
        }
        let want_epic = jql.contains("issuetype = Epic");
        let summary_part = quoted_after(jql, "summary ~");
        let label = quoted_after(jql, "labels =");
        Ok(self
            .issues
            .borrow()
            .iter()
            .filter(|i| i.is_epic() == want_epic)
            .filter(|i| summary_part.map_or(true, |s| i.summary().contains(s)))
            .filter(|i| label.map_or(true, |l| i.has_label(l)))
            .map(|i| IssueRef {
                key: i.key.clone(),
                summary: i.summary().to_string(),
                labels: Vec::new(),
            })
            .collect())
    }

    fn create_issue(&self, payload: &Value) -> RemoteResult<IssueRef> {
        self.tick();
        let fields = payload["fields"].clone();
        let summary = fields["summary"].as_str().unwrap_or_default().to_string();
        if self.failing_creates.borrow().contains(&summary) {
            return Err(status("jira", 400));
        }
        let mut issues = self.issues.borrow_mut();
        let key = format!("MP-{}", issues.len() + 1);
        issues.push(StoredIssue {
            key: key.clone(),
            fields,
        });
        Ok(IssueRef {
            key,
            summary,
            labels: Vec::new(),
        })
    }

    fn update_issue(&self, key: &str, payload: &Value) -> RemoteResult<()> {
        self.tick();
        let mut issues = self.issues.borrow_mut();
        let issue = issues
            .iter_mut()
            .find(|i| i.key == key)
            .ok_or_else(|| status("jira", 404))?;
        if let (Some(target), Some(update)) =
            (issue.fields.as_object_mut(), payload["fields"].as_object())
        {
            for (k, v) in update {
                target.insert(k.clone(), v.clone());
            }
        }
        Ok(())
    }
}
