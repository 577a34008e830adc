use super::{document_url, feature_url};
use crate::adf;
use crate::config::AtlassianConfig;
use crate::error::{Result, SyncError};
use crate::paths;
use crate::project::ProjectMetadata;
use crate::remote::{IssueRef, TrackerApi};
use crate::spec_state::SpecState;
use crate::tasks_doc::{StorySpec, TasksDocument};
use crate::types::Phase;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::Path;

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StoryOutcome {
    Created { title: String, key: String },
    Reused { title: String, key: String },
    Failed { title: String, error: String },
}

impl StoryOutcome {
    pub fn title(&self) -> &str {
        match self {
            StoryOutcome::Created { title, .. }
            | StoryOutcome::Reused { title, .. }
            | StoryOutcome::Failed { title, .. } => title,
        }
    }

    pub fn key(&self) -> Option<&str> {
        match self {
            StoryOutcome::Created { key, .. } | StoryOutcome::Reused { key, .. } => Some(key),
            StoryOutcome::Failed { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackerSyncReport {
    pub epic_key: String,
    pub epic_reused: bool,
    pub outcomes: Vec<StoryOutcome>,
}

impl TrackerSyncReport {
    pub fn created(&self) -> usize {
        self.count(|o| matches!(o, StoryOutcome::Created { .. }))
    }

    pub fn reused(&self) -> usize {
        self.count(|o| matches!(o, StoryOutcome::Reused { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, StoryOutcome::Failed { .. }))
    }

    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    fn count(&self, f: impl Fn(&StoryOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|o| f(o)).count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkOutcome {
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EpicLinkReport {
    pub epic_key: String,
    pub field: String,
    pub outcomes: Vec<LinkOutcome>,
}

impl EpicLinkReport {
    pub fn linked(&self) -> usize {
        self.outcomes.iter().filter(|o| o.error.is_none()).count()
    }
}

// ---------------------------------------------------------------------------
// TrackerSyncer
// ---------------------------------------------------------------------------

/// Mirrors a feature's task breakdown into one epic and one story per
/// `### Story` heading.
pub struct TrackerSyncer<'a> {
    root: &'a Path,
    project: &'a ProjectMetadata,
    settings: &'a AtlassianConfig,
    tracker: &'a dyn TrackerApi,
}

impl<'a> TrackerSyncer<'a> {
    pub fn new(
        root: &'a Path,
        project: &'a ProjectMetadata,
        settings: &'a AtlassianConfig,
        tracker: &'a dyn TrackerApi,
    ) -> Self {
        Self {
            root,
            project,
            settings,
            tracker,
        }
    }

    fn project_key(&self) -> &str {
        &self.project.jira_project_key
    }

    fn story_jql(&self, feature: &str) -> String {
        format!(
            "project = {} AND issuetype = Story AND labels = \"{feature}\"",
            self.project_key()
        )
    }

    pub fn sync_tasks(&self, feature: &str) -> Result<TrackerSyncReport> {
        let path = paths::document_path(self.root, feature, Phase::Tasks);
        if !path.is_file() {
            return Err(SyncError::DocumentNotFound {
                phase: Phase::Tasks,
                path,
            });
        }
        let doc = TasksDocument::load(self.root, feature)?;
        let mut state = SpecState::load_or_default(self.root, feature)?;

        let (epic_key, epic_reused) = self.ensure_epic(feature, &state)?;
        state.record_epic(epic_key.clone());

        let existing = match self.tracker.search_issues(&self.story_jql(feature)) {
            Ok(issues) => issues,
            Err(e) => {
                tracing::warn!(error = %e, "story search failed; duplicates may be created");
                Vec::new()
            }
        };
        tracing::info!(count = existing.len(), "existing stories found");
        let mut known: HashMap<String, String> = existing
            .into_iter()
            .map(|IssueRef { key, summary, .. }| (summary, key))
            .collect();

        let source_url = document_url(self.project, feature, Phase::Tasks);
        let mut outcomes = Vec::with_capacity(doc.stories.len());
        for story in &doc.stories {
            let summary = story.summary();
            if let Some(key) = known.get(&summary) {
                tracing::info!(title = %story.title, %key, "story exists, skipping");
                outcomes.push(StoryOutcome::Reused {
                    title: story.title.clone(),
                    key: key.clone(),
                });
                continue;
            }

            let payload = self.story_payload(feature, story, &epic_key, &source_url);
            match self.tracker.create_issue(&payload) {
                Ok(issue) => {
                    tracing::info!(title = %story.title, key = %issue.key, label = %story.phase_label, "story created");
                    known.insert(summary, issue.key.clone());
                    outcomes.push(StoryOutcome::Created {
                        title: story.title.clone(),
                        key: issue.key,
                    });
                }
                Err(e) => {
                    tracing::warn!(title = %story.title, error = %e, "story creation failed");
                    outcomes.push(StoryOutcome::Failed {
                        title: story.title.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        let report = TrackerSyncReport {
            epic_key,
            epic_reused,
            outcomes,
        };
        state.record_stories(
            (report.created() + report.reused()) as u32,
            report.total() as u32,
        );
        state.save(self.root, feature)?;

        tracing::info!(
            epic = %report.epic_key,
            created = report.created(),
            reused = report.reused(),
            failed = report.failed(),
            "tracker sync finished"
        );
        Ok(report)
    }

    /// Returns the epic key and whether it already existed.
    fn ensure_epic(&self, feature: &str, state: &SpecState) -> Result<(String, bool)> {
        if let Some(key) = state.epic_key() {
            tracing::info!(%key, "epic recorded in spec.json");
            return Ok((key.to_string(), true));
        }

        let jql = format!(
            "project = {} AND issuetype = Epic AND summary ~ \"{feature}\"",
            self.project_key()
        );
        let found = self
            .tracker
            .search_issues(&jql)
            .map_err(SyncError::EpicSearch)?;
        if let Some(epic) = found.into_iter().next() {
            tracing::info!(key = %epic.key, "reusing epic with matching summary");
            return Ok((epic.key, true));
        }

        let description = format!("Feature: {feature}\nGitHub: {}", feature_url(self.project, feature));
        let payload = json!({
            "fields": {
                "project": { "key": self.project_key() },
                "summary": format!("[{feature}] {}", self.project.project_name),
                "description": adf::text_to_adf(&description),
                "issuetype": { "name": "Epic" },
                "labels": self.project.confluence_labels,
            }
        });
        let epic = self.tracker.create_issue(&payload)?;
        tracing::info!(key = %epic.key, "epic created");
        Ok((epic.key, false))
    }

    fn story_payload(&self, feature: &str, story: &StorySpec, epic_key: &str, source_url: &str) -> Value {
        let mut labels = self.project.confluence_labels.clone();
        labels.push(feature.to_string());
        labels.push(story.phase_label.clone());

        let mut fields = json!({
            "project": { "key": self.project_key() },
            "summary": story.summary(),
            "description": adf::story_description(story, source_url),
            "issuetype": { "id": self.settings.story_issue_type_id },
            "labels": labels,
            "priority": { "name": story.priority.as_str() },
        });
        if let Some(due) = story.due_date {
            fields["duedate"] = json!(due.format("%Y-%m-%d").to_string());
        }
        if let Some(field) = self.settings.epic_link_field.as_deref() {
            fields[field] = json!(epic_key);
        }
        json!({ "fields": fields })
    }

    /// Point every story of the feature at its recorded epic.
    pub fn link_epic(&self, feature: &str) -> Result<EpicLinkReport> {
        let state = SpecState::load(self.root, feature)?;
        let epic_key = state
            .epic_key()
            .ok_or_else(|| SyncError::EpicNotRecorded(feature.to_string()))?
            .to_string();
        let field = self.settings.epic_link_field_or_default().to_string();

        let stories = self.tracker.search_issues(&self.story_jql(feature))?;
        tracing::info!(epic = %epic_key, count = stories.len(), %field, "linking stories to epic");

        let mut fields = serde_json::Map::new();
        fields.insert(field.clone(), json!(epic_key));
        let payload = json!({ "fields": fields });

        let outcomes = stories
            .into_iter()
            .map(|story| {
                let error = self
                    .tracker
                    .update_issue(&story.key, &payload)
                    .err()
                    .map(|e| {
                        tracing::warn!(key = %story.key, error = %e, "epic link failed");
                        e.to_string()
                    });
                LinkOutcome {
                    key: story.key,
                    error,
                }
            })
            .collect();

        Ok(EpicLinkReport {
            epic_key,
            field,
            outcomes,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{self, FakeTracker};
    use tempfile::TempDir;

    const TASKS: &str = "\
## Phase 1: Build (Implementation)
### Story 1.1: Login
**Priority**: High
**Due**: 2025-02-03
### Story 1.2: Logout
## Phase 2: Verify（テスト）
### Story 2.1: E2E
";

    fn setup() -> (TempDir, ProjectMetadata, AtlassianConfig) {
        let dir = TempDir::new().unwrap();
        let meta = testing::write_project(dir.path());
        testing::write_doc(dir.path(), "demo", "tasks.md", TASKS);
        (dir, meta, testing::settings())
    }

    #[test]
    fn creates_epic_and_stories_and_records_state() {
        let (dir, meta, settings) = setup();
        let tracker = FakeTracker::with_project("MP");
        let report = TrackerSyncer::new(dir.path(), &meta, &settings, &tracker)
            .sync_tasks("demo")
            .unwrap();

        assert!(!report.epic_reused);
        assert_eq!(report.created(), 3);
        let epic = tracker.issue(&report.epic_key).unwrap();
        assert_eq!(epic.fields["summary"], "[demo] Michi");
        assert_eq!(epic.fields["issuetype"]["name"], "Epic");

        let login = tracker.issue(report.outcomes[0].key().unwrap()).unwrap();
        assert_eq!(login.fields["summary"], "Story: Login");
        assert_eq!(login.fields["priority"]["name"], "High");
        assert_eq!(login.fields["duedate"], "2025-02-03");
        assert_eq!(login.fields["issuetype"]["id"], "10036");
        assert_eq!(
            login.fields["labels"],
            json!(["project:michi", "demo", "implementation"])
        );
        let e2e = tracker.issue(report.outcomes[2].key().unwrap()).unwrap();
        assert_eq!(e2e.fields["labels"][2], "testing");
        assert!(e2e.fields.get("customfield_10014").is_none());

        let state = SpecState::load(dir.path(), "demo").unwrap();
        assert_eq!(state.epic_key(), Some(report.epic_key.as_str()));
        assert_eq!(state.story_counts().unwrap().created, 3);
        assert_eq!(state.story_counts().unwrap().total, 3);
    }

    #[test]
    fn second_run_creates_nothing() {
        let (dir, meta, settings) = setup();
        let tracker = FakeTracker::with_project("MP");
        let syncer = TrackerSyncer::new(dir.path(), &meta, &settings, &tracker);

        let first = syncer.sync_tasks("demo").unwrap();
        let issues_after_first = tracker.issue_count();
        let second = syncer.sync_tasks("demo").unwrap();

        assert_eq!(tracker.issue_count(), issues_after_first);
        assert_eq!(second.epic_key, first.epic_key);
        assert!(second.epic_reused);
        assert_eq!(second.reused(), 3);
        assert_eq!(second.created(), 0);
        assert_eq!(SpecState::load(dir.path(), "demo").unwrap().story_counts().unwrap().created, 3);
    }

    #[test]
    fn epic_found_by_search_when_state_is_lost() {
        let (dir, meta, settings) = setup();
        let tracker = FakeTracker::with_project("MP");
        let syncer = TrackerSyncer::new(dir.path(), &meta, &settings, &tracker);
        let first = syncer.sync_tasks("demo").unwrap();

        std::fs::remove_file(paths::spec_state_path(dir.path(), "demo")).unwrap();
        let second = syncer.sync_tasks("demo").unwrap();
        assert_eq!(second.epic_key, first.epic_key);
        assert!(second.epic_reused);
        assert_eq!(second.created(), 0);
    }

    #[test]
    fn epic_search_failure_is_fatal() {
        let (dir, meta, settings) = setup();
        let tracker = FakeTracker::with_project("MP");
        tracker.fail_search_containing("issuetype = Epic");
        let err = TrackerSyncer::new(dir.path(), &meta, &settings, &tracker)
            .sync_tasks("demo")
            .unwrap_err();
        assert!(matches!(err, SyncError::EpicSearch(_)));
        assert_eq!(tracker.issue_count(), 0);
    }

    #[test]
    fn story_search_failure_degrades() {
        let (dir, meta, settings) = setup();
        let tracker = FakeTracker::with_project("MP");
        tracker.fail_search_containing("issuetype = Story");
        let report = TrackerSyncer::new(dir.path(), &meta, &settings, &tracker)
            .sync_tasks("demo")
            .unwrap();
        assert_eq!(report.created(), 3);
    }

    #[test]
    fn story_creation_failure_does_not_stop_batch() {
        let (dir, meta, settings) = setup();
        let tracker = FakeTracker::with_project("MP");
        tracker.fail_create_for("Story: Logout");
        let report = TrackerSyncer::new(dir.path(), &meta, &settings, &tracker)
            .sync_tasks("demo")
            .unwrap();

        assert_eq!(report.created(), 2);
        assert_eq!(report.failed(), 1);
        assert!(matches!(&report.outcomes[1], StoryOutcome::Failed { title, .. } if title == "Logout"));
        assert_eq!(report.outcomes[2].title(), "E2E");

        let counts = SpecState::load(dir.path(), "demo").unwrap().story_counts().unwrap();
        assert_eq!((counts.created, counts.total), (2, 3));
    }

    #[test]
    fn epic_link_field_is_set_when_configured() {
        let (dir, meta, mut settings) = setup();
        settings.epic_link_field = Some("customfield_10014".into());
        let tracker = FakeTracker::with_project("MP");
        let report = TrackerSyncer::new(dir.path(), &meta, &settings, &tracker)
            .sync_tasks("demo")
            .unwrap();
        let story = tracker.issue(report.outcomes[0].key().unwrap()).unwrap();
        assert_eq!(story.fields["customfield_10014"], json!(report.epic_key));
    }

    #[test]
    fn link_epic_updates_each_story() {
        let (dir, meta, settings) = setup();
        let tracker = FakeTracker::with_project("MP");
        let syncer = TrackerSyncer::new(dir.path(), &meta, &settings, &tracker);
        let sync = syncer.sync_tasks("demo").unwrap();

        let report = syncer.link_epic("demo").unwrap();
        assert_eq!(report.field, "customfield_10014");
        assert_eq!(report.linked(), 3);
        for outcome in &report.outcomes {
            let issue = tracker.issue(&outcome.key).unwrap();
            assert_eq!(issue.fields["customfield_10014"], json!(sync.epic_key));
        }
    }

    #[test]
    fn link_epic_requires_recorded_epic() {
        let (dir, meta, settings) = setup();
        testing::write_doc(dir.path(), "demo", "spec.json", "{}");
        let tracker = FakeTracker::with_project("MP");
        let err = TrackerSyncer::new(dir.path(), &meta, &settings, &tracker)
            .link_epic("demo")
            .unwrap_err();
        assert!(matches!(err, SyncError::EpicNotRecorded(f) if f == "demo"));
    }
}
