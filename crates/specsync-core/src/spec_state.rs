//! Typed view of a feature's `spec.json`.
//!
//! The file is shared with other tooling, so every struct keeps the fields it
//! does not know about in a flattened `extra` map and writes them back
//! untouched.

use crate::error::{Result, SyncError};
use crate::paths;
use crate::types::Phase;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

// ---------------------------------------------------------------------------
// Remote references
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfluenceRefs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub space_key: Option<String>,
    #[serde(
        default,
        deserialize_with = "string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub requirements_page_id: Option<String>,
    #[serde(
        default,
        deserialize_with = "string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub design_page_id: Option<String>,
    #[serde(
        default,
        deserialize_with = "string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub tasks_page_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ConfluenceRefs {
    pub fn page_id(&self, phase: Phase) -> Option<&str> {
        let id = match phase {
            Phase::Requirements => &self.requirements_page_id,
            Phase::Design => &self.design_page_id,
            Phase::Tasks => &self.tasks_page_id,
        };
        id.as_deref().filter(|s| !s.is_empty())
    }

    fn set_page_id(&mut self, phase: Phase, id: String) {
        match phase {
            Phase::Requirements => self.requirements_page_id = Some(id),
            Phase::Design => self.design_page_id = Some(id),
            Phase::Tasks => self.tasks_page_id = Some(id),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryCounts {
    #[serde(default)]
    pub created: u32,
    #[serde(default)]
    pub total: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JiraRefs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub epic_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stories: Option<StoryCounts>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ---------------------------------------------------------------------------
// Milestones
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Milestone {
    #[serde(default)]
    pub completed: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Milestones {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requirements: Option<Milestone>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub design: Option<Milestone>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tasks: Option<Milestone>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ---------------------------------------------------------------------------
// SpecState
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpecState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confluence: Option<ConfluenceRefs>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jira: Option<JiraRefs>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub milestones: Option<Milestones>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SpecState {
    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    pub fn load(root: &Path, feature: &str) -> Result<Self> {
        let path = paths::spec_state_path(root, feature);
        if !path.exists() {
            return Err(SyncError::SpecStateNotFound(path));
        }
        let data = std::fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Load the state, starting fresh when the file is absent. A malformed
    /// file is still an error so it is never silently overwritten.
    pub fn load_or_default(root: &Path, feature: &str) -> Result<Self> {
        match Self::load(root, feature) {
            Err(SyncError::SpecStateNotFound(_)) => Ok(Self::default()),
            other => other,
        }
    }

    pub fn save(&self, root: &Path, feature: &str) -> Result<()> {
        crate::io::write_json(&paths::spec_state_path(root, feature), self)
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn space_key(&self) -> Option<&str> {
        self.confluence
            .as_ref()
            .and_then(|c| c.space_key.as_deref())
            .filter(|s| !s.is_empty())
    }

    pub fn page_id(&self, phase: Phase) -> Option<&str> {
        self.confluence.as_ref().and_then(|c| c.page_id(phase))
    }

    pub fn epic_key(&self) -> Option<&str> {
        self.jira
            .as_ref()
            .and_then(|j| j.epic_key.as_deref())
            .filter(|s| !s.is_empty())
    }

    pub fn story_counts(&self) -> Option<StoryCounts> {
        self.jira.as_ref().and_then(|j| j.stories)
    }

    pub fn is_complete(&self, phase: Phase) -> bool {
        let Some(m) = self.milestones.as_ref() else {
            return false;
        };
        let milestone = match phase {
            Phase::Requirements => &m.requirements,
            Phase::Design => &m.design,
            Phase::Tasks => &m.tasks,
        };
        milestone.as_ref().is_some_and(|m| m.completed)
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    pub fn record_page(&mut self, space_key: &str, phase: Phase, page_id: impl Into<String>) {
        let refs = self.confluence.get_or_insert_with(Default::default);
        refs.space_key = Some(space_key.to_string());
        refs.set_page_id(phase, page_id.into());
    }

    pub fn record_epic(&mut self, epic_key: impl Into<String>) {
        self.jira.get_or_insert_with(Default::default).epic_key = Some(epic_key.into());
    }

    pub fn record_stories(&mut self, created: u32, total: u32) {
        self.jira.get_or_insert_with(Default::default).stories =
            Some(StoryCounts { created, total });
    }

    pub fn set_complete(&mut self, phase: Phase, completed: bool) {
        let m = self.milestones.get_or_insert_with(Default::default);
        let slot = match phase {
            Phase::Requirements => &mut m.requirements,
            Phase::Design => &mut m.design,
            Phase::Tasks => &mut m.tasks,
        };
        slot.get_or_insert_with(Default::default).completed = completed;
    }
}

/// Page ids arrive as strings from the REST API but hand-edited files often
/// carry bare numbers.
fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected page id string or number, got {other}"
        ))),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
