use crate::error::{Result, SyncError};
use crate::paths;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

// ---------------------------------------------------------------------------
// ProjectStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    #[default]
    Active,
    Inactive,
    Completed,
    #[serde(other)]
    Unknown,
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ProjectStatus::Active => "active",
            ProjectStatus::Inactive => "inactive",
            ProjectStatus::Completed => "completed",
            ProjectStatus::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// ProjectMetadata
// ---------------------------------------------------------------------------

/// Project descriptor read from `.kiro/project.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectMetadata {
    pub project_id: String,
    pub project_name: String,
    pub jira_project_key: String,
    pub confluence_labels: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer: Option<String>,
    #[serde(default)]
    pub status: ProjectStatus,
    #[serde(default)]
    pub team: Vec<String>,
    #[serde(default)]
    pub stakeholders: Vec<String>,
    #[serde(default)]
    pub repository: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

const REQUIRED_FIELDS: [&str; 4] = [
    "projectId",
    "projectName",
    "jiraProjectKey",
    "confluenceLabels",
];

impl ProjectMetadata {
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::project_path(root);
        if !path.exists() {
            return Err(SyncError::ProjectNotFound(path));
        }
        let data = std::fs::read_to_string(&path)?;
        Self::parse(&data).map_err(|e| match e {
            SyncError::Json(err) => SyncError::InvalidProject {
                path: path.clone(),
                reason: err.to_string(),
            },
            other => other,
        })
    }

    /// Parse descriptor JSON. Required fields must be present and non-empty.
    pub fn parse(data: &str) -> Result<Self> {
        let raw: serde_json::Value = serde_json::from_str(data)?;
        for field in REQUIRED_FIELDS {
            if !is_present(raw.get(field)) {
                return Err(SyncError::MissingProjectField(field));
            }
        }
        Ok(serde_json::from_value(raw)?)
    }

    /// Base URL for browsing the repository's default branch, without a
    /// trailing slash.
    pub fn repository_base(&self) -> &str {
        self.repository.trim_end_matches('/')
    }

    /// Multi-line summary for terminal display.
    pub fn format_info(&self) -> String {
        let mut lines = vec![
            format!("Project: {} ({})", self.project_name, self.project_id),
            format!("JIRA:    {}", self.jira_project_key),
            format!("Labels:  {}", self.confluence_labels.join(", ")),
            format!("Status:  {}", self.status),
        ];
        if !self.team.is_empty() {
            lines.push(format!("Team:    {}", self.team.join(", ")));
        }
        if !self.stakeholders.is_empty() {
            lines.push(format!("Owners:  {}", self.stakeholders.join(", ")));
        }
        if !self.repository.is_empty() {
            lines.push(format!("Repo:    {}", self.repository));
        }
        lines.join("\n")
    }
}

fn is_present(value: Option<&serde_json::Value>) -> bool {
    match value {
        None | Some(serde_json::Value::Null) => false,
        Some(serde_json::Value::String(s)) => !s.trim().is_empty(),
        Some(serde_json::Value::Array(a)) => !a.is_empty(),
        Some(_) => true,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
