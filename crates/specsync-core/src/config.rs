use crate::error::{Result, SyncError};
use crate::paths;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Keys
// ---------------------------------------------------------------------------

pub const ATLASSIAN_URL: &str = "ATLASSIAN_URL";
pub const ATLASSIAN_EMAIL: &str = "ATLASSIAN_EMAIL";
pub const ATLASSIAN_API_TOKEN: &str = "ATLASSIAN_API_TOKEN";
pub const CONFLUENCE_SPACE: &str = "CONFLUENCE_PRD_SPACE";
pub const JIRA_STORY_ISSUE_TYPE_ID: &str = "JIRA_STORY_ISSUE_TYPE_ID";
pub const JIRA_EPIC_LINK_FIELD: &str = "JIRA_EPIC_LINK_FIELD";

pub const REQUIRED_KEYS: [&str; 3] = [ATLASSIAN_URL, ATLASSIAN_EMAIL, ATLASSIAN_API_TOKEN];

const KNOWN_KEYS: [&str; 6] = [
    ATLASSIAN_URL,
    ATLASSIAN_EMAIL,
    ATLASSIAN_API_TOKEN,
    CONFLUENCE_SPACE,
    JIRA_STORY_ISSUE_TYPE_ID,
    JIRA_EPIC_LINK_FIELD,
];

pub const DEFAULT_SPACE: &str = "PRD";
pub const DEFAULT_STORY_ISSUE_TYPE_ID: &str = "10036";
pub const DEFAULT_EPIC_LINK_FIELD: &str = "customfield_10014";

// ---------------------------------------------------------------------------
// EnvConfig
// ---------------------------------------------------------------------------

/// Credentials and service settings gathered once at startup from the
/// project's `.env` file, overlaid by the process environment.
#[derive(Debug, Clone, Default)]
pub struct EnvConfig {
    /// The `.env` file the values came from, if one exists.
    pub source: Option<PathBuf>,
    vars: BTreeMap<String, String>,
}

impl EnvConfig {
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::env_path(root);
        let mut vars = BTreeMap::new();
        let source = if path.is_file() {
            let iter =
                dotenvy::from_path_iter(&path).map_err(|e| SyncError::EnvFile(e.to_string()))?;
            for item in iter {
                let (key, value) = item.map_err(|e| SyncError::EnvFile(e.to_string()))?;
                vars.insert(key, value);
            }
            Some(path)
        } else {
            None
        };
        for key in KNOWN_KEYS {
            if let Ok(value) = std::env::var(key) {
                vars.insert(key.to_string(), value);
            }
        }
        Ok(Self { source, vars })
    }

    /// Build from explicit pairs. Used by tests and embedders that manage
    /// their own configuration.
    pub fn from_pairs<I, K, V>(source: Option<PathBuf>, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            source,
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// A set, non-blank value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    pub fn missing_required(&self) -> Vec<&'static str> {
        REQUIRED_KEYS
            .iter()
            .copied()
            .filter(|key| self.get(key).is_none())
            .collect()
    }

    pub fn space_key(&self) -> &str {
        self.get(CONFLUENCE_SPACE).unwrap_or(DEFAULT_SPACE)
    }

    /// Resolve the full Atlassian settings, failing if any credential is missing.
    pub fn atlassian(&self) -> Result<AtlassianConfig> {
        let missing = self.missing_required();
        if !missing.is_empty() {
            return Err(SyncError::MissingCredentials(missing));
        }
        Ok(AtlassianConfig {
            url: self.get(ATLASSIAN_URL).unwrap_or_default().trim_end_matches('/').to_string(),
            email: self.get(ATLASSIAN_EMAIL).unwrap_or_default().to_string(),
            api_token: self.get(ATLASSIAN_API_TOKEN).unwrap_or_default().to_string(),
            space: self.space_key().to_string(),
            story_issue_type_id: self
                .get(JIRA_STORY_ISSUE_TYPE_ID)
                .unwrap_or(DEFAULT_STORY_ISSUE_TYPE_ID)
                .to_string(),
            epic_link_field: self.get(JIRA_EPIC_LINK_FIELD).map(str::to_string),
        })
    }
}

// ---------------------------------------------------------------------------
// AtlassianConfig
// ---------------------------------------------------------------------------

/// Resolved settings shared by the wiki and tracker clients and syncers.
#[derive(Debug, Clone)]
pub struct AtlassianConfig {
    /// Site base URL without a trailing slash, e.g. `https://acme.atlassian.net`.
    pub url: String,
    pub email: String,
    pub api_token: String,
    /// Wiki space that receives feature pages.
    pub space: String,
    pub story_issue_type_id: String,
    /// Custom field carrying the epic link. Stories are created without a
    /// link when unset.
    pub epic_link_field: Option<String>,
}

impl AtlassianConfig {
    pub fn epic_link_field_or_default(&self) -> &str {
        self.epic_link_field
            .as_deref()
            .unwrap_or(DEFAULT_EPIC_LINK_FIELD)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
