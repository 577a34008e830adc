//! Interfaces to the remote documentation wiki and issue tracker.
//!
//! Business logic talks to [`DocsApi`] and [`TrackerApi`] only. The HTTP
//! implementations live in [`confluence`] and [`jira`]; tests substitute
//! in-memory fakes.

pub mod confluence;
pub mod jira;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use confluence::ConfluenceClient;
pub use jira::JiraClient;

// ---------------------------------------------------------------------------
// RemoteError
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("{service} returned HTTP {status}: {body}")]
    Status {
        service: &'static str,
        status: u16,
        body: String,
    },

    #[error("{service} request failed: {message}")]
    Transport {
        service: &'static str,
        message: String,
    },

    #[error("{service} sent an unexpected response: {message}")]
    Decode {
        service: &'static str,
        message: String,
    },
}

impl RemoteError {
    pub fn status(&self) -> Option<u16> {
        match self {
            RemoteError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }
}

pub type RemoteResult<T> = std::result::Result<T, RemoteError>;

// ---------------------------------------------------------------------------
// Wiki types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpaceInfo {
    pub key: String,
    pub name: String,
}

/// A wiki page as returned by search, create, and update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRef {
    pub id: String,
    pub title: String,
    pub version: u32,
    /// Path of the page's web UI relative to the wiki root, e.g.
    /// `/spaces/PRD/pages/123/Title`.
    pub web_path: Option<String>,
}

pub trait DocsApi {
    fn get_space(&self, key: &str) -> RemoteResult<SpaceInfo>;

    fn find_page(&self, space: &str, title: &str) -> RemoteResult<Option<PageRef>>;

    fn create_page(
        &self,
        space: &str,
        title: &str,
        body: &str,
        labels: &[String],
    ) -> RemoteResult<PageRef>;

    /// Replace the page body. `current_version` is the version being replaced.
    fn update_page(
        &self,
        page_id: &str,
        title: &str,
        body: &str,
        current_version: u32,
    ) -> RemoteResult<PageRef>;

    fn add_labels(&self, page_id: &str, labels: &[String]) -> RemoteResult<()>;
}

// ---------------------------------------------------------------------------
// Tracker types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectInfo {
    pub key: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueRef {
    pub key: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub labels: Vec<String>,
}

pub trait TrackerApi {
    fn get_project(&self, key: &str) -> RemoteResult<ProjectInfo>;

    fn search_issues(&self, jql: &str) -> RemoteResult<Vec<IssueRef>>;

    /// Create an issue from a complete `{"fields": {...}}` payload.
    fn create_issue(&self, payload: &serde_json::Value) -> RemoteResult<IssueRef>;

    fn update_issue(&self, key: &str, payload: &serde_json::Value) -> RemoteResult<()>;
}

// ---------------------------------------------------------------------------
// Shared HTTP helpers
// ---------------------------------------------------------------------------

pub(crate) fn send(
    service: &'static str,
    request: reqwest::blocking::RequestBuilder,
) -> RemoteResult<reqwest::blocking::Response> {
    let response = request.send().map_err(|e| RemoteError::Transport {
        service,
        message: e.to_string(),
    })?;
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    tracing::debug!(service, status = status.as_u16(), %body, "remote call failed");
    Err(RemoteError::Status {
        service,
        status: status.as_u16(),
        body: truncate(&body, 500),
    })
}

pub(crate) fn decode<T: serde::de::DeserializeOwned>(
    service: &'static str,
    response: reqwest::blocking::Response,
) -> RemoteResult<T> {
    response.json().map_err(|e| RemoteError::Decode {
        service,
        message: e.to_string(),
    })
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &s[..end])
}
