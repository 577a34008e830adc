use crate::remote::RemoteError;
use crate::types::{Phase, Stage};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("project metadata not found: {} (create .kiro/project.json or run from a project root)", .0.display())]
    ProjectNotFound(PathBuf),

    #[error("invalid JSON in {}: {reason}", .path.display())]
    InvalidProject { path: PathBuf, reason: String },

    #[error("required field missing in project.json: {0}")]
    MissingProjectField(&'static str),

    #[error("missing credentials: {} (set them in .env)", .0.join(", "))]
    MissingCredentials(Vec<&'static str>),

    #[error("failed to read .env: {0}")]
    EnvFile(String),

    #[error("invalid feature name '{0}': must be lowercase alphanumeric with hyphens")]
    InvalidSlug(String),

    #[error("invalid phase: {0} (expected requirements, design, or tasks)")]
    InvalidPhase(String),

    #[error("invalid stage: {0} (expected requirements, design, tasks, implement, test, or release)")]
    InvalidStage(String),

    #[error("invalid preflight scope: {0} (expected confluence, jira, or all)")]
    InvalidScope(String),

    #[error("{phase} document not found: {}", .path.display())]
    DocumentNotFound { phase: Phase, path: PathBuf },

    #[error("spec.json not found: {}", .0.display())]
    SpecStateNotFound(PathBuf),

    #[error("no epic recorded for '{0}' (run: specsync tracker sync {0})")]
    EpicNotRecorded(String),

    #[error("tracker epic search failed, refusing to create a possibly duplicate epic: {0}")]
    EpicSearch(#[source] RemoteError),

    #[error("stage '{stage}' failed: {source}")]
    StageFailed {
        stage: Stage,
        #[source]
        source: Box<SyncError>,
    },

    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SyncError>;
