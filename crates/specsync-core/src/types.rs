use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

/// A documented development phase. Each phase owns one Markdown document in
/// the feature directory and is gated on the one before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Requirements,
    Design,
    Tasks,
}

impl Phase {
    pub fn all() -> &'static [Phase] {
        &[Phase::Requirements, Phase::Design, Phase::Tasks]
    }

    /// The phase that must be complete before this one can validate.
    pub fn prerequisite(self) -> Option<Phase> {
        match self {
            Phase::Requirements => None,
            Phase::Design => Some(Phase::Requirements),
            Phase::Tasks => Some(Phase::Design),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Requirements => "requirements",
            Phase::Design => "design",
            Phase::Tasks => "tasks",
        }
    }

    pub fn filename(self) -> &'static str {
        match self {
            Phase::Requirements => "requirements.md",
            Phase::Design => "design.md",
            Phase::Tasks => "tasks.md",
        }
    }

    /// Human label used in wiki page titles.
    pub fn title_label(self) -> &'static str {
        match self {
            Phase::Requirements => "Requirements",
            Phase::Design => "Design",
            Phase::Tasks => "Tasks",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Phase {
    type Err = crate::error::SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "requirements" => Ok(Phase::Requirements),
            "design" => Ok(Phase::Design),
            "tasks" => Ok(Phase::Tasks),
            _ => Err(crate::error::SyncError::InvalidPhase(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Stage
// ---------------------------------------------------------------------------

/// A workflow stage: the three documented phases plus the downstream steps
/// that are tracked but not automated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Requirements,
    Design,
    Tasks,
    Implement,
    Test,
    Release,
}

impl Stage {
    pub fn all() -> &'static [Stage] {
        &[
            Stage::Requirements,
            Stage::Design,
            Stage::Tasks,
            Stage::Implement,
            Stage::Test,
            Stage::Release,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Requirements => "requirements",
            Stage::Design => "design",
            Stage::Tasks => "tasks",
            Stage::Implement => "implement",
            Stage::Test => "test",
            Stage::Release => "release",
        }
    }

    /// The documented phase behind this stage, if any.
    pub fn phase(self) -> Option<Phase> {
        match self {
            Stage::Requirements => Some(Phase::Requirements),
            Stage::Design => Some(Phase::Design),
            Stage::Tasks => Some(Phase::Tasks),
            Stage::Implement | Stage::Test | Stage::Release => None,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Stage {
    type Err = crate::error::SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "requirements" => Ok(Stage::Requirements),
            "design" => Ok(Stage::Design),
            "tasks" => Ok(Stage::Tasks),
            "implement" => Ok(Stage::Implement),
            "test" => Ok(Stage::Test),
            "release" => Ok(Stage::Release),
            _ => Err(crate::error::SyncError::InvalidStage(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// PreflightScope
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreflightScope {
    Docs,
    Tracker,
    All,
}

impl PreflightScope {
    pub fn includes_docs(self) -> bool {
        matches!(self, PreflightScope::Docs | PreflightScope::All)
    }

    pub fn includes_tracker(self) -> bool {
        matches!(self, PreflightScope::Tracker | PreflightScope::All)
    }
}

impl fmt::Display for PreflightScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PreflightScope::Docs => "confluence",
            PreflightScope::Tracker => "jira",
            PreflightScope::All => "all",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for PreflightScope {
    type Err = crate::error::SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "confluence" | "docs" => Ok(PreflightScope::Docs),
            "jira" | "tracker" => Ok(PreflightScope::Tracker),
            "all" => Ok(PreflightScope::All),
            _ => Err(crate::error::SyncError::InvalidScope(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
