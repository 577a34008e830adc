//! Parser for a feature's `tasks.md`.
//!
//! The document is a sequence of phase headings, each followed by stories:
//!
//! ```text
//! ## Phase 2: Build (Implementation)
//! ### Story 2.1: Login form
//! **Priority**: High
//! **Due**: 2025-03-14
//! **Description**:
//! Users sign in with email.
//! **Acceptance Criteria**:
//! - [ ] form validates
//! ```
//!
//! Field names are accepted in English or Japanese.

use crate::error::Result;
use crate::paths;
use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::OnceLock;

pub const DEFAULT_PHASE_LABEL: &str = "implementation";

// ---------------------------------------------------------------------------
// Priority
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
        }
    }

    /// Lenient parse; anything unrecognised is `Medium`.
    pub fn parse_lenient(s: &str) -> Self {
        let s = s.trim();
        match s.to_ascii_lowercase().as_str() {
            "high" | "highest" => Priority::High,
            "low" | "lowest" => Priority::Low,
            _ if s.starts_with('高') => Priority::High,
            _ if s.starts_with('低') => Priority::Low,
            _ => Priority::Medium,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// StorySpec
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorySpec {
    pub title: String,
    /// Label of the enclosing phase heading, e.g. `implementation`.
    pub phase_label: String,
    pub description: Option<String>,
    pub acceptance_criteria: Vec<String>,
    pub subtasks: Vec<String>,
    pub dependencies: Option<String>,
    pub priority: Priority,
    pub estimate: Option<String>,
    pub assignee: Option<String>,
    pub due_date: Option<NaiveDate>,
}

impl StorySpec {
    fn new(title: &str, phase_label: &str) -> Self {
        Self {
            title: title.trim().to_string(),
            phase_label: phase_label.to_string(),
            description: None,
            acceptance_criteria: Vec::new(),
            subtasks: Vec::new(),
            dependencies: None,
            priority: Priority::default(),
            estimate: None,
            assignee: None,
            due_date: None,
        }
    }

    /// Tracker summary derived from the title.
    pub fn summary(&self) -> String {
        format!("Story: {}", self.title)
    }
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Priority,
    Estimate,
    Assignee,
    Due,
    Dependencies,
    Description,
    AcceptanceCriteria,
    Subtasks,
}

impl Field {
    fn from_name(name: &str) -> Option<Field> {
        let lower = name.trim().to_ascii_lowercase();
        let field = match lower.as_str() {
            "priority" | "優先度" => Field::Priority,
            "estimate" | "見積もり" | "見積" => Field::Estimate,
            "assignee" | "owner" | "担当" | "担当者" => Field::Assignee,
            "due" | "due date" | "期限" => Field::Due,
            "dependencies" | "depends on" | "依存関係" => Field::Dependencies,
            "description" | "説明" => Field::Description,
            "acceptance criteria" | "完了条件" => Field::AcceptanceCriteria,
            "subtasks" | "サブタスク" => Field::Subtasks,
            _ => return None,
        };
        Some(field)
    }
}

fn phase_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^## Phase [\d.]+:\s*(.+?)\s*[（(](.+?)[）)]").unwrap())
}

fn story_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^### Story [\d.]+:\s*(.+)$").unwrap())
}

fn field_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\*\*(.+?)\*\*\s*[:：]\s*(.*)$").unwrap())
}

fn checklist_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*- \[.\]\s*(.*)$").unwrap())
}

fn date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d{4}-\d{2}-\d{2}").unwrap())
}

/// Map a phase heading's parenthesised label to a tracker label.
pub fn phase_label_for(label: &str) -> &'static str {
    let lower = label.to_ascii_lowercase();
    if label.contains("要件定義") || lower.contains("requirements") {
        "requirements"
    } else if label.contains("設計") || lower.contains("design") {
        "design"
    } else if label.contains("実装") || lower.contains("implementation") {
        "implementation"
    } else if label.contains("試験") || label.contains("テスト") || lower.contains("testing") {
        "testing"
    } else if label.contains("リリース準備")
        || lower.contains("release-prep")
        || lower.contains("release preparation")
    {
        "release-prep"
    } else if label.contains("リリース") || lower.contains("release") {
        "release"
    } else {
        DEFAULT_PHASE_LABEL
    }
}

/// The parsed stories of one `tasks.md`, in document order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TasksDocument {
    pub stories: Vec<StorySpec>,
}

impl TasksDocument {
    pub fn load(root: &Path, feature: &str) -> Result<Self> {
        let path = paths::document_path(root, feature, crate::types::Phase::Tasks);
        let text = std::fs::read_to_string(path)?;
        Ok(Self::parse(&text))
    }

    pub fn parse(text: &str) -> Self {
        let mut stories = Vec::new();
        let mut phase_label = DEFAULT_PHASE_LABEL;
        let mut current: Option<StorySpec> = None;
        let mut field: Option<Field> = None;

        for line in text.lines() {
            if let Some(caps) = phase_re().captures(line) {
                stories.extend(current.take());
                field = None;
                phase_label = phase_label_for(&caps[2]);
                tracing::debug!(heading = &caps[1], label = phase_label, "phase heading");
                continue;
            }
            if let Some(caps) = story_re().captures(line) {
                stories.extend(current.take());
                field = None;
                current = Some(StorySpec::new(&caps[1], phase_label));
                continue;
            }
            if line.starts_with("## ") || line.starts_with("### ") {
                stories.extend(current.take());
                field = None;
                continue;
            }

            let Some(story) = current.as_mut() else {
                continue;
            };

            if let Some(caps) = field_re().captures(line) {
                field = Field::from_name(&caps[1]);
                let value = caps[2].trim();
                if let Some(f) = field {
                    apply_inline(story, f, value);
                }
                continue;
            }

            match field {
                Some(Field::AcceptanceCriteria) | Some(Field::Subtasks) => {
                    if let Some(caps) = checklist_re().captures(line) {
                        let item = caps[1].trim();
                        if item.is_empty() {
                            continue;
                        }
                        if field == Some(Field::Subtasks) {
                            story.subtasks.push(item.to_string());
                        } else {
                            story.acceptance_criteria.push(item.to_string());
                        }
                    } else if !line.trim().is_empty() {
                        field = None;
                    }
                }
                Some(Field::Description) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    match story.description.as_mut() {
                        Some(d) => {
                            d.push('\n');
                            d.push_str(line);
                        }
                        None => story.description = Some(line.to_string()),
                    }
                }
                _ => {}
            }
        }
        stories.extend(current);

        Self { stories }
    }
}

fn apply_inline(story: &mut StorySpec, field: Field, value: &str) {
    let non_empty = || (!value.is_empty()).then(|| value.to_string());
    match field {
        Field::Priority => story.priority = Priority::parse_lenient(value),
        Field::Estimate => story.estimate = non_empty(),
        Field::Assignee => story.assignee = non_empty(),
        Field::Dependencies => story.dependencies = non_empty(),
        Field::Description => story.description = non_empty(),
        Field::Due => {
            story.due_date = date_re()
                .find(value)
                .and_then(|m| NaiveDate::parse_from_str(m.as_str(), "%Y-%m-%d").ok());
            if story.due_date.is_none() && !value.is_empty() {
                tracing::warn!(story = %story.title, value, "ignoring unparseable due date");
            }
        }
        Field::AcceptanceCriteria | Field::Subtasks => {}
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
