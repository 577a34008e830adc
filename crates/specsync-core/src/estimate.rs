//! Effort estimate extracted from the task table in `design.md`.
//!
//! Any Markdown table row shaped `| task | days | assignee |` counts, so the
//! table may sit anywhere in the document.

use crate::error::{Result, SyncError};
use crate::paths;
use crate::types::Phase;
use regex::Regex;
use serde::Serialize;
use std::path::Path;
use std::sync::OnceLock;

/// One story point per half day.
const DAYS_PER_POINT: f64 = 0.5;
const PESSIMISTIC_FACTOR: f64 = 1.5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskEstimate {
    pub name: String,
    pub days: f64,
    pub assignee: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskAllowance {
    pub risk: &'static str,
    pub days: f64,
    pub mitigation: &'static str,
}

const RISKS: [RiskAllowance; 2] = [
    RiskAllowance {
        risk: "Technical unknowns",
        days: 5.0,
        mitigation: "Prototype early",
    },
    RiskAllowance {
        risk: "Requirement changes",
        days: 3.0,
        mitigation: "Keep a schedule buffer",
    },
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Estimate {
    pub feature: String,
    pub tasks: Vec<TaskEstimate>,
    pub total_days: f64,
    pub total_points: u32,
    pub risks: Vec<RiskAllowance>,
    pub optimistic: f64,
    pub standard: f64,
    pub pessimistic: f64,
}

fn row_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\|\s*([^|]+?)\s*\|\s*(\d+(?:\.\d+)?)\s*\|\s*([^|]+?)\s*\|").unwrap())
}

fn is_header_or_total(name: &str) -> bool {
    let bare = name.trim_matches('*').trim();
    matches!(bare, "Task" | "タスク" | "Total" | "合計")
}

impl Estimate {
    pub fn load(root: &Path, feature: &str) -> Result<Self> {
        let path = paths::document_path(root, feature, Phase::Design);
        if !path.is_file() {
            return Err(SyncError::DocumentNotFound {
                phase: Phase::Design,
                path,
            });
        }
        Ok(Self::parse(feature, &std::fs::read_to_string(path)?))
    }

    pub fn parse(feature: &str, design: &str) -> Self {
        let tasks: Vec<TaskEstimate> = design
            .lines()
            .filter_map(|line| row_re().captures(line))
            .filter(|caps| !is_header_or_total(&caps[1]))
            .filter_map(|caps| {
                let days = caps[2].parse::<f64>().ok()?;
                Some(TaskEstimate {
                    name: caps[1].to_string(),
                    days,
                    assignee: caps[3].to_string(),
                })
            })
            .collect();

        let total_days: f64 = tasks.iter().map(|t| t.days).sum();
        let risk_days: f64 = RISKS.iter().map(|r| r.days).sum();
        Self {
            feature: feature.to_string(),
            total_points: (total_days / DAYS_PER_POINT).ceil() as u32,
            optimistic: total_days,
            standard: total_days + risk_days,
            pessimistic: (total_days * PESSIMISTIC_FACTOR).ceil(),
            total_days,
            tasks,
            risks: RISKS.to_vec(),
        }
    }

    pub fn to_markdown(&self) -> String {
        let mut out = format!("# Estimate: {}\n\n## Tasks\n\n", self.feature);
        out.push_str("| Task | Days | Assignee |\n|------|------|----------|\n");
        for t in &self.tasks {
            out.push_str(&format!("| {} | {} | {} |\n", t.name, t.days, t.assignee));
        }
        out.push_str(&format!(
            "| **Total** | **{}** | - |\n\nStory points: {}\n\n## Risks\n\n",
            self.total_days, self.total_points
        ));
        out.push_str("| Risk | Days | Mitigation |\n|------|------|------------|\n");
        for r in &self.risks {
            out.push_str(&format!("| {} | {} | {} |\n", r.risk, r.days, r.mitigation));
        }
        out.push_str(&format!(
            "\n## Final estimate\n\n- **Optimistic**: {} days\n- **Standard**: {} days (with risks)\n- **Pessimistic**: {} days\n\n**Plan for**: {} days\n",
            self.optimistic, self.standard, self.pessimistic, self.standard
        ));
        out
    }
}
