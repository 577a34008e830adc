//! Sequential multi-stage workflow with approval gates.
//!
//! Stages run in declared order and the first failure ends the run. Approval
//! gates are announced after their stage and do not block; approvals are
//! collected out of band and recorded with `phase approve`.

use crate::config::{AtlassianConfig, EnvConfig};
use crate::error::{Result, SyncError};
use crate::project::ProjectMetadata;
use crate::remote::{DocsApi, TrackerApi};
use crate::sync::{DocSyncer, TrackerSyncer};
use crate::types::{Phase, Stage};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

// ---------------------------------------------------------------------------
// WorkflowConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowConfig {
    pub feature: String,
    pub stages: Vec<Stage>,
    #[serde(default, alias = "approvalGates", skip_serializing_if = "BTreeMap::is_empty")]
    pub approval_gates: BTreeMap<Stage, Vec<String>>,
}

impl WorkflowConfig {
    /// All six stages with review gates after requirements, design and
    /// release.
    pub fn standard(feature: &str) -> Self {
        let gate = |names: &[&str]| names.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        let mut approval_gates = BTreeMap::new();
        approval_gates.insert(Stage::Requirements, gate(&["Product", "Manager"]));
        approval_gates.insert(Stage::Design, gate(&["Architect", "Manager"]));
        approval_gates.insert(Stage::Release, gate(&["Scrum Master", "Manager"]));
        Self {
            feature: feature.to_string(),
            stages: Stage::all().to_vec(),
            approval_gates,
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&data)?;
        crate::paths::validate_slug(&config.feature)?;
        Ok(config)
    }

    pub fn approvers_for(&self, stage: Stage) -> &[String] {
        self.approval_gates
            .get(&stage)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    fn needs_remote(&self) -> bool {
        self.stages.iter().any(|s| s.phase().is_some())
    }
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApprovalRequest {
    pub stage: Stage,
    pub approvers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageReport {
    pub stage: Stage,
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approval: Option<ApprovalRequest>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkflowReport {
    pub feature: String,
    pub status: WorkflowStatus,
    pub stages: Vec<StageReport>,
}

impl WorkflowReport {
    pub fn pending_approvals(&self) -> impl Iterator<Item = &ApprovalRequest> {
        self.stages.iter().filter_map(|s| s.approval.as_ref())
    }
}

// ---------------------------------------------------------------------------
// WorkflowOrchestrator
// ---------------------------------------------------------------------------

pub struct WorkflowOrchestrator<'a> {
    root: &'a Path,
    env: &'a EnvConfig,
    config: WorkflowConfig,
    docs: &'a dyn DocsApi,
    tracker: &'a dyn TrackerApi,
}

impl<'a> WorkflowOrchestrator<'a> {
    pub fn new(
        root: &'a Path,
        env: &'a EnvConfig,
        config: WorkflowConfig,
        docs: &'a dyn DocsApi,
        tracker: &'a dyn TrackerApi,
    ) -> Self {
        Self {
            root,
            env,
            config,
            docs,
            tracker,
        }
    }

    pub fn run(&self) -> Result<WorkflowReport> {
        let feature = self.config.feature.as_str();
        let stage_list: Vec<&str> = self.config.stages.iter().map(|s| s.as_str()).collect();
        tracing::info!(feature, stages = %stage_list.join(" -> "), "starting workflow");

        let project = ProjectMetadata::load(self.root)?;
        let settings = if self.config.needs_remote() {
            Some(self.env.atlassian()?)
        } else {
            None
        };
        tracing::info!(project = %project.project_name, "project loaded");

        let mut stages = Vec::with_capacity(self.config.stages.len());
        for &stage in &self.config.stages {
            tracing::info!(%stage, "stage started");
            let detail = self
                .execute(stage, &project, settings.as_ref())
                .map_err(|e| {
                    tracing::error!(%stage, error = %e, "stage failed");
                    SyncError::StageFailed {
                        stage,
                        source: Box::new(e),
                    }
                })?;

            let approvers = self.config.approvers_for(stage);
            let approval = (!approvers.is_empty()).then(|| {
                tracing::info!(
                    %stage,
                    approvers = %approvers.join(", "),
                    "approval required; review on the wiki, then run `specsync phase approve`"
                );
                ApprovalRequest {
                    stage,
                    approvers: approvers.to_vec(),
                }
            });

            tracing::info!(%stage, "stage completed");
            stages.push(StageReport {
                stage,
                detail,
                approval,
            });
        }

        tracing::info!(feature, "workflow completed");
        Ok(WorkflowReport {
            feature: feature.to_string(),
            status: WorkflowStatus::Completed,
            stages,
        })
    }

    fn execute(
        &self,
        stage: Stage,
        project: &ProjectMetadata,
        settings: Option<&AtlassianConfig>,
    ) -> Result<String> {
        let feature = self.config.feature.as_str();
        match (stage.phase(), settings) {
            (Some(Phase::Tasks), Some(settings)) => {
                let report = TrackerSyncer::new(self.root, project, settings, self.tracker)
                    .sync_tasks(feature)?;
                Ok(format!(
                    "epic {}: {} created, {} reused, {} failed",
                    report.epic_key,
                    report.created(),
                    report.reused(),
                    report.failed()
                ))
            }
            (Some(phase), Some(settings)) => {
                let outcome = DocSyncer::new(self.root, project, settings, self.docs)
                    .sync_document(feature, phase)?;
                Ok(format!("page {} {}", outcome.page_id, outcome.action))
            }
            (Some(_), None) => Err(SyncError::MissingCredentials(self.env.missing_required())),
            (None, _) => Ok(match stage {
                Stage::Implement => "manual step: implement the tasks",
                Stage::Test => "manual step: run the test suite",
                _ => "manual step: prepare release notes",
            }
            .to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
