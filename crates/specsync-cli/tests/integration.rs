#![allow(deprecated)]
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const PROJECT_JSON: &str = r#"{
    "projectId": "michi",
    "projectName": "Michi",
    "jiraProjectKey": "MP",
    "confluenceLabels": ["project:michi"],
    "stakeholders": ["PM"],
    "repository": "https://github.com/acme/michi"
}"#;

const ENV_KEYS: [&str; 6] = [
    "ATLASSIAN_URL",
    "ATLASSIAN_EMAIL",
    "ATLASSIAN_API_TOKEN",
    "CONFLUENCE_PRD_SPACE",
    "JIRA_STORY_ISSUE_TYPE_ID",
    "JIRA_EPIC_LINK_FIELD",
];

fn specsync(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("specsync").unwrap();
    cmd.current_dir(dir.path()).env("SPECSYNC_ROOT", dir.path());
    for key in ENV_KEYS {
        cmd.env_remove(key);
    }
    cmd
}

fn write(dir: &TempDir, rel: &str, content: &str) {
    let path = dir.path().join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

fn spec_json(dir: &TempDir) -> serde_json::Value {
    let data = std::fs::read_to_string(dir.path().join(".kiro/specs/demo/spec.json")).unwrap();
    serde_json::from_str(&data).unwrap()
}

// ---------------------------------------------------------------------------
// specsync validate
// ---------------------------------------------------------------------------

#[test]
fn validate_without_state_fails_with_single_error() {
    let dir = TempDir::new().unwrap();
    write(&dir, ".kiro/specs/demo/requirements.md", "# Requirements\n");

    specsync(&dir)
        .args(["--json", "validate", "demo", "requirements"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("\"valid\": false"))
        .stdout(predicate::str::contains("spec.json"));
}

#[test]
fn validate_requirements_passes_with_recorded_page() {
    let dir = TempDir::new().unwrap();
    write(&dir, ".kiro/specs/demo/requirements.md", "# Requirements\n");
    write(
        &dir,
        ".kiro/specs/demo/spec.json",
        r#"{"confluence":{"spaceKey":"PRD","requirementsPageId":"123"}}"#,
    );

    specsync(&dir)
        .args(["validate", "demo", "requirements"])
        .assert()
        .success()
        .stdout(predicate::str::contains("valid"))
        .stdout(predicate::str::contains("milestones.requirements.completed is false"));
}

#[test]
fn validate_design_reports_missing_prerequisite() {
    let dir = TempDir::new().unwrap();
    write(&dir, ".kiro/specs/demo/design.md", "# Design\n");
    write(
        &dir,
        ".kiro/specs/demo/spec.json",
        r#"{"confluence":{"spaceKey":"PRD","designPageId":7}}"#,
    );

    specsync(&dir)
        .args(["validate", "demo", "design"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("requirements phase is not complete"));
}

#[test]
fn validate_rejects_bad_feature_name() {
    let dir = TempDir::new().unwrap();
    specsync(&dir)
        .args(["validate", "../etc", "requirements"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid feature name"));
}

#[test]
fn validate_rejects_unknown_phase() {
    let dir = TempDir::new().unwrap();
    specsync(&dir)
        .args(["validate", "demo", "deploy"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid phase"));
}

// ---------------------------------------------------------------------------
// specsync preflight
// ---------------------------------------------------------------------------

#[test]
fn preflight_without_env_file_fails() {
    let dir = TempDir::new().unwrap();
    specsync(&dir)
        .arg("preflight")
        .assert()
        .failure()
        .stdout(predicate::str::contains(".env not found"));
}

#[test]
fn preflight_reports_missing_credentials() {
    let dir = TempDir::new().unwrap();
    write(&dir, ".env", "ATLASSIAN_URL=https://acme.atlassian.net\n");

    specsync(&dir)
        .args(["--json", "preflight", "jira"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("ATLASSIAN_EMAIL"))
        .stdout(predicate::str::contains("ATLASSIAN_API_TOKEN"));
}

// ---------------------------------------------------------------------------
// specsync phase
// ---------------------------------------------------------------------------

#[test]
fn phase_run_without_document_fails() {
    let dir = TempDir::new().unwrap();
    specsync(&dir)
        .args(["phase", "run", "demo", "requirements"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("document not found"));
}

#[test]
fn phase_run_tasks_stops_at_preflight() {
    let dir = TempDir::new().unwrap();
    write(&dir, ".kiro/specs/demo/tasks.md", "### Story 1: A\n");
    specsync(&dir)
        .args(["phase", "run", "demo", "tasks"])
        .assert()
        .failure()
        .stdout(predicate::str::contains(".env not found"));
}

#[test]
fn phase_approve_marks_milestone_complete() {
    let dir = TempDir::new().unwrap();
    write(&dir, ".kiro/specs/demo/requirements.md", "# Requirements\n");
    write(
        &dir,
        ".kiro/specs/demo/spec.json",
        r#"{"feature_name":"demo","confluence":{"spaceKey":"PRD","requirementsPageId":"1"}}"#,
    );

    specsync(&dir)
        .args(["phase", "approve", "demo", "requirements"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Approved requirements"));

    let state = spec_json(&dir);
    assert_eq!(state["milestones"]["requirements"]["completed"], true);
    assert_eq!(state["feature_name"], "demo");

    specsync(&dir)
        .args(["phase", "status", "demo"])
        .assert()
        .success()
        .stdout(predicate::str::contains("requirements  yes"));
}

#[test]
fn phase_approve_refuses_invalid_phase_state() {
    let dir = TempDir::new().unwrap();
    write(&dir, ".kiro/specs/demo/design.md", "# Design\n");
    write(&dir, ".kiro/specs/demo/spec.json", "{}");

    specsync(&dir)
        .args(["phase", "approve", "demo", "design"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot approve design"));

    assert!(spec_json(&dir).get("milestones").is_none());
}

// ---------------------------------------------------------------------------
// specsync docs / tracker
// ---------------------------------------------------------------------------

#[test]
fn docs_sync_requires_credentials() {
    let dir = TempDir::new().unwrap();
    write(&dir, ".kiro/project.json", PROJECT_JSON);
    write(&dir, ".kiro/specs/demo/requirements.md", "# Requirements\n");

    specsync(&dir)
        .args(["docs", "sync", "demo"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing credentials"));
}

#[test]
fn docs_render_prints_storage_markup() {
    let dir = TempDir::new().unwrap();
    write(&dir, "page.md", "# Title\n\n```rust\nfn main() {}\n```\n");

    specsync(&dir)
        .args(["docs", "render", "page.md"])
        .assert()
        .success()
        .stdout(predicate::str::contains("<h1>Title</h1>"))
        .stdout(predicate::str::contains(r#"ac:name="code""#));
}

#[test]
fn tracker_sync_requires_credentials() {
    let dir = TempDir::new().unwrap();
    specsync(&dir)
        .args(["tracker", "sync", "demo"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("ATLASSIAN_URL"));
}

// ---------------------------------------------------------------------------
// specsync workflow
// ---------------------------------------------------------------------------

#[test]
fn workflow_manual_stages_complete_without_credentials() {
    let dir = TempDir::new().unwrap();
    write(&dir, ".kiro/project.json", PROJECT_JSON);

    specsync(&dir)
        .args(["workflow", "run", "--feature", "demo", "--stages", "implement,test"])
        .assert()
        .success()
        .stdout(predicate::str::contains("implement"))
        .stdout(predicate::str::contains("Workflow completed"));
}

#[test]
fn workflow_without_project_fails() {
    let dir = TempDir::new().unwrap();
    specsync(&dir)
        .args(["workflow", "run", "--feature", "demo", "--stages", "test"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("project metadata not found"));
}

#[test]
fn workflow_remote_stage_without_credentials_fails() {
    let dir = TempDir::new().unwrap();
    write(&dir, ".kiro/project.json", PROJECT_JSON);
    write(&dir, ".kiro/specs/demo/requirements.md", "# R\n");

    specsync(&dir)
        .args(["workflow", "run", "--feature", "demo", "--stages", "requirements"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing credentials"));
}

#[test]
fn workflow_config_file_is_loaded() {
    let dir = TempDir::new().unwrap();
    write(&dir, ".kiro/project.json", PROJECT_JSON);
    write(
        &dir,
        "workflow.yaml",
        "feature: demo\nstages: [implement, release]\napprovalGates:\n  release: [Manager]\n",
    );

    specsync(&dir)
        .args(["workflow", "run", "--config", "workflow.yaml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("release: Manager"));
}

#[test]
fn workflow_template_prints_standard_stages() {
    let dir = TempDir::new().unwrap();
    specsync(&dir)
        .args(["workflow", "template", "demo"])
        .assert()
        .success()
        .stdout(predicate::str::contains("feature: demo"))
        .stdout(predicate::str::contains("- release"));
}

// ---------------------------------------------------------------------------
// specsync estimate / project
// ---------------------------------------------------------------------------

#[test]
fn estimate_prints_and_writes_summary() {
    let dir = TempDir::new().unwrap();
    write(
        &dir,
        ".kiro/specs/demo/design.md",
        "| Task | Days | Assignee |\n|---|---|---|\n| API | 2 | alice |\n| UI | 1 | bob |\n",
    );

    specsync(&dir)
        .args(["estimate", "demo"])
        .assert()
        .success()
        .stdout(predicate::str::contains("| API | 2 | alice |"))
        .stdout(predicate::str::contains("**Standard**: 11 days"));

    specsync(&dir)
        .args(["estimate", "demo", "--write"])
        .assert()
        .success();
    assert!(dir.path().join(".kiro/specs/demo/estimate.md").exists());
}

#[test]
fn estimate_without_design_fails() {
    let dir = TempDir::new().unwrap();
    specsync(&dir)
        .args(["estimate", "demo"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("design document not found"));
}

#[test]
fn project_show_and_features() {
    let dir = TempDir::new().unwrap();
    write(&dir, ".kiro/project.json", PROJECT_JSON);
    write(
        &dir,
        ".kiro/specs/demo/spec.json",
        r#"{"milestones":{"requirements":{"completed":true}}}"#,
    );

    specsync(&dir)
        .args(["project", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Project: Michi (michi)"))
        .stdout(predicate::str::contains("JIRA:    MP"));

    specsync(&dir)
        .args(["--json", "project", "features"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"feature\": \"demo\""))
        .stdout(predicate::str::contains("\"requirements\""));
}

#[test]
fn project_show_without_metadata_fails() {
    let dir = TempDir::new().unwrap();
    specsync(&dir)
        .args(["project", "show"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("project metadata not found"));
}
