//! CLI integration tests
//!
//! Drive the `casewatch` binary against local case pages in offline mode.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../casewatch-engine/tests/fixtures")
        .join(name)
}

struct Workspace {
    dir: TempDir,
    page: PathBuf,
}

impl Workspace {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let page = dir.path().join("case.html");
        fs::copy(fixture("case_page.html"), &page).unwrap();
        fs::write(
            dir.path().join("records.txt"),
            format!("# tracked cases\n{}\n", page.display()),
        )
        .unwrap();
        Self { dir, page }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn update_page(&self) {
        fs::copy(fixture("case_page_updated.html"), &self.page).unwrap();
    }

    fn casewatch(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_casewatch"))
            .current_dir(self.dir.path())
            .env("CASEWATCH__LOG_PROFILE", "production")
            .args(args)
            .output()
            .expect("Failed to execute CLI")
    }

    fn run_offline(&self, extra: &[&str]) -> Output {
        let mut args = vec![
            "run",
            "--offline",
            "--records",
            "records.txt",
            "--state",
            "state.json",
            "--events",
            "changes.json",
        ];
        args.extend_from_slice(extra);
        self.casewatch(&args)
    }
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn page_arg(page: &Path) -> String {
    page.to_string_lossy().into_owned()
}

#[test]
fn test_first_run_reports_new_record() {
    let ws = Workspace::new();

    let output = ws.run_offline(&[]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let out = stdout(&output);
    assert!(out.contains("## Change Summary"));
    assert!(out.contains("| `new_record` | 1 |"));
    assert!(out.contains("first observation with 3 sections"));
    assert!(stderr(&output).contains("processed 1 records: 1 changed, 0 errors"));
    assert!(ws.path("state.json").exists());
    assert!(ws.path("changes.json").exists());
}

#[test]
fn test_second_run_reports_judge_change() {
    let ws = Workspace::new();
    assert!(ws.run_offline(&[]).status.success());
    ws.update_page();

    let output = ws.run_offline(&[]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let out = stdout(&output);
    assert!(out.contains("| `field_changed` | 1 |"));
    assert!(out.contains("Сидоров Борис Петрович"));
    assert!(out.contains("+ Решение по делу вынесено 15.04.2024 14:30"));
    assert!(!out.contains("new_record"));
}

#[test]
fn test_unchanged_run_reports_nothing() {
    let ws = Workspace::new();
    assert!(ws.run_offline(&[]).status.success());

    let output = ws.run_offline(&[]);

    assert!(output.status.success());
    assert!(stdout(&output).contains("_No changes detected._"));
    assert!(stderr(&output).contains("0 changed, 0 errors"));
}

#[test]
fn test_json_flag_prints_event_log() {
    let ws = Workspace::new();

    let output = ws.run_offline(&["--json"]);

    assert!(output.status.success());
    let log: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(log["log_schema_version"], 1);
    assert_eq!(log["events"].as_array().unwrap().len(), 1);
}

#[test]
fn test_report_rebuilds_from_event_log() {
    let ws = Workspace::new();
    assert!(ws.run_offline(&[]).status.success());
    ws.update_page();
    let run = ws.run_offline(&[]);

    let output = ws.casewatch(&["report", "--events", "changes.json"]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let out = stdout(&output);
    assert!(out.contains("| `field_changed` | 1 |"));
    assert!(out.starts_with("_Run "));
    assert!(out.ends_with(&stdout(&run)));
}

#[test]
fn test_show_and_forget() {
    let ws = Workspace::new();
    assert!(ws.run_offline(&[]).status.success());
    let id = page_arg(&ws.page);

    let shown = ws.casewatch(&["show", &id, "--state", "state.json"]);
    assert!(shown.status.success(), "stderr: {}", stderr(&shown));
    let summary: serde_json::Value = serde_json::from_slice(&shown.stdout).unwrap();
    assert_eq!(summary["record_id"], id.as_str());

    let forgot = ws.casewatch(&["forget", &id, "--state", "state.json"]);
    assert!(forgot.status.success());
    assert!(stdout(&forgot).contains("Forgot"));

    let missing = ws.casewatch(&["show", &id, "--state", "state.json"]);
    assert_eq!(missing.status.code(), Some(1));
    assert!(stderr(&missing).contains("is not tracked"));
}

#[test]
fn test_state_write_failure_exits_nonzero() {
    let ws = Workspace::new();
    fs::create_dir(ws.path("state.json")).unwrap();

    let output = ws.run_offline(&[]);

    assert_eq!(output.status.code(), Some(1));
    // The report is still printed.
    assert!(stdout(&output).contains("| `new_record` | 1 |"));
    assert!(stderr(&output).contains("state was not saved"));
}

#[test]
fn test_missing_record_list_fails() {
    let ws = Workspace::new();

    let output = ws.casewatch(&["run", "--offline", "--records", "absent.txt"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Error:"));
}

#[test]
fn test_zero_concurrency_rejected() {
    let ws = Workspace::new();

    let output = ws.run_offline(&["--concurrency", "0"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("concurrency"));
}
