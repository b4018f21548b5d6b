//! Basic CLI E2E tests.
//!
//! Tests invoke CLI commands via cargo run and verify outputs. Each test
//! gets its own data directory through POMOTRACK_DATA_DIR so runs do not
//! interfere with each other or with real user data.

use std::path::Path;
use std::process::Command;

/// Run a CLI command against the given data directory.
fn run_cli(data_dir: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new("cargo")
        .args(["run", "-q", "-p", "pomotrack-cli", "--"])
        .args(args)
        .env("POMOTRACK_DATA_DIR", data_dir)
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

#[test]
fn timer_start_creates_running_session() {
    let dir = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(dir.path(), &["timer", "start", "--tag", "learn"]);
    assert_eq!(code, 0, "timer start failed");

    let session: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(session["tag"], "learn");
    assert_eq!(session["status"], "running");

    // A 25-minute countdown cannot complete between the two invocations,
    // so status prints exactly one JSON document.
    let (stdout, _, code) = run_cli(dir.path(), &["timer", "status"]);
    assert_eq!(code, 0);
    let state: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(state["is_active"], true);
    assert_eq!(state["is_paused"], false);
}

#[test]
fn timer_pause_and_resume_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    run_cli(dir.path(), &["timer", "start"]);

    let (stdout, _, code) = run_cli(dir.path(), &["timer", "pause"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("TimerPaused"), "got: {stdout}");

    let (stdout, _, code) = run_cli(dir.path(), &["timer", "resume"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("TimerResumed"), "got: {stdout}");
}

#[test]
fn timer_reset_cancels_session() {
    let dir = tempfile::tempdir().unwrap();
    run_cli(dir.path(), &["timer", "start"]);
    let (stdout, _, code) = run_cli(dir.path(), &["timer", "reset"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("TimerReset"));

    let (stdout, _, _) = run_cli(dir.path(), &["session", "list", "--json"]);
    let sessions: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(sessions[0]["status"], "cancelled");
}

#[test]
fn stats_today_reports_rollup() {
    let dir = tempfile::tempdir().unwrap();
    run_cli(dir.path(), &["timer", "start"]);
    run_cli(dir.path(), &["timer", "complete"]);

    let (stdout, _, code) = run_cli(dir.path(), &["stats", "today"]);
    assert_eq!(code, 0);
    let stats: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(stats["completed_sessions"], 1);

    let (stdout, _, code) = run_cli(dir.path(), &["stats", "streak"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "1");
}

#[test]
fn config_duration_applies_to_idle_timer() {
    let dir = tempfile::tempdir().unwrap();
    // First run persists an engine built from the default 1500s duration.
    run_cli(dir.path(), &["timer", "start"]);
    run_cli(dir.path(), &["timer", "reset"]);

    std::fs::write(dir.path().join("config.toml"), "[timer]\nduration_secs = 300\n").unwrap();

    let (stdout, _, code) = run_cli(dir.path(), &["timer", "start"]);
    assert_eq!(code, 0);
    let session: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(session["duration"], 300);

    let (stdout, _, _) = run_cli(dir.path(), &["timer", "status"]);
    let state: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert!(state["time_remaining"].as_u64().unwrap() <= 300);
}

#[test]
fn config_duration_does_not_clobber_a_running_countdown() {
    let dir = tempfile::tempdir().unwrap();
    run_cli(dir.path(), &["timer", "start"]);

    std::fs::write(dir.path().join("config.toml"), "[timer]\nduration_secs = 60\n").unwrap();

    // The in-flight session keeps its original countdown.
    let (stdout, _, code) = run_cli(dir.path(), &["timer", "status"]);
    assert_eq!(code, 0);
    let state: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(state["is_active"], true);
    assert!(state["time_remaining"].as_u64().unwrap() > 60);
}

#[test]
fn data_export_is_a_valid_envelope() {
    let dir = tempfile::tempdir().unwrap();
    run_cli(dir.path(), &["timer", "start"]);

    let (stdout, _, code) = run_cli(dir.path(), &["data", "export"]);
    assert_eq!(code, 0);
    let envelope: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(envelope["version"], 1);
    assert!(envelope["sessions"].is_array());
}

#[test]
fn data_import_rejects_malformed_payload() {
    let dir = tempfile::tempdir().unwrap();
    let bad = dir.path().join("bad.json");
    std::fs::write(&bad, "{\"sessions\": 42}").unwrap();

    let (_, stderr, code) = run_cli(dir.path(), &["data", "import", bad.to_str().unwrap()]);
    assert_ne!(code, 0);
    assert!(stderr.contains("error"), "got: {stderr}");
}
