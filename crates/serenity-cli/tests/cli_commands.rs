//! CLI E2E tests.
//!
//! Each test runs the built binary against its own temporary HOME, so the
//! config file and session log start empty.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

use serde_json::Value;
use tempfile::TempDir;

/// Run a CLI command and return (exit code, stdout, stderr).
fn run_cli(home: &Path, args: &[&str]) -> (i32, String, String) {
    let output = Command::new(env!("CARGO_BIN_EXE_serenity-cli"))
        .args(args)
        .env("HOME", home)
        .env_remove("SERENITY_ENV")
        .env_remove("SERENITY_LOG")
        .stdin(Stdio::null())
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (code, stdout, stderr)
}

/// Run a CLI command with `input` piped to stdin.
fn run_cli_with_input(home: &Path, args: &[&str], input: &str) -> (i32, String, String) {
    let mut child = Command::new(env!("CARGO_BIN_EXE_serenity-cli"))
        .args(args)
        .env("HOME", home)
        .env_remove("SERENITY_ENV")
        .env_remove("SERENITY_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn CLI command");

    child
        .stdin
        .take()
        .unwrap()
        .write_all(input.as_bytes())
        .unwrap();
    let output = child.wait_with_output().expect("Failed to wait for CLI");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (code, stdout, stderr)
}

fn json(stdout: &str) -> Value {
    serde_json::from_str(stdout).unwrap_or_else(|e| panic!("not JSON ({e}): {stdout}"))
}

fn assert_nothing_recorded(home: &Path) {
    let (_, stdout, _) = run_cli(home, &["history", "list"]);
    assert_eq!(json(&stdout), Value::Array(vec![]));
}

#[test]
fn test_timer_presets_lists_defaults() {
    let home = TempDir::new().unwrap();
    let (code, stdout, _) = run_cli(home.path(), &["timer", "presets"]);
    assert_eq!(code, 0);

    let presets = json(&stdout);
    let minutes: Vec<u64> = presets
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["minutes"].as_u64().unwrap())
        .collect();
    assert_eq!(minutes, vec![5, 10, 15, 20, 30]);
    assert_eq!(presets[0]["index"], 0);
}

#[test]
fn test_config_set_then_get() {
    let home = TempDir::new().unwrap();
    let (code, _, _) = run_cli(home.path(), &["config", "set", "timer.default_minutes", "25"]);
    assert_eq!(code, 0);

    let (code, stdout, _) = run_cli(home.path(), &["config", "get", "timer.default_minutes"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "25");
}

#[test]
fn test_config_rejects_unknown_key_and_bad_value() {
    let home = TempDir::new().unwrap();
    let (code, _, stderr) = run_cli(home.path(), &["config", "set", "timer.nope", "1"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error:"), "stderr: {stderr}");

    let (code, _, _) = run_cli(home.path(), &["config", "set", "timer.default_minutes", "0"]);
    assert_eq!(code, 1);

    let (code, _, _) = run_cli(home.path(), &["config", "get", "timer.nope"]);
    assert_eq!(code, 1);
}

#[test]
fn test_config_path_is_under_home() {
    let home = TempDir::new().unwrap();
    let (code, stdout, _) = run_cli(home.path(), &["config", "path"]);
    assert_eq!(code, 0);
    assert!(stdout.trim().starts_with(home.path().to_str().unwrap()));
    assert!(stdout.trim().ends_with("config.toml"));
}

#[test]
fn test_settings_toggle_persists() {
    let home = TempDir::new().unwrap();
    let (code, stdout, _) = run_cli(home.path(), &["settings", "toggle", "session_analytics"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "session_analytics: on");

    let (_, stdout, _) = run_cli(home.path(), &["settings", "preferences"]);
    let prefs = json(&stdout);
    let analytics = prefs
        .as_array()
        .unwrap()
        .iter()
        .find(|p| p["id"] == "session_analytics")
        .unwrap();
    assert_eq!(analytics["enabled"], true);

    let (code, _, _) = run_cli(home.path(), &["settings", "toggle", "dark_mode"]);
    assert_ne!(code, 0);
}

#[test]
fn test_sounds_select_play_and_volume() {
    let home = TempDir::new().unwrap();
    assert_eq!(run_cli(home.path(), &["sounds", "select", "gentle_rain"]).0, 0);
    assert_eq!(run_cli(home.path(), &["sounds", "play", "gentle_rain"]).0, 0);
    assert_eq!(run_cli(home.path(), &["sounds", "volume", "40"]).0, 0);

    let (_, stdout, _) = run_cli(home.path(), &["sounds", "list"]);
    let list = json(&stdout);
    assert_eq!(list["volume"], 40);
    let rain = list["sounds"]
        .as_array()
        .unwrap()
        .iter()
        .find(|s| s["id"] == "gentle_rain")
        .unwrap();
    assert_eq!(rain["selected"], true);
    assert_eq!(rain["playing"], true);

    // Deselecting stops the preview.
    run_cli(home.path(), &["sounds", "select", "gentle_rain"]);
    let (_, stdout, _) = run_cli(home.path(), &["sounds", "list"]);
    let list = json(&stdout);
    assert!(list["sounds"]
        .as_array()
        .unwrap()
        .iter()
        .all(|s| s["playing"] == false));

    let (code, _, _) = run_cli(home.path(), &["sounds", "volume", "150"]);
    assert_ne!(code, 0);
}

#[test]
fn test_timer_run_rejects_zero_seconds() {
    let home = TempDir::new().unwrap();
    let (code, _, stderr) = run_cli(home.path(), &["timer", "run", "--seconds", "0"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("Invalid argument"), "stderr: {stderr}");
}

#[test]
fn test_timer_run_rejects_unknown_preset() {
    let home = TempDir::new().unwrap();
    let (code, _, stderr) = run_cli(home.path(), &["timer", "run", "--preset", "9"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("no preset"), "stderr: {stderr}");
}

#[test]
fn test_history_empty_log() {
    let home = TempDir::new().unwrap();
    let (code, stdout, _) = run_cli(home.path(), &["history", "list"]);
    assert_eq!(code, 0);
    assert_eq!(json(&stdout), Value::Array(vec![]));

    let (code, stdout, _) = run_cli(home.path(), &["history", "stats"]);
    assert_eq!(code, 0);
    assert_eq!(json(&stdout)["total_sessions"], 0);
}

#[test]
fn test_short_session_is_recorded() {
    let home = TempDir::new().unwrap();
    let (code, _, _) = run_cli(home.path(), &["config", "set", "timer.save_remote", "false"]);
    assert_eq!(code, 0);

    let (code, stdout, stderr) = run_cli(home.path(), &["timer", "run", "--seconds", "2"]);
    assert_eq!(code, 0, "stderr: {stderr}");
    assert_eq!(json(&stdout)["duration_secs"], 2);
    assert!(stderr.contains("session complete"), "stderr: {stderr}");

    let (_, stdout, _) = run_cli(home.path(), &["history", "list"]);
    let history = json(&stdout);
    assert_eq!(history.as_array().unwrap().len(), 1);
    assert_eq!(history[0]["duration_secs"], 2);

    let (_, stdout, _) = run_cli(home.path(), &["history", "summary"]);
    let summary = json(&stdout);
    assert_eq!(summary[0]["total_duration_secs"], 2);
    assert_eq!(summary[0]["count"], 1);
}

#[test]
fn test_quit_cancels_running_session() {
    let home = TempDir::new().unwrap();
    let (code, stdout, stderr) =
        run_cli_with_input(home.path(), &["timer", "run", "--seconds", "30"], "q\n");
    assert_eq!(code, 0, "stderr: {stderr}");

    let snapshot = json(&stdout);
    assert_eq!(snapshot["phase"], "running");
    assert_eq!(snapshot["total_secs"], 30);
    assert!(stderr.contains("session cancelled"), "stderr: {stderr}");
    assert_nothing_recorded(home.path());
}

#[test]
fn test_pause_then_quit_reports_paused() {
    let home = TempDir::new().unwrap();
    let (code, stdout, stderr) =
        run_cli_with_input(home.path(), &["timer", "run", "--seconds", "30"], "p\nq\n");
    assert_eq!(code, 0, "stderr: {stderr}");
    assert_eq!(json(&stdout)["phase"], "paused");
    assert!(stderr.contains("session cancelled"), "stderr: {stderr}");
    assert_nothing_recorded(home.path());
}

#[test]
fn test_pause_resume_then_quit_reports_running() {
    let home = TempDir::new().unwrap();
    let (code, stdout, _) = run_cli_with_input(
        home.path(),
        &["timer", "run", "--seconds", "30"],
        "p\ns\nq\n",
    );
    assert_eq!(code, 0);
    assert_eq!(json(&stdout)["phase"], "running");
}

#[test]
fn test_reset_then_quit_reports_idle() {
    let home = TempDir::new().unwrap();
    let (code, stdout, stderr) =
        run_cli_with_input(home.path(), &["timer", "run", "--seconds", "30"], "r\nq\n");
    assert_eq!(code, 0, "stderr: {stderr}");

    let snapshot = json(&stdout);
    assert_eq!(snapshot["phase"], "idle");
    assert_eq!(snapshot["remaining_secs"], 30);
    // The reset cancels the session; quitting from idle adds nothing.
    assert_eq!(stderr.matches("session cancelled").count(), 1, "stderr: {stderr}");
    assert_nothing_recorded(home.path());
}

#[test]
fn test_unknown_control_is_reported_and_ignored() {
    let home = TempDir::new().unwrap();
    let (code, stdout, stderr) =
        run_cli_with_input(home.path(), &["timer", "run", "--seconds", "30"], "x\nq\n");
    assert_eq!(code, 0);
    assert!(stderr.contains("unknown command 'x'"), "stderr: {stderr}");
    assert_eq!(json(&stdout)["phase"], "running");
}
