// tests/eval_cli_tests.rs
//
// Integration tests for the copilot_eval binary: exit codes, report
// placement, and gate behaviour as seen by a CI job.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use serde_json::Value;
use tempfile::tempdir;

fn copilot_eval_bin() -> &'static str {
    env!("CARGO_BIN_EXE_copilot_eval")
}

fn shipped_config_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("eval/copilot_scenarios.yaml")
}

fn combined_output(output: &Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{}{}", stdout, stderr)
}

fn read_json(path: &Path) -> Value {
    let contents = fs::read_to_string(path).unwrap();
    serde_json::from_str(&contents).unwrap()
}

/// Config with one scenario whose response is too short to pass.
fn failing_config(fail_on_threshold_breach: bool, report_file: &Path) -> String {
    format!(
        r#"
version: "ci-test"
scenarios:
  - id: greeting_1
    category: status
    languages: [en]
    input: "Hello?"
    mock_response: "Hi"
evaluation:
  mock_mode: true
  scoring:
    overall_pass_rate: 0.8
  output:
    file: "{}"
  ci_gate:
    enabled: true
    fail_on_threshold_breach: {}
"#,
        report_file.display(),
        fail_on_threshold_breach
    )
}

#[test]
fn test_shipped_config_run_succeeds_and_writes_reports() {
    let temp = tempdir().unwrap();
    let report_path = temp.path().join("out").join("report.json");

    let output = Command::new(copilot_eval_bin())
        .arg(shipped_config_path())
        .args(["--seed", "11", "--no-latency", "--output"])
        .arg(&report_path)
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(0), "{}", combined_output(&output));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("GOLD COPILOT EVALUATION"));
    assert!(stdout.contains("CI GATE PASSED"));

    let report = read_json(&report_path);
    assert_eq!(report["config_version"], "1.0");
    assert_eq!(report["scoring_mode"], "lenient");
    assert_eq!(report["summary"]["total_scenarios"], 17);
    assert_eq!(report["summary"]["ci_gate"]["status"], "passed");
    assert_eq!(report["detailed_results"].as_array().unwrap().len(), 17);
    assert_eq!(report["results_checksum"].as_str().unwrap().len(), 64);
    assert!(report.get("debug_info").is_none());

    // report_format: markdown in the shipped config
    let markdown = fs::read_to_string(temp.path().join("out").join("report.md")).unwrap();
    assert!(markdown.contains("# Gold Copilot Evaluation Report"));
}

#[test]
fn test_debug_flag_adds_debug_info() {
    let temp = tempdir().unwrap();
    let report_path = temp.path().join("report.json");

    let output = Command::new(copilot_eval_bin())
        .arg(shipped_config_path())
        .args(["--debug", "--seed", "3", "--no-latency", "--output"])
        .arg(&report_path)
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(0), "{}", combined_output(&output));
    let report = read_json(&report_path);
    let debug_info = &report["debug_info"];
    assert_eq!(debug_info["config"]["version"], "1.0");
    assert_eq!(debug_info["execution_traces"].as_array().unwrap().len(), 17);
}

#[test]
fn test_gate_breach_exits_one_after_writing_report() {
    let temp = tempdir().unwrap();
    let report_path = temp.path().join("report.json");
    let config_path = temp.path().join("config.yaml");
    fs::write(&config_path, failing_config(true, &report_path)).unwrap();

    let output = Command::new(copilot_eval_bin())
        .arg(&config_path)
        .arg("--no-latency")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1), "{}", combined_output(&output));
    assert!(combined_output(&output).contains("Overall pass rate 0.0% < 80%"));

    let report = read_json(&report_path);
    assert_eq!(report["summary"]["ci_gate"]["status"], "failed");
    assert_eq!(
        report["summary"]["ci_gate"]["failures"][0],
        "Overall pass rate 0.0% < 80%"
    );
    assert_eq!(
        report["detailed_results"][0]["details"]["errors"][0],
        "response too short"
    );
}

#[test]
fn test_gate_breach_tolerated_without_fail_flag() {
    let temp = tempdir().unwrap();
    let report_path = temp.path().join("report.json");
    let config_path = temp.path().join("config.yaml");
    fs::write(&config_path, failing_config(false, &report_path)).unwrap();

    let output = Command::new(copilot_eval_bin())
        .arg(&config_path)
        .arg("--no-latency")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(0), "{}", combined_output(&output));
    let report = read_json(&report_path);
    assert_eq!(report["summary"]["ci_gate"]["status"], "failed");
}

#[test]
fn test_missing_config_exits_one() {
    let temp = tempdir().unwrap();
    let output = Command::new(copilot_eval_bin())
        .arg(temp.path().join("does_not_exist.yaml"))
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(combined_output(&output).contains("failed to read evaluation config"));
}

#[test]
fn test_invalid_config_exits_one() {
    let temp = tempdir().unwrap();
    let config_path = temp.path().join("config.yaml");
    fs::write(&config_path, "version: \"1.0\"\nscenarios: []\n").unwrap();

    let output = Command::new(copilot_eval_bin())
        .arg(&config_path)
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(combined_output(&output).contains("scenarios list cannot be empty"));
}

#[test]
fn test_unknown_flag_exits_two() {
    let output = Command::new(copilot_eval_bin())
        .arg("--definitely-not-a-flag")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(2));
}
