//! End-to-end tests for the java-reviewer binary: exit codes and output formats.

use std::path::PathBuf;
use std::process::{Command, Output};

use tempfile::TempDir;

fn testdata_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("testdata")
}

/// Run the binary from an empty directory so no config file is discovered.
fn run(args: &[&str]) -> Output {
    let cwd = TempDir::new().unwrap();
    Command::new(env!("CARGO_BIN_EXE_java-reviewer"))
        .args(args)
        .current_dir(cwd.path())
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .output()
        .expect("binary should run")
}

fn json(output: &Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).expect("stdout should be JSON")
}

#[test]
fn test_scan_directory_reports_skipped_file() {
    let testdata = testdata_path();
    let output = run(&["scan", testdata.to_str().unwrap(), "--format", "json"]);
    assert_eq!(output.status.code(), Some(1));

    let report = json(&output);
    assert_eq!(report["files_scanned"], 1);
    assert_eq!(report["files"][0]["path"], "OrderService.java");
    assert_eq!(report["skipped"][0]["path"], "Broken.java");
    assert_eq!(report["counts"]["return_statement"], 4);
}

#[test]
fn test_scan_single_file_with_detector_filter() {
    let file = testdata_path().join("OrderService.java");
    let output = run(&[
        "scan",
        file.to_str().unwrap(),
        "--format",
        "json",
        "--detector",
        "boolean_method",
        "--detector",
        "raw_text_match",
        "--needle",
        "return",
    ]);
    assert_eq!(output.status.code(), Some(0));

    let report = json(&output);
    assert_eq!(report["files"][0]["path"], "OrderService.java");
    let findings = &report["files"][0]["findings"];
    assert_eq!(findings["boolean_method"][0]["name"], "isOpen");
    assert_eq!(findings["boolean_method"][0]["span"]["start"], 12);
    assert_eq!(findings["raw_text_match"].as_array().unwrap().len(), 4);
    assert!(findings.get("method_call").is_none());
}

#[test]
fn test_scan_with_config_file() {
    let testdata = testdata_path();
    let config = testdata.join("review-config.yaml");
    let output = run(&[
        "scan",
        testdata.to_str().unwrap(),
        "--config",
        config.to_str().unwrap(),
        "--format",
        "json",
    ]);
    assert_eq!(output.status.code(), Some(0));

    let report = json(&output);
    assert_eq!(report["total_findings"], 12);
    assert_eq!(report["skipped"].as_array().unwrap().len(), 0);
}

#[test]
fn test_lenient_scan_has_no_skips() {
    let testdata = testdata_path();
    let output = run(&["scan", testdata.to_str().unwrap(), "--format", "json", "--lenient"]);
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(json(&output)["files"][0]["has_syntax_errors"], true);
}

#[test]
fn test_pretty_output() {
    let file = testdata_path().join("OrderService.java");
    let output = run(&["scan", file.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(0));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("java-reviewer"));
    assert!(stdout.contains("BOOL METHOD"));
    assert!(stdout.contains("isOpen, in OrderService, lines 12-14"));
    assert!(stdout.contains("1 file scanned"));
}

#[test]
fn test_errors_exit_with_code_two() {
    let output = run(&["scan", "/definitely/not/here"]);
    assert_eq!(output.status.code(), Some(2));

    let empty_needle = run(&[
        "scan",
        testdata_path().to_str().unwrap(),
        "--needle",
        "",
    ]);
    assert_eq!(empty_needle.status.code(), Some(2));
}
