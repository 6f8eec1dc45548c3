//! End-to-end tests for `callgate check`.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::io::Write;
use std::process::{Command, Output};

use serde_json::Value;

fn callgate(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_callgate"))
        .args(args)
        .output()
        .expect("failed to run callgate")
}

fn decision(output: &Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("stdout is not JSON")
}

#[test]
fn test_allowed_caller() {
    let output = callgate(&["check", "--allow", "/app/libs/math", "/app/libs/math/index.rs:3:7"]);

    assert_eq!(output.status.code(), Some(0));
    let decision = decision(&output);
    assert_eq!(decision["allowed"], true);
    assert_eq!(decision["operation"], "calling function");
    assert_eq!(decision["caller"]["line"], 3);
    assert_eq!(decision["caller"]["column"], 7);
    assert!(decision["message"].is_null());
}

#[test]
fn test_denied_caller() {
    let output = callgate(&["check", "--allow", "/app/libs/math", "/app/libs/other/index.rs:3:7"]);

    assert_eq!(output.status.code(), Some(1));
    let decision = decision(&output);
    assert_eq!(decision["allowed"], false);
    assert_eq!(
        decision["message"],
        "Access denied for calling function from /app/libs/other/index.rs:3:7"
    );
    assert!(decision["reason"].is_string());
}

#[test]
fn test_relative_caller_with_dot_segments() {
    let workdir = tempfile::tempdir().unwrap();
    let output = Command::new(env!("CARGO_BIN_EXE_callgate"))
        .args(["check", "--allow", "libs/math", "./libs/math/index.rs:2:3"])
        .current_dir(workdir.path())
        .output()
        .expect("failed to run callgate");

    assert_eq!(output.status.code(), Some(0));
    let decision = decision(&output);
    let file = decision["caller"]["file"].as_str().unwrap();
    assert!(file.ends_with("/libs/math/index.rs"), "got: {file}");
    assert!(!file.contains("/./"), "got: {file}");
}

#[test]
fn test_keyed_operation() {
    let output = callgate(&[
        "check",
        "--allow",
        "/app/libs/math",
        "--operation",
        "get",
        "--key",
        "prop1",
        "/app/main.rs:10",
    ]);

    assert_eq!(output.status.code(), Some(1));
    assert_eq!(
        decision(&output)["message"],
        "Access denied for prop1 from /app/main.rs:10:1"
    );
}

#[test]
fn test_dependency_trust_from_config() {
    let mut config = tempfile::NamedTempFile::new().unwrap();
    write!(config, r#"{{"trust_dependencies": true}}"#).unwrap();
    let config_path = config.path().to_str().unwrap();
    let dependency = "/home/u/.cargo/registry/src/index/some-crate-1.0.0/src/lib.rs:1:1";

    let trusted = callgate(&["check", "--allow", "/app", "--config", config_path, dependency]);
    assert_eq!(trusted.status.code(), Some(0));

    let untrusted = callgate(&["check", "--allow", "/app", dependency]);
    assert_eq!(untrusted.status.code(), Some(1));
}

#[test]
fn test_invalid_config() {
    let mut config = tempfile::NamedTempFile::new().unwrap();
    write!(config, "not json").unwrap();

    let output = callgate(&[
        "check",
        "--allow",
        "/app",
        "--config",
        config.path().to_str().unwrap(),
        "/app/main.rs",
    ]);

    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("invalid config"));
}

#[test]
fn test_empty_pattern_rejected() {
    let output = callgate(&["check", "--allow", "", "/app/main.rs"]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_missing_pattern_is_usage_error() {
    let output = callgate(&["check", "/app/main.rs"]);
    assert_eq!(output.status.code(), Some(2));
}
