//! CLI integration tests
//!
//! These run the binary without network access: argument validation and
//! package-name validation both fail before any request is issued.

use assert_cmd::Command;
use predicates::prelude::*;

fn risk_audit() -> Command {
    Command::cargo_bin("risk-audit").unwrap()
}

#[test]
fn help_lists_subcommands() {
    risk_audit()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("scan"))
        .stdout(predicate::str::contains("report"))
        .stdout(predicate::str::contains("check"));
}

#[test]
fn version_flag_works() {
    risk_audit()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("risk-audit"));
}

#[test]
fn missing_subcommand_fails() {
    risk_audit().assert().failure();
}

#[test]
fn invalid_package_name_is_caller_error() {
    risk_audit()
        .args(["scan", ".hidden-package"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Invalid package name"));
}

#[test]
fn package_name_with_shell_chars_rejected() {
    risk_audit()
        .args(["scan", "lodash;rm -rf /"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Invalid package name"));
}

#[test]
fn malformed_scope_rejected() {
    risk_audit()
        .args(["check", "@babel"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("@scope/name"));
}

#[test]
fn nonexistent_config_file_fails() {
    risk_audit()
        .args(["-c", "/nonexistent/audit.toml", "scan", "lodash"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to load config"));
}

#[test]
fn malformed_config_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("audit.toml");
    std::fs::write(&path, "cache_ttl_secs = \"not a number\"").unwrap();

    risk_audit()
        .args(["-c", path.to_str().unwrap(), "scan", "lodash"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to load config"));
}

#[test]
fn unknown_report_format_rejected() {
    risk_audit()
        .args(["report", "lodash", "--format", "xml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown format"));
}
