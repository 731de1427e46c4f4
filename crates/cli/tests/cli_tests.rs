//! CLI integration tests

use std::process::Command;

fn homeops() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_homeops"));
    cmd.env_remove("HOMEOPS_API_URL");
    cmd
}

/// Test that the CLI shows help
#[test]
fn test_cli_help() {
    let output = homeops()
        .arg("--help")
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI help should succeed");
    assert!(stdout.contains("Home Ops"), "Should show app name");
    for command in [
        "services",
        "history",
        "check",
        "containers",
        "ports",
        "health",
        "resources",
        "pihole",
        "notify",
    ] {
        assert!(stdout.contains(command), "Should show {} command", command);
    }
}

/// Test that the CLI shows version
#[test]
fn test_cli_version() {
    let output = homeops()
        .arg("--version")
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI version should succeed");
    assert!(stdout.contains("homeops"), "Should show binary name");
}

/// Test format and api-url options
#[test]
fn test_global_options() {
    let output = homeops()
        .arg("--help")
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(stdout.contains("--format"), "Should show format option");
    assert!(stdout.contains("table"), "Should show table format");
    assert!(stdout.contains("json"), "Should show json format");
    assert!(stdout.contains("--api-url"), "Should show api-url option");
    assert!(stdout.contains("HOMEOPS_API_URL"), "Should show env var");
}

/// Test notify command help
#[test]
fn test_notify_help() {
    let output = homeops()
        .args(["notify", "--help"])
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Notify help should succeed");
    assert!(stdout.contains("<WEBHOOK_URL>"), "Should show webhook argument");
    assert!(stdout.contains("--message"), "Should show message option");
}

/// Test invalid command error handling
#[test]
fn test_invalid_command() {
    let output = homeops()
        .arg("invalid-command")
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success(), "Invalid command should fail");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("error") || stderr.contains("invalid"),
        "Should show error message"
    );
}

/// Test missing required argument error handling
#[test]
fn test_missing_argument() {
    let output = homeops()
        .arg("history")
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success(), "Missing argument should fail");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("required") || stderr.contains("error"),
        "Should show error about missing argument"
    );
}

/// Test that an unreachable dashboard is reported as a failure
#[test]
fn test_unreachable_dashboard() {
    let output = homeops()
        .args(["--api-url", "http://127.0.0.1:1", "services"])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success(), "Unreachable dashboard should fail");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Failed to send request"),
        "Should report the connection failure"
    );
}
