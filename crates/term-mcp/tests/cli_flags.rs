//! Tests for the `term-mcp` binary's startup flags.
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use std::process::Command;

#[test]
fn help_lists_every_startup_flag() {
    let output = Command::new(env!("CARGO_BIN_EXE_term-mcp"))
        .arg("--help")
        .output()
        .expect("failed to run term-mcp --help");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for flag in [
        "--log-level",
        "--default-shell",
        "--default-cols",
        "--default-rows",
        "--history-max-bytes",
    ] {
        assert!(stdout.contains(flag), "--help should mention {flag}");
    }
}

#[test]
fn rejects_unknown_flags() {
    let output = Command::new(env!("CARGO_BIN_EXE_term-mcp"))
        .arg("--not-a-real-flag")
        .output()
        .expect("failed to run term-mcp");

    assert!(!output.status.success());
}

#[test]
fn version_flag_reports_a_version_string() {
    let output = Command::new(env!("CARGO_BIN_EXE_term-mcp"))
        .arg("--version")
        .output()
        .expect("failed to run term-mcp --version");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("term-mcp"));
}
