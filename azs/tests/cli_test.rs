//! CLI surface smoke tests
//!
//! Only flag handling is exercised here; launching the TUI needs a real
//! terminal.

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn version_flag_exits_zero() {
    Command::cargo_bin("azs")
        .unwrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("azs"));
}

#[test]
fn help_lists_demo_flag() {
    Command::cargo_bin("azs")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--demo"))
        .stdout(predicate::str::contains("--subscription"));
}

#[test]
fn unknown_flag_fails_with_usage() {
    Command::cargo_bin("azs")
        .unwrap()
        .arg("--definitely-not-a-flag")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}
