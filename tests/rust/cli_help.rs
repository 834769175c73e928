use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn cli_prints_help() {
    let mut cmd = Command::cargo_bin("duet").expect("binary not found");
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("duet"))
        .stdout(predicate::str::contains("play"))
        .stdout(predicate::str::contains("history"));
}

#[test]
fn cli_play_help_lists_overrides() {
    let mut cmd = Command::cargo_bin("duet").expect("binary not found");
    cmd.args(["play", "--help"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("--bpm"))
        .stdout(predicate::str::contains("--virtual"));
}
