use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn cli_virtual_session_ends_with_stdin() {
    let dir = tempfile::tempdir().expect("tempdir");

    let mut cmd = Command::cargo_bin("duet").expect("binary not found");
    cmd.current_dir(dir.path())
        .args(["play", "--virtual", "--bpm", "90"])
        .write_stdin("");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("BPM: 90"))
        .stdout(predicate::str::contains("Done"));

    assert!(dir.path().join("duet.json").exists());
}

#[test]
fn cli_rejects_zero_bpm() {
    let dir = tempfile::tempdir().expect("tempdir");

    let mut cmd = Command::cargo_bin("duet").expect("binary not found");
    cmd.current_dir(dir.path())
        .args(["play", "--virtual", "--bpm", "0"])
        .write_stdin("");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("invalid configuration"));
}
