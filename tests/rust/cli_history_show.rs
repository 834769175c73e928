use assert_cmd::Command;
use duet::engine::history::NoteLog;
use duet::engine::notes::Note;
use predicates::prelude::*;

#[test]
fn cli_summarises_saved_history() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("music_history.json");
    NoteLog::from(vec![
        Note::press(60, 100, 0),
        Note::release(60, 64),
        Note::press(72, 90, 128),
    ])
    .save(&path)
    .expect("save history");

    let mut cmd = Command::cargo_bin("duet").expect("binary not found");
    cmd.current_dir(dir.path())
        .args(["history", "show", "--path"])
        .arg(&path);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("3 notes"))
        .stdout(predicate::str::contains("presses: 2"))
        .stdout(predicate::str::contains("C4..C5"));
}

#[test]
fn cli_reports_missing_history() {
    let dir = tempfile::tempdir().expect("tempdir");

    let mut cmd = Command::cargo_bin("duet").expect("binary not found");
    cmd.current_dir(dir.path())
        .args(["history", "show", "--path", "nope.json"]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("failed to read history"));
}
