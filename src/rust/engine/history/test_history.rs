use super::*;
use crate::tools::logger::LogLevel;
use tempfile::tempdir;

fn sample_log() -> NoteLog {
    NoteLog::from(vec![
        Note::press(80, 100, 3),
        Note::release(80, 40),
        Note::press(60, 20, 41),
        Note::press(90, 70, 2),
    ])
}

#[test]
fn test_save_then_load_keeps_order() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("music_history.json");
    let log = sample_log();

    log.save(&path).expect("save");
    let loaded = NoteLog::load(&path).expect("load");

    assert_eq!(loaded, log);
    assert_eq!(loaded.notes()[3], Note::press(90, 70, 2));
    assert!(!dir.path().join("music_history.json.tmp").exists());
}

#[test]
fn test_save_overwrites_whole_snapshot() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("h.json");
    sample_log().save(&path).expect("first save");

    let smaller = NoteLog::from(vec![Note::press(61, 1, 0)]);
    smaller.save(&path).expect("second save");

    assert_eq!(NoteLog::load(&path).expect("load"), smaller);
}

#[test]
fn test_missing_file_is_reported() {
    let dir = tempdir().expect("tempdir");
    let err = NoteLog::load(&dir.path().join("nope.json")).unwrap_err();
    assert!(matches!(err, HistoryError::Missing { .. }));
}

#[test]
fn test_corrupt_file_is_reported() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("bad.json");
    std::fs::write(&path, "{ not json").expect("write");
    assert!(matches!(
        NoteLog::load(&path).unwrap_err(),
        HistoryError::Corrupt { .. }
    ));
}

#[test]
fn test_unknown_version_is_rejected() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("v9.json");
    std::fs::write(&path, r#"{"version":9,"notes":[]}"#).expect("write");
    assert!(matches!(
        NoteLog::load(&path).unwrap_err(),
        HistoryError::Version { found: 9, .. }
    ));
}

#[test]
fn test_load_or_empty_degrades_with_warning() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("bad.json");
    std::fs::write(&path, "garbage").expect("write");
    let logger = Logger::capturing();

    let log = NoteLog::load_or_empty(&path, &logger);

    assert!(log.is_empty());
    assert!(logger.has_logged(LogLevel::Warning, "corrupt"));
}

#[test]
fn test_summary() {
    let summary = sample_log().summary().expect("summary");
    assert_eq!(summary.notes, 4);
    assert_eq!(summary.presses, 3);
    assert_eq!((summary.first_beat, summary.last_beat), (2, 41));
    assert_eq!((summary.lowest_pitch, summary.highest_pitch), (60, 90));
    assert!(NoteLog::new().summary().is_none());
}
