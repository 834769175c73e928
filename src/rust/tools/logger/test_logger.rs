use super::*;

#[test]
fn test_capturing_logger_records_levels() {
    let logger = Logger::capturing();
    logger.info("hello");
    logger.warn("careful");
    logger.debug("metronome");

    let lines = logger.captured();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], (LogLevel::Info, "hello".to_string()));
    assert!(logger.has_logged(LogLevel::Warning, "care"));
    assert!(logger.has_logged(LogLevel::Debug, "metronome"));
    assert!(!logger.has_logged(LogLevel::Error, "hello"));
}

#[test]
fn test_clones_share_capture() {
    let logger = Logger::capturing();
    let clone = logger.clone();
    clone.success("saved");
    assert!(logger.has_logged(LogLevel::Success, "saved"));
}

#[test]
fn test_printing_logger_has_nothing_captured() {
    let logger = Logger::with_debug(false);
    logger.debug("dropped");
    assert!(logger.captured().is_empty());
    assert!(!logger.debug_enabled());
}

#[test]
fn test_labels() {
    assert_eq!(LogLevel::Warning.as_label(), "WARN");
    assert_eq!(LogLevel::Action.as_label(), "ACTION");
}
