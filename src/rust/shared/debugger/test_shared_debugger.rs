use super::*;
use crate::tools::logger::LogLevel;
use std::thread;
use std::time::Duration;

#[test]
fn test_debug_timer() {
    let logger = Arc::new(Logger::capturing());
    let timer = DebugTimer::new("test", Arc::clone(&logger));
    thread::sleep(Duration::from_millis(10));
    assert!(timer.elapsed_ms() >= 10.0);
    drop(timer);
    assert!(logger.has_logged(LogLevel::Debug, "test took"));
}
