use super::*;
use crate::engine::instrument::VirtualInstrument;
use crate::tools::logger::LogLevel;
use std::time::Duration;

fn coordinator() -> (Arc<VirtualInstrument>, Arc<Logger>, ShutdownCoordinator) {
    let instrument = Arc::new(VirtualInstrument::new());
    let logger = Arc::new(Logger::capturing());
    let coordinator = ShutdownCoordinator::new(
        Arc::clone(&instrument) as Arc<dyn Instrument>,
        Arc::clone(&logger),
    );
    (instrument, logger, coordinator)
}

#[test]
fn test_shutdown_closes_instrument_exactly_once() {
    let (instrument, logger, coordinator) = coordinator();
    let signal = coordinator.signal();
    assert!(!signal.is_set());

    assert!(coordinator.shutdown());
    assert!(!coordinator.shutdown());
    assert!(!coordinator.shutdown());

    assert_eq!(instrument.close_calls(), 1);
    assert!(coordinator.is_shut_down());
    assert!(signal.is_set());
    assert!(!logger.has_logged(LogLevel::Error, "close"));
}

#[test]
fn test_close_failure_is_logged_not_fatal() {
    let (instrument, logger, coordinator) = coordinator();
    instrument.close().expect("pre-close");

    assert!(coordinator.shutdown());
    assert!(logger.has_logged(LogLevel::Error, "Failed to close instrument"));
    assert!(coordinator.signal().is_set());
}

#[tokio::test]
async fn test_watch_waits_for_interrupt() {
    let (instrument, logger, coordinator) = coordinator();
    let coordinator = Arc::new(coordinator);
    let mut signal = coordinator.signal();
    let (fire, interrupt) = tokio::sync::oneshot::channel::<()>();

    let watcher = {
        let coordinator = Arc::clone(&coordinator);
        tokio::spawn(async move {
            coordinator
                .watch(async move {
                    interrupt.await.ok();
                })
                .await;
        })
    };

    tokio::time::sleep(Duration::from_millis(5)).await;
    assert!(!signal.is_set());
    assert_eq!(instrument.close_calls(), 0);

    fire.send(()).expect("fire");
    tokio::time::timeout(Duration::from_secs(1), signal.wait())
        .await
        .expect("signal observed");
    watcher.await.expect("watcher");
    assert_eq!(instrument.close_calls(), 1);
    assert!(logger.has_logged(LogLevel::Watch, "Interrupt received"));
}
