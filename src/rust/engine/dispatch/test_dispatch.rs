use super::*;
use crate::engine::instrument::VirtualInstrument;
use crate::engine::notes::Note;
use crate::tools::logger::LogLevel;
use std::time::Duration;

struct Fixture {
    store: Arc<SessionStore>,
    instrument: Arc<VirtualInstrument>,
    logger: Arc<Logger>,
    dispatcher: Dispatcher,
}

fn fixture(settings: DispatchSettings) -> Fixture {
    let store = Arc::new(SessionStore::new());
    let instrument = Arc::new(VirtualInstrument::new());
    let logger = Arc::new(Logger::capturing());
    let (dispatcher, _worker) = Dispatcher::spawn(
        Arc::clone(&store),
        Arc::clone(&instrument) as Arc<dyn Instrument>,
        120,
        settings,
        Arc::clone(&logger),
    );
    Fixture {
        store,
        instrument,
        logger,
        dispatcher,
    }
}

async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn test_dispatch_plays_scheduled_beats_only() {
    let f = fixture(DispatchSettings::default());
    f.store
        .schedule_notes(vec![Note::press(80, 100, 2), Note::press(84, 100, 2)]);

    for beat in 1..=3 {
        assert_eq!(f.dispatcher.issue(beat), Issue::Queued);
    }
    settle().await;

    let played = f.instrument.played();
    assert_eq!(played.len(), 1);
    assert_eq!(played[0].len(), 2);
    assert_eq!(f.store.counters().last_activity, 2);
}

#[tokio::test]
async fn test_playback_failure_is_logged_and_contained() {
    let f = fixture(DispatchSettings::default());
    f.store
        .schedule_notes(vec![Note::press(80, 100, 1), Note::press(81, 100, 2)]);

    f.instrument.fail_playback(true);
    f.dispatcher.issue(1);
    settle().await;
    f.instrument.fail_playback(false);
    f.dispatcher.issue(2);
    settle().await;

    assert!(f.logger.has_logged(LogLevel::Error, "beat 1: playback failed"));
    assert_eq!(f.instrument.played().len(), 1);
    assert_eq!(f.store.counters().last_activity, 2);
}

#[tokio::test(start_paused = true)]
async fn test_full_queue_skips_instead_of_waiting() {
    let f = fixture(DispatchSettings {
        queue_capacity: 1,
        max_in_flight: 1,
    });
    f.instrument.set_play_delay(Duration::from_secs(10));
    f.store.schedule_notes((1..=4).map(|beat| Note::press(80, 100, beat)));

    assert_eq!(f.dispatcher.issue(1), Issue::Queued);
    settle().await;
    // Beat 1 is playing; the worker now holds beat 2 waiting for a permit.
    assert_eq!(f.dispatcher.issue(2), Issue::Queued);
    settle().await;
    assert_eq!(f.dispatcher.issue(3), Issue::Queued);
    assert_eq!(f.dispatcher.issue(4), Issue::Overrun);
    assert!(f.logger.has_logged(LogLevel::Warning, "skipping beat 4"));
}

#[tokio::test]
async fn test_closed_instrument_is_quiet() {
    let f = fixture(DispatchSettings::default());
    f.store.schedule_notes(vec![Note::press(80, 100, 1)]);
    f.instrument.close().expect("close");

    f.dispatcher.issue(1);
    settle().await;

    assert!(f.logger.has_logged(LogLevel::Debug, "instrument closed"));
    assert!(!f.logger.has_logged(LogLevel::Error, "beat 1"));
}

#[tokio::test]
async fn test_dropping_dispatcher_stops_worker() {
    let store = Arc::new(SessionStore::new());
    let instrument: Arc<dyn Instrument> = Arc::new(VirtualInstrument::new());
    let (dispatcher, worker) = Dispatcher::spawn(
        store,
        instrument,
        120,
        DispatchSettings::default(),
        Arc::new(Logger::capturing()),
    );
    drop(dispatcher);
    tokio::time::timeout(Duration::from_secs(1), worker)
        .await
        .expect("worker exits")
        .expect("worker ok");
}
