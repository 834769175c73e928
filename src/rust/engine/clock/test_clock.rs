use super::*;
use crate::engine::composer::{self, MarkovComposer};
use crate::engine::dispatch::DispatchSettings;
use crate::engine::improvise::ImprovisationSettings;
use crate::engine::instrument::{Instrument, VirtualInstrument};
use crate::engine::notes::Note;
use crate::engine::shutdown::ShutdownCoordinator;
use crate::tools::logger::LogLevel;

struct Fixture {
    store: Arc<SessionStore>,
    instrument: Arc<VirtualInstrument>,
    logger: Arc<Logger>,
    coordinator: ShutdownCoordinator,
    clock: TickClock,
}

fn fixture(bpm: u32) -> Fixture {
    let store = Arc::new(SessionStore::new());
    let instrument = Arc::new(VirtualInstrument::new());
    let logger = Arc::new(Logger::capturing());
    let (dispatcher, _worker) = Dispatcher::spawn(
        Arc::clone(&store),
        Arc::clone(&instrument) as Arc<dyn Instrument>,
        bpm,
        DispatchSettings::default(),
        Arc::clone(&logger),
    );
    let coordinator = ShutdownCoordinator::new(
        Arc::clone(&instrument) as Arc<dyn Instrument>,
        Arc::clone(&logger),
    );
    let clock = TickClock::new(bpm, Arc::clone(&store), dispatcher, Arc::clone(&logger));
    Fixture {
        store,
        instrument,
        logger,
        coordinator,
        clock,
    }
}

#[test]
fn test_tick_period_from_bpm() {
    assert_eq!(tick_period(120), Duration::from_nanos(7_812_500));
    assert!((tick_period(120).as_secs_f64() * 1000.0 - 7.8125).abs() < 1e-9);
    assert_eq!(tick_period(60), Duration::from_nanos(15_625_000));
    // Zero is rejected by config validation; the clock still refuses to divide by it.
    assert_eq!(tick_period(0), tick_period(1));
}

#[tokio::test]
async fn test_sixty_four_ticks_make_one_beat() {
    let f = fixture(120);
    for _ in 0..64 {
        f.clock.tick();
    }
    assert_eq!(f.store.beat(), 64);
    let diagnostics: Vec<_> = f
        .logger
        .captured()
        .into_iter()
        .filter(|(level, line)| *level == LogLevel::Debug && line.starts_with("metronome"))
        .collect();
    assert_eq!(diagnostics.len(), 1);
    assert!(diagnostics[0].1.contains("beat=64"));
}

#[tokio::test(start_paused = true)]
async fn test_run_ticks_on_schedule_until_shutdown() {
    let f = fixture(120);
    let period = f.clock.period();
    f.store.schedule_notes(vec![Note::press(80, 100, 3)]);
    let signal = f.coordinator.signal();
    let clock = f.clock;
    let run = tokio::spawn(async move { clock.run(signal).await });

    tokio::time::sleep(period * 64 + period / 2).await;
    assert!(f.coordinator.shutdown());
    let ticks = run.await.expect("clock task");

    assert_eq!(ticks, 64);
    assert_eq!(f.store.beat(), 64);
    assert_eq!(f.instrument.played().len(), 1);
    assert_eq!(f.instrument.close_calls(), 1);
    assert!(f.logger.has_logged(LogLevel::Info, "tick size: 7.8 ms"));
}

#[tokio::test(start_paused = true)]
async fn test_slow_playback_does_not_hold_up_the_clock() {
    let f = fixture(120);
    let period = f.clock.period();
    f.instrument.set_play_delay(Duration::from_secs(60));
    f.store
        .schedule_notes((1..=64).map(|beat| Note::press(80, 100, beat)));
    let signal = f.coordinator.signal();
    let clock = f.clock;
    let run = tokio::spawn(async move { clock.run(signal).await });

    tokio::time::sleep(period * 64 + period / 2).await;
    f.coordinator.shutdown();

    assert_eq!(run.await.expect("clock task"), 64);
    assert!(f.instrument.played().is_empty());
}

#[tokio::test]
async fn test_shutdown_before_start_means_no_ticks() {
    let f = fixture(120);
    f.coordinator.shutdown();
    assert_eq!(f.clock.run(f.coordinator.signal()).await, 0);
    assert_eq!(f.store.beat(), 0);
}

#[tokio::test]
async fn test_auto_improvise_checked_every_tick() {
    let f = fixture(120);
    let trigger = Arc::new(ImprovisationTrigger::new(
        Arc::clone(&f.store),
        composer::shared(MarkovComposer::seeded(70, 4, 3)),
        ImprovisationSettings {
            beats_of_silence: 8,
            auto: true,
            teach_grace: 0,
            phrase_length: 4,
        },
        Arc::clone(&f.logger),
    ));
    let clock = f.clock.with_auto_improvise(trigger);
    for _ in 0..9 {
        clock.tick();
    }
    assert!(f.logger.has_logged(LogLevel::Info, "Silence since beat 9"));
    assert_eq!(f.store.counters().improvised_at, Some(0));
}
