use super::*;
use crate::engine::composer::{self, MarkovComposer};
use crate::engine::history::NoteLog;
use crate::engine::improvise::ImprovisationSettings;
use crate::engine::instrument::{Instrument, VirtualInstrument};
use crate::engine::notes::Beat;
use crate::engine::shutdown::ShutdownCoordinator;
use crate::tools::logger::LogLevel;
use tempfile::TempDir;

const THRESHOLD: u8 = 70;

struct Fixture {
    dir: TempDir,
    history_path: PathBuf,
    store: Arc<SessionStore>,
    logger: Arc<Logger>,
    listener: EventListener,
}

fn fixture(history: Vec<Note>) -> Fixture {
    let dir = tempfile::tempdir().expect("tempdir");
    let history_path = dir.path().join("music_history.json");
    let store = Arc::new(SessionStore::with_history(NoteLog::from(history)));
    let logger = Arc::new(Logger::capturing());
    let trigger = Arc::new(ImprovisationTrigger::new(
        Arc::clone(&store),
        composer::shared(MarkovComposer::seeded(THRESHOLD, 4, 11)),
        ImprovisationSettings {
            teach_grace: 0,
            ..ImprovisationSettings::default()
        },
        Arc::clone(&logger),
    ));
    let listener = EventListener::new(
        Arc::clone(&store),
        trigger,
        ControlPitchMap::default(),
        THRESHOLD,
        history_path.clone(),
        Arc::clone(&logger),
    );
    Fixture {
        dir,
        history_path,
        store,
        logger,
        listener,
    }
}

fn advance_to(store: &SessionStore, beat: Beat) {
    while store.beat() < beat {
        store.advance_beat();
    }
}

#[test]
fn test_classify_priority_and_edges() {
    let controls = ControlPitchMap::default();
    let c = |event: InputEvent| classify(&event, &controls, THRESHOLD);

    assert_eq!(
        c(InputEvent::press(21, 90)),
        Classification::Control(ControlAction::Save)
    );
    assert_eq!(
        c(InputEvent::press(22, 90)),
        Classification::Control(ControlAction::Replay)
    );
    assert_eq!(
        c(InputEvent::press(107, 90)),
        Classification::Control(ControlAction::Teach)
    );
    assert_eq!(
        c(InputEvent::press(108, 90)),
        Classification::Control(ControlAction::Improvise)
    );
    assert_eq!(c(InputEvent::release(108)), Classification::ControlRelease);
    assert_eq!(
        c(InputEvent::press(80, 100)),
        Classification::Note(KeyEffect::Press)
    );
    assert_eq!(
        c(InputEvent::release(80)),
        Classification::Note(KeyEffect::Release)
    );
    assert_eq!(
        c(InputEvent::press(70, 100)),
        Classification::Note(KeyEffect::Uncounted)
    );
}

#[test]
fn test_control_map_first_match_wins() {
    let controls = ControlPitchMap {
        save: 60,
        replay: 60,
        teach: 61,
        improvise: 62,
    };
    assert_eq!(controls.action_for(60), Some(ControlAction::Save));
    assert_eq!(controls.action_for(63), None);
}

#[tokio::test]
async fn test_press_then_release_updates_counters() {
    let f = fixture(Vec::new());
    advance_to(&f.store, 10);
    f.listener.handle(InputEvent::press(80, 100)).await;
    assert_eq!(f.store.counters().pressed_keys, 1);

    advance_to(&f.store, 42);
    f.listener.handle(InputEvent::release(80)).await;
    let counters = f.store.counters();
    assert_eq!(counters.pressed_keys, 0);
    assert_eq!(counters.last_activity, 42);

    let log = f.store.log_snapshot();
    assert_eq!(
        log.notes(),
        &[Note::press(80, 100, 10), Note::release(80, 42)]
    );
}

#[tokio::test]
async fn test_low_notes_are_logged_but_not_counted() {
    let f = fixture(Vec::new());
    advance_to(&f.store, 5);
    f.listener.handle(InputEvent::press(40, 100)).await;
    f.listener.handle(InputEvent::release(40)).await;

    assert_eq!(f.store.counters(), Default::default());
    assert_eq!(f.store.log_len(), 2);
}

#[tokio::test]
async fn test_unmatched_release_does_not_go_negative() {
    let f = fixture(Vec::new());
    f.listener.handle(InputEvent::release(90)).await;
    f.listener.handle(InputEvent::release(91)).await;
    f.listener.handle(InputEvent::press(92, 10)).await;
    assert_eq!(f.store.counters().pressed_keys, 1);
}

#[tokio::test]
async fn test_control_releases_are_ignored() {
    let f = fixture(vec![Note::press(80, 100, 3)]);
    for pitch in ControlPitchMap::default().pitches() {
        f.listener.handle(InputEvent::release(pitch)).await;
    }
    assert_eq!(f.store.log_len(), 1);
    assert!(f.store.schedule_snapshot().is_empty());
    assert!(!f.history_path.exists());
}

#[tokio::test]
async fn test_save_persists_snapshot() {
    let f = fixture(Vec::new());
    advance_to(&f.store, 3);
    f.listener.handle(InputEvent::press(80, 100)).await;
    advance_to(&f.store, 9);
    f.listener.handle(InputEvent::release(80)).await;

    f.listener.handle(InputEvent::press(21, 64)).await;

    let reloaded = NoteLog::load(&f.history_path).expect("reload");
    assert_eq!(reloaded, f.store.log_snapshot());
    assert_eq!(reloaded.len(), 2, "control presses are not logged");
    assert!(f.logger.has_logged(LogLevel::Success, "Saved 2 notes"));
}

#[tokio::test]
async fn test_save_failure_is_logged() {
    let f = fixture(Vec::new());
    let not_a_dir = f.dir.path().join("plain_file");
    std::fs::write(&not_a_dir, "x").expect("write file");
    let blocked = EventListener::new(
        Arc::clone(&f.store),
        Arc::new(ImprovisationTrigger::new(
            Arc::clone(&f.store),
            composer::shared(MarkovComposer::seeded(THRESHOLD, 4, 1)),
            ImprovisationSettings::default(),
            Arc::clone(&f.logger),
        )),
        ControlPitchMap::default(),
        THRESHOLD,
        not_a_dir.join("music_history.json"),
        Arc::clone(&f.logger),
    );
    blocked.handle(InputEvent::press(21, 64)).await;
    assert!(f.logger.has_logged(LogLevel::Error, "Save failed"));
}

#[tokio::test]
async fn test_replay_rewinds_and_schedules_history() {
    let history = vec![
        Note::press(80, 100, 3),
        Note::release(80, 40),
        Note::press(60, 30, 41),
    ];
    let f = fixture(history.clone());
    advance_to(&f.store, 500);

    f.listener.handle(InputEvent::press(22, 64)).await;

    assert_eq!(f.store.beat(), 0);
    let schedule = f.store.schedule_snapshot();
    for note in &history {
        assert!(schedule.contains(note), "{note:?} missing");
    }

    f.listener.handle(InputEvent::press(22, 64)).await;
    assert_eq!(f.store.schedule_snapshot(), schedule);
}

#[tokio::test]
async fn test_teach_and_improvise_controls() {
    let f = fixture(vec![
        Note::press(72, 100, 0),
        Note::release(72, 30),
        Note::press(74, 90, 64),
        Note::release(74, 90),
    ]);
    advance_to(&f.store, 200);

    f.listener.handle(InputEvent::press(107, 64)).await;
    assert!(f.logger.has_logged(LogLevel::Success, "Composer trained"));

    f.listener.handle(InputEvent::press(108, 64)).await;
    let schedule = f.store.schedule_snapshot();
    assert!(!schedule.is_empty() && schedule.len() <= 8);
    assert!(schedule.iter().all(|(beat, _)| *beat > 200));
}

#[tokio::test]
async fn test_improvise_without_history_fails_quietly() {
    let f = fixture(Vec::new());
    f.listener.handle(InputEvent::press(108, 64)).await;
    assert!(f.logger.has_logged(LogLevel::Warning, "Training failed"));
    assert!(f.store.schedule_snapshot().is_empty());
}

#[tokio::test]
async fn test_run_consumes_in_order_until_shutdown() {
    let f = fixture(Vec::new());
    let instrument = Arc::new(VirtualInstrument::new());
    let keyboard = instrument.keyboard();
    let stream = instrument.listen().expect("stream");
    let coordinator = Arc::new(ShutdownCoordinator::new(
        Arc::clone(&instrument) as Arc<dyn Instrument>,
        Arc::clone(&f.logger),
    ));

    for pitch in 80..90 {
        keyboard.press(pitch, 100);
    }
    let listener = Arc::new(f.listener);
    let task = {
        let listener = Arc::clone(&listener);
        let signal = coordinator.signal();
        tokio::spawn(async move { listener.run(stream, signal).await })
    };
    while f.store.log_len() < 10 {
        tokio::task::yield_now().await;
    }
    coordinator.shutdown();

    assert_eq!(task.await.expect("listener"), 10);
    let pitches: Vec<u8> = f.store.log_snapshot().iter().map(|n| n.pitch).collect();
    assert_eq!(pitches, (80..90).collect::<Vec<u8>>());
    assert_eq!(f.store.counters().pressed_keys, 10);
}
