use super::*;
use crate::engine::composer::{self, Composer};
use crate::engine::history::NoteLog;
use crate::tools::logger::LogLevel;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Composer that records calls and answers with a fixed phrase.
struct ScriptedComposer {
    trains: Arc<AtomicUsize>,
    generates: Arc<AtomicUsize>,
    fail_training: bool,
    trained: bool,
}

impl Composer for ScriptedComposer {
    fn train(&mut self, notes: &[Note]) -> Result<(), ComposeError> {
        self.trains.fetch_add(1, Ordering::SeqCst);
        if self.fail_training {
            return Err(ComposeError::NotEnoughHistory {
                found: notes.len(),
                needed: 2,
            });
        }
        self.trained = true;
        Ok(())
    }

    fn generate(&mut self, seed_beat: Beat) -> Result<Vec<Note>, ComposeError> {
        self.generates.fetch_add(1, Ordering::SeqCst);
        Ok(vec![
            Note::press(90, 80, seed_beat + 10),
            Note::release(90, seed_beat + 40),
        ])
    }

    fn has_trained(&self) -> bool {
        self.trained
    }
}

struct Fixture {
    store: Arc<SessionStore>,
    trigger: Arc<ImprovisationTrigger>,
    logger: Arc<Logger>,
    trains: Arc<AtomicUsize>,
    generates: Arc<AtomicUsize>,
}

fn fixture(fail_training: bool, settings: ImprovisationSettings) -> Fixture {
    let store = Arc::new(SessionStore::with_history(NoteLog::from(vec![
        Note::press(80, 100, 0),
        Note::press(82, 100, 32),
    ])));
    let logger = Arc::new(Logger::capturing());
    let trains = Arc::new(AtomicUsize::new(0));
    let generates = Arc::new(AtomicUsize::new(0));
    let composer = composer::shared(ScriptedComposer {
        trains: Arc::clone(&trains),
        generates: Arc::clone(&generates),
        fail_training,
        trained: false,
    });
    let trigger = Arc::new(ImprovisationTrigger::new(
        Arc::clone(&store),
        composer,
        settings,
        Arc::clone(&logger),
    ));
    Fixture {
        store,
        trigger,
        logger,
        trains,
        generates,
    }
}

fn quick_settings() -> ImprovisationSettings {
    ImprovisationSettings {
        beats_of_silence: 10,
        auto: true,
        teach_grace: 0,
        phrase_length: 4,
    }
}

fn advance(store: &SessionStore, ticks: u64) {
    for _ in 0..ticks {
        store.advance_beat();
    }
}

#[tokio::test]
async fn test_improvise_trains_first_then_merges() {
    let f = fixture(false, quick_settings());
    f.store.schedule_notes(vec![Note::press(60, 50, 15)]);
    advance(&f.store, 5);

    let added = f.trigger.improvise().await.expect("improvise");

    assert_eq!(added, 2);
    assert_eq!(f.trains.load(Ordering::SeqCst), 1);
    assert_eq!(f.generates.load(Ordering::SeqCst), 1);
    let schedule = f.store.schedule_snapshot();
    assert!(schedule.contains(&Note::press(60, 50, 15)));
    assert!(schedule.contains(&Note::press(90, 80, 15)));
    assert!(schedule.contains(&Note::release(90, 45)));
    assert!(f.logger.has_logged(LogLevel::Info, "Added 2 notes"));

    // Already trained: a second call goes straight to generation.
    f.trigger.improvise().await.expect("improvise again");
    assert_eq!(f.trains.load(Ordering::SeqCst), 1);
    assert_eq!(f.generates.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_training_failure_leaves_schedule_alone() {
    let f = fixture(true, quick_settings());
    f.store.schedule_notes(vec![Note::press(60, 50, 15)]);
    let before = f.store.schedule_snapshot();

    let result = f.trigger.improvise().await;

    assert!(matches!(result, Err(ComposeError::NotEnoughHistory { .. })));
    assert_eq!(f.generates.load(Ordering::SeqCst), 0);
    assert_eq!(f.store.schedule_snapshot(), before);
    assert!(f.logger.has_logged(LogLevel::Warning, "Training failed"));
}

#[tokio::test]
async fn test_teach_grants_grace_period() {
    let settings = ImprovisationSettings {
        teach_grace: 256,
        ..quick_settings()
    };
    let f = fixture(false, settings);
    advance(&f.store, 100);

    f.trigger.teach().await.expect("teach");

    assert!(f.trigger.has_trained());
    assert_eq!(f.store.counters().last_activity, 356);
    advance(&f.store, 200);
    assert!(!f.trigger.evaluate(), "still inside the grace period");
}

#[tokio::test]
async fn test_failed_auto_training_fires_once() {
    let settings = ImprovisationSettings {
        teach_grace: 256,
        ..quick_settings()
    };
    let f = fixture(true, settings);

    let mut fires = 0;
    for _ in 0..2000 {
        advance(&f.store, 1);
        if f.trigger.evaluate() {
            fires += 1;
            while f.trains.load(Ordering::SeqCst) < fires {
                tokio::task::yield_now().await;
            }
        }
    }

    assert_eq!(fires, 1);
    assert_eq!(f.trains.load(Ordering::SeqCst), 1);
    assert_eq!(f.generates.load(Ordering::SeqCst), 0);
    assert!(f.store.schedule_snapshot().is_empty());
}

#[tokio::test]
async fn test_evaluate_fires_once_until_activity_advances() {
    let f = fixture(false, quick_settings());
    advance(&f.store, 10);
    assert!(!f.trigger.evaluate());

    advance(&f.store, 1);
    assert!(f.trigger.evaluate());
    for _ in 0..20 {
        advance(&f.store, 1);
        assert!(!f.trigger.evaluate());
    }

    // A release counts as new activity and re-arms the trigger.
    let beat = f.store.beat();
    f.store.key_released(beat);
    advance(&f.store, 11);
    assert!(f.trigger.evaluate());
}

#[tokio::test]
async fn test_evaluate_waits_while_keys_are_held() {
    let f = fixture(false, quick_settings());
    f.store.key_pressed();
    advance(&f.store, 100);
    assert!(!f.trigger.evaluate());
    assert_eq!(f.store.counters().improvised_at, None);
}
