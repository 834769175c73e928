use super::*;
use std::sync::Arc;

#[test]
fn test_pressed_keys_never_negative() {
    let store = SessionStore::new();
    assert_eq!(store.key_released(5), 0);
    assert_eq!(store.key_pressed(), 1);
    assert_eq!(store.key_released(6), 0);
    assert_eq!(store.key_released(7), 0);
    assert_eq!(store.counters().pressed_keys, 0);
    assert_eq!(store.counters().last_activity, 7);
}

#[test]
fn test_pressed_keys_random_walk_stays_non_negative() {
    let store = SessionStore::new();
    let mut expected: u32 = 0;
    // Deterministic mix of presses and releases, heavy on releases.
    for i in 0..500u64 {
        if i % 3 == 0 {
            store.key_pressed();
            expected += 1;
        } else {
            store.key_released(i);
            expected = expected.saturating_sub(1);
        }
        assert_eq!(store.counters().pressed_keys, expected);
    }
}

#[test]
fn test_advance_and_reset_beat() {
    let store = SessionStore::new();
    for expected in 1..=64 {
        assert_eq!(store.advance_beat(), expected);
    }
    assert_eq!(store.beat(), 64);
    store.reset_beat();
    assert_eq!(store.beat(), 0);
}

#[test]
fn test_concurrent_counter_updates_are_serialized() {
    let store = Arc::new(SessionStore::new());
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let store = Arc::clone(&store);
            std::thread::spawn(move || {
                for _ in 0..1000 {
                    store.key_pressed();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("worker");
    }
    assert_eq!(store.counters().pressed_keys, 8000);
}

#[test]
fn test_replay_history_schedules_and_rewinds() {
    let store = SessionStore::with_history(NoteLog::from(vec![
        Note::press(80, 100, 3),
        Note::release(80, 40),
    ]));
    for _ in 0..100 {
        store.advance_beat();
    }

    assert_eq!(store.replay_history(), 2);
    assert_eq!(store.beat(), 0);
    assert!(store.notes_at(3).is_some());
    assert!(store.notes_at(40).is_some());

    // A second replay adds nothing new and removes nothing.
    assert_eq!(store.replay_history(), 0);
    assert_eq!(store.schedule_snapshot().len(), 2);
}

#[test]
fn test_claim_silence_fires_once_per_activity() {
    let store = SessionStore::new();
    for _ in 0..10 {
        store.advance_beat();
    }
    assert_eq!(store.claim_silence(10), None, "silence must exceed the threshold");

    store.advance_beat();
    assert_eq!(store.claim_silence(10), Some(11));
    store.advance_beat();
    assert_eq!(store.claim_silence(10), None, "already fired for this activity");

    store.mark_activity(12);
    for _ in 0..11 {
        store.advance_beat();
    }
    assert_eq!(store.claim_silence(10), Some(23));
}

#[test]
fn test_claim_silence_waits_for_keys_up() {
    let store = SessionStore::new();
    store.key_pressed();
    for _ in 0..50 {
        store.advance_beat();
    }
    assert_eq!(store.claim_silence(10), None);
    store.key_released(20);
    assert_eq!(store.claim_silence(10), Some(50));
}

#[test]
fn test_future_activity_counts_as_no_silence() {
    let store = SessionStore::new();
    store.mark_activity(500);
    for _ in 0..100 {
        store.advance_beat();
    }
    assert_eq!(store.claim_silence(10), None);
}

#[test]
fn test_grace_does_not_rearm_a_fired_trigger() {
    let store = SessionStore::new();
    for _ in 0..11 {
        store.advance_beat();
    }
    assert_eq!(store.claim_silence(10), Some(11));

    store.grant_grace(11 + 256);
    for _ in 0..1000 {
        store.advance_beat();
    }
    assert_eq!(store.claim_silence(10), None);
    assert_eq!(store.counters().last_activity, 267);

    store.key_released(store.beat());
    for _ in 0..11 {
        store.advance_beat();
    }
    assert_eq!(store.claim_silence(10), Some(1022));
}

#[test]
fn test_grace_before_any_fire_only_delays() {
    let store = SessionStore::new();
    store.grant_grace(100);
    for _ in 0..110 {
        store.advance_beat();
    }
    assert_eq!(store.claim_silence(10), None);
    store.advance_beat();
    assert_eq!(store.claim_silence(10), Some(111));
}

#[test]
fn test_save_history_writes_snapshot() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("history.json");
    let store = SessionStore::new();
    store.append(Note::press(81, 90, 1));
    store.append(Note::release(81, 9));

    assert_eq!(store.save_history(&path).expect("save"), 2);
    assert_eq!(NoteLog::load(&path).expect("load"), store.log_snapshot());
}
