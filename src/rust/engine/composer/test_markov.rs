use super::*;

fn melody() -> Vec<Note> {
    vec![
        Note::press(72, 100, 0),
        Note::release(72, 30),
        Note::press(74, 90, 64),
        Note::release(74, 90),
        Note::press(76, 80, 128),
        Note::release(76, 160),
        Note::press(72, 100, 192),
        Note::release(72, 220),
        // Below the threshold: never learned.
        Note::press(40, 100, 200),
        Note::release(40, 210),
    ]
}

#[test]
fn test_untrained_composer_refuses_to_generate() {
    let mut composer = MarkovComposer::seeded(70, 8, 1);
    assert!(!composer.has_trained());
    assert_eq!(composer.generate(0), Err(ComposeError::Untrained));
}

#[test]
fn test_training_needs_two_presses_above_threshold() {
    let mut composer = MarkovComposer::seeded(70, 8, 1);
    let notes = vec![Note::press(80, 100, 0), Note::press(50, 100, 10)];
    assert_eq!(
        composer.train(&notes),
        Err(ComposeError::NotEnoughHistory {
            found: 1,
            needed: 2
        })
    );
    assert!(!composer.has_trained());
}

#[test]
fn test_training_learns_transitions() {
    let mut composer = MarkovComposer::seeded(70, 8, 1);
    composer.train(&melody()).expect("train");

    assert!(composer.has_trained());
    let from_72 = composer.transitions_from(72).expect("72 transitions");
    assert_eq!(from_72.get(&74), Some(&1.0));
    assert!(composer.transitions_from(40).is_none());
}

#[test]
fn test_generated_phrase_follows_seed_and_pairs_releases() {
    let mut composer = MarkovComposer::seeded(70, 6, 7);
    composer.train(&melody()).expect("train");

    let phrase = composer.generate(1000).expect("generate");
    assert_eq!(phrase.len(), 12);
    for pair in phrase.chunks(2) {
        let (press, release) = (pair[0], pair[1]);
        assert!(press.onset && press.beat > 1000);
        assert!(release.is_release());
        assert_eq!(release.pitch, press.pitch);
        assert!(release.beat > press.beat);
        assert!([72, 74, 76].contains(&press.pitch));
    }
}

#[test]
fn test_seeded_composers_agree() {
    let mut a = MarkovComposer::seeded(70, 8, 42);
    let mut b = MarkovComposer::seeded(70, 8, 42);
    a.train(&melody()).expect("train a");
    b.train(&melody()).expect("train b");
    assert_eq!(a.generate(64), b.generate(64));
}

#[test]
fn test_sample_from_table_edges() {
    let mut table = TransitionTable::new();
    assert_eq!(sample_from_table(&table, 0.5), None);
    table.insert(60, 1.0);
    table.insert(62, 3.0);
    assert_eq!(sample_from_table(&table, 0.0), Some(60));
    assert_eq!(sample_from_table(&table, 0.9), Some(62));
}
