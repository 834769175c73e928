use super::*;

#[test]
fn test_add_groups_by_beat() {
    let mut schedule = NoteSchedule::new();
    assert!(schedule.add(Note::press(60, 90, 10)));
    assert!(schedule.add(Note::press(64, 90, 10)));
    assert!(schedule.add(Note::release(60, 20)));

    assert_eq!(schedule.beat_count(), 2);
    assert_eq!(schedule.len(), 3);
    assert_eq!(schedule.get(10).map(|s| s.len()), Some(2));
    assert!(schedule.get(11).is_none());
}

#[test]
fn test_merge_is_a_union() {
    let mut schedule = NoteSchedule::new();
    schedule.add(Note::press(60, 90, 10));

    let added = schedule.merge(vec![Note::press(60, 90, 10), Note::press(67, 80, 10)]);
    assert_eq!(added, 1);
    assert_eq!(schedule.get(10).map(|s| s.len()), Some(2));
    assert!(schedule.contains(&Note::press(60, 90, 10)));
}

#[test]
fn test_merging_twice_never_loses_entries() {
    let history = vec![
        Note::press(72, 100, 0),
        Note::release(72, 32),
        Note::press(74, 100, 64),
    ];
    let mut schedule = NoteSchedule::new();
    schedule.add(Note::press(50, 20, 32));

    schedule.merge(history.clone());
    let after_one = schedule.clone();
    schedule.merge(history);

    assert_eq!(schedule, after_one);
    assert_eq!(schedule.len(), 4);
    assert!(schedule.contains(&Note::press(50, 20, 32)));
}
