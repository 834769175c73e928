use super::*;

#[test]
fn test_from_midi_note_on() {
    let ev = InputEvent::from_midi(&[0x90, 80, 100]).expect("note on");
    assert_eq!(ev, InputEvent::press(80, 100));
    assert!(ev.onset);
}

#[test]
fn test_from_midi_zero_velocity_is_release() {
    let ev = InputEvent::from_midi(&[0x91, 80, 0]).expect("release");
    assert!(!ev.onset);
    assert_eq!(ev.velocity, 0);
}

#[test]
fn test_from_midi_note_off_reports_zero_velocity() {
    let ev = InputEvent::from_midi(&[0x80, 64, 45]).expect("note off");
    assert_eq!(ev, InputEvent::release(64));
}

#[test]
fn test_from_midi_ignores_clock_and_controllers() {
    assert!(InputEvent::from_midi(&[0xF8]).is_none());
    assert!(InputEvent::from_midi(&[0xB0, 64, 127]).is_none());
    assert!(InputEvent::from_midi(&[]).is_none());
}

#[test]
fn test_event_stamped_with_beat() {
    let note = InputEvent::press(72, 90).at(640);
    assert_eq!(note, Note::press(72, 90, 640));
    let release = InputEvent::release(72).at(700);
    assert!(release.is_release());
    assert_eq!(release.beat, 700);
}

#[test]
fn test_midi_message_bytes() {
    assert_eq!(Note::press(60, 100, 0).midi_message(0), [0x90, 60, 100]);
    assert_eq!(Note::release(60, 0).midi_message(2), [0x82, 60, 0]);
}

#[test]
fn test_note_serializes_onset_as_on() {
    let json = serde_json::to_string(&Note::press(60, 10, 5)).expect("serialize");
    assert!(json.contains("\"on\":true"));
}

#[test]
fn test_pitch_name() {
    assert_eq!(pitch_name(60), "C4");
    assert_eq!(pitch_name(21), "A0");
    assert_eq!(pitch_name(108), "C8");
}
