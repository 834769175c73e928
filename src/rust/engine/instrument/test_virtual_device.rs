use super::*;
use crate::engine::notes::Note;
use crate::tools::logger::LogLevel;

fn chord() -> NoteSet {
    [Note::press(60, 90, 4), Note::press(64, 90, 4)]
        .into_iter()
        .collect()
}

#[tokio::test]
async fn test_keyboard_feeds_stream_in_order() {
    let instrument = VirtualInstrument::new();
    let keyboard = instrument.keyboard();
    let mut stream = instrument.listen().expect("stream");

    keyboard.press(80, 100);
    keyboard.release(80);

    assert_eq!(stream.recv().await, Some(InputEvent::press(80, 100)));
    assert_eq!(stream.recv().await, Some(InputEvent::release(80)));
}

#[test]
fn test_stream_cannot_be_taken_twice() {
    let instrument = VirtualInstrument::new();
    assert!(instrument.listen().is_ok());
    assert!(matches!(
        instrument.listen(),
        Err(InstrumentError::AlreadyListening)
    ));
}

#[tokio::test]
async fn test_play_records_and_echoes() {
    let logger = Arc::new(Logger::capturing());
    let instrument = VirtualInstrument::new().with_echo(Arc::clone(&logger));

    instrument.play(chord(), 120).await.expect("play");

    assert_eq!(instrument.played(), vec![chord()]);
    assert!(logger.has_logged(LogLevel::Action, "+C4 +E4"));
}

#[tokio::test]
async fn test_play_failure_and_close() {
    let instrument = VirtualInstrument::new();
    instrument.fail_playback(true);
    assert!(matches!(
        instrument.play(chord(), 120).await,
        Err(InstrumentError::Playback(_))
    ));

    instrument.fail_playback(false);
    instrument.close().expect("first close");
    assert!(instrument.is_closed());
    assert!(matches!(
        instrument.play(chord(), 120).await,
        Err(InstrumentError::Closed)
    ));
    assert!(instrument.close().is_err());
    assert_eq!(instrument.close_calls(), 2);
    assert!(instrument.played().is_empty());
}

#[test]
fn test_parse_keyboard_line() {
    assert_eq!(parse_keyboard_line("on 80 90"), Some(InputEvent::press(80, 90)));
    assert_eq!(parse_keyboard_line("ON 21"), Some(InputEvent::press(21, 100)));
    assert_eq!(parse_keyboard_line("off 80"), Some(InputEvent::release(80)));
    assert_eq!(parse_keyboard_line("on 200"), None);
    assert_eq!(parse_keyboard_line("on 60 0"), None);
    assert_eq!(parse_keyboard_line("hello"), None);
    assert_eq!(parse_keyboard_line(""), None);
}
