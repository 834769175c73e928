use super::*;
use crate::engine::clock::tick_period;
use crate::engine::composer::{self, MarkovComposer};
use crate::engine::instrument::VirtualInstrument;
use crate::engine::notes::Note;
use crate::tools::logger::LogLevel;
use std::time::Duration;
use tempfile::TempDir;

struct Fixture {
    _dir: TempDir,
    config: AppConfig,
    instrument: Arc<VirtualInstrument>,
    logger: Arc<Logger>,
}

fn fixture(history: Option<Vec<Note>>) -> Fixture {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut config = AppConfig::default();
    config.paths.history = dir.path().join("music_history.json");
    if let Some(notes) = history {
        NoteLog::from(notes)
            .save(&config.paths.history)
            .expect("seed history");
    }
    Fixture {
        _dir: dir,
        config,
        instrument: Arc::new(VirtualInstrument::new()),
        logger: Arc::new(Logger::capturing()),
    }
}

fn session(f: &Fixture) -> LiveSession {
    LiveSession::new(
        f.config.clone(),
        Arc::clone(&f.instrument) as Arc<dyn Instrument>,
        composer::shared(MarkovComposer::seeded(
            f.config.input.high_pass_threshold,
            f.config.improvisation.phrase_length,
            5,
        )),
        Arc::clone(&f.logger),
    )
}

fn after_ticks(bpm: u32, ticks: u32) -> Duration {
    let period = tick_period(bpm);
    period * ticks + period / 2
}

#[tokio::test(start_paused = true)]
async fn test_session_records_until_interrupted() {
    let f = fixture(None);
    let keyboard = f.instrument.keyboard();
    keyboard.press(80, 100);
    keyboard.release(80);

    let report = session(&f)
        .run_until(tokio::time::sleep(after_ticks(120, 10)))
        .await
        .expect("session");

    assert_eq!(report.ticks, 10);
    assert_eq!(report.final_beat, 10);
    assert_eq!(report.notes_recorded, 2);
    assert_eq!(f.instrument.close_calls(), 1);
    assert!(f.logger.has_logged(LogLevel::Watch, "Interrupt received"));
    assert!(f.logger.has_logged(LogLevel::Success, "Done after 10 ticks"));
}

#[tokio::test]
async fn test_missing_history_starts_empty() {
    let f = fixture(None);
    let session = session(&f);
    assert_eq!(session.store().log_len(), 0);
    assert!(f
        .logger
        .has_logged(LogLevel::Warning, "starting with an empty history"));
}

#[tokio::test]
async fn test_listen_failure_is_fatal() {
    let f = fixture(None);
    let _taken = f.instrument.listen().expect("first listen");

    let err = session(&f)
        .run_until(std::future::ready(()))
        .await
        .expect_err("second listen fails");
    assert!(format!("{err:#}").contains("failed to start listening"));
    assert_eq!(f.instrument.close_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_replay_control_plays_saved_history() {
    let f = fixture(Some(vec![
        Note::press(80, 100, 2),
        Note::press(84, 90, 5),
    ]));
    f.instrument.keyboard().press(f.config.controls.replay, 64);

    let session = session(&f);
    assert_eq!(session.store().log_len(), 2);
    let report = session
        .run_until(tokio::time::sleep(after_ticks(120, 8)))
        .await
        .expect("session");

    assert_eq!(report.scheduled, 2);
    assert_eq!(report.notes_recorded, 0);
    assert_eq!(f.instrument.played().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_auto_improvise_fills_silence() {
    let mut f = fixture(Some(vec![
        Note::press(72, 100, 0),
        Note::release(72, 20),
        Note::press(76, 100, 40),
        Note::release(76, 60),
    ]));
    f.config.improvisation.auto = true;
    f.config.improvisation.beats_of_silence = 4;
    f.config.improvisation.teach_grace = 0;
    f.config.improvisation.phrase_length = 4;

    let report = session(&f)
        .run_until(tokio::time::sleep(after_ticks(120, 64)))
        .await
        .expect("session");

    assert!(f.logger.has_logged(LogLevel::Info, "Silence since beat 5"));
    assert!(f.logger.has_logged(LogLevel::Success, "Composer trained"));
    assert!(report.scheduled > 0);
}
