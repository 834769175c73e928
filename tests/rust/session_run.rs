use std::sync::Arc;

use duet::engine::clock::tick_period;
use duet::engine::composer::{self, MarkovComposer};
use duet::engine::history::NoteLog;
use duet::engine::instrument::{Instrument, VirtualInstrument};
use duet::platform::config::AppConfig;
use duet::services::live::LiveSession;
use duet::tools::logger::{LogLevel, Logger};

#[tokio::test(start_paused = true)]
async fn session_records_saves_and_reloads() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut config = AppConfig::default();
    config.paths.history = dir.path().join("music_history.json");

    let instrument = Arc::new(VirtualInstrument::new());
    let keyboard = instrument.keyboard();
    keyboard.press(80, 100);
    keyboard.release(80);
    keyboard.press(40, 60);
    keyboard.press(config.controls.save, 64);
    keyboard.release(config.controls.save);

    let logger = Arc::new(Logger::capturing());
    let period = tick_period(config.tempo.bpm);
    let report = LiveSession::new(
        config.clone(),
        Arc::clone(&instrument) as Arc<dyn Instrument>,
        composer::shared(MarkovComposer::seeded(70, 4, 9)),
        Arc::clone(&logger),
    )
    .run_until(tokio::time::sleep(period * 32 + period / 2))
    .await
    .expect("session");

    assert_eq!(report.ticks, 32);
    assert_eq!(report.notes_recorded, 3);
    assert!(logger.has_logged(LogLevel::Success, "Saved 3 notes"));

    let saved = NoteLog::load(&config.paths.history).expect("reload");
    assert_eq!(saved.len(), 3);
    assert!(instrument.is_closed());
}
