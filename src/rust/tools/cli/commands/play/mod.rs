use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use tokio::sync::oneshot;

use crate::engine::composer::{self, MarkovComposer, SharedComposer};
use crate::engine::instrument::virtual_device::parse_keyboard_line;
use crate::engine::instrument::{Instrument, MidiInstrument, VirtualInstrument, VirtualKeyboard};
use crate::platform::config::AppConfig;
use crate::services::live::LiveSession;
use crate::tools::cli::state::CliContext;
use crate::tools::logger::Logger;

#[derive(Debug, Clone, Args)]
pub struct PlayCommand {
    /// Tempo in beats per minute (overrides config)
    #[arg(long)]
    pub bpm: Option<u32>,

    /// Ticks of silence before the composer takes over (64 ticks per beat)
    #[arg(long)]
    pub silence: Option<u64>,

    /// Improvise automatically when you stop playing
    #[arg(long = "auto-improvise")]
    pub auto_improvise: bool,

    /// History file to load and save (overrides config)
    #[arg(long)]
    pub history: Option<PathBuf>,

    /// MIDI input port index (see `duet devices list`)
    #[arg(long = "input-port")]
    pub input_port: Option<usize>,

    /// MIDI output port index
    #[arg(long = "output-port")]
    pub output_port: Option<usize>,

    /// Play from the terminal: `on <pitch> [velocity]` / `off <pitch>`, one per line
    #[arg(long = "virtual")]
    pub virtual_keyboard: bool,

    /// Seed the composer for reproducible improvisation
    #[arg(long)]
    pub seed: Option<u64>,
}

impl PlayCommand {
    fn apply(&self, config: &mut AppConfig) {
        if let Some(bpm) = self.bpm {
            config.tempo.bpm = bpm;
        }
        if let Some(silence) = self.silence {
            config.improvisation.beats_of_silence = silence;
        }
        if self.auto_improvise {
            config.improvisation.auto = true;
        }
        if let Some(history) = &self.history {
            config.paths.history = history.clone();
        }
        if self.input_port.is_some() {
            config.midi.input_port = self.input_port;
        }
        if self.output_port.is_some() {
            config.midi.output_port = self.output_port;
        }
    }
}

pub async fn execute(command: PlayCommand, ctx: &CliContext) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let mut config = AppConfig::load(&cwd)?;
    command.apply(&mut config);
    config.validate().context("invalid configuration")?;
    config.paths.history = config.history_path(&cwd);

    let logger = if config.logging.debug && !ctx.logger().debug_enabled() {
        Arc::new(Logger::with_debug(true))
    } else {
        ctx.logger()
    };

    let composer = build_composer(&config, command.seed);
    let (instrument, keys_closed): (Arc<dyn Instrument>, Option<oneshot::Receiver<()>>) =
        if command.virtual_keyboard {
            let instrument = VirtualInstrument::new().with_echo(Arc::clone(&logger));
            let closed = spawn_terminal_keyboard(instrument.keyboard(), Arc::clone(&logger));
            logger.info("Virtual keyboard: type `on <pitch> [velocity]` or `off <pitch>`");
            (Arc::new(instrument) as Arc<dyn Instrument>, Some(closed))
        } else {
            let instrument = MidiInstrument::open(config.midi.input_port, config.midi.output_port)
                .context("failed to open MIDI instrument")?;
            (Arc::new(instrument) as Arc<dyn Instrument>, None)
        };

    let interrupt = {
        let logger = Arc::clone(&logger);
        async move {
            let ctrl_c = async {
                if let Err(err) = tokio::signal::ctrl_c().await {
                    logger.error(format!("Unable to listen for Ctrl-C: {err}"));
                    std::future::pending::<()>().await;
                }
            };
            match keys_closed {
                Some(closed) => {
                    tokio::select! {
                        _ = ctrl_c => {}
                        _ = closed => {}
                    }
                }
                None => ctrl_c.await,
            }
        }
    };

    LiveSession::new(config, instrument, composer, logger)
        .run_until(interrupt)
        .await?;
    Ok(())
}

fn build_composer(config: &AppConfig, seed: Option<u64>) -> SharedComposer {
    let threshold = config.input.high_pass_threshold;
    let phrase_length = config.improvisation.phrase_length;
    match seed {
        Some(seed) => composer::shared(MarkovComposer::seeded(threshold, phrase_length, seed)),
        None => composer::shared(MarkovComposer::new(threshold, phrase_length)),
    }
}

/// Feed stdin lines to the virtual keyboard. The receiver fires when stdin closes.
fn spawn_terminal_keyboard(keyboard: VirtualKeyboard, logger: Arc<Logger>) -> oneshot::Receiver<()> {
    let (closed_tx, closed_rx) = oneshot::channel();
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if line.trim().is_empty() {
                continue;
            }
            match parse_keyboard_line(&line) {
                Some(event) => {
                    if !keyboard.send(event) {
                        break;
                    }
                }
                None => logger.warn(format!("Ignoring '{}'", line.trim())),
            }
        }
        closed_tx.send(()).ok();
    });
    closed_rx
}
