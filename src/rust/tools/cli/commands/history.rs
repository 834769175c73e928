use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use crate::engine::history::NoteLog;
use crate::engine::notes::{TICKS_PER_BEAT, pitch_name};
use crate::platform::config::AppConfig;
use crate::tools::cli::state::CliContext;
use crate::tools::logger::LogLevel;

#[derive(Args, Debug)]
pub struct HistoryShowCommand {
    /// History file to read (defaults to paths.history from the config)
    #[arg(long)]
    pub path: Option<PathBuf>,
}

pub fn execute_show(cmd: HistoryShowCommand, ctx: &CliContext) -> Result<()> {
    let logger = ctx.logger();
    let path = match cmd.path {
        Some(path) => path,
        None => {
            let cwd = std::env::current_dir()?;
            AppConfig::load(&cwd)?.history_path(&cwd)
        }
    };

    let log = NoteLog::load(&path)
        .with_context(|| format!("failed to read history {}", path.display()))?;

    let Some(summary) = log.summary() else {
        logger.info(format!("{} is empty", path.display()));
        return Ok(());
    };

    logger.log_with_details(
        LogLevel::Info,
        format!("{}: {} notes", path.display(), summary.notes),
        [
            format!(
                "presses: {}, releases: {}",
                summary.presses,
                summary.notes - summary.presses
            ),
            format!(
                "beats {}..{} ({:.1} bars of 4/4)",
                summary.first_beat,
                summary.last_beat,
                (summary.last_beat - summary.first_beat) as f64 / (TICKS_PER_BEAT * 4) as f64
            ),
            format!(
                "pitch range {}..{}",
                pitch_name(summary.lowest_pitch),
                pitch_name(summary.highest_pitch)
            ),
        ],
    );
    Ok(())
}
