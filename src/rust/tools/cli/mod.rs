// Parent `tools` module controls `cli` gating; avoid duplicating crate-level cfg here.
mod commands;
pub mod state;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::devices::DevicesListCommand;
use commands::history::HistoryShowCommand;
use commands::play::PlayCommand;
use state::CliContext;

#[derive(Parser, Debug)]
#[command(name = "duet")]
#[command(
    version,
    about = "🎹 Duet – play along with your own history on a MIDI keyboard."
)]
pub struct Cli {
    /// Print debug diagnostics (metronome, timings)
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start a live session on a MIDI keyboard (or the terminal with --virtual)
    Play(PlayCommand),
    /// Manage MIDI devices
    Devices {
        #[command(subcommand)]
        action: DevicesCommands,
    },
    /// Inspect a saved note history
    History {
        #[command(subcommand)]
        action: HistoryCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum DevicesCommands {
    /// List MIDI devices
    List(DevicesListCommand),
}

#[derive(Subcommand, Debug)]
pub enum HistoryCommands {
    /// Summarise a history file
    Show(HistoryShowCommand),
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let ctx = CliContext::new(cli.debug);
    let runtime = tokio::runtime::Runtime::new()?;

    runtime.block_on(async move {
        match cli.command {
            Commands::Play(command) => commands::play::execute(command, &ctx).await?,
            Commands::Devices { action } => match action {
                DevicesCommands::List(cmd) => commands::devices::execute_list(cmd, &ctx)?,
            },
            Commands::History { action } => match action {
                HistoryCommands::Show(cmd) => commands::history::execute_show(cmd, &ctx)?,
            },
        }
        Ok(())
    })
}
