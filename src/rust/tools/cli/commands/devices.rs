use anyhow::Result;
use clap::Args;

use crate::engine::instrument::MidiInstrument;
use crate::tools::cli::state::CliContext;

#[derive(Args, Debug)]
pub struct DevicesListCommand {}

pub fn execute_list(_cmd: DevicesListCommand, ctx: &CliContext) -> Result<()> {
    let logger = ctx.logger();

    let inputs = MidiInstrument::list_input_ports();
    if inputs.is_empty() {
        logger.warn("No MIDI inputs found");
    } else {
        logger.info("MIDI inputs:");
        for (i, name) in inputs.iter().enumerate() {
            logger.info(format!("  [{}] {}", i, name));
        }
    }

    let outputs = MidiInstrument::list_output_ports();
    if outputs.is_empty() {
        logger.warn("No MIDI outputs found");
    } else {
        logger.info("MIDI outputs:");
        for (i, name) in outputs.iter().enumerate() {
            logger.info(format!("  [{}] {}", i, name));
        }
    }

    logger.info("Pick ports with `duet play --input-port N --output-port M`");
    Ok(())
}
