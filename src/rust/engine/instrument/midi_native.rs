// Native MIDI instrument (CLI/native builds via 'midir')
// Responsibilities:
// - list available midi in/out ports
// - open the chosen in port and forward note on/off messages to the input stream
// - send scheduled notes to the chosen out port

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use midir::{MidiInput, MidiInputConnection, MidiOutput, MidiOutputConnection};
use tokio::sync::mpsc;

use super::{InputStream, Instrument};
use crate::engine::clock::tick_period;
use crate::engine::error::InstrumentError;
use crate::engine::notes::{InputEvent, NoteSet};

const CLIENT_IN: &str = "duet-in";
const CLIENT_OUT: &str = "duet-out";

pub struct MidiInstrument {
    // Keep connections alive; `None` once closed.
    input: Mutex<Option<MidiInputConnection<()>>>,
    output: Mutex<Option<MidiOutputConnection>>,
    stream: Mutex<Option<InputStream>>,
    channel: u8,
}

impl MidiInstrument {
    pub fn list_input_ports() -> Vec<String> {
        if let Ok(midi_in) = MidiInput::new(CLIENT_IN) {
            midi_in
                .ports()
                .iter()
                .map(|p| {
                    midi_in
                        .port_name(p)
                        .unwrap_or_else(|_| "unknown".to_string())
                })
                .collect()
        } else {
            Vec::new()
        }
    }

    pub fn list_output_ports() -> Vec<String> {
        if let Ok(midi_out) = MidiOutput::new(CLIENT_OUT) {
            midi_out
                .ports()
                .iter()
                .map(|p| {
                    midi_out
                        .port_name(p)
                        .unwrap_or_else(|_| "unknown".to_string())
                })
                .collect()
        } else {
            Vec::new()
        }
    }

    /// Connect to the keyboard. Port indices default to the first port.
    pub fn open(
        input_port: Option<usize>,
        output_port: Option<usize>,
    ) -> Result<Self, InstrumentError> {
        let midi_in =
            MidiInput::new(CLIENT_IN).map_err(|e| InstrumentError::Connection(e.to_string()))?;
        let in_ports = midi_in.ports();
        let in_port = pick_port(&in_ports, input_port, "input")?.clone();

        let (tx, rx) = mpsc::unbounded_channel();
        let input = midi_in
            .connect(
                &in_port,
                "duet-listen",
                move |_stamp, message, _| {
                    if let Some(event) = InputEvent::from_midi(message) {
                        // The receiver only goes away at shutdown.
                        let _ = tx.send(event);
                    }
                },
                (),
            )
            .map_err(|e| InstrumentError::Connection(e.to_string()))?;

        let midi_out =
            MidiOutput::new(CLIENT_OUT).map_err(|e| InstrumentError::Connection(e.to_string()))?;
        let out_ports = midi_out.ports();
        let out_port = pick_port(&out_ports, output_port, "output")?.clone();
        let output = midi_out
            .connect(&out_port, "duet-play")
            .map_err(|e| InstrumentError::Connection(e.to_string()))?;

        Ok(Self {
            input: Mutex::new(Some(input)),
            output: Mutex::new(Some(output)),
            stream: Mutex::new(Some(rx)),
            channel: 0,
        })
    }
}

fn pick_port<'a, P>(
    ports: &'a [P],
    index: Option<usize>,
    direction: &'static str,
) -> Result<&'a P, InstrumentError> {
    if ports.is_empty() {
        return Err(InstrumentError::NoPort { direction });
    }
    let index = index.unwrap_or(0);
    ports.get(index).ok_or(InstrumentError::PortOutOfRange {
        direction,
        index,
        available: ports.len(),
    })
}

#[async_trait]
impl Instrument for MidiInstrument {
    fn listen(&self) -> Result<InputStream, InstrumentError> {
        self.stream
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or(InstrumentError::AlreadyListening)
    }

    async fn play(&self, notes: NoteSet, bpm: u32) -> Result<(), InstrumentError> {
        {
            let mut output = self.output.lock().unwrap_or_else(PoisonError::into_inner);
            let conn = output.as_mut().ok_or(InstrumentError::Closed)?;
            for note in &notes {
                conn.send(&note.midi_message(self.channel))
                    .map_err(|e| InstrumentError::Playback(e.to_string()))?;
            }
        }
        // Hold for one tick so overlapping dispatches keep their spacing.
        tokio::time::sleep(tick_period(bpm)).await;
        Ok(())
    }

    fn close(&self) -> Result<(), InstrumentError> {
        let input = self
            .input
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let output = self
            .output
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if input.is_none() && output.is_none() {
            return Err(InstrumentError::Closed);
        }
        if let Some(conn) = input {
            conn.close();
        }
        if let Some(conn) = output {
            conn.close();
        }
        Ok(())
    }
}
