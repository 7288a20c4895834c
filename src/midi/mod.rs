/// MIDI output using midir
/// Mirrors note picks to an external synth with the same one-note-at-a-time rule
use log::{info, warn};
use midir::{MidiOutput, MidiOutputConnection};
use thiserror::Error;

use crate::audio::SamplePlayer;
use crate::sequencer::{Instrument, Pitch};

const CLIENT_NAME: &str = "NOTEGRID MIDI Output";
const VELOCITY: u8 = 100;

#[derive(Debug, Error)]
pub enum MidiError {
    #[error("Failed to create MIDI output: {0}")]
    Init(#[from] midir::InitError),

    #[error("Invalid port index: {0}")]
    InvalidPort(usize),

    #[error("Failed to connect: {0}")]
    Connect(String),

    #[error("Failed to send: {0}")]
    Send(#[from] midir::SendError),
}

/// General MIDI program for an instrument id
pub fn program_for(instrument: &Instrument) -> u8 {
    match instrument.id() {
        Instrument::KOTO => 107,
        _ => 0,
    }
}

pub struct MidiOutputDevice {
    connection: Option<MidiOutputConnection>,
    sounding: Option<u8>,
    program: Option<u8>,
}

impl MidiOutputDevice {
    pub fn new() -> Self {
        Self {
            connection: None,
            sounding: None,
            program: None,
        }
    }

    pub fn available_ports() -> Vec<String> {
        if let Ok(midi_out) = MidiOutput::new(CLIENT_NAME) {
            midi_out
                .ports()
                .iter()
                .filter_map(|p| midi_out.port_name(p).ok())
                .collect()
        } else {
            vec![]
        }
    }

    pub fn connect(&mut self, port_index: usize) -> Result<(), MidiError> {
        let midi_out = MidiOutput::new(CLIENT_NAME)?;

        let ports = midi_out.ports();
        let port = ports
            .get(port_index)
            .ok_or(MidiError::InvalidPort(port_index))?;

        let connection = midi_out
            .connect(port, "notegrid")
            .map_err(|e| MidiError::Connect(e.to_string()))?;

        info!("MIDI output connected to port {}", port_index);
        self.connection = Some(connection);
        self.sounding = None;
        self.program = None;
        Ok(())
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    /// A failed note-off is logged and the new note still goes out
    pub fn send_note_on(&mut self, instrument: &Instrument, pitch: Pitch) -> Result<(), MidiError> {
        if let Err(err) = self.send_note_off() {
            warn!("MIDI note off not sent: {}", err);
        }

        if let Some(ref mut conn) = self.connection {
            let program = program_for(instrument);
            if self.program != Some(program) {
                conn.send(&[0xC0, program])?;
                self.program = Some(program);
            }

            let note = pitch.midi_note();
            conn.send(&[0x90, note, VELOCITY])?;
            self.sounding = Some(note);
        }
        Ok(())
    }

    pub fn send_note_off(&mut self) -> Result<(), MidiError> {
        if let Some(note) = self.sounding.take() {
            if let Some(ref mut conn) = self.connection {
                conn.send(&[0x80, note, 0])?;
            }
        }
        Ok(())
    }
}

impl Default for MidiOutputDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl SamplePlayer for MidiOutputDevice {
    fn play(&mut self, instrument: &Instrument, pitch: Pitch) {
        if let Err(err) = self.send_note_on(instrument, pitch) {
            warn!("MIDI note {} not sent: {}", pitch, err);
        }
    }

    fn stop(&mut self) {
        if let Err(err) = self.send_note_off() {
            warn!("MIDI note off not sent: {}", err);
        }
    }

    fn release(&mut self) {
        self.stop();
    }
}
