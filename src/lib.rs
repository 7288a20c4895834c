/// NOTEGRID - a column-by-column note picking toy
///
/// This library provides the core components of the note grid:
/// - Selection state for a fixed row of note columns
/// - Scale filtering for the koto reduced scales
/// - Single-voice sample playback (plus an optional MIDI mirror)
/// - A clock-driven sequence player
/// - Line rendering between neighbouring selections

pub mod audio;
pub mod config;
pub mod controller;
pub mod midi;
pub mod render;
pub mod sequencer;

// Re-export commonly used types
pub use audio::{AudioOutput, SampleLibrary, SamplePlayer};
pub use config::Config;
pub use controller::Session;
pub use midi::MidiOutputDevice;
pub use render::{LineCanvas, LineStyle, Segment};
pub use sequencer::playback::{Clock, ManualClock, PlaybackEvent, SequencePlayer, SystemClock};
pub use sequencer::scale::{is_disabled, ScaleMode};
pub use sequencer::{
    ButtonId, Instrument, NoteGrid, Pitch, PlaybackConfig, Point, SelectionEntry, SelectionStore,
};
