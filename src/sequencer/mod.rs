/// Core note grid logic - pitches, buttons and per-column selection state
/// The column count is fixed when the grid is built and never changes
use std::fmt;
use std::time::Duration;

pub mod playback;
pub mod scale;

use scale::ScaleMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Pitch {
    C,
    D,
    E,
    F,
    G,
    A,
    B,
}

impl Pitch {
    pub const ALL: [Pitch; 7] = [
        Pitch::C,
        Pitch::D,
        Pitch::E,
        Pitch::F,
        Pitch::G,
        Pitch::A,
        Pitch::B,
    ];

    /// Label used for display and for sample file names
    pub fn label(self) -> &'static str {
        match self {
            Pitch::C => "C",
            Pitch::D => "D",
            Pitch::E => "E",
            Pitch::F => "F",
            Pitch::G => "G",
            Pitch::A => "A",
            Pitch::B => "B",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.label() == label)
    }

    /// MIDI note number in the fourth octave (C4 = 60)
    pub fn midi_note(self) -> u8 {
        static OFFSETS: [u8; 7] = [0, 2, 4, 5, 7, 9, 11];
        60 + OFFSETS[self as usize]
    }
}

impl fmt::Display for Pitch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Instrument(String);

impl Instrument {
    pub const PIANO: &'static str = "piano";
    pub const KOTO: &'static str = "koto";

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn piano() -> Self {
        Self::new(Self::PIANO)
    }

    pub fn koto() -> Self {
        Self::new(Self::KOTO)
    }

    pub fn id(&self) -> &str {
        &self.0
    }

    pub fn is_koto(&self) -> bool {
        self.0 == Self::KOTO
    }
}

impl Default for Instrument {
    fn default() -> Self {
        Self::piano()
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Screen position in logical pixels
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ButtonId {
    pub column: usize,
    pub pitch: Pitch,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NoteButton {
    id: ButtonId,
    selected: bool,
    disabled: bool,
    playing: bool,
}

impl NoteButton {
    fn new(id: ButtonId) -> Self {
        Self {
            id,
            selected: false,
            disabled: false,
            playing: false,
        }
    }

    pub fn id(&self) -> ButtonId {
        self.id
    }

    pub fn pitch(&self) -> Pitch {
        self.id.pitch
    }

    pub fn is_selected(&self) -> bool {
        self.selected
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }
}

/// Columns of note buttons, one button per pitch in every column
#[derive(Debug, Clone)]
pub struct NoteGrid {
    columns: Vec<Vec<NoteButton>>,
}

impl NoteGrid {
    pub fn new(columns: usize) -> Self {
        Self {
            columns: (0..columns)
                .map(|column| {
                    Pitch::ALL
                        .into_iter()
                        .map(|pitch| NoteButton::new(ButtonId { column, pitch }))
                        .collect()
                })
                .collect(),
        }
    }

    pub fn columns(&self) -> usize {
        self.columns.len()
    }

    pub fn column(&self, column: usize) -> &[NoteButton] {
        &self.columns[column]
    }

    pub fn button(&self, id: ButtonId) -> &NoteButton {
        &self.columns[id.column][id.pitch as usize]
    }

    fn button_mut(&mut self, id: ButtonId) -> &mut NoteButton {
        &mut self.columns[id.column][id.pitch as usize]
    }

    pub fn buttons(&self) -> impl Iterator<Item = &NoteButton> {
        self.columns.iter().flatten()
    }

    /// Mark `id` selected and unmark every other button in its column
    pub fn select(&mut self, id: ButtonId) {
        for button in &mut self.columns[id.column] {
            button.selected = button.id == id;
        }
    }

    pub fn deselect(&mut self, id: ButtonId) {
        self.button_mut(id).selected = false;
    }

    pub fn set_playing(&mut self, id: ButtonId, playing: bool) {
        self.button_mut(id).playing = playing;
    }

    /// Recompute the disabled flag of every button. Selection flags are left alone.
    pub fn apply_scale(&mut self, instrument: &Instrument, mode: ScaleMode) {
        for button in self.columns.iter_mut().flatten() {
            button.disabled = mode.disables(instrument, button.id.pitch);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionEntry {
    pub pitch: Pitch,
    /// Button center captured when the note was picked
    pub center: Point,
    pub button: ButtonId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectionStore {
    slots: Vec<Option<SelectionEntry>>,
}

impl SelectionStore {
    pub fn new(columns: usize) -> Self {
        Self {
            slots: vec![None; columns],
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Overwrites whatever the column held before. Panics if `column` is out of range.
    pub fn select(&mut self, column: usize, entry: SelectionEntry) {
        self.slots[column] = Some(entry);
    }

    pub fn get(&self, column: usize) -> Option<&SelectionEntry> {
        self.slots[column].as_ref()
    }

    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            *slot = None;
        }
    }

    pub fn entries(&self) -> &[Option<SelectionEntry>] {
        &self.slots
    }

    pub fn occupied(&self) -> impl Iterator<Item = &SelectionEntry> {
        self.slots.iter().flatten()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackConfig {
    pub instrument: Instrument,
    pub bpm: f32,
}

impl PlaybackConfig {
    pub fn new(instrument: Instrument, bpm: f32) -> Self {
        Self { instrument, bpm }
    }

    /// One beat: 60000 / bpm milliseconds
    pub fn note_duration(&self) -> Duration {
        Duration::from_secs_f64(60.0 / f64::from(self.bpm))
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self::new(Instrument::piano(), 90.0)
    }
}
