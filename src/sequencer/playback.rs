/// Playback engine - steps through the columns one beat at a time
use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use log::{debug, info};

use super::{ButtonId, SelectionStore};

/// Source of "now" for the sequence player, measured from an arbitrary origin
pub trait Clock {
    fn now(&self) -> Duration;
}

pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Hand-driven clock. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, now: Duration) {
        self.now.set(now);
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackEvent {
    NoteOn(ButtonId),
    NoteOff(ButtonId),
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Stepping { column: usize, started: Duration },
}

pub struct SequencePlayer {
    state: PlaybackState,
    note_duration: Duration,
    sounding: Option<ButtonId>,
}

impl SequencePlayer {
    pub fn new(note_duration: Duration) -> Self {
        Self {
            state: PlaybackState::Idle,
            note_duration,
            sounding: None,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, PlaybackState::Stepping { .. })
    }

    pub fn note_duration(&self) -> Duration {
        self.note_duration
    }

    /// Begin at column 0. A start while already stepping is ignored.
    pub fn start(&mut self, now: Duration, store: &SelectionStore) -> Vec<PlaybackEvent> {
        if self.is_running() {
            debug!("play ignored, sequence already running");
            return Vec::new();
        }

        if store.is_empty() {
            return vec![PlaybackEvent::Finished];
        }

        info!(
            "sequence started: {} columns, {:?} per note",
            store.len(),
            self.note_duration
        );

        self.state = PlaybackState::Stepping {
            column: 0,
            started: now,
        };

        let mut events = Vec::new();
        self.enter_column(0, store, &mut events);
        events
    }

    /// When the current column's beat ends
    pub fn next_deadline(&self) -> Option<Duration> {
        match self.state {
            PlaybackState::Idle => None,
            PlaybackState::Stepping { column, started } => {
                Some(started + self.note_duration * (column as u32 + 1))
            }
        }
    }

    /// Run every step whose deadline is at or before `now`
    pub fn advance(&mut self, now: Duration, store: &SelectionStore) -> Vec<PlaybackEvent> {
        let mut events = Vec::new();

        while let Some(deadline) = self.next_deadline() {
            if now < deadline {
                break;
            }

            if let Some(button) = self.sounding.take() {
                events.push(PlaybackEvent::NoteOff(button));
            }

            let PlaybackState::Stepping { column, started } = self.state else {
                break;
            };

            let next = column + 1;
            if next >= store.len() {
                self.state = PlaybackState::Idle;
                events.push(PlaybackEvent::Finished);
                info!("sequence finished");
            } else {
                self.state = PlaybackState::Stepping {
                    column: next,
                    started,
                };
                self.enter_column(next, store, &mut events);
            }
        }

        events
    }

    // Slots are read live, so a reset mid-sequence silences the remaining columns.
    fn enter_column(
        &mut self,
        column: usize,
        store: &SelectionStore,
        events: &mut Vec<PlaybackEvent>,
    ) {
        if let Some(entry) = store.get(column) {
            self.sounding = Some(entry.button);
            events.push(PlaybackEvent::NoteOn(entry.button));
        }
    }
}
