/// Session - owns all note grid state and turns user actions into component calls
use std::time::Duration;

use log::{debug, info};

use crate::audio::SamplePlayer;
use crate::config::Config;
use crate::render::{LineCanvas, LineStyle};
use crate::sequencer::playback::{Clock, PlaybackEvent, SequencePlayer};
use crate::sequencer::scale::ScaleMode;
use crate::sequencer::{
    ButtonId, Instrument, NoteGrid, Pitch, PlaybackConfig, Point, SelectionEntry, SelectionStore,
};

pub struct Session<P: SamplePlayer, C: Clock> {
    grid: NoteGrid,
    store: SelectionStore,
    scale: ScaleMode,
    playback: PlaybackConfig,
    sequence: SequencePlayer,
    canvas: LineCanvas,
    player: P,
    clock: C,
    // End of a clicked note's beat
    release_at: Option<Duration>,
}

impl<P: SamplePlayer, C: Clock> Session<P, C> {
    pub fn new(
        columns: usize,
        playback: PlaybackConfig,
        style: LineStyle,
        player: P,
        clock: C,
    ) -> Self {
        let mut grid = NoteGrid::new(columns);
        let scale = ScaleMode::default();
        grid.apply_scale(&playback.instrument, scale);

        Self {
            grid,
            store: SelectionStore::new(columns),
            scale,
            sequence: SequencePlayer::new(playback.note_duration()),
            playback,
            canvas: LineCanvas::new(style),
            player,
            clock,
            release_at: None,
        }
    }

    pub fn from_config(config: &Config, player: P, clock: C) -> Self {
        Self::new(config.columns, config.playback(), config.line_style(), player, clock)
    }

    pub fn grid(&self) -> &NoteGrid {
        &self.grid
    }

    pub fn store(&self) -> &SelectionStore {
        &self.store
    }

    pub fn canvas(&self) -> &LineCanvas {
        &self.canvas
    }

    pub fn scale(&self) -> ScaleMode {
        self.scale
    }

    pub fn instrument(&self) -> &Instrument {
        &self.playback.instrument
    }

    pub fn playback(&self) -> &PlaybackConfig {
        &self.playback
    }

    pub fn player(&self) -> &P {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut P {
        &mut self.player
    }

    pub fn is_playing(&self) -> bool {
        self.sequence.is_running()
    }

    /// Time left until the session needs another `tick`
    pub fn time_to_next_step(&self) -> Option<Duration> {
        let deadline = match (self.sequence.next_deadline(), self.release_at) {
            (Some(step), Some(release)) => Some(step.min(release)),
            (step, release) => step.or(release),
        };
        deadline.map(|deadline| deadline.saturating_sub(self.clock.now()))
    }

    /// Pick a note. Returns false when the button is disabled and the click is ignored.
    pub fn click_note(&mut self, column: usize, pitch: Pitch, center: Point) -> bool {
        let button = ButtonId { column, pitch };
        if self.grid.button(button).is_disabled() {
            debug!("ignored click on disabled {} in column {}", pitch, column);
            return false;
        }

        self.sound(pitch);
        self.release_at = Some(self.clock.now() + self.playback.note_duration());
        self.store.select(column, SelectionEntry { pitch, center, button });
        self.grid.select(button);
        self.canvas.redraw(&self.store);
        true
    }

    pub fn set_instrument(&mut self, instrument: Instrument) {
        if instrument == self.playback.instrument {
            return;
        }

        info!("instrument changed to {}", instrument);
        self.playback.instrument = instrument;
        self.refresh_scale();
        self.canvas.redraw(&self.store);
    }

    pub fn set_yonabuki(&mut self, enabled: bool) {
        self.scale.yonabuki = enabled;
        self.refresh_scale();
    }

    pub fn set_nirobuki(&mut self, enabled: bool) {
        self.scale.nirobuki = enabled;
        self.refresh_scale();
    }

    // Selections of newly disabled notes are kept and still play.
    fn refresh_scale(&mut self) {
        self.grid.apply_scale(&self.playback.instrument, self.scale);
    }

    pub fn play(&mut self) {
        let events = self.sequence.start(self.clock.now(), &self.store);
        self.apply(events);
    }

    pub fn reset(&mut self) {
        if self.release_at.take().is_some() {
            self.player.release();
        }
        for entry in self.store.occupied() {
            self.grid.deselect(entry.button);
        }
        self.store.clear();
        self.canvas.clear();
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.canvas.resize(width, height);
        self.canvas.redraw(&self.store);
    }

    /// Drive the sequence and any held click forward to the clock's current time
    pub fn tick(&mut self) {
        let now = self.clock.now();
        if self.release_at.is_some_and(|at| now >= at) {
            self.release_at = None;
            self.player.release();
        }

        if !self.sequence.is_running() {
            return;
        }
        let events = self.sequence.advance(now, &self.store);
        self.apply(events);
    }

    // At most one note sounds: the previous one is cut before the next starts.
    fn sound(&mut self, pitch: Pitch) {
        self.release_at = None;
        self.player.stop();
        self.player.play(&self.playback.instrument, pitch);
    }

    fn apply(&mut self, events: Vec<PlaybackEvent>) {
        for event in events {
            match event {
                PlaybackEvent::NoteOn(button) => {
                    self.sound(button.pitch);
                    self.grid.set_playing(button, true);
                }
                PlaybackEvent::NoteOff(button) => {
                    self.player.release();
                    self.grid.set_playing(button, false);
                }
                // The last sounding note already got its NoteOff
                PlaybackEvent::Finished => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequencer::playback::ManualClock;

    #[derive(Default)]
    struct Recorder {
        played: Vec<(String, Pitch)>,
        stops: usize,
        releases: usize,
    }

    impl SamplePlayer for Recorder {
        fn play(&mut self, instrument: &Instrument, pitch: Pitch) {
            self.played.push((instrument.id().to_string(), pitch));
        }

        fn stop(&mut self) {
            self.stops += 1;
        }

        fn release(&mut self) {
            self.releases += 1;
        }
    }

    fn session(columns: usize) -> (Session<Recorder, ManualClock>, ManualClock) {
        let clock = ManualClock::new();
        let session = Session::new(
            columns,
            PlaybackConfig::default(),
            LineStyle::default(),
            Recorder::default(),
            clock.clone(),
        );
        (session, clock)
    }

    fn at(column: usize) -> Point {
        Point::new(column as f32 * 50.0, 20.0)
    }

    #[test]
    fn test_click_selects_plays_and_draws() {
        let (mut session, _) = session(3);
        assert!(session.click_note(0, Pitch::C, at(0)));
        assert!(session.click_note(1, Pitch::E, at(1)));

        assert_eq!(
            session.player().played,
            vec![("piano".to_string(), Pitch::C), ("piano".to_string(), Pitch::E)]
        );
        assert_eq!(session.store().occupied().count(), 2);
        assert_eq!(session.canvas().segments().len(), 1);
        assert!(session.grid().button(ButtonId { column: 1, pitch: Pitch::E }).is_selected());
    }

    #[test]
    fn test_reclick_in_column_replaces_selection() {
        let (mut session, _) = session(2);
        session.click_note(0, Pitch::C, at(0));
        session.click_note(0, Pitch::A, Point::new(5.0, 90.0));

        let entry = session.store().get(0).copied().unwrap();
        assert_eq!(entry.pitch, Pitch::A);
        assert_eq!(entry.center, Point::new(5.0, 90.0));
        let selected: Vec<_> = session
            .grid()
            .column(0)
            .iter()
            .filter(|b| b.is_selected())
            .map(|b| b.pitch())
            .collect();
        assert_eq!(selected, vec![Pitch::A]);
    }

    #[test]
    fn test_disabled_click_is_ignored() {
        let (mut session, _) = session(2);
        session.set_instrument(Instrument::koto());
        session.set_yonabuki(true);

        assert!(!session.click_note(0, Pitch::F, at(0)));
        assert!(session.player().played.is_empty());
        assert!(session.store().get(0).is_none());
        assert!(!session.grid().button(ButtonId { column: 0, pitch: Pitch::F }).is_selected());
    }

    #[test]
    fn test_scale_follows_instrument_and_toggles() {
        let (mut session, _) = session(1);
        session.set_nirobuki(true);
        assert!(session.grid().buttons().all(|b| !b.is_disabled()));

        session.set_instrument(Instrument::koto());
        let disabled: Vec<_> = session
            .grid()
            .buttons()
            .filter(|b| b.is_disabled())
            .map(|b| b.pitch())
            .collect();
        assert_eq!(disabled, vec![Pitch::D, Pitch::A]);

        session.set_nirobuki(false);
        assert!(session.grid().buttons().all(|b| !b.is_disabled()));
    }

    #[test]
    fn test_disabling_keeps_existing_selection() {
        let (mut session, clock) = session(1);
        session.set_instrument(Instrument::koto());
        session.click_note(0, Pitch::B, at(0));
        session.set_yonabuki(true);

        let button = session.grid().button(ButtonId { column: 0, pitch: Pitch::B });
        assert!(button.is_selected() && button.is_disabled());

        session.play();
        clock.advance(session.playback().note_duration());
        session.tick();
        assert_eq!(
            session.player().played,
            vec![("koto".to_string(), Pitch::B), ("koto".to_string(), Pitch::B)]
        );
    }

    #[test]
    fn test_reset_clears_everything() {
        let (mut session, _) = session(3);
        session.click_note(0, Pitch::C, at(0));
        session.click_note(1, Pitch::D, at(1));
        session.click_note(2, Pitch::E, at(2));
        session.reset();

        assert!(session.store().entries().iter().all(Option::is_none));
        assert!(session.canvas().segments().is_empty());
        assert!(session.grid().buttons().all(|b| !b.is_selected()));
    }

    #[test]
    fn test_play_marks_and_unmarks_buttons() {
        let (mut session, clock) = session(2);
        session.click_note(0, Pitch::G, at(0));
        session.click_note(1, Pitch::A, at(1));
        let beat = session.playback().note_duration();

        session.play();
        assert!(session.is_playing());
        assert!(session.grid().button(ButtonId { column: 0, pitch: Pitch::G }).is_playing());

        clock.advance(beat);
        session.tick();
        assert!(!session.grid().button(ButtonId { column: 0, pitch: Pitch::G }).is_playing());
        assert!(session.grid().button(ButtonId { column: 1, pitch: Pitch::A }).is_playing());

        clock.advance(beat);
        session.tick();
        assert!(!session.is_playing());
        assert!(session.grid().buttons().all(|b| !b.is_playing()));
    }

    #[test]
    fn test_second_play_while_running_is_ignored() {
        let (mut session, clock) = session(2);
        session.click_note(0, Pitch::C, at(0));
        let clicks = session.player().played.len();

        session.play();
        clock.advance(Duration::from_millis(100));
        session.play();

        assert_eq!(session.player().played.len(), clicks + 1);
        assert_eq!(
            session.time_to_next_step(),
            Some(session.playback().note_duration() - Duration::from_millis(100))
        );
    }

    #[test]
    fn test_resize_redraws_with_stored_positions() {
        let (mut session, _) = session(2);
        session.click_note(0, Pitch::C, at(0));
        session.click_note(1, Pitch::C, at(1));
        session.resize(640.0, 480.0);

        assert_eq!((session.canvas().width(), session.canvas().height()), (640.0, 480.0));
        assert_eq!(session.canvas().segments()[0].from, at(0));
        assert_eq!(session.canvas().segments()[0].to, at(1));
    }

    #[test]
    fn test_clicked_note_released_after_a_beat() {
        let (mut session, clock) = session(2);
        session.click_note(0, Pitch::C, at(0));
        assert_eq!(session.player().stops, 1);
        assert_eq!(session.time_to_next_step(), Some(session.playback().note_duration()));

        clock.advance(session.playback().note_duration() / 2);
        session.tick();
        assert_eq!(session.player().releases, 0);

        clock.advance(session.playback().note_duration());
        session.tick();
        assert_eq!(session.player().releases, 1);
        assert_eq!(session.time_to_next_step(), None);

        session.tick();
        assert_eq!(session.player().releases, 1);
    }

    #[test]
    fn test_reset_releases_held_click() {
        let (mut session, _) = session(1);
        session.click_note(0, Pitch::D, at(0));
        session.reset();
        assert_eq!(session.player().releases, 1);

        session.reset();
        assert_eq!(session.player().releases, 1);
    }

    #[test]
    fn test_every_sequence_note_is_released() {
        let (mut session, clock) = session(3);
        session.click_note(0, Pitch::C, at(0));
        session.click_note(1, Pitch::E, at(1));
        let beat = session.playback().note_duration();

        // Sequence notes take over from the pending click release
        session.play();
        assert_eq!(session.time_to_next_step(), Some(beat));
        for _ in 0..3 {
            clock.advance(beat);
            session.tick();
        }

        assert!(!session.is_playing());
        assert_eq!(session.player().played.len(), 4);
        assert_eq!(session.player().releases, 2);
    }
}
