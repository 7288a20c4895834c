use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use notegrid::{
    Clock, Instrument, LineStyle, ManualClock, Pitch, PlaybackConfig, Point, SamplePlayer, Session,
};

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Stop,
    Play(Duration, Pitch),
    Release(Duration),
}

/// Records calls with the time they happened at
struct TimedRecorder {
    clock: ManualClock,
    calls: Rc<RefCell<Vec<Call>>>,
}

impl SamplePlayer for TimedRecorder {
    fn play(&mut self, _instrument: &Instrument, pitch: Pitch) {
        self.calls.borrow_mut().push(Call::Play(self.clock.now(), pitch));
    }

    fn stop(&mut self) {
        self.calls.borrow_mut().push(Call::Stop);
    }

    fn release(&mut self) {
        self.calls.borrow_mut().push(Call::Release(self.clock.now()));
    }
}

type Calls = Rc<RefCell<Vec<Call>>>;

fn setup(columns: usize) -> (Session<TimedRecorder, ManualClock>, ManualClock, Calls) {
    let clock = ManualClock::new();
    let calls = Rc::new(RefCell::new(Vec::new()));
    let recorder = TimedRecorder {
        clock: clock.clone(),
        calls: Rc::clone(&calls),
    };
    let session = Session::new(
        columns,
        PlaybackConfig::default(),
        LineStyle::default(),
        recorder,
        clock.clone(),
    );
    (session, clock, calls)
}

fn plays(calls: &[Call]) -> Vec<(Duration, Pitch)> {
    calls
        .iter()
        .filter_map(|call| match call {
            Call::Play(at, pitch) => Some((*at, *pitch)),
            _ => None,
        })
        .collect()
}

/// Step the clock in small increments the way GUI frames would
fn run_until_idle(session: &mut Session<TimedRecorder, ManualClock>, clock: &ManualClock) {
    while session.is_playing() {
        clock.advance(Duration::from_millis(1));
        session.tick();
    }
}

#[test]
fn test_gap_column_plays_silence() {
    let (mut session, clock, calls) = setup(3);
    session.click_note(0, Pitch::C, Point::new(10.0, 10.0));
    session.click_note(2, Pitch::G, Point::new(110.0, 40.0));
    assert!(session.canvas().segments().is_empty());

    calls.borrow_mut().clear();
    clock.set(Duration::from_secs(5));
    let start = clock.now();
    session.play();
    run_until_idle(&mut session, &clock);

    let beat = PlaybackConfig::default().note_duration();
    let played = plays(&calls.borrow());
    assert_eq!(played.len(), 2);

    let (first_at, first) = played[0];
    let (second_at, second) = played[1];
    assert_eq!((first_at - start, first), (Duration::ZERO, Pitch::C));
    assert_eq!(second, Pitch::G);

    // Frames are 1 ms apart, so the second note lands within a millisecond of 2 beats
    let offset = second_at - start;
    assert!(offset >= beat * 2 && offset < beat * 2 + Duration::from_millis(1));

    // 3 beats total
    let finished = clock.now() - start;
    assert!(finished >= beat * 3 && finished < beat * 3 + Duration::from_millis(1));
}

#[test]
fn test_duration_is_same_for_empty_and_full_rows() {
    let beat = PlaybackConfig::default().note_duration();

    for picks in [vec![], vec![0, 1, 2, 3]] {
        let (mut session, clock, _) = setup(4);
        for column in picks {
            session.click_note(column, Pitch::E, Point::new(column as f32, 0.0));
        }

        session.play();
        run_until_idle(&mut session, &clock);
        let elapsed = clock.now();
        assert!(elapsed >= beat * 4 && elapsed < beat * 4 + Duration::from_millis(1));
    }
}

#[test]
fn test_reset_mid_sequence_silences_rest() {
    let (mut session, clock, calls) = setup(3);
    session.click_note(0, Pitch::C, Point::default());
    session.click_note(1, Pitch::D, Point::default());
    session.click_note(2, Pitch::E, Point::default());
    calls.borrow_mut().clear();

    session.play();
    clock.advance(Duration::from_millis(100));
    session.tick();
    session.reset();
    run_until_idle(&mut session, &clock);

    assert_eq!(plays(&calls.borrow()), vec![(Duration::ZERO, Pitch::C)]);
    assert!(matches!(calls.borrow().last(), Some(Call::Release(_))));
    assert!(session.grid().buttons().all(|b| !b.is_playing() && !b.is_selected()));
}

#[test]
fn test_selection_tracks_latest_click_per_column() {
    let (mut session, _, _) = setup(4);
    let clicks = [
        (0, Pitch::C),
        (1, Pitch::D),
        (0, Pitch::B),
        (3, Pitch::F),
        (1, Pitch::A),
        (1, Pitch::G),
    ];
    for (column, pitch) in clicks {
        session.click_note(column, pitch, Point::default());
    }

    let picked: Vec<_> = session
        .store()
        .entries()
        .iter()
        .map(|slot| slot.map(|entry| entry.pitch))
        .collect();
    assert_eq!(picked, vec![Some(Pitch::B), Some(Pitch::G), None, Some(Pitch::F)]);

    for column in 0..4 {
        let selected = session.grid().column(column).iter().filter(|b| b.is_selected()).count();
        assert!(selected <= 1);
    }
}

#[test]
fn test_previous_note_stopped_before_next_plays() {
    let (mut session, _, calls) = setup(2);
    session.click_note(0, Pitch::C, Point::default());
    session.click_note(1, Pitch::G, Point::default());

    assert_eq!(
        *calls.borrow(),
        vec![
            Call::Stop,
            Call::Play(Duration::ZERO, Pitch::C),
            Call::Stop,
            Call::Play(Duration::ZERO, Pitch::G),
        ]
    );
}

#[test]
fn test_sequence_notes_are_stopped_then_released() {
    let (mut session, clock, calls) = setup(3);
    session.click_note(0, Pitch::C, Point::default());
    session.click_note(1, Pitch::E, Point::default());
    calls.borrow_mut().clear();

    session.play();
    run_until_idle(&mut session, &clock);

    let calls = calls.borrow();
    let beat = PlaybackConfig::default().note_duration();
    assert_eq!(calls.len(), 6);
    assert_eq!(calls[0], Call::Stop);
    assert_eq!(calls[1], Call::Play(Duration::ZERO, Pitch::C));
    assert!(matches!(calls[2], Call::Release(at) if at >= beat));
    assert_eq!(calls[3], Call::Stop);
    assert!(matches!(calls[4], Call::Play(_, Pitch::E)));
    assert!(matches!(calls[5], Call::Release(at) if at >= beat * 2));
}
