//! Integration tests for fred
//!
//! Tests the full pipeline from a music info record and a MusicXML score to a
//! running coordinator.

use std::cell::RefCell;
use std::rc::Rc;

use fred::coordinator::{SheetPoint, TransportState};
use fred::score::{NoteId, ScoreCursor};
use fred::{prepare, MusicInfo, ScoreView, SyncError, SyncSession, Transport};

const REFERENCE: &str = "static/tmp/songs/minuet_sid_0f8fad5b-d9cb-469f-a165-70867728950e.wav";

const SCORE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<score-partwise version="4.0">
  <part-list>
    <score-part id="P1"><part-name>Violin</part-name></score-part>
  </part-list>
  <part id="P1">
    <measure number="1">
      <attributes><divisions>1</divisions></attributes>
      <direction>
        <direction-type>
          <metronome><beat-unit>quarter</beat-unit><per-minute>60</per-minute></metronome>
        </direction-type>
      </direction>
      <note><pitch><step>G</step><octave>4</octave></pitch><duration>1</duration></note>
      <note><pitch><step>A</step><octave>4</octave></pitch><duration>1</duration></note>
      <note><pitch><step>B</step><octave>4</octave></pitch><duration>1</duration></note>
      <note><pitch><step>C</step><octave>5</octave></pitch><duration>1</duration></note>
    </measure>
  </part>
</score-partwise>
"#;

fn frame_time(frame: f64) -> f64 {
    frame * 512.0 / 22050.0
}

/// Two recordings aligned frame for frame, except that frame 10 of the first
/// matches frames 12 and 14 of the second and frame 500 has no match at all.
fn info_json() -> String {
    let forward: Vec<(i64, i64)> = (0..400i64)
        .filter(|&f| f != 10)
        .map(|f| (f, f))
        .chain([(10, 12), (10, 14)])
        .collect();
    let backward: Vec<(i64, i64)> = (0..400i64).map(|f| (f, f)).collect();
    serde_json::json!({
        "score": ["static/tmp/scores/minuet.musicxml"],
        "recordings": ["static/tmp/songs/take_1.wav", REFERENCE],
        "chroma": {"hop_length": 512, "sampling_rate": 22050},
        "frame_equivalence": {"0;1": forward, "1;0": backward}
    })
    .to_string()
}

fn session() -> SyncSession {
    let info = MusicInfo::from_json(&info_json()).unwrap();
    prepare(info, SCORE).unwrap()
}

#[derive(Debug, Default)]
struct Deck {
    time: f64,
    playing: bool,
    seeks: Vec<f64>,
}

#[derive(Debug, Clone, Default)]
struct Player(Rc<RefCell<Deck>>);

impl Transport for Player {
    fn current_time(&self) -> f64 {
        self.0.borrow().time
    }

    fn duration(&self) -> f64 {
        8.0
    }

    fn seek(&mut self, seconds: f64) {
        let mut deck = self.0.borrow_mut();
        deck.time = seconds;
        deck.seeks.push(seconds);
    }

    fn play(&mut self) {
        self.0.borrow_mut().playing = true;
    }

    fn pause(&mut self) {
        self.0.borrow_mut().playing = false;
    }

    fn stop(&mut self) {
        let mut deck = self.0.borrow_mut();
        deck.playing = false;
        deck.time = 0.0;
    }

    fn is_playing(&self) -> bool {
        self.0.borrow().playing
    }
}

#[derive(Debug, Default)]
struct Sheet {
    position: usize,
    clicked: Option<NoteId>,
}

impl ScoreCursor for Sheet {
    fn reset_cursor(&mut self) {
        self.position = 0;
    }

    fn advance_cursor(&mut self) {
        self.position += 1;
    }

    fn show_cursor(&mut self) {}
}

impl ScoreView for Sheet {
    fn nearest_note_at(&self, _point: SheetPoint) -> Option<NoteId> {
        self.clicked
    }
}

#[test]
fn test_prepare_builds_timeline_from_score() {
    let session = session();
    let boundaries = session.timeline.boundaries();
    assert_eq!(boundaries.len(), 4);
    for (actual, expected) in boundaries.iter().zip([0.0, 1.0, 2.0, 3.0]) {
        assert!((actual - expected).abs() < 1e-9);
    }
    assert!((session.timeline.timestamp_of(NoteId(2)).unwrap() - 2.0).abs() < 1e-9);
}

#[test]
fn test_resolve_averages_several_candidates() {
    let session = session();
    let time = session.resolve(0, 1, frame_time(10.0)).unwrap();
    assert!((time - frame_time(13.0)).abs() < 1e-9);
}

#[test]
fn test_resolve_reports_missing_frame() {
    let session = session();
    let result = session.resolve(0, 1, frame_time(500.0));
    assert!(matches!(
        result,
        Err(SyncError::NoCorrespondence { frame: 500, .. })
    ));
}

#[test]
fn test_resolve_rejects_unknown_recording() {
    let session = session();
    assert!(matches!(
        session.resolve(0, 2, 1.0),
        Err(SyncError::InvalidSelection { index: 2, count: 2 })
    ));
}

#[test]
fn test_coordinator_titles_and_reference() {
    let session = session();
    let coordinator = session
        .coordinator(vec![Player::default(), Player::default()], Sheet::default())
        .unwrap();
    assert_eq!(coordinator.recordings()[0].title(), "take 1");
    assert_eq!(coordinator.recordings()[1].title(), "minuet");
    assert_eq!(coordinator.reference_index(), 1);
    assert!(coordinator.recordings()[0].is_selected());
}

#[test]
fn test_coordinator_requires_one_transport_per_recording() {
    let session = session();
    let result = session.coordinator(vec![Player::default()], Sheet::default());
    assert!(matches!(result, Err(SyncError::MetadataError(_))));
}

#[test]
fn test_playback_moves_cursor_and_displays() {
    let session = session();
    let first = Player::default();
    let second = Player::default();
    let mut coordinator = session
        .coordinator(vec![first.clone(), second.clone()], Sheet::default())
        .unwrap();

    let task = coordinator.play().expect("play should schedule a tick");
    assert!(first.is_playing());

    first.0.borrow_mut().time = 1.2;
    let report = coordinator.tick(&task).unwrap();
    assert!(report.cursor_moved);
    assert!(report.skipped.is_empty());
    assert_eq!(coordinator.view().position, 1);

    let display = coordinator.recordings()[1].display();
    assert!((display.progress - 1.2 / 8.0).abs() < 1e-9);
    assert_eq!(display.elapsed_label(), "00:01");
}

#[test]
fn test_switch_while_playing_keeps_position() {
    let session = session();
    let first = Player::default();
    let second = Player::default();
    let mut coordinator = session
        .coordinator(vec![first.clone(), second.clone()], Sheet::default())
        .unwrap();

    let old_task = coordinator.play().unwrap();
    first.0.borrow_mut().time = frame_time(10.0);

    let new_task = coordinator.select(1).unwrap().expect("playback should resume");
    assert_eq!(new_task.track, 1);
    assert!(!first.is_playing());
    assert!(second.is_playing());
    assert_eq!(coordinator.active_index(), 1);
    assert_eq!(coordinator.recordings()[0].state(), TransportState::Paused);

    let seeks = second.0.borrow().seeks.clone();
    assert_eq!(seeks.len(), 1);
    assert!((seeks[0] - frame_time(13.0)).abs() < 1e-9);

    assert!(coordinator.tick(&old_task).is_none());
    assert!(coordinator.tick(&new_task).is_some());
}

#[test]
fn test_score_click_seeks_every_recording() {
    let session = session();
    let first = Player::default();
    let second = Player::default();
    let mut coordinator = session
        .coordinator(vec![first.clone(), second.clone()], Sheet::default())
        .unwrap();

    coordinator.view_mut().clicked = Some(NoteId(2));
    let report = coordinator
        .seek_to_note(SheetPoint { x: 10.0, y: 20.0 })
        .expect("note has a timestamp");

    assert_eq!(report.track, 1);
    assert!(report.unresolved.is_empty());
    assert!((first.current_time() - 2.0).abs() < 0.05);
    assert!((second.current_time() - 2.0).abs() < 0.05);
    assert_eq!(coordinator.view().position, 2);
    assert!(!first.is_playing());
}

#[test]
fn test_stop_resets_cursor() {
    let session = session();
    let first = Player::default();
    let mut coordinator = session
        .coordinator(vec![first.clone(), Player::default()], Sheet::default())
        .unwrap();

    let task = coordinator.play().unwrap();
    first.0.borrow_mut().time = 2.5;
    coordinator.tick(&task);
    assert_eq!(coordinator.view().position, 2);

    coordinator.stop();
    assert_eq!(coordinator.view().position, 0);
    assert_eq!(coordinator.cursor().position(), 0);
    assert!(coordinator.tick(&task).is_none());
    assert_eq!(coordinator.recordings()[1].display().progress, 0.0);
}
