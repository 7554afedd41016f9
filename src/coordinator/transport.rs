//! Collaborator interfaces and the per-recording transport state machine

use crate::score::{NoteId, ScoreCursor};

/// Audio playback for one recording.
///
/// Implementations wrap whatever actually decodes and plays the audio. Times are
/// in seconds from the start of the recording.
pub trait Transport {
    fn current_time(&self) -> f64;
    fn duration(&self) -> f64;
    fn seek(&mut self, seconds: f64);
    fn play(&mut self);
    fn pause(&mut self);
    fn stop(&mut self);
    fn is_playing(&self) -> bool;
}

/// A point in the renderer's sheet coordinate space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SheetPoint {
    pub x: f64,
    pub y: f64,
}

/// The rendered score: its cursor plus a geometric nearest-note query.
pub trait ScoreView: ScoreCursor {
    fn nearest_note_at(&self, point: SheetPoint) -> Option<NoteId>;
}

/// Notification delivered by a recording's transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportEvent {
    Play,
    Pause,
    Stop,
    /// Playback reached the end of the recording.
    End,
}

/// Transport state of one recording.
///
/// ```text
/// Idle --Play--> Playing --Pause--> Paused
///                Playing --Stop/End--> Idle
///                Paused  --Play--> Playing
///                Paused  --Stop/End--> Idle
/// ```
///
/// Any other event leaves the state unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TransportState {
    #[default]
    Idle,
    Playing,
    Paused,
}

impl TransportState {
    pub fn on_event(self, event: TransportEvent) -> Self {
        use TransportEvent as E;
        use TransportState as S;

        match (self, event) {
            (S::Idle, E::Play) | (S::Paused, E::Play) => S::Playing,
            (S::Playing, E::Pause) => S::Paused,
            (S::Playing, E::Stop | E::End) | (S::Paused, E::Stop | E::End) => S::Idle,
            (state, _) => state,
        }
    }
}
