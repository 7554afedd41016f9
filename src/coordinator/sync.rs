//! The synchronization coordinator

use std::sync::Arc;

use crate::error::SyncError;
use crate::resolver::EquivalentTimeResolver;
use crate::score::{CursorState, ScoreTimeline};
use super::display::RecordingDisplay;
use super::ticker::{CoordinatorConfig, TickTask, Ticker};
use super::transport::{ScoreView, SheetPoint, Transport, TransportEvent, TransportState};

/// One loaded recording.
#[derive(Debug)]
pub struct Recording<T> {
    index: usize,
    title: String,
    transport: T,
    selected: bool,
    state: TransportState,
    display: RecordingDisplay,
}

impl<T: Transport> Recording<T> {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn is_selected(&self) -> bool {
        self.selected
    }

    pub fn state(&self) -> TransportState {
        self.state
    }

    pub fn display(&self) -> &RecordingDisplay {
        &self.display
    }
}

/// What one tick did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub cursor_moved: bool,
    /// The cursor could not be placed this tick.
    pub cursor_skipped: bool,
    /// Recordings whose display was left untouched this tick.
    pub skipped: Vec<usize>,
}

/// Result of a direct seek.
#[derive(Debug, Clone, PartialEq)]
pub struct SeekReport {
    /// Recording the seek was expressed in.
    pub track: usize,
    pub time: f64,
    /// Recordings that could not be moved for lack of a correspondence.
    pub unresolved: Vec<usize>,
    /// The tick to schedule when playback resumed after the seek.
    pub tick: Option<TickTask>,
}

/// Keeps every recording, the score cursor and the progress displays in step.
///
/// Exactly one recording is active (selected) at any time; transport commands act
/// on it alone. The last recording is the reference track whose clock the score
/// timeline is expressed in.
pub struct SyncCoordinator<T, V> {
    recordings: Vec<Recording<T>>,
    active: usize,
    resolver: EquivalentTimeResolver,
    timeline: Arc<ScoreTimeline>,
    cursor: CursorState,
    view: V,
    ticker: Ticker,
}

impl<T: Transport, V: ScoreView> SyncCoordinator<T, V> {
    /// Take ownership of the recordings (in load order) and the score view.
    ///
    /// The first recording starts selected and the score cursor is shown.
    pub fn new(
        recordings: Vec<(String, T)>,
        resolver: EquivalentTimeResolver,
        timeline: Arc<ScoreTimeline>,
        mut view: V,
        config: CoordinatorConfig,
    ) -> Result<Self, SyncError> {
        if recordings.is_empty() {
            return Err(SyncError::MetadataError("at least one recording is required".to_string()));
        }

        let recordings = recordings
            .into_iter()
            .enumerate()
            .map(|(index, (title, transport))| Recording {
                index,
                title,
                transport,
                selected: index == 0,
                state: TransportState::Idle,
                display: RecordingDisplay::default(),
            })
            .collect();

        view.show_cursor();

        Ok(Self {
            recordings,
            active: 0,
            resolver,
            timeline,
            cursor: CursorState::new(),
            view,
            ticker: Ticker::new(config.tick_period()),
        })
    }

    pub fn recordings(&self) -> &[Recording<T>] {
        &self.recordings
    }

    pub fn recording(&self, index: usize) -> Option<&Recording<T>> {
        self.recordings.get(index)
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn reference_index(&self) -> usize {
        self.recordings.len() - 1
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    pub fn cursor(&self) -> &CursorState {
        &self.cursor
    }

    pub fn timeline(&self) -> &ScoreTimeline {
        &self.timeline
    }

    /// The outstanding tick, if playback is running.
    pub fn tick_task(&self) -> Option<TickTask> {
        self.ticker.active()
    }

    /// Start the active recording. Returns the tick the host should schedule.
    pub fn play(&mut self) -> Option<TickTask> {
        let active = self.active;
        let recording = &mut self.recordings[active];
        if !recording.transport.is_playing() {
            recording.transport.play();
        }
        self.apply(active, TransportEvent::Play)
    }

    pub fn pause(&mut self) {
        let active = self.active;
        self.recordings[active].transport.pause();
        self.apply(active, TransportEvent::Pause);
    }

    pub fn stop(&mut self) {
        let active = self.active;
        self.recordings[active].transport.stop();
        self.apply(active, TransportEvent::Stop);
    }

    /// Notification from a recording's transport. Events that do not change the
    /// recording's state, such as the echo of a command issued here, are no-ops,
    /// except that `Stop` and `End` on the active recording always rewind.
    pub fn handle_event(
        &mut self,
        track: usize,
        event: TransportEvent,
    ) -> Result<Option<TickTask>, SyncError> {
        self.check_index(track)?;
        Ok(self.apply(track, event))
    }

    fn apply(&mut self, track: usize, event: TransportEvent) -> Option<TickTask> {
        let recording = &mut self.recordings[track];
        let from = recording.state;
        let to = from.on_event(event);
        recording.state = to;
        if from != to {
            tracing::debug!("Recording {}: {:?} -> {:?} on {:?}", track, from, to, event);
        }

        match (to, event) {
            // Stop and End rewind from any state.
            (TransportState::Idle, TransportEvent::Stop | TransportEvent::End) => {
                self.ticker.cancel_for(track);
                if track == self.active {
                    self.rewind();
                }
                None
            }
            _ if from == to => None,
            (TransportState::Playing, _) if track == self.active => Some(self.ticker.start(track)),
            (TransportState::Paused, _) => {
                self.ticker.cancel_for(track);
                None
            }
            _ => None,
        }
    }

    /// Cursor back to the first step and every display zeroed.
    fn rewind(&mut self) {
        self.cursor.reset(&mut self.view);
        for recording in &mut self.recordings {
            recording.display.reset();
        }
    }

    /// Run one polling tick. Stale tasks (cancelled or superseded) do nothing
    /// and return `None`.
    pub fn tick(&mut self, task: &TickTask) -> Option<TickReport> {
        if !self.ticker.is_current(task) {
            tracing::trace!("Ignoring stale tick for recording {}", task.track);
            return None;
        }

        let active = self.active;
        let reference = self.reference_index();
        let current_time = self.recordings[active].transport.current_time();
        let mut report = TickReport::default();

        match self.resolver.resolve(active, reference, current_time) {
            Ok(score_time) => {
                report.cursor_moved = self.cursor.advance(&self.timeline, score_time, &mut self.view);
            }
            Err(e) => {
                tracing::debug!("Cursor not updated this tick: {}", e);
                report.cursor_skipped = true;
            }
        }

        for recording in &mut self.recordings {
            match self.resolver.resolve(active, recording.index, current_time) {
                Ok(time) => {
                    let duration = recording.transport.duration();
                    recording.display.update(time, duration);
                }
                Err(e) => {
                    tracing::debug!("Display of recording {} not updated this tick: {}", recording.index, e);
                    report.skipped.push(recording.index);
                }
            }
        }

        Some(report)
    }

    /// Make `index` the active recording, keeping the musical position.
    ///
    /// Everything is paused, the new recording is moved to the time equivalent to
    /// where the old one was, and playback resumes if the old one was playing. If
    /// the alignment has no entry for that moment the new recording keeps its own
    /// position.
    pub fn select(&mut self, index: usize) -> Result<Option<TickTask>, SyncError> {
        self.check_index(index)?;
        if index == self.active {
            return Ok(None);
        }

        let old = self.active;
        let was_playing = self.recordings[old].transport.is_playing();
        self.pause_all();

        let old_time = self.recordings[old].transport.current_time();
        self.recordings[old].selected = false;
        self.recordings[index].selected = true;
        self.active = index;

        match self.resolver.resolve(old, index, old_time) {
            Ok(time) => {
                tracing::info!("Switching from recording {} at {:.3}s to recording {} at {:.3}s", old, old_time, index, time);
                self.recordings[index].transport.seek(time);
            }
            Err(e) => tracing::warn!("Switching to recording {} without repositioning: {}", index, e),
        }

        if was_playing {
            return Ok(self.play());
        }
        Ok(None)
    }

    /// Progress-bar click: move `track` to `fraction` of its duration and everything
    /// else to the equivalent moment.
    pub fn seek_to_fraction(&mut self, track: usize, fraction: f64) -> Result<SeekReport, SyncError> {
        self.check_index(track)?;
        let duration = self.recordings[track].transport.duration();
        let time = fraction.clamp(0.0, 1.0) * duration;
        Ok(self.seek_all_from(track, time))
    }

    /// Score click: move every recording to the moment of the note nearest to
    /// `point`. Returns `None`, changing nothing, when no known note is there.
    pub fn seek_to_note(&mut self, point: SheetPoint) -> Option<SeekReport> {
        let note = self.view.nearest_note_at(point)?;
        let time = match self.timeline.timestamp_of(note) {
            Some(time) => time,
            None => {
                tracing::debug!("Note {:?} has no timestamp", note);
                return None;
            }
        };
        let reference = self.reference_index();
        Some(self.seek_all_from(reference, time))
    }

    /// Seek `track` to `time` and every other recording to the equivalent moment,
    /// then re-place the cursor. Resumes playback if anything was playing, in which
    /// case the report carries the new tick.
    pub fn seek_all_from(&mut self, track: usize, time: f64) -> SeekReport {
        let was_playing = self.recordings.iter().any(|r| r.transport.is_playing());
        self.pause_all();

        let mut unresolved = Vec::new();
        for recording in &mut self.recordings {
            match self.resolver.resolve(track, recording.index, time) {
                Ok(equivalent) => {
                    recording.transport.seek(equivalent);
                    let duration = recording.transport.duration();
                    recording.display.update(equivalent, duration);
                }
                Err(e) => {
                    tracing::warn!("Recording {} not moved: {}", recording.index, e);
                    unresolved.push(recording.index);
                }
            }
        }

        let reference = self.reference_index();
        match self.resolver.resolve(track, reference, time) {
            Ok(score_time) => {
                self.cursor.fast_forward(&self.timeline, score_time, &mut self.view);
            }
            Err(e) => {
                tracing::debug!("Cursor reset without replay: {}", e);
                self.cursor.reset(&mut self.view);
            }
        }
        tracing::info!("Seek to {:.3}s in recording {}", time, track);

        let tick = if was_playing { self.play() } else { None };

        SeekReport {
            track,
            time,
            unresolved,
            tick,
        }
    }

    /// Pause every recording and cancel the tick.
    pub fn pause_all(&mut self) {
        self.ticker.cancel();
        for index in 0..self.recordings.len() {
            let recording = &mut self.recordings[index];
            if recording.transport.is_playing() {
                recording.transport.pause();
            }
            self.apply(index, TransportEvent::Pause);
        }
    }

    fn check_index(&self, index: usize) -> Result<(), SyncError> {
        if index >= self.recordings.len() {
            return Err(SyncError::InvalidSelection {
                index,
                count: self.recordings.len(),
            });
        }
        Ok(())
    }
}
