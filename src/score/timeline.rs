//! Score timeline construction and cursor advance
//!
//! Places every cursor position of the score on the clock of the reference
//! recording, then consumes those boundaries as playback time moves forward.

use std::collections::HashMap;

use crate::error::SyncError;
use super::types::{CursorStep, NoteId, ScoreSource, TempoMark};

/// The score-side collaborator that owns the visual cursor.
pub trait ScoreCursor {
    /// Put the cursor back on the first position of the score.
    fn reset_cursor(&mut self);
    /// Move the cursor forward one position.
    fn advance_cursor(&mut self);
    fn show_cursor(&mut self);
}

/// Absolute time of every cursor step, built once and never mutated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreTimeline {
    boundaries: Vec<f64>,
    steps: Vec<CursorStep>,
    note_steps: HashMap<NoteId, usize>,
}

/// Build the timeline for a score.
///
/// Walks the positions once. Whenever a new measure carries a tempo marking the
/// first marking becomes the current tempo (120 quarter-note BPM until the first
/// marking). Time accumulates piecewise: a position `offset` whole notes into the
/// score sits at
///
/// ```text
/// anchor_time + (offset - anchor_offset) * (60 / bpm) / beat_fraction
/// ```
///
/// where the anchor is the position at which the current tempo took effect. With
/// a single tempo this is `offset * seconds_per_beat / beat_fraction`.
///
/// # Example
/// ```rust
/// use fred::score::{build_timeline, BeatUnit, MeasureInfo, ScorePosition, ScoreSource, TempoMark};
///
/// let source = ScoreSource {
///     measures: vec![MeasureInfo {
///         tempo_marks: vec![TempoMark { bpm: 60.0, beat_unit: BeatUnit::Quarter, dotted: false }],
///     }],
///     positions: (0..4)
///         .map(|i| ScorePosition { measure_index: 0, offset: i as f64 * 0.25, notes: vec![] })
///         .collect(),
/// };
///
/// let timeline = build_timeline(&source);
/// assert_eq!(timeline.boundaries(), &[0.0, 1.0, 2.0, 3.0]);
/// ```
pub fn build_timeline(source: &ScoreSource) -> ScoreTimeline {
    let mut tempo = TempoMark::default();
    let mut anchor_offset = 0.0;
    let mut anchor_time = 0.0;
    let mut last_measure: Option<usize> = None;

    let mut steps = Vec::with_capacity(source.positions.len());

    for position in &source.positions {
        if last_measure != Some(position.measure_index) {
            // Markings in measures without positions of their own still apply.
            let first_unvisited = last_measure.map(|m| m + 1).unwrap_or(0);
            let start = first_unvisited.min(position.measure_index);
            for measure_index in start..=position.measure_index {
                if let Some(mark) = source
                    .measures
                    .get(measure_index)
                    .and_then(|m| m.tempo_marks.first())
                {
                    if !(mark.bpm > 0.0) {
                        tracing::warn!("Ignoring tempo marking with {} BPM in measure {}", mark.bpm, measure_index + 1);
                        continue;
                    }
                    anchor_time += (position.offset - anchor_offset) * tempo.seconds_per_whole_note();
                    anchor_offset = position.offset;
                    tempo = *mark;
                }
            }
            last_measure = Some(position.measure_index);
        }

        let time = anchor_time + (position.offset - anchor_offset) * tempo.seconds_per_whole_note();
        steps.push(CursorStep {
            time,
            measure_index: position.measure_index,
            notes: position.notes.clone(),
        });
    }

    ScoreTimeline::from_steps(steps)
}

impl ScoreTimeline {
    fn from_steps(steps: Vec<CursorStep>) -> Self {
        let boundaries = steps.iter().map(|s| s.time).collect();
        let mut note_steps = HashMap::new();
        for (index, step) in steps.iter().enumerate() {
            for note in &step.notes {
                note_steps.entry(note.id).or_insert(index);
            }
        }
        Self {
            boundaries,
            steps,
            note_steps,
        }
    }

    /// Timeline from raw boundaries, with no notes attached.
    pub fn from_boundaries(boundaries: Vec<f64>) -> Result<Self, SyncError> {
        if let Some(i) = boundaries.windows(2).position(|w| !(w[0] <= w[1])) {
            return Err(SyncError::MetadataError(format!(
                "cursor boundaries must be non-decreasing (step {} at {} follows {})",
                i + 1,
                boundaries[i + 1],
                boundaries[i]
            )));
        }
        let steps = boundaries
            .into_iter()
            .map(|time| CursorStep {
                time,
                measure_index: 0,
                notes: Vec::new(),
            })
            .collect();
        Ok(Self::from_steps(steps))
    }

    pub fn boundaries(&self) -> &[f64] {
        &self.boundaries
    }

    pub fn steps(&self) -> &[CursorStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.boundaries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boundaries.is_empty()
    }

    /// Absolute time of the step a note sounds at.
    pub fn timestamp_of(&self, note: NoteId) -> Option<f64> {
        self.note_steps.get(&note).map(|&i| self.boundaries[i])
    }
}

/// Which boundaries of a [`ScoreTimeline`] the cursor has not crossed yet.
///
/// `remaining()[0]` is the step the cursor currently sits on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CursorState {
    position: usize,
}

impl CursorState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of the step the cursor sits on.
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn remaining<'a>(&self, timeline: &'a ScoreTimeline) -> &'a [f64] {
        timeline.boundaries.get(self.position..).unwrap_or(&[])
    }

    /// Back to the full boundary sequence, moving the visual cursor with it.
    pub fn reset(&mut self, cursor: &mut dyn ScoreCursor) {
        self.position = 0;
        cursor.reset_cursor();
    }

    /// Cross every boundary at or before `current_time`.
    ///
    /// Steps the cursor while `current_time` has reached the *next* boundary; the
    /// current one is already crossed. Once fewer than two boundaries remain the
    /// timeline is exhausted and this is a no-op. Time must not go backwards
    /// between resets. Returns whether the cursor moved.
    pub fn advance(
        &mut self,
        timeline: &ScoreTimeline,
        current_time: f64,
        cursor: &mut dyn ScoreCursor,
    ) -> bool {
        let mut moved = false;
        while let Some(&next) = timeline.boundaries.get(self.position + 1) {
            if current_time < next || current_time.is_nan() {
                break;
            }
            self.position += 1;
            cursor.advance_cursor();
            moved = true;
        }
        moved
    }

    /// Reset, then replay the timeline up to `current_time`. Used after any seek.
    pub fn fast_forward(
        &mut self,
        timeline: &ScoreTimeline,
        current_time: f64,
        cursor: &mut dyn ScoreCursor,
    ) -> bool {
        self.reset(cursor);
        self.advance(timeline, current_time, cursor)
    }
}
