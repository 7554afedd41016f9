//! # Score Module
//!
//! Put the rendered score on the clock of the reference recording and drive the
//! score cursor from playback time.
//!
//! ## Purpose
//! The score renderer exposes a cursor that can only be reset or stepped forward.
//! This module precomputes the absolute time of every cursor step so that, on
//! each polling tick, the cursor can be stepped until it catches up with the
//! music. It also remembers which pitched notes sound at each step, so a click on
//! a note can be turned into a time to seek to.
//!
//! ## Sub-modules
//! - `types` - ScorePosition, TempoMark, NoteId, CursorStep type definitions
//! - `timeline` - Timeline construction and cursor advance
//! - `musicxml` - MusicXML reader producing score positions
//!
//! ## Key Types
//! - [`ScoreTimeline`] - Immutable, non-decreasing cursor boundaries
//! - [`CursorState`] - Which boundaries are not crossed yet
//! - [`ScoreCursor`] - The renderer's cursor, stepped by `CursorState`
//!
//! ## Example
//! ```rust
//! use fred::score::{CursorState, ScoreCursor, ScoreTimeline};
//!
//! struct Steps(usize);
//! impl ScoreCursor for Steps {
//!     fn reset_cursor(&mut self) { self.0 = 0; }
//!     fn advance_cursor(&mut self) { self.0 += 1; }
//!     fn show_cursor(&mut self) {}
//! }
//!
//! let timeline = ScoreTimeline::from_boundaries(vec![0.0, 1.0, 2.5, 4.0]).unwrap();
//! let mut state = CursorState::new();
//! let mut cursor = Steps(0);
//!
//! for t in [0.2, 1.1, 2.6, 2.6, 5.0] {
//!     state.advance(&timeline, t, &mut cursor);
//! }
//! assert_eq!(cursor.0, 3);
//! assert_eq!(state.remaining(&timeline), &[4.0]);
//! ```
//!
//! ## Tempo Policy
//! Only the first tempo marking of a measure is honored; the renderer displays a
//! single tempo per measure. Until the first marking, 120 quarter-note BPM is
//! assumed.

mod types;
mod timeline;
mod musicxml;


pub use types::{BeatUnit, CursorStep, MeasureInfo, NoteId, ScoreNote, ScorePosition, ScoreSource, TempoMark};
pub use timeline::{build_timeline, CursorState, ScoreCursor, ScoreTimeline};
pub use musicxml::read_musicxml;

use crate::error::SyncError;

/// Read a MusicXML document and build its timeline.
pub fn timeline_from_musicxml(xml: &str) -> Result<ScoreTimeline, SyncError> {
    let source = read_musicxml(xml)?;
    let timeline = build_timeline(&source);
    tracing::debug!(
        "Built score timeline: {} measures, {} cursor steps",
        source.measures.len(),
        timeline.len()
    );
    Ok(timeline)
}
