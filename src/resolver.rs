//! # Equivalent Time Resolver
//!
//! Answers "the listener is at `t` seconds in recording A: where is the same musical
//! moment in recording B?".
//!
//! ## Algorithm
//! 1. Same recording: return `t` unchanged.
//! 2. Convert `t` to a frame of A, keeping the sub-frame residual.
//! 3. Collect every frame of B paired with that frame.
//! 4. None: [`SyncError::NoCorrespondence`].
//! 5. Several (many-to-one alignment): take the arithmetic mean, rounded to the
//!    nearest frame. Duplicates count once per occurrence.
//! 6. Convert back to seconds, reusing A's residual on B's side.
//!
//! The residual carried in step 6 is an approximation: the true sub-frame offset in
//! B is unknown, but a frame is short relative to audible drift.

use std::sync::Arc;

use crate::correspondence::{CorrespondenceIndex, TrackPair};
use crate::error::SyncError;
use crate::timing::{frame_to_seconds, seconds_to_frame, ChromaConfig};

#[derive(Debug, Clone)]
pub struct EquivalentTimeResolver {
    chroma: ChromaConfig,
    index: Arc<CorrespondenceIndex>,
}

impl EquivalentTimeResolver {
    pub fn new(chroma: ChromaConfig, index: Arc<CorrespondenceIndex>) -> Self {
        Self { chroma, index }
    }

    pub fn chroma(&self) -> &ChromaConfig {
        &self.chroma
    }

    pub fn index(&self) -> &CorrespondenceIndex {
        &self.index
    }

    /// Equivalent time in recording `to` of `current_time` seconds in recording `from`.
    pub fn resolve(&self, from: usize, to: usize, current_time: f64) -> Result<f64, SyncError> {
        if from == to {
            return Ok(current_time);
        }

        let pair = TrackPair::new(from, to);
        let position = seconds_to_frame(current_time, &self.chroma);
        let candidates = self.index.lookup(pair, position.frame);

        let target_frame = mean_frame(candidates).ok_or(SyncError::NoCorrespondence {
            pair,
            frame: position.frame,
        })?;

        Ok(frame_to_seconds(target_frame, position.residual, &self.chroma))
    }
}

/// Rounded arithmetic mean of the candidate frames, `None` when there are none.
fn mean_frame(candidates: &[i64]) -> Option<i64> {
    if candidates.is_empty() {
        return None;
    }
    // Summed as i128 so large frame numbers cannot overflow.
    let sum: i128 = candidates.iter().map(|&f| f as i128).sum();
    let mean = sum as f64 / candidates.len() as f64;
    Some(mean.round() as i64)
}
