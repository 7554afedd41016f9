//! Score timeline type definitions
//!
//! This module defines the types that describe a rendered score as a sequence of
//! cursor steps, and the tempo information needed to put them on a clock.

use serde::Serialize;

/// Note value that a tempo marking counts in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BeatUnit {
    Double,
    Whole,
    Half,
    Quarter,
    Eighth,
    Sixteenth,
    ThirtySecond,
}

impl BeatUnit {
    /// Parse a MusicXML `<beat-unit>` name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim() {
            "breve" | "double" => Some(Self::Double),
            "whole" => Some(Self::Whole),
            "half" => Some(Self::Half),
            "quarter" => Some(Self::Quarter),
            "eighth" => Some(Self::Eighth),
            "16th" | "sixteenth" => Some(Self::Sixteenth),
            "32nd" | "thirty-second" => Some(Self::ThirtySecond),
            _ => None,
        }
    }

    /// Length of this note value as a fraction of a whole note.
    pub fn fraction(&self) -> f64 {
        match self {
            Self::Double => 2.0,
            Self::Whole => 1.0,
            Self::Half => 0.5,
            Self::Quarter => 0.25,
            Self::Eighth => 0.125,
            Self::Sixteenth => 0.0625,
            Self::ThirtySecond => 0.03125,
        }
    }
}

/// A tempo marking: `bpm` beats per minute, where one beat is `beat_unit`
/// (1.5x longer when dotted).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TempoMark {
    pub bpm: f64,
    pub beat_unit: BeatUnit,
    pub dotted: bool,
}

impl Default for TempoMark {
    fn default() -> Self {
        Self {
            bpm: 120.0,
            beat_unit: BeatUnit::Quarter,
            dotted: false,
        }
    }
}

impl TempoMark {
    /// Beat length as a fraction of a whole note, dot included.
    pub fn beat_fraction(&self) -> f64 {
        let base = self.beat_unit.fraction();
        if self.dotted {
            base * 1.5
        } else {
            base
        }
    }

    pub fn seconds_per_beat(&self) -> f64 {
        60.0 / self.bpm
    }

    /// Seconds taken by one whole note at this tempo.
    pub fn seconds_per_whole_note(&self) -> f64 {
        self.seconds_per_beat() / self.beat_fraction()
    }
}

/// Identity of a pitched note in the score.
///
/// The score renderer answers nearest-note queries with one of these; ids are
/// assigned in document order when the score is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NoteId(pub usize);

/// A pitched note sounding at a cursor step.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreNote {
    pub id: NoteId,
    pub midi_note: u8,
}

/// Per-measure information relevant to timing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeasureInfo {
    /// Tempo markings in the order they appear. Only the first one is honored.
    pub tempo_marks: Vec<TempoMark>,
}

/// One position the score cursor stops at.
///
/// `offset` is measured in whole notes from the start of the score.
#[derive(Debug, Clone, PartialEq)]
pub struct ScorePosition {
    pub measure_index: usize,
    pub offset: f64,
    pub notes: Vec<ScoreNote>,
}

/// Time-ordered cursor positions plus the measure tempo map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreSource {
    pub measures: Vec<MeasureInfo>,
    pub positions: Vec<ScorePosition>,
}

/// A cursor step placed on the clock.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CursorStep {
    pub time: f64,
    pub measure_index: usize,
    pub notes: Vec<ScoreNote>,
}
