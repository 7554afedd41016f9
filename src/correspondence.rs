//! # Correspondence Index
//!
//! Read-only lookup over the precomputed frame-correspondence table.
//!
//! The table maps an ordered pair of recordings to a bag of `(from_frame, to_frame)`
//! pairs produced by the upstream alignment. The bag is not sorted, not one-to-one
//! and may contain duplicates. Queries happen on every polling tick for every
//! recording, so entries are grouped by `(pair, from_frame)` once at load time.
//!
//! A frame with no entry is a normal outcome of a sparse alignment; `lookup`
//! returns an empty slice and the caller decides what that means.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::error::SyncError;

/// Ordered pair of recording indices, `from != to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TrackPair {
    pub from: usize,
    pub to: usize,
}

impl TrackPair {
    pub fn new(from: usize, to: usize) -> Self {
        Self { from, to }
    }
}

impl fmt::Display for TrackPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{};{}", self.from, self.to)
    }
}

/// Parses the `"i;j"` keys used by the music info record.
impl FromStr for TrackPair {
    type Err = SyncError;

    fn from_str(key: &str) -> Result<Self, Self::Err> {
        let invalid = |message: &str| SyncError::InvalidPair {
            key: key.to_string(),
            message: message.to_string(),
        };

        let (from, to) = key
            .split_once(';')
            .ok_or_else(|| invalid("expected two recording indices separated by ';'"))?;
        let from: usize = from
            .trim()
            .parse()
            .map_err(|_| invalid("source index is not a non-negative integer"))?;
        let to: usize = to
            .trim()
            .parse()
            .map_err(|_| invalid("target index is not a non-negative integer"))?;

        if from == to {
            return Err(invalid("a recording cannot map to itself"));
        }
        Ok(Self { from, to })
    }
}

/// Raw correspondence pairs per recording pair, as delivered by the alignment step.
pub type CorrespondenceTable = HashMap<TrackPair, Vec<(i64, i64)>>;

/// Correspondence pairs grouped by `(pair, from_frame)`.
#[derive(Debug, Clone, Default)]
pub struct CorrespondenceIndex {
    groups: HashMap<TrackPair, HashMap<i64, Vec<i64>>>,
}

impl CorrespondenceIndex {
    pub fn new(table: CorrespondenceTable) -> Self {
        let mut groups: HashMap<TrackPair, HashMap<i64, Vec<i64>>> = HashMap::with_capacity(table.len());

        for (pair, entries) in table {
            if entries.is_empty() {
                tracing::warn!("Correspondence table for pair {} is empty", pair);
            }
            let by_frame = groups.entry(pair).or_default();
            for (from_frame, to_frame) in entries {
                // Duplicates are kept.
                by_frame.entry(from_frame).or_default().push(to_frame);
            }
        }

        Self { groups }
    }

    /// All target frames paired with `frame` for the given recording pair.
    pub fn lookup(&self, pair: TrackPair, frame: i64) -> &[i64] {
        self.groups
            .get(&pair)
            .and_then(|by_frame| by_frame.get(&frame))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}
