//! # Music Info
//!
//! The record describing one synchronization session: the score file, the
//! recordings in load order, the analysis parameters and the correspondence table.
//!
//! ## Format
//! JSON as written by the alignment step, or the same structure in YAML:
//!
//! ```json
//! {
//!   "score": ["static/tmp/scores/minuet.musicxml"],
//!   "recordings": ["static/tmp/songs/take_1.wav", "static/tmp/songs/minuet_sid_....wav"],
//!   "chroma": { "hop_length": 512, "sampling_rate": 22050 },
//!   "frame_equivalence": { "0;1": [[0, 0], [1, 3]], "1;0": [[0, 0], [3, 1]] },
//!   "sync": { "tick_period_ms": 10 }
//! }
//! ```
//!
//! `score` may also be a single string. `sync` is optional. The last recording is
//! the reference track.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;

use crate::coordinator::CoordinatorConfig;
use crate::correspondence::{CorrespondenceIndex, CorrespondenceTable, TrackPair};
use crate::error::SyncError;
use crate::resolver::EquivalentTimeResolver;
use crate::timing::ChromaConfig;

/// Validated music info.
#[derive(Debug, Clone)]
pub struct MusicInfo {
    pub score: String,
    pub recordings: Vec<String>,
    pub chroma: ChromaConfig,
    pub correspondence: CorrespondenceTable,
    pub sync: CoordinatorConfig,
}

/// Raw record for JSON/YAML deserialization
#[derive(Deserialize, Debug)]
pub struct RawMusicInfo {
    pub score: ScoreRef,
    pub recordings: Vec<String>,
    pub chroma: ChromaConfig,
    #[serde(default)]
    pub frame_equivalence: HashMap<String, Vec<(i64, i64)>>,
    #[serde(default)]
    pub sync: CoordinatorConfig,
}

#[derive(Deserialize, Debug)]
#[serde(untagged)]
pub enum ScoreRef {
    One(String),
    Many(Vec<String>),
}

impl MusicInfo {
    pub fn from_json(text: &str) -> Result<Self, SyncError> {
        let raw: RawMusicInfo =
            serde_json::from_str(text).map_err(|e| SyncError::MetadataError(e.to_string()))?;
        Self::from_raw(raw)
    }

    pub fn from_yaml(text: &str) -> Result<Self, SyncError> {
        let raw: RawMusicInfo =
            serde_yaml::from_str(text).map_err(|e| SyncError::MetadataError(e.to_string()))?;
        Self::from_raw(raw)
    }

    pub fn from_raw(raw: RawMusicInfo) -> Result<Self, SyncError> {
        let score = match raw.score {
            ScoreRef::One(path) => path,
            ScoreRef::Many(mut paths) => {
                if paths.len() != 1 {
                    return Err(SyncError::MetadataError(format!(
                        "expected exactly one score file, found {}",
                        paths.len()
                    )));
                }
                paths.remove(0)
            }
        };

        if raw.recordings.is_empty() {
            return Err(SyncError::MetadataError("at least one recording is required".to_string()));
        }
        let count = raw.recordings.len();

        let mut correspondence = CorrespondenceTable::with_capacity(raw.frame_equivalence.len());
        for (key, entries) in raw.frame_equivalence {
            let pair: TrackPair = key.parse()?;
            if pair.from >= count || pair.to >= count {
                return Err(SyncError::InvalidPair {
                    key,
                    message: format!("only {} recordings are loaded", count),
                });
            }
            correspondence.insert(pair, entries);
        }

        for from in 0..count {
            for to in (0..count).filter(|&to| to != from) {
                let pair = TrackPair::new(from, to);
                if !correspondence.contains_key(&pair) {
                    tracing::warn!("No correspondence table for recordings {}", pair);
                }
            }
        }

        Ok(Self {
            score,
            recordings: raw.recordings,
            chroma: raw.chroma,
            correspondence,
            sync: raw.sync,
        })
    }

    /// Index of the recording the score cursor is timed against.
    pub fn reference_index(&self) -> usize {
        self.recordings.len() - 1
    }

    pub fn check_recording(&self, index: usize) -> Result<(), SyncError> {
        if index >= self.recordings.len() {
            return Err(SyncError::InvalidSelection {
                index,
                count: self.recordings.len(),
            });
        }
        Ok(())
    }

    /// Group the correspondence table for lookups.
    pub fn resolver(&self) -> EquivalentTimeResolver {
        let index = CorrespondenceIndex::new(self.correspondence.clone());
        EquivalentTimeResolver::new(self.chroma, Arc::new(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INFO: &str = r#"{
        "score": ["fred/static/tmp/scores/minuet.musicxml"],
        "recordings": ["fred/static/tmp/songs/a.wav", "fred/static/tmp/songs/b.wav"],
        "chroma": {"hop_length": 512, "sampling_rate": 22050},
        "frame_equivalence": {"0;1": [[10, 12], [10, 14]], "1;0": [[12, 10], [14, 10]]}
    }"#;

    #[test]
    fn test_from_json() {
        let info = MusicInfo::from_json(INFO).unwrap();
        assert_eq!(info.score, "fred/static/tmp/scores/minuet.musicxml");
        assert_eq!(info.recordings.len(), 2);
        assert_eq!(info.reference_index(), 1);
        assert_eq!(info.chroma.hop_length(), 512);
        assert_eq!(
            info.correspondence[&TrackPair::new(0, 1)],
            vec![(10, 12), (10, 14)]
        );
        assert_eq!(info.sync, CoordinatorConfig::default());
    }

    #[test]
    fn test_from_yaml() {
        let yaml = r#"
score: minuet.musicxml
recordings:
  - a.wav
  - b.wav
chroma:
  hop_length: 1024
  sampling_rate: 44100
frame_equivalence:
  "0;1": [[0, 0], [1, 2]]
sync:
  tick_period_ms: 20
"#;
        let info = MusicInfo::from_yaml(yaml).unwrap();
        assert_eq!(info.score, "minuet.musicxml");
        assert_eq!(info.chroma.sampling_rate(), 44100);
        assert_eq!(info.sync.tick_period_ms, 20);
        assert_eq!(info.correspondence.len(), 1);
    }

    #[test]
    fn test_rejects_several_scores() {
        let json = INFO.replace(
            r#"["fred/static/tmp/scores/minuet.musicxml"]"#,
            r#"["a.musicxml", "b.musicxml"]"#,
        );
        assert!(matches!(
            MusicInfo::from_json(&json),
            Err(SyncError::MetadataError(_))
        ));
    }

    #[test]
    fn test_rejects_pair_out_of_range() {
        let json = INFO.replace("\"1;0\"", "\"2;0\"");
        assert!(matches!(
            MusicInfo::from_json(&json),
            Err(SyncError::InvalidPair { .. })
        ));
    }

    #[test]
    fn test_rejects_self_pair() {
        let json = INFO.replace("\"1;0\"", "\"1;1\"");
        assert!(MusicInfo::from_json(&json).is_err());
    }

    #[test]
    fn test_rejects_bad_chroma() {
        let json = INFO.replace("\"hop_length\": 512", "\"hop_length\": 0");
        assert!(MusicInfo::from_json(&json).is_err());
    }

    #[test]
    fn test_resolver_from_info() {
        let info = MusicInfo::from_json(INFO).unwrap();
        let resolver = info.resolver();
        let ten = 10.0 * 512.0 / 22050.0;
        let thirteen = 13.0 * 512.0 / 22050.0;
        assert!((resolver.resolve(0, 1, ten).unwrap() - thirteen).abs() < 1e-9);
        assert!(info.check_recording(1).is_ok());
        assert!(info.check_recording(2).is_err());
    }

    #[test]
    fn test_rejects_no_recordings() {
        let json = r#"{"score": "s.musicxml", "recordings": [], "chroma": {"hop_length": 512, "sampling_rate": 22050}}"#;
        assert!(MusicInfo::from_json(json).is_err());
    }
}
