pub mod coordinator;
pub mod correspondence;
pub mod error;
pub mod metadata;
pub mod resolver;
pub mod score;
pub mod timing;

use std::sync::Arc;

pub use coordinator::{CoordinatorConfig, ScoreView, SyncCoordinator, Transport, TransportEvent};
pub use correspondence::{CorrespondenceIndex, CorrespondenceTable, TrackPair};
pub use error::*;
pub use metadata::MusicInfo;
pub use resolver::EquivalentTimeResolver;
pub use score::{ScoreTimeline, timeline_from_musicxml};
pub use timing::ChromaConfig;

/// Everything loaded once per session and shared read-only afterwards.
#[derive(Debug, Clone)]
pub struct SyncSession {
    pub info: MusicInfo,
    pub resolver: EquivalentTimeResolver,
    pub timeline: Arc<ScoreTimeline>,
}

/// Prepare a session from the music info record and the score's MusicXML.
/// This is the main entry point for the library.
pub fn prepare(info: MusicInfo, score_xml: &str) -> Result<SyncSession, SyncError> {
    let timeline = timeline_from_musicxml(score_xml)?;
    let resolver = info.resolver();
    tracing::info!(
        "Prepared session: {} recordings, {} cursor steps",
        info.recordings.len(),
        timeline.len()
    );
    Ok(SyncSession {
        info,
        resolver,
        timeline: Arc::new(timeline),
    })
}

impl SyncSession {
    /// Hand the session's recordings to a coordinator. `transports` must be in the
    /// same order as `info.recordings`.
    pub fn coordinator<T: Transport, V: ScoreView>(
        &self,
        transports: Vec<T>,
        view: V,
    ) -> Result<SyncCoordinator<T, V>, SyncError> {
        if transports.len() != self.info.recordings.len() {
            return Err(SyncError::MetadataError(format!(
                "{} recordings listed but {} transports given",
                self.info.recordings.len(),
                transports.len()
            )));
        }
        let reference = self.info.reference_index();
        let recordings = self
            .info
            .recordings
            .iter()
            .enumerate()
            .map(|(i, path)| coordinator::recording_title(path, i == reference))
            .zip(transports)
            .collect();
        SyncCoordinator::new(
            recordings,
            self.resolver.clone(),
            Arc::clone(&self.timeline),
            view,
            self.info.sync,
        )
    }

    /// Equivalent time in recording `to` of `seconds` in recording `from`.
    pub fn resolve(&self, from: usize, to: usize, seconds: f64) -> Result<f64, SyncError> {
        self.info.check_recording(from)?;
        self.info.check_recording(to)?;
        self.resolver.resolve(from, to, seconds)
    }
}
