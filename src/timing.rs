//! # Time Domain Conversion
//!
//! Converts between wall-clock seconds and the discrete analysis frames used by the
//! correspondence table. A frame is `hop_length` samples long at `sampling_rate`.
//!
//! Rounding to the nearest frame loses up to half a frame of precision. The
//! `residual` of a [`FramePosition`] keeps that remainder, so converting back
//! with the residual gives the original time:
//!
//! ```rust
//! use fred::timing::{frame_to_seconds, seconds_to_frame, ChromaConfig};
//!
//! let chroma = ChromaConfig::new(512, 22050).unwrap();
//! let position = seconds_to_frame(12.345, &chroma);
//! let back = frame_to_seconds(position.frame, position.residual, &chroma);
//! assert!((back - 12.345).abs() < 1e-9);
//! ```

use serde::Deserialize;

use crate::error::SyncError;

/// Analysis parameters shared by every time/frame conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawChromaConfig")]
pub struct ChromaConfig {
    hop_length: u32,
    sampling_rate: u32,
}

#[derive(Deserialize)]
struct RawChromaConfig {
    hop_length: i64,
    sampling_rate: i64,
}

impl TryFrom<RawChromaConfig> for ChromaConfig {
    type Error = SyncError;

    fn try_from(raw: RawChromaConfig) -> Result<Self, Self::Error> {
        let hop = u32::try_from(raw.hop_length).map_err(|_| {
            SyncError::MetadataError(format!("hop_length out of range: {}", raw.hop_length))
        })?;
        let rate = u32::try_from(raw.sampling_rate).map_err(|_| {
            SyncError::MetadataError(format!("sampling_rate out of range: {}", raw.sampling_rate))
        })?;
        ChromaConfig::new(hop, rate)
    }
}

impl ChromaConfig {
    pub fn new(hop_length: u32, sampling_rate: u32) -> Result<Self, SyncError> {
        if hop_length == 0 {
            return Err(SyncError::MetadataError("hop_length must be positive".to_string()));
        }
        if sampling_rate == 0 {
            return Err(SyncError::MetadataError("sampling_rate must be positive".to_string()));
        }
        Ok(Self { hop_length, sampling_rate })
    }

    pub fn hop_length(&self) -> u32 {
        self.hop_length
    }

    pub fn sampling_rate(&self) -> u32 {
        self.sampling_rate
    }

    /// Length of one frame in seconds.
    pub fn frame_duration(&self) -> f64 {
        self.hop_length as f64 / self.sampling_rate as f64
    }

    /// Frames per second, i.e. `sampling_rate / hop_length`.
    fn frames_per_second(&self) -> f64 {
        self.sampling_rate as f64 / self.hop_length as f64
    }
}

/// A time expressed as a whole frame plus the sub-frame remainder lost by rounding.
///
/// `residual` lies in `[-0.5, 0.5]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FramePosition {
    pub frame: i64,
    pub residual: f64,
}

/// Convert seconds to the nearest frame, keeping the rounding remainder.
pub fn seconds_to_frame(seconds: f64, chroma: &ChromaConfig) -> FramePosition {
    let exact = seconds * chroma.frames_per_second();
    let frame = exact.round();
    FramePosition {
        frame: frame as i64,
        residual: exact - frame,
    }
}

/// Convert a frame (plus residual) back to seconds.
pub fn frame_to_seconds(frame: i64, residual: f64, chroma: &ChromaConfig) -> f64 {
    (frame as f64 + residual) * chroma.frame_duration()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chroma() -> ChromaConfig {
        ChromaConfig::new(512, 22050).unwrap()
    }

    #[test]
    fn test_seconds_to_frame_rounds_to_nearest() {
        let chroma = chroma();
        // 1 second = 43.066... frames
        let position = seconds_to_frame(1.0, &chroma);
        assert_eq!(position.frame, 43);
        assert!((position.residual - (22050.0 / 512.0 - 43.0)).abs() < 1e-12);
    }

    #[test]
    fn test_residual_is_within_half_frame() {
        let chroma = chroma();
        for i in 0..500 {
            let t = i as f64 * 0.0137;
            let position = seconds_to_frame(t, &chroma);
            assert!(position.residual.abs() <= 0.5 + 1e-12, "residual {} at t={}", position.residual, t);
        }
    }

    #[test]
    fn test_round_trip_with_residual() {
        let chroma = chroma();
        for t in [0.0, 0.001, 0.5, 1.0, 3.14159, 59.99, 245.7, 3600.0] {
            let position = seconds_to_frame(t, &chroma);
            let back = frame_to_seconds(position.frame, position.residual, &chroma);
            assert!((back - t).abs() < 1e-9, "round trip of {} gave {}", t, back);
        }
    }

    #[test]
    fn test_round_trip_without_residual_is_bounded() {
        let chroma = chroma();
        let bound = chroma.frame_duration() / 2.0;
        for i in 0..1000 {
            let t = i as f64 * 0.0071;
            let position = seconds_to_frame(t, &chroma);
            let back = frame_to_seconds(position.frame, 0.0, &chroma);
            assert!((back - t).abs() <= bound + 1e-12);
        }
    }

    #[test]
    fn test_frame_to_seconds() {
        let chroma = chroma();
        let seconds = frame_to_seconds(13, 0.0, &chroma);
        assert!((seconds - 13.0 * 512.0 / 22050.0).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_zero_parameters() {
        assert!(ChromaConfig::new(0, 22050).is_err());
        assert!(ChromaConfig::new(512, 0).is_err());
    }

    #[test]
    fn test_deserialize_rejects_negative() {
        let result: Result<ChromaConfig, _> =
            serde_json::from_str(r#"{"hop_length": -512, "sampling_rate": 22050}"#);
        assert!(result.is_err());

        let ok: ChromaConfig =
            serde_json::from_str(r#"{"hop_length": 512, "sampling_rate": 22050}"#).unwrap();
        assert_eq!(ok.hop_length(), 512);
        assert_eq!(ok.sampling_rate(), 22050);
    }
}
