//! # Error Types
//!
//! This module defines all error types for the synchronization engine.
//!
//! Errors fall into two groups:
//! - **Recoverable at runtime**: `NoCorrespondence` is expected for sparse
//!   alignments. The coordinator skips the affected display update for one tick
//!   and carries on; playback is never interrupted.
//! - **Load-time / programming errors**: `MetadataError`, `InvalidPair`,
//!   `ParseError` and `InvalidSelection` are surfaced to the caller and not retried.
//!
//! Reaching the end of the score timeline is not an error: cursor advance simply
//! returns `false`.
//!
//! ## Usage
//! ```rust
//! use fred::{SyncError, TrackPair};
//!
//! let err = SyncError::NoCorrespondence { pair: TrackPair::new(0, 1), frame: 42 };
//! match err {
//!     SyncError::NoCorrespondence { .. } => { /* skip this tick */ }
//!     e => eprintln!("Error: {}", e),
//! }
//! ```

use thiserror::Error;

use crate::correspondence::TrackPair;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SyncError {
    /// No correspondence entry for the requested source frame.
    ///
    /// # Example
    /// ```
    /// # use fred::{SyncError, TrackPair};
    /// let err = SyncError::NoCorrespondence { pair: TrackPair::new(0, 2), frame: 431 };
    /// assert_eq!(err.to_string(), "No correspondence for frame 431 from recording 0 to recording 2");
    /// ```
    #[error("No correspondence for frame {frame} from recording {} to recording {}", .pair.from, .pair.to)]
    NoCorrespondence { pair: TrackPair, frame: i64 },

    /// A selection referenced a recording that does not exist.
    ///
    /// # Example
    /// ```
    /// # use fred::SyncError;
    /// let err = SyncError::InvalidSelection { index: 5, count: 3 };
    /// assert_eq!(err.to_string(), "Invalid selection: recording 5 does not exist (3 loaded)");
    /// ```
    #[error("Invalid selection: recording {index} does not exist ({count} loaded)")]
    InvalidSelection { index: usize, count: usize },

    /// A correspondence table key could not be used.
    ///
    /// # Example
    /// ```
    /// # use fred::SyncError;
    /// let err = SyncError::InvalidPair { key: "1;1".to_string(), message: "a recording cannot map to itself".to_string() };
    /// assert_eq!(err.to_string(), "Invalid recording pair '1;1': a recording cannot map to itself");
    /// ```
    #[error("Invalid recording pair '{key}': {message}")]
    InvalidPair { key: String, message: String },

    /// Invalid or unreadable music info record.
    ///
    /// # Example
    /// ```
    /// # use fred::SyncError;
    /// let err = SyncError::MetadataError("hop_length must be positive".to_string());
    /// assert_eq!(err.to_string(), "Invalid metadata: hop_length must be positive");
    /// ```
    #[error("Invalid metadata: {0}")]
    MetadataError(String),

    /// MusicXML score could not be read.
    ///
    /// # Example
    /// ```
    /// # use fred::SyncError;
    /// let err = SyncError::ParseError { measure: Some(3), message: "divisions must be positive".to_string() };
    /// assert_eq!(err.to_string(), "Score parse error (measure 3): divisions must be positive");
    /// ```
    #[error("Score parse error{}: {message}", .measure.map(|m| format!(" (measure {})", m)).unwrap_or_default())]
    ParseError {
        measure: Option<usize>,
        message: String,
    },
}
