//! # Coordinator Module
//!
//! Drive the score cursor and every recording's progress display from whichever
//! recording is currently audible.
//!
//! ## Sub-modules
//! - `transport` - Collaborator traits (`Transport`, `ScoreView`) and the transport state machine
//! - `ticker` - Cancellable polling task and coordinator settings
//! - `display` - Progress/elapsed display state, title and time formatting
//! - `sync` - [`SyncCoordinator`]
//!
//! ## Control Flow
//! Everything runs on one control thread. The host:
//! 1. forwards user commands (`play`, `pause`, `stop`, `select`, seeks),
//! 2. forwards transport notifications through `handle_event`,
//! 3. calls `tick` with the current [`TickTask`] each time its timer fires.
//!
//! Pausing, stopping, switching and seeking cancel the outstanding tick before
//! doing anything else, so a tick from a superseded task never updates anything.
//!
//! ## Per-Tick Update
//! - Resolve the active recording's time on the reference recording and advance
//!   the cursor.
//! - Resolve the same moment on every recording and refresh its display.
//!
//! A missing correspondence skips only the affected update; audio keeps playing.

mod display;
mod sync;
mod ticker;
mod transport;


pub use display::{click_fraction, format_elapsed, recording_title, RecordingDisplay};
pub use sync::{Recording, SeekReport, SyncCoordinator, TickReport};
pub use ticker::{CoordinatorConfig, TickTask, Ticker};
pub use transport::{ScoreView, SheetPoint, Transport, TransportEvent, TransportState};
