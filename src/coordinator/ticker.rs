//! Cancellable repeating tick
//!
//! The host owns the actual timer. The coordinator hands out a [`TickTask`] when
//! playback starts, and the host passes it back every time its timer fires. Only
//! the most recently started task is current: starting a new one or cancelling
//! makes every earlier task stale, and stale ticks are ignored.

use std::time::Duration;

use serde::Deserialize;

/// Coordinator settings.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    /// Polling period in milliseconds.
    pub tick_period_ms: u64,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self { tick_period_ms: 10 }
    }
}

impl CoordinatorConfig {
    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_period_ms.max(1))
    }
}

/// Handle for one scheduled repeating tick, bound to the recording that started it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickTask {
    pub track: usize,
    pub period: Duration,
    generation: u64,
}

#[derive(Debug, Clone)]
pub struct Ticker {
    period: Duration,
    generation: u64,
    active: Option<TickTask>,
}

impl Ticker {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            generation: 0,
            active: None,
        }
    }

    /// Start a tick for `track`, superseding any outstanding one.
    pub fn start(&mut self, track: usize) -> TickTask {
        self.generation += 1;
        let task = TickTask {
            track,
            period: self.period,
            generation: self.generation,
        };
        self.active = Some(task);
        task
    }

    pub fn cancel(&mut self) -> Option<TickTask> {
        self.active.take()
    }

    /// Cancel only if the outstanding tick belongs to `track`.
    pub fn cancel_for(&mut self, track: usize) -> Option<TickTask> {
        if self.active.is_some_and(|task| task.track == track) {
            self.active.take()
        } else {
            None
        }
    }

    pub fn active(&self) -> Option<TickTask> {
        self.active
    }

    pub fn is_current(&self, task: &TickTask) -> bool {
        self.active.as_ref() == Some(task)
    }
}
