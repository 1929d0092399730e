// src/app/schedule.rs
//! Frame-polled timers. Nothing here spawns threads: the UI loop calls
//! `poll(now)` every frame and acts on whatever fired.
use std::time::{Duration, Instant};

/// Cancellable delayed task carrying a value. Each `schedule` replaces the
/// pending value and restarts the quiet period.
pub struct Debouncer<T> {
    quiet: Duration,
    pending: Option<(Instant, T)>,
}

impl<T> Debouncer<T> {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            pending: None,
        }
    }

    pub fn schedule(&mut self, value: T, now: Instant) {
        self.pending = Some((now + self.quiet, value));
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Time left before the pending value fires (for repaint scheduling).
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.pending
            .as_ref()
            .map(|(due, _)| due.saturating_duration_since(now))
    }

    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match &self.pending {
            Some((due, _)) if now >= *due => self.pending.take().map(|(_, v)| v),
            _ => None,
        }
    }
}

/// One-shot timer.
pub struct Delay {
    fire_at: Option<Instant>,
}

impl Delay {
    pub fn new(after: Duration, now: Instant) -> Self {
        Self {
            fire_at: Some(now + after),
        }
    }

    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.fire_at.map(|at| at.saturating_duration_since(now))
    }

    /// True exactly once, on the first poll at or after the deadline.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.fire_at {
            Some(at) if now >= at => {
                self.fire_at = None;
                true
            }
            _ => false,
        }
    }
}
