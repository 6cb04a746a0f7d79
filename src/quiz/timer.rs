use std::time::{Duration, Instant};

/// Per-question clock. Records when the question was shown and, in Timed
/// mode, when it runs out. Never reads the wall clock itself: every query
/// takes the instant to evaluate at.
#[derive(Debug, Clone, Copy)]
pub struct Countdown {
    started_at: Instant,
    limit: Option<Duration>,
}

impl Countdown {
    pub fn start(at: Instant, limit: Option<Duration>) -> Self {
        Self { started_at: at, limit }
    }

    pub fn restart(&mut self, at: Instant) {
        self.started_at = at;
    }

    /// Instant after which the question counts as unanswered.
    pub fn deadline(&self) -> Option<Instant> {
        self.limit.map(|limit| self.started_at + limit)
    }

    /// Time since the question was shown. Instants before the start clamp to zero.
    pub fn elapsed(&self, at: Instant) -> Duration {
        at.saturating_duration_since(self.started_at)
    }

    pub fn remaining(&self, at: Instant) -> Option<Duration> {
        self.limit.map(|limit| limit.saturating_sub(self.elapsed(at)))
    }

    pub fn is_expired(&self, at: Instant) -> bool {
        match self.limit {
            Some(limit) => self.elapsed(at) >= limit,
            None => false,
        }
    }
}
