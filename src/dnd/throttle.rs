use std::time::{Duration, Instant};

/// Leading + trailing throttle with "latest wins" coalescing.
///
/// The first value after a quiet interval commits immediately. Values that
/// arrive inside the interval replace each other, and the freshest one
/// commits on the first [`Throttle::poll`] after the interval elapses.
#[derive(Debug, Clone)]
pub struct Throttle<T> {
    interval: Duration,
    last_commit: Option<Instant>,
    pending: Option<T>,
}

impl<T> Throttle<T> {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_commit: None,
            pending: None,
        }
    }

    fn is_open(&self, now: Instant) -> bool {
        self.last_commit
            .is_none_or(|last| now.saturating_duration_since(last) >= self.interval)
    }

    /// Returns the value when it may be applied right away.
    pub fn offer(&mut self, value: T, now: Instant) -> Option<T> {
        if self.is_open(now) {
            self.last_commit = Some(now);
            self.pending = None;
            Some(value)
        } else {
            self.pending = Some(value);
            None
        }
    }

    /// Releases the coalesced value once the interval has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        if self.pending.is_some() && self.is_open(now) {
            self.last_commit = Some(now);
            return self.pending.take();
        }
        None
    }

    /// Takes the pending value regardless of timing.
    pub fn take_pending(&mut self) -> Option<T> {
        self.pending.take()
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn cancel(&mut self) {
        self.pending = None;
        self.last_commit = None;
    }
}
