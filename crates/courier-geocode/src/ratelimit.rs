//! Sliding one-minute window admission control for outbound provider calls.
//!
//! Keeps the timestamps of admitted requests for the trailing 60 seconds;
//! a request is admitted only while fewer than `limit` timestamps remain in
//! the window. Cache hits never reach the limiter.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

const WINDOW: Duration = Duration::from_secs(60);

#[derive(Debug)]
pub struct SlidingWindow {
    limit: usize,
    timestamps: VecDeque<Instant>,
}

impl SlidingWindow {
    #[must_use]
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            timestamps: VecDeque::new(),
        }
    }

    /// Admits one request if budget remains, recording its timestamp.
    pub fn try_acquire(&mut self) -> bool {
        self.try_acquire_at(Instant::now())
    }

    fn try_acquire_at(&mut self, now: Instant) -> bool {
        self.prune(now);
        if self.timestamps.len() >= self.limit {
            return false;
        }
        self.timestamps.push_back(now);
        true
    }

    /// How many requests can still be admitted in the current window.
    pub fn remaining(&mut self) -> usize {
        self.prune(Instant::now());
        self.limit - self.timestamps.len()
    }

    /// How long until the oldest in-window request ages out and frees a slot.
    /// Zero when budget is already available.
    pub fn retry_after(&mut self) -> Duration {
        let now = Instant::now();
        self.prune(now);
        if self.timestamps.len() < self.limit {
            return Duration::ZERO;
        }
        self.timestamps
            .front()
            .map_or(Duration::ZERO, |oldest| {
                WINDOW.saturating_sub(now.duration_since(*oldest))
            })
    }

    #[must_use]
    pub fn limit(&self) -> usize {
        self.limit
    }

    fn prune(&mut self, now: Instant) {
        while self
            .timestamps
            .front()
            .is_some_and(|t| now.duration_since(*t) >= WINDOW)
        {
            self.timestamps.pop_front();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admits_up_to_limit_then_rejects() {
        let mut window = SlidingWindow::new(3);
        let now = Instant::now();
        assert!(window.try_acquire_at(now));
        assert!(window.try_acquire_at(now));
        assert!(window.try_acquire_at(now));
        assert!(!window.try_acquire_at(now), "fourth request must be rejected");
    }

    #[test]
    fn slots_free_up_after_window_elapses() {
        let mut window = SlidingWindow::new(1);
        let start = Instant::now();
        assert!(window.try_acquire_at(start));
        assert!(!window.try_acquire_at(start + Duration::from_secs(59)));
        assert!(
            window.try_acquire_at(start + Duration::from_secs(61)),
            "timestamp older than 60s must be pruned"
        );
    }

    #[test]
    fn zero_limit_rejects_everything() {
        let mut window = SlidingWindow::new(0);
        assert!(!window.try_acquire_at(Instant::now()));
    }

    #[test]
    fn remaining_reflects_admitted_requests() {
        let mut window = SlidingWindow::new(5);
        let now = Instant::now();
        assert!(window.try_acquire_at(now));
        assert!(window.try_acquire_at(now));
        assert_eq!(window.remaining(), 3);
    }

    #[test]
    fn retry_after_is_zero_with_budget_available() {
        let mut window = SlidingWindow::new(2);
        assert!(window.try_acquire());
        assert_eq!(window.retry_after(), Duration::ZERO);
    }

    #[test]
    fn retry_after_is_bounded_by_window_when_exhausted() {
        let mut window = SlidingWindow::new(1);
        assert!(window.try_acquire());
        let wait = window.retry_after();
        assert!(wait > Duration::ZERO && wait <= WINDOW, "got {wait:?}");
    }
}
