//! Request-rate circuit breaker.
//!
//! Each admitted call holds a slot until the window elapses. Once more than
//! `ceiling` slots are live the guard trips, which catches re-render loops
//! that fire the same request over and over. It is a heuristic: concurrent
//! callers on one client may race on the count without harm.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Sliding-window call counter.
#[derive(Debug)]
pub struct LoopGuard {
    ceiling: usize,
    window: Duration,
    calls: Mutex<VecDeque<Instant>>,
}

impl LoopGuard {
    /// Allow at most `ceiling` calls per `window`.
    pub fn new(ceiling: usize, window: Duration) -> Self {
        LoopGuard {
            ceiling,
            window,
            calls: Mutex::new(VecDeque::new()),
        }
    }

    /// Record a call and report whether it may proceed.
    ///
    /// The call is counted even when it is refused, so a storm keeps the
    /// guard tripped until callers back off for a full window.
    pub fn admit(&self) -> bool {
        self.admit_at(Instant::now())
    }

    fn admit_at(&self, now: Instant) -> bool {
        let mut calls = self.calls.lock();
        while calls
            .front()
            .is_some_and(|&t| now.saturating_duration_since(t) >= self.window)
        {
            calls.pop_front();
        }
        calls.push_back(now);
        calls.len() <= self.ceiling
    }

    /// Calls currently counted against the ceiling.
    pub fn outstanding(&self) -> usize {
        let now = Instant::now();
        self.calls
            .lock()
            .iter()
            .filter(|&&t| now.saturating_duration_since(t) < self.window)
            .count()
    }

    /// The configured ceiling.
    pub fn ceiling(&self) -> usize {
        self.ceiling
    }
}
