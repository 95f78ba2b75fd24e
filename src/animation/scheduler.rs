//! Frame scheduling and time sources injected into the book.
//!
//! The engine never owns a timer. It asks its scheduler for a frame whenever
//! visual state changes, and the host calls `Book::render_frame` when that
//! frame is due. Tests substitute [`ManualScheduler`] and [`ManualClock`] to
//! step animations deterministically.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Requests animation frames from the host
pub trait FrameScheduler: fmt::Debug {
    /// Ask for `Book::render_frame` to be called on the next frame
    fn schedule_frame(&mut self);

    /// Drop any pending frame request
    fn cancel(&mut self);

    /// Whether a frame is currently requested
    fn is_pending(&self) -> bool;
}

/// Scheduler for tests and hosts that poll explicitly
#[derive(Debug, Default, Clone)]
pub struct ManualScheduler {
    pending: Rc<Cell<bool>>,
    requests: Rc<Cell<u64>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume the pending request, returning whether there was one
    pub fn take_pending(&self) -> bool {
        self.pending.replace(false)
    }

    /// Total number of frame requests seen
    pub fn requests(&self) -> u64 {
        self.requests.get()
    }
}

impl FrameScheduler for ManualScheduler {
    fn schedule_frame(&mut self) {
        self.pending.set(true);
        self.requests.set(self.requests.get().wrapping_add(1));
    }

    fn cancel(&mut self) {
        self.pending.set(false);
    }

    fn is_pending(&self) -> bool {
        self.pending.get()
    }
}

/// Scheduler backed by an atomic flag shared with a tick loop
#[derive(Debug, Default, Clone)]
pub struct FlagScheduler {
    flag: Arc<AtomicBool>,
}

impl FlagScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle the host polls on every tick
    pub fn flag(&self) -> Arc<AtomicBool> {
        self.flag.clone()
    }

    /// Consume the pending request, returning whether there was one
    pub fn take_pending(&self) -> bool {
        self.flag.swap(false, Ordering::AcqRel)
    }
}

impl FrameScheduler for FlagScheduler {
    fn schedule_frame(&mut self) {
        self.flag.store(true, Ordering::Release);
    }

    fn cancel(&mut self) {
        self.flag.store(false, Ordering::Release);
    }

    fn is_pending(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

/// Millisecond time source for gesture timing (swipes, duplicate suppression)
pub trait Clock: fmt::Debug {
    fn now_ms(&self) -> f64;
}

/// Wall clock measured from construction
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

/// Clock advanced by hand; clones share the same time
#[derive(Debug, Default, Clone)]
pub struct ManualClock {
    now: Rc<Cell<f64>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, ms: f64) {
        self.now.set(ms);
    }

    pub fn advance(&self, ms: f64) {
        self.now.set(self.now.get() + ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> f64 {
        self.now.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_scheduler_shares_state_between_clones() {
        let handle = ManualScheduler::new();
        let mut scheduler = handle.clone();
        scheduler.schedule_frame();
        scheduler.schedule_frame();
        assert!(handle.is_pending());
        assert_eq!(handle.requests(), 2);
        assert!(handle.take_pending());
        assert!(!scheduler.is_pending());
    }

    #[test]
    fn test_flag_scheduler_cancel() {
        let mut scheduler = FlagScheduler::new();
        let flag = scheduler.flag();
        scheduler.schedule_frame();
        assert!(flag.load(Ordering::Acquire));
        scheduler.cancel();
        assert!(!scheduler.take_pending());
    }

    #[test]
    fn test_manual_clock_advance() {
        let clock = ManualClock::new();
        let shared = clock.clone();
        clock.set(100.0);
        shared.advance(250.0);
        assert_eq!(clock.now_ms(), 350.0);
    }
}
