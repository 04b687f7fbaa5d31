//! Busy-wait for short-lived conditions, then back off to yielding the thread.
//!
//! Used wherever a peer thread is known to flip a state shortly, for example when waiting for the render thread
//! to leave a transient `Suspend` marker, and where no dedicated wake-up channel exists.
use std::time::{Duration, Instant};

/// A bounded busy loop which falls back to [`std::thread::yield_now()`] once spinning stops paying off.
pub struct SpinWait {
    inner: parking_lot_core::SpinWait,
}

impl Default for SpinWait {
    fn default() -> Self {
        Self::new()
    }
}

impl SpinWait {
    /// Create a new instance, starting out with short busy spins.
    pub fn new() -> Self {
        SpinWait {
            inner: parking_lot_core::SpinWait::new(),
        }
    }

    /// Wait a little, spinning for exponentially longer periods until the budget is exhausted, yielding after that.
    pub fn spin(&mut self) {
        if !self.inner.spin() {
            std::thread::yield_now();
        }
    }

    /// Start over with short busy spins.
    pub fn reset(&mut self) {
        self.inner.reset();
    }
}

/// Block the calling thread until `done()` returns true.
pub fn until(mut done: impl FnMut() -> bool) {
    let mut wait = SpinWait::new();
    while !done() {
        wait.spin();
    }
}

/// Block the calling thread until `done()` returns true or `timeout` elapsed, returning false in the latter case.
pub fn until_timeout(mut done: impl FnMut() -> bool, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    let mut wait = SpinWait::new();
    loop {
        if done() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        wait.spin();
    }
}
