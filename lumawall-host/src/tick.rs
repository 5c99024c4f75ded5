//! Loop timing
//!
//! `MonotonicClock` provides the millisecond timestamps every core component
//! works with; `Ticker` paces the main loop at a fixed rate.

use std::thread;
use std::time::{Duration, Instant};

/// Milliseconds since the clock was created
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    start: Instant,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self { start: Instant::now() }
    }

    pub fn now_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}

/// Fixed-rate loop pacer
///
/// Deadlines advance by whole periods. After a stall longer than one period
/// the schedule restarts from now instead of firing a burst of late ticks.
#[derive(Debug, Clone)]
pub struct Ticker {
    period: Duration,
    next: Instant,
}

impl Ticker {
    pub fn every(period: Duration) -> Self {
        Self {
            period,
            next: Instant::now() + period,
        }
    }

    /// Ticker firing `hz` times per second
    pub fn from_hz(hz: u16) -> Self {
        Self::every(Duration::from_secs(1) / u32::from(hz.max(1)))
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Sleep until the next deadline
    pub fn wait(&mut self) {
        let now = Instant::now();
        if let Some(remaining) = self.next.checked_duration_since(now) {
            thread::sleep(remaining);
            self.next += self.period;
        } else {
            self.next = now + self.period;
        }
    }
}
