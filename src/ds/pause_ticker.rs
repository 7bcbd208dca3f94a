//! Periodic tick source with a zero-duration ⇒ stopped idiom.
//!
//! Wraps [`crossbeam_channel::tick`], whose receiver holds at most one
//! pending tick, so missed ticks collapse instead of queueing. A
//! stopped ticker swaps in [`crossbeam_channel::never`], which blocks a
//! `select!` arm indefinitely — callers can disable either background
//! timer without tearing anything down.
//!
//! ## Operations
//! - `new(d)`: armed at period `d`; `d == 0` constructs stopped
//! - `reset(d)`: remember `d` and re-arm; `d == 0` stops
//! - `stop()`: pause without forgetting the period
//! - `resume()`: re-arm the remembered period (zero stays stopped)
//! - `receiver()`: clone of the current tick channel for `select!`

use std::time::{Duration, Instant};

use crossbeam_channel::{never, tick, Receiver};

/// Pausable periodic ticker.
#[derive(Debug, Clone)]
pub struct PauseTicker {
    rx: Receiver<Instant>,
    period: Duration,
}

impl PauseTicker {
    /// Creates a ticker armed at `period`. A zero period constructs the
    /// ticker in the stopped state.
    pub fn new(period: Duration) -> Self {
        let rx = if period.is_zero() {
            never()
        } else {
            tick(period)
        };
        Self { rx, period }
    }

    /// Creates a ticker that remembers `period` but starts stopped.
    pub fn stopped(period: Duration) -> Self {
        Self {
            rx: never(),
            period,
        }
    }

    /// Sets the period and re-arms. A zero period stops the ticker.
    pub fn reset(&mut self, period: Duration) {
        self.period = period;
        self.rx = if period.is_zero() {
            never()
        } else {
            tick(period)
        };
    }

    /// Stops ticking; the period is kept for [`resume`](Self::resume).
    pub fn stop(&mut self) {
        self.rx = never();
    }

    /// Re-arms at the remembered period. A remembered period of zero
    /// leaves the ticker stopped.
    pub fn resume(&mut self) {
        let period = self.period;
        self.reset(period);
    }

    /// Returns the remembered period.
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Returns the current tick channel. The clone goes stale after a
    /// `reset`; re-fetch per select iteration.
    pub fn receiver(&self) -> Receiver<Instant> {
        self.rx.clone()
    }
}
