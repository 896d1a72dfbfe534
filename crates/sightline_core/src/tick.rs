//! # Tick Gating
//!
//! Interval-gated tick controller and the re-entrancy guard.
//!
//! ## Design
//!
//! The pipeline must:
//! - Run at most once per configured interval
//! - Never start a tick while the previous one is in flight
//! - Release the in-flight flag on every exit path, panics included
//!
//! [`TickGate`] handles the first rule for hosts that poll from their frame
//! loop. [`InFlightGuard`] handles the other two.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Holds the in-flight flag for the duration of one tick.
///
/// Dropping the guard clears the flag, so a tick that panics or returns
/// early can never starve later ticks.
#[derive(Debug)]
#[must_use = "the flag is released as soon as the guard is dropped"]
pub struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> InFlightGuard<'a> {
    /// Sets `flag` if it was clear. Returns `None` if a tick is in flight.
    pub fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Tick timing statistics.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TickStats {
    /// Minimum tick duration observed.
    pub min_tick_us: u64,
    /// Maximum tick duration observed.
    pub max_tick_us: u64,
    /// Average tick duration (rolling).
    pub avg_tick_us: u64,
    /// Number of late ticks (took longer than the interval).
    pub late_ticks: u64,
    /// Total ticks measured.
    pub total_ticks: u64,
}

impl Default for TickStats {
    fn default() -> Self {
        Self {
            min_tick_us: u64::MAX,
            max_tick_us: 0,
            avg_tick_us: 0,
            late_ticks: 0,
            total_ticks: 0,
        }
    }
}

/// Interval gate for host-polled ticking.
///
/// Unlike a fixed-timestep accumulator it never fires catch-up ticks: a
/// host that stalls for several intervals gets exactly one tick afterwards.
#[derive(Debug)]
pub struct TickGate {
    /// Minimum time between ticks.
    interval: Duration,
    /// Start of the last tick, `None` before the first.
    last_tick: Option<Instant>,
    /// Timing statistics.
    stats: TickStats,
}

impl TickGate {
    /// Creates a gate with the given minimum interval.
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_tick: None,
            stats: TickStats::default(),
        }
    }

    /// Returns true if a tick may start at `now`.
    #[must_use]
    pub fn should_tick(&self, now: Instant) -> bool {
        match self.last_tick {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.interval,
        }
    }

    /// Marks the start of a tick at `now`.
    pub fn begin_tick(&mut self, now: Instant) {
        self.last_tick = Some(now);
    }

    /// Records the duration of a finished tick.
    pub fn record(&mut self, duration: Duration) {
        let duration_us = u64::try_from(duration.as_micros()).unwrap_or(u64::MAX);

        self.stats.min_tick_us = self.stats.min_tick_us.min(duration_us);
        self.stats.max_tick_us = self.stats.max_tick_us.max(duration_us);

        // Rolling average
        self.stats.avg_tick_us = if self.stats.total_ticks == 0 {
            duration_us
        } else {
            (self.stats.avg_tick_us.saturating_mul(15).saturating_add(duration_us)) / 16
        };
        self.stats.total_ticks += 1;

        if duration > self.interval {
            self.stats.late_ticks += 1;
        }
    }

    /// Time left until a tick may start.
    #[must_use]
    pub fn time_until_next(&self, now: Instant) -> Duration {
        match self.last_tick {
            None => Duration::ZERO,
            Some(last) => self.interval.saturating_sub(now.saturating_duration_since(last)),
        }
    }

    /// Returns tick statistics.
    #[must_use]
    pub const fn stats(&self) -> &TickStats {
        &self.stats
    }

    /// Resets statistics.
    pub fn reset_stats(&mut self) {
        self.stats = TickStats::default();
    }
}
