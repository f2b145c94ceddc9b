//! Elapsed-time statistics over benchmark iterations.

use std::fmt;
use std::time::Duration;

/// Running min / max / average of a named timer.
///
/// Only samples passed to [`update`](Self::update) count; the caller
/// decides which iterations are warm-up and skips them.
#[derive(Clone, Debug, PartialEq)]
pub struct TimerStats {
    name: String,
    min: Duration,
    max: Duration,
    total: Duration,
    count: u32,
}

impl TimerStats {
    /// An empty timer.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            min: Duration::MAX,
            max: Duration::ZERO,
            total: Duration::ZERO,
            count: 0,
        }
    }

    /// Record one sample.
    pub fn update(&mut self, elapsed: Duration) {
        self.min = self.min.min(elapsed);
        self.max = self.max.max(elapsed);
        self.total = self.total.saturating_add(elapsed);
        self.count += 1;
    }

    /// Timer name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of samples.
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Shortest sample, or zero if there are none.
    pub fn min(&self) -> Duration {
        if self.count == 0 {
            Duration::ZERO
        } else {
            self.min
        }
    }

    /// Longest sample.
    pub fn max(&self) -> Duration {
        self.max
    }

    /// Mean sample, or zero if there are none.
    pub fn avg(&self) -> Duration {
        if self.count == 0 {
            Duration::ZERO
        } else {
            self.total / self.count
        }
    }
}

impl fmt::Display for TimerStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: min, max, avg -- {:.5}, {:.5}, {:.5}",
            self.name,
            self.min().as_secs_f64(),
            self.max().as_secs_f64(),
            self.avg().as_secs_f64()
        )
    }
}
