//! Clock sources for record timestamps

use chrono::{DateTime, TimeDelta, Utc};

/// Source of "now" for timestamps and window pruning
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time anchored once, then advanced by the Tokio clock
///
/// Under a paused Tokio runtime (tests) timestamps move exactly with
/// `tokio::time::advance`, so tick timestamps land on the timer deadlines.
#[derive(Debug, Clone)]
pub struct RuntimeClock {
    anchor_wall: DateTime<Utc>,
    anchor: tokio::time::Instant,
}

impl RuntimeClock {
    pub fn new() -> Self {
        Self {
            anchor_wall: Utc::now(),
            anchor: tokio::time::Instant::now(),
        }
    }
}

impl Default for RuntimeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for RuntimeClock {
    fn now(&self) -> DateTime<Utc> {
        let elapsed = tokio::time::Instant::now().duration_since(self.anchor);
        self.anchor_wall + TimeDelta::from_std(elapsed).unwrap_or_else(|_| TimeDelta::zero())
    }
}

/// Simulated clock that advances by a fixed step on every read
///
/// Used for offline batches where ticks are generated back to back but should
/// carry timestamps spaced by the tick interval. Once a step would leave the
/// calendar range the clock stops advancing.
#[derive(Debug)]
pub struct SteppingClock {
    next: parking_lot::Mutex<DateTime<Utc>>,
    step: TimeDelta,
}

impl SteppingClock {
    pub fn new(start: DateTime<Utc>, step: TimeDelta) -> Self {
        Self {
            next: parking_lot::Mutex::new(start),
            step,
        }
    }
}

impl Clock for SteppingClock {
    fn now(&self) -> DateTime<Utc> {
        let mut next = self.next.lock();
        let now = *next;
        *next = now.checked_add_signed(self.step).unwrap_or(now);
        now
    }
}
