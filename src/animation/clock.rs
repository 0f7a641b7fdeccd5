use std::cell::Cell;
use std::time::{SystemTime, UNIX_EPOCH};

/// Wall-clock source in milliseconds. Readings must never go backwards.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

/// Milliseconds since the Unix epoch, matching feed `lastUpdatedAt` values.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

/// Clock that only moves when told to. Used for replays and tests.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<u64>,
}

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        ManualClock {
            now: Cell::new(start_ms),
        }
    }

    pub fn advance(&self, delta_ms: u64) {
        self.now.set(self.now.get().saturating_add(delta_ms));
    }

    /// Moves the clock to `ms`, ignoring attempts to go back in time.
    pub fn set(&self, ms: u64) {
        self.now.set(self.now.get().max(ms));
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }
}
