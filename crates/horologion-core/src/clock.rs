//! Clock sources
//!
//! `WallClock` is the seam between the engine and the operating
//! system clock: production code reads `SystemClock`, tests inject
//! `FixedClock` so every derived value is reproducible.

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::UtcInstant;

/// A source of the current wall-clock instant
pub trait WallClock: Send + Sync {
    /// Read the current instant from this clock
    fn read(&self) -> UtcInstant;
}

/// The operating system clock
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl WallClock for SystemClock {
    fn read(&self) -> UtcInstant {
        match SystemTime::now().duration_since(UNIX_EPOCH) {
            Ok(since) => UtcInstant::from_micros(since.as_micros() as i64),
            // System clock set before 1970
            Err(err) => UtcInstant::from_micros(-(err.duration().as_micros() as i64)),
        }
    }
}

/// A settable clock for deterministic tests
#[derive(Debug, Default)]
pub struct FixedClock(AtomicI64);

impl FixedClock {
    pub fn new(at: UtcInstant) -> Self {
        FixedClock(AtomicI64::new(at.as_micros()))
    }

    /// Move the clock to a new instant
    pub fn set(&self, at: UtcInstant) {
        self.0.store(at.as_micros(), Ordering::SeqCst);
    }
}

impl WallClock for FixedClock {
    fn read(&self) -> UtcInstant {
        UtcInstant::from_micros(self.0.load(Ordering::SeqCst))
    }
}
