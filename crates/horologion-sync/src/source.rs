//! Synchronized time source
//!
//! Wraps a `WallClock` and applies the last measured SNTP offset. A
//! failed re-synchronization never discards a previously good offset:
//! the source reports `Failed` but keeps serving adjusted time. A
//! good offset that has not been refreshed within the staleness
//! threshold is reported as `Stale`.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tracing::info;

use horologion_core::{ClockOffset, UtcInstant, WallClock};

use crate::ntp::SyncSample;

/// Trust level of the adjusted time
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SyncStatus {
    /// No successful exchange yet: adjusted time equals local time
    Unsynced,
    /// Last exchange succeeded recently
    Synced { server: String, stratum: u8 },
    /// Last exchange succeeded, but longer ago than the staleness
    /// threshold
    Stale { age: Duration },
    /// The most recent attempts failed; the last good offset (if
    /// any) is still applied
    Failed { consecutive_failures: u32 },
}

#[derive(Debug)]
struct SourceState {
    offset: ClockOffset,
    last_sample: Option<SyncSample>,
    consecutive_failures: u32,
}

/// A wall clock corrected by the last known network offset
pub struct TimeSource {
    clock: Arc<dyn WallClock>,
    staleness_threshold: Duration,
    state: RwLock<SourceState>,
}

impl TimeSource {
    pub fn new(clock: Arc<dyn WallClock>, staleness_threshold: Duration) -> Self {
        Self {
            clock,
            staleness_threshold,
            state: RwLock::new(SourceState {
                offset: ClockOffset::ZERO,
                last_sample: None,
                consecutive_failures: 0,
            }),
        }
    }

    /// Local clock reading, uncorrected
    pub fn local_now(&self) -> UtcInstant {
        self.clock.read()
    }

    /// Corrected reading: local clock plus the applied offset
    pub fn now(&self) -> UtcInstant {
        let offset = self.state.read().offset;
        self.clock.read() + offset
    }

    /// Offset currently applied
    pub fn offset(&self) -> ClockOffset {
        self.state.read().offset
    }

    /// Trust level at the current local time
    pub fn status(&self) -> SyncStatus {
        self.reading().1
    }

    /// Corrected reading and trust level, from one state acquisition
    pub fn reading(&self) -> (UtcInstant, SyncStatus) {
        let local = self.clock.read();
        let state = self.state.read();
        let now = local + state.offset;
        let status = match &state.last_sample {
            None => SyncStatus::Unsynced,
            Some(_) if state.consecutive_failures > 0 => SyncStatus::Failed {
                consecutive_failures: state.consecutive_failures,
            },
            Some(sample) => {
                let age = local - sample.measured_at;
                if age > self.staleness_threshold {
                    SyncStatus::Stale { age }
                } else {
                    SyncStatus::Synced {
                        server: sample.server.clone(),
                        stratum: sample.stratum,
                    }
                }
            }
        };
        (now, status)
    }

    /// Last successful sample, if any
    pub fn last_sample(&self) -> Option<SyncSample> {
        self.state.read().last_sample.clone()
    }

    /// Record a successful exchange and apply its offset
    pub fn apply_sample(&self, sample: SyncSample) {
        let mut state = self.state.write();
        info!(
            server = %sample.server,
            offset_ms = sample.offset.as_secs_f64() * 1e3,
            rtt_ms = sample.round_trip.as_secs_f64() * 1e3,
            stratum = sample.stratum,
            "applied clock offset"
        );
        state.offset = sample.offset;
        state.last_sample = Some(sample);
        state.consecutive_failures = 0;
    }

    /// Record a failed exchange. The applied offset is untouched.
    pub fn record_failure(&self) {
        self.state.write().consecutive_failures += 1;
    }
}
