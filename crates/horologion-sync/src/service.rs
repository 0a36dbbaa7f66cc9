//! Background synchronization service
//!
//! Periodically re-measures the clock offset and publishes it into a
//! [`TimeSource`]. Manual triggers and timer ticks share one
//! in-flight guard, so overlapping requests coalesce into a single
//! network exchange.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tracing::{debug, info, warn};

use horologion_core::WallClock;

use crate::ntp::{NtpClient, NTP_SERVERS};
use crate::source::TimeSource;

/// Synchronization settings
#[derive(Clone, Debug)]
pub struct SyncConfig {
    /// Servers tried in order. Empty means offline: no network
    /// exchanges are ever attempted.
    pub servers: Vec<String>,

    /// Interval between automatic re-synchronizations
    pub interval: Duration,

    /// Timeout for one request/reply exchange
    pub timeout: Duration,

    /// Age beyond which a good offset is reported as stale
    pub staleness_threshold: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            servers: NTP_SERVERS.iter().map(|s| s.to_string()).collect(),
            interval: Duration::from_secs(15 * 60),
            timeout: Duration::from_secs(3),
            staleness_threshold: Duration::from_secs(60 * 60),
        }
    }
}

/// Outcome of one synchronization request
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyncOutcome {
    /// An exchange ran and succeeded
    Synchronized,
    /// An exchange ran and failed on every server
    Failed,
    /// Another exchange was already in flight; no request was sent
    Coalesced,
    /// The server list is empty
    Offline,
}

/// Periodic SNTP synchronization against a set of servers
pub struct SyncService {
    config: SyncConfig,
    client: NtpClient,
    source: Arc<TimeSource>,
    clock: Arc<dyn WallClock>,
    in_flight: AtomicBool,
    trigger: Notify,
}

impl SyncService {
    pub fn new(
        config: SyncConfig,
        source: Arc<TimeSource>,
        clock: Arc<dyn WallClock>,
    ) -> Self {
        let client = NtpClient::with_timeout(config.timeout);
        Self {
            config,
            client,
            source,
            clock,
            in_flight: AtomicBool::new(false),
            trigger: Notify::new(),
        }
    }

    /// The time source this service feeds
    pub fn source(&self) -> &Arc<TimeSource> {
        &self.source
    }

    /// Ask the background loop to re-synchronize now
    pub fn request_sync(&self) {
        self.trigger.notify_one();
    }

    /// Run one synchronization. If another is already in flight this
    /// returns immediately without sending anything. Cancelling the
    /// returned future mid-exchange releases the in-flight guard.
    pub async fn sync_once(&self) -> SyncOutcome {
        if self.config.servers.is_empty() {
            return SyncOutcome::Offline;
        }
        if self.in_flight.swap(true, Ordering::AcqRel) {
            debug!("sync already in flight, coalescing");
            return SyncOutcome::Coalesced;
        }
        // Released on every exit path, including a dropped future
        let _guard = InFlightGuard(&self.in_flight);

        match self
            .client
            .query_any(&self.config.servers, self.clock.as_ref())
            .await
        {
            Ok(sample) => {
                self.source.apply_sample(sample);
                SyncOutcome::Synchronized
            }
            Err(e) => {
                warn!(error = %e, "synchronization failed");
                self.source.record_failure();
                SyncOutcome::Failed
            }
        }
    }

    /// Drive periodic synchronization until the task is dropped.
    /// Returns immediately when configured offline.
    pub async fn run(self: Arc<Self>) {
        if self.config.servers.is_empty() {
            info!("no time servers configured, running offline");
            return;
        }

        info!(
            servers = self.config.servers.len(),
            interval_secs = self.config.interval.as_secs(),
            "time synchronization started"
        );

        // First sync right away, then on the timer or on demand
        self.sync_once().await;

        let mut ticker = tokio::time::interval(self.config.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        ticker.reset();

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.sync_once().await;
                }
                _ = self.trigger.notified() => {
                    self.sync_once().await;
                }
            }
        }
    }
}

/// Clears the in-flight flag when the owning future finishes or is
/// dropped
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
