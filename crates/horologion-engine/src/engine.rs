//! Temporal model engine
//!
//! Orchestrates the time source and the pure calculators. `tick`
//! reads the synchronized instant exactly once and fans it out, so
//! every ring in a snapshot describes the same moment. Network
//! synchronization runs in its own task and only influences future
//! ticks through the shared offset.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use horologion_astro::{rotation_state_with_sun, solar_position, Pulsar};
use horologion_calendar::hebrew;
use horologion_core::{HorologionResult, SystemClock, WallClock};
use horologion_sync::{SyncService, TimeSource};

use crate::config::EngineConfig;
use crate::snapshot::{LocalClockState, Snapshot};

pub struct TemporalModelEngine {
    config: EngineConfig,
    source: Arc<TimeSource>,
    sync: Arc<SyncService>,
    pulsars: Vec<Pulsar>,
}

impl TemporalModelEngine {
    /// Build an engine on the operating system clock
    pub fn new(config: EngineConfig) -> HorologionResult<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Build an engine on an injected clock. Configuration is
    /// validated here; a constructed engine cannot fail to tick.
    pub fn with_clock(
        config: EngineConfig,
        clock: Arc<dyn WallClock>,
    ) -> HorologionResult<Self> {
        let pulsars = config.validated_pulsars()?;
        let source = Arc::new(TimeSource::new(clock.clone(), config.staleness_threshold));
        let sync = Arc::new(SyncService::new(
            config.sync_config(),
            source.clone(),
            clock,
        ));
        Ok(Self {
            config,
            source,
            sync,
            pulsars,
        })
    }

    /// The synchronized time source feeding this engine
    pub fn source(&self) -> &Arc<TimeSource> {
        &self.source
    }

    /// Ask the sync service to re-measure the clock offset now
    pub fn request_sync(&self) {
        self.sync.request_sync();
    }

    /// Produce one snapshot. Reads the time source once and never
    /// touches the network.
    pub fn tick(&self) -> Snapshot {
        let (instant, sync) = self.source.reading();

        let solar = solar_position(instant);
        let rotation = rotation_state_with_sun(instant, &self.config.location, &solar);

        let hebrew = match hebrew::convert(instant) {
            Ok(date) => Some(date),
            Err(e) => {
                // One unavailable ring, the rest keep updating
                debug!(error = %e, "hebrew calendar ring unavailable");
                None
            }
        };

        let pulsars = self
            .pulsars
            .iter()
            .map(|p| {
                (
                    p.name().to_string(),
                    p.state_at(instant, self.config.tick_interval),
                )
            })
            .collect();

        Snapshot {
            instant,
            local: LocalClockState::compute(instant, self.config.timezone),
            hebrew,
            solar,
            rotation,
            pulsars,
            sync,
        }
    }

    /// Start the tick loop and the sync service. Snapshots are
    /// published through the returned handle's watch channel.
    pub fn spawn(self) -> EngineHandle {
        let engine = Arc::new(self);
        let (tx, snapshots) = watch::channel(engine.tick());

        let sync_task = tokio::spawn(engine.sync.clone().run());

        let tick_engine = engine.clone();
        let tick_interval = engine.config.tick_interval;
        let tick_task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(tick_interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                if tx.send(tick_engine.tick()).is_err() {
                    break;
                }
            }
        });

        info!(
            tick_ms = tick_interval.as_millis() as u64,
            "temporal model engine started"
        );

        EngineHandle {
            engine,
            snapshots,
            tasks: vec![sync_task, tick_task],
        }
    }
}

/// Running engine: snapshot subscription plus task lifecycle
pub struct EngineHandle {
    engine: Arc<TemporalModelEngine>,
    snapshots: watch::Receiver<Snapshot>,
    tasks: Vec<JoinHandle<()>>,
}

impl EngineHandle {
    /// A receiver for the renderer; each clone observes every
    /// published snapshot independently
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshots.clone()
    }

    /// The most recently published snapshot
    pub fn latest(&self) -> Snapshot {
        self.snapshots.borrow().clone()
    }

    pub fn request_sync(&self) {
        self.engine.request_sync();
    }

    pub fn engine(&self) -> &Arc<TemporalModelEngine> {
        &self.engine
    }

    /// Stop the tick loop and abandon any in-flight sync
    pub fn shutdown(self) {
        for task in self.tasks {
            task.abort();
        }
        info!("temporal model engine stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use horologion_calendar::HebrewMonth;
    use horologion_core::{ClockOffset, FixedClock, UtcInstant};
    use horologion_sync::{SyncSample, SyncStatus};

    fn offline_config() -> EngineConfig {
        EngineConfig {
            ntp_servers: Vec::new(),
            ..Default::default()
        }
    }

    fn fixed_engine(secs: i64) -> (Arc<FixedClock>, TemporalModelEngine) {
        let clock = Arc::new(FixedClock::new(UtcInstant::from_secs(secs)));
        let engine = TemporalModelEngine::with_clock(offline_config(), clock.clone())
            .expect("valid config");
        (clock, engine)
    }

    #[test]
    fn test_snapshot_fields_share_one_instant() {
        // 2024-01-01T00:00:00Z
        let (_, engine) = fixed_engine(1_704_067_200);
        let snapshot = engine.tick();
        let instant = UtcInstant::from_secs(1_704_067_200);

        assert_eq!(snapshot.instant, instant);
        assert_eq!(snapshot.solar, solar_position(instant));
        assert_eq!(
            snapshot.rotation,
            rotation_state_with_sun(
                instant,
                &horologion_core::GeoLocation::GREENWICH,
                &snapshot.solar
            )
        );
        assert_eq!(snapshot.hebrew, Some(hebrew::convert(instant).unwrap()));
        for (name, state) in &snapshot.pulsars {
            let expected = engine
                .pulsars
                .iter()
                .find(|p| p.name() == name)
                .unwrap()
                .phase_at(instant);
            assert_eq!(state.phase, expected);
        }
    }

    #[test]
    fn test_hebrew_reference_date_in_snapshot() {
        let (_, engine) = fixed_engine(1_704_067_200);
        let hebrew = engine.tick().hebrew.unwrap();
        assert_eq!(hebrew.year, 5784);
        assert_eq!(hebrew.month, HebrewMonth::Tevet);
        assert_eq!(hebrew.day, 20);
    }

    #[test]
    fn test_pre_epoch_instant_degrades_one_ring() {
        // Around 3762 BCE, before the Hebrew calendar epoch
        let (_, engine) = fixed_engine(-180_800_000_000);
        let snapshot = engine.tick();
        assert!(snapshot.hebrew.is_none());
        // Every other ring still updates
        assert!((0.0..360.0).contains(&snapshot.solar.ecliptic_longitude_deg));
        assert!((0.0..360.0).contains(&snapshot.rotation.gmst_deg));
        assert_eq!(snapshot.pulsars.len(), 4);
    }

    #[test]
    fn test_snapshot_idempotent_on_fixed_clock() {
        let (_, engine) = fixed_engine(1_704_067_200);
        let a = engine.tick();
        let b = engine.tick();
        assert_eq!(a.instant, b.instant);
        assert_eq!(a.solar, b.solar);
        assert_eq!(a.hebrew, b.hebrew);
        assert_eq!(a.pulsars, b.pulsars);
    }

    #[test]
    fn test_applied_offset_shifts_snapshot_instant() {
        let (_, engine) = fixed_engine(1_704_067_200);
        engine.source().apply_sample(SyncSample {
            server: "test".to_string(),
            offset: ClockOffset::from_millis(750),
            round_trip: Duration::from_millis(12),
            stratum: 2,
            measured_at: UtcInstant::from_secs(1_704_067_200),
        });

        let snapshot = engine.tick();
        assert_eq!(
            snapshot.instant,
            UtcInstant::from_micros(1_704_067_200_000_000 + 750_000)
        );
        assert!(matches!(snapshot.sync, SyncStatus::Synced { .. }));
    }

    #[test]
    fn test_offline_engine_reports_unsynced() {
        let (_, engine) = fixed_engine(1_704_067_200);
        assert_eq!(engine.tick().sync, SyncStatus::Unsynced);
    }

    #[test]
    fn test_invalid_config_rejected_before_first_tick() {
        let clock = Arc::new(FixedClock::new(UtcInstant::from_secs(0)));
        let config = EngineConfig {
            tick_interval: Duration::ZERO,
            ..offline_config()
        };
        assert!(TemporalModelEngine::with_clock(config, clock).is_err());
    }

    #[tokio::test]
    async fn test_spawned_engine_publishes_snapshots() {
        let clock = Arc::new(FixedClock::new(UtcInstant::from_secs(1_704_067_200)));
        let config = EngineConfig {
            tick_interval: Duration::from_millis(10),
            ..offline_config()
        };
        let engine = TemporalModelEngine::with_clock(config, clock.clone()).unwrap();
        let handle = engine.spawn();

        let mut rx = handle.subscribe();
        rx.changed().await.expect("tick published");
        let first = rx.borrow_and_update().clone();
        assert_eq!(first.instant, UtcInstant::from_secs(1_704_067_200));

        // Move the clock and wait for a snapshot that follows it
        clock.set(UtcInstant::from_secs(1_704_067_260));
        let followed = tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                rx.changed().await.expect("tick published");
                if rx.borrow_and_update().instant == UtcInstant::from_secs(1_704_067_260) {
                    break;
                }
            }
        })
        .await;
        assert!(followed.is_ok(), "snapshot never followed the clock");

        handle.shutdown();
    }
}
