//! Engine configuration
//!
//! Every field is validated up front: a configuration that passes
//! `validate` cannot fail mid-tick.

use std::time::Duration;

use chrono_tz::Tz;

use horologion_astro::{default_catalog, Pulsar};
use horologion_core::{GeoLocation, HorologionError, HorologionResult};
use horologion_sync::{SyncConfig, NTP_SERVERS};

/// One configured pulsar
#[derive(Clone, Debug)]
pub struct PulsarConfig {
    pub display_name: String,
    pub period: Duration,
    pub phase_offset: Duration,
}

/// Full engine configuration
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Zone the local-clock ring is displayed in
    pub timezone: Tz,

    /// Observer location for the Earth rotation ring
    pub location: GeoLocation,

    /// Time servers tried in order. Empty runs the engine offline.
    pub ntp_servers: Vec<String>,

    /// Simulated pulsars
    pub pulsars: Vec<PulsarConfig>,

    /// Interval between automatic re-synchronizations
    pub sync_interval: Duration,

    /// Timeout for one SNTP exchange
    pub sync_timeout: Duration,

    /// Age beyond which a good offset is reported as stale
    pub staleness_threshold: Duration,

    /// Interval between snapshots
    pub tick_interval: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            timezone: Tz::UTC,
            location: GeoLocation::GREENWICH,
            ntp_servers: NTP_SERVERS.iter().map(|s| s.to_string()).collect(),
            pulsars: default_catalog()
                .into_iter()
                .map(|p| PulsarConfig {
                    display_name: p.name().to_string(),
                    period: p.period(),
                    phase_offset: p.phase_offset(),
                })
                .collect(),
            sync_interval: Duration::from_secs(15 * 60),
            sync_timeout: Duration::from_secs(3),
            staleness_threshold: Duration::from_secs(60 * 60),
            tick_interval: Duration::from_millis(250),
        }
    }
}

impl EngineConfig {
    /// Parse an IANA zone identifier, rejecting unknown names
    pub fn parse_timezone(name: &str) -> HorologionResult<Tz> {
        name.parse::<Tz>()
            .map_err(|_| HorologionError::InvalidTimezone(name.to_string()))
    }

    /// Check every field. Called by the engine before any tick runs.
    pub fn validate(&self) -> HorologionResult<()> {
        self.validated_pulsars().map(drop)
    }

    /// Check every field and construct the pulsar set in one pass
    pub(crate) fn validated_pulsars(&self) -> HorologionResult<Vec<Pulsar>> {
        if self.tick_interval.is_zero() {
            return Err(HorologionError::ZeroTickInterval);
        }
        self.build_pulsars()
    }

    /// Construct the validated pulsar set
    fn build_pulsars(&self) -> HorologionResult<Vec<Pulsar>> {
        let mut pulsars = Vec::with_capacity(self.pulsars.len());
        let mut names: Vec<&str> = Vec::with_capacity(self.pulsars.len());
        for cfg in &self.pulsars {
            if names.contains(&cfg.display_name.as_str()) {
                return Err(HorologionError::DuplicatePulsarName(
                    cfg.display_name.clone(),
                ));
            }
            names.push(&cfg.display_name);
            pulsars.push(Pulsar::new(&cfg.display_name, cfg.period, cfg.phase_offset)?);
        }
        Ok(pulsars)
    }

    /// Synchronization settings for the sync service
    pub(crate) fn sync_config(&self) -> SyncConfig {
        SyncConfig {
            servers: self.ntp_servers.clone(),
            interval: self.sync_interval,
            timeout: self.sync_timeout,
            staleness_threshold: self.staleness_threshold,
        }
    }
}
