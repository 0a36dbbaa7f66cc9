//! Snapshot types
//!
//! One `Snapshot` per tick, assembled from a single instant. The
//! renderer receives it read-only and may keep the previous one for
//! interpolation.

use std::collections::BTreeMap;

use chrono::{DateTime, Timelike};
use chrono_tz::Tz;

use horologion_astro::{PulsarState, RotationState, SolarPosition};
use horologion_calendar::HebrewDate;
use horologion_core::UtcInstant;
use horologion_sync::SyncStatus;

/// The local-clock ring: zone-adjusted wall time and the analog hand
/// angles, precomputed so the renderer does no timezone math
#[derive(Clone, Debug)]
pub struct LocalClockState {
    pub zone: Tz,

    /// Wall time in `zone`. Absent only for instants chrono cannot
    /// represent.
    pub wall_time: Option<DateTime<Tz>>,

    /// Hour hand angle, degrees clockwise from 12 o'clock
    pub hour_angle_deg: f64,

    /// Minute hand angle, degrees
    pub minute_angle_deg: f64,

    /// Second hand angle, degrees, sweeping continuously
    pub second_angle_deg: f64,
}

impl LocalClockState {
    pub fn compute(instant: UtcInstant, zone: Tz) -> LocalClockState {
        let wall_time = instant.in_zone(zone);
        let (hour_angle_deg, minute_angle_deg, second_angle_deg) = match &wall_time {
            Some(dt) => {
                let seconds =
                    f64::from(dt.second()) + f64::from(dt.nanosecond()) / 1e9;
                let minutes = f64::from(dt.minute()) + seconds / 60.0;
                let hours = f64::from(dt.hour() % 12) + minutes / 60.0;
                (hours * 30.0, minutes * 6.0, seconds * 6.0)
            }
            None => (0.0, 0.0, 0.0),
        };
        LocalClockState {
            zone,
            wall_time,
            hour_angle_deg,
            minute_angle_deg,
            second_angle_deg,
        }
    }
}

/// Immutable aggregate of all six time systems at one instant
#[derive(Clone, Debug)]
pub struct Snapshot {
    /// The single instant every field below was computed from
    pub instant: UtcInstant,

    /// Local clock ring
    pub local: LocalClockState,

    /// Hebrew calendar ring. `None` when the instant precedes the
    /// calendar epoch; the other rings still update.
    pub hebrew: Option<HebrewDate>,

    /// Solar year ring
    pub solar: SolarPosition,

    /// Earth rotation ring
    pub rotation: RotationState,

    /// Pulsar rings, keyed by display name
    pub pulsars: BTreeMap<String, PulsarState>,

    /// Trust level of `instant`
    pub sync: SyncStatus,
}
