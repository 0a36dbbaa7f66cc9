//! Time primitives for the Horologion engine
//!
//! Every calculator in the engine operates on `UtcInstant`, a
//! UTC-anchored microsecond count. Timezones exist only at the
//! display boundary (`UtcInstant::in_zone`).

use std::fmt;
use std::ops::{Add, Neg, Sub};
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Microseconds per day
const MICROS_PER_DAY: i64 = 86_400_000_000;

/// Julian date of the Unix epoch (1970-01-01T00:00:00Z)
const UNIX_EPOCH_JD: f64 = 2_440_587.5;

/// Rata Die day number of 1970-01-01 (days since 0000-12-31)
const UNIX_EPOCH_RD: i64 = 719_163;

/// An absolute, timezone-independent point in time.
/// Represented as microseconds since the Unix epoch (UTC).
#[derive(
    Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct UtcInstant(pub i64);

impl UtcInstant {
    pub const UNIX_EPOCH: UtcInstant = UtcInstant(0);

    #[inline]
    pub fn from_micros(micros: i64) -> Self {
        UtcInstant(micros)
    }

    #[inline]
    pub fn from_millis(millis: i64) -> Self {
        UtcInstant(millis * 1000)
    }

    #[inline]
    pub fn from_secs(secs: i64) -> Self {
        UtcInstant(secs * 1_000_000)
    }

    #[inline]
    pub fn as_micros(self) -> i64 {
        self.0
    }

    #[inline]
    pub fn as_millis(self) -> i64 {
        self.0 / 1000
    }

    #[inline]
    pub fn as_secs_f64(self) -> f64 {
        self.0 as f64 / 1_000_000.0
    }

    /// Julian date equivalent (fractional days)
    #[inline]
    pub fn julian_date(self) -> f64 {
        self.0 as f64 / MICROS_PER_DAY as f64 + UNIX_EPOCH_JD
    }

    /// Days since the J2000.0 reference epoch (2000-01-01T12:00:00Z)
    #[inline]
    pub fn days_since_j2000(self) -> f64 {
        self.julian_date() - 2_451_545.0
    }

    /// Rata Die day number of the UTC calendar date containing this
    /// instant (day 1 = 0001-01-01 CE)
    #[inline]
    pub fn rata_die(self) -> i64 {
        self.0.div_euclid(MICROS_PER_DAY) + UNIX_EPOCH_RD
    }

    /// Fraction of the UTC day elapsed, in [0, 1)
    #[inline]
    pub fn day_fraction(self) -> f64 {
        self.0.rem_euclid(MICROS_PER_DAY) as f64 / MICROS_PER_DAY as f64
    }

    /// Convert to a chrono UTC datetime.
    /// `None` for instants outside chrono's representable year range.
    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        Utc.timestamp_micros(self.0).single()
    }

    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        UtcInstant(dt.timestamp_micros())
    }

    /// View this instant in a display timezone.
    /// Display-only: no engine computation consumes the result.
    pub fn in_zone(self, tz: Tz) -> Option<DateTime<Tz>> {
        self.to_datetime().map(|dt| dt.with_timezone(&tz))
    }

    /// Signed difference `self - earlier`
    #[inline]
    pub fn offset_from(self, earlier: UtcInstant) -> ClockOffset {
        ClockOffset(self.0 - earlier.0)
    }

    #[inline]
    pub fn saturating_add(self, duration: Duration) -> Self {
        UtcInstant(self.0.saturating_add(duration.as_micros() as i64))
    }

    #[inline]
    pub fn saturating_sub(self, duration: Duration) -> Self {
        UtcInstant(self.0.saturating_sub(duration.as_micros() as i64))
    }
}

impl Add<Duration> for UtcInstant {
    type Output = UtcInstant;

    #[inline]
    fn add(self, rhs: Duration) -> Self::Output {
        UtcInstant(self.0 + rhs.as_micros() as i64)
    }
}

impl Sub<Duration> for UtcInstant {
    type Output = UtcInstant;

    #[inline]
    fn sub(self, rhs: Duration) -> Self::Output {
        UtcInstant(self.0 - rhs.as_micros() as i64)
    }
}

impl Sub<UtcInstant> for UtcInstant {
    type Output = Duration;

    /// Elapsed time since `rhs`, saturating at zero
    #[inline]
    fn sub(self, rhs: UtcInstant) -> Self::Output {
        let diff = self.0 - rhs.0;
        if diff >= 0 {
            Duration::from_micros(diff as u64)
        } else {
            Duration::ZERO
        }
    }
}

impl Add<ClockOffset> for UtcInstant {
    type Output = UtcInstant;

    #[inline]
    fn add(self, rhs: ClockOffset) -> Self::Output {
        UtcInstant(self.0 + rhs.0)
    }
}

impl fmt::Debug for UtcInstant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_datetime() {
            Some(dt) => write!(f, "UtcInstant({})", dt.format("%Y-%m-%dT%H:%M:%S%.6fZ")),
            None => write!(f, "UtcInstant({}us)", self.0),
        }
    }
}

/// A signed clock correction in microseconds.
/// Positive means the reference clock is ahead of the local clock.
#[derive(
    Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct ClockOffset(pub i64);

impl ClockOffset {
    pub const ZERO: ClockOffset = ClockOffset(0);

    #[inline]
    pub fn from_micros(micros: i64) -> Self {
        ClockOffset(micros)
    }

    #[inline]
    pub fn from_millis(millis: i64) -> Self {
        ClockOffset(millis * 1000)
    }

    #[inline]
    pub fn from_secs_f64(secs: f64) -> Self {
        ClockOffset((secs * 1_000_000.0) as i64)
    }

    #[inline]
    pub fn as_micros(self) -> i64 {
        self.0
    }

    #[inline]
    pub fn as_secs_f64(self) -> f64 {
        self.0 as f64 / 1_000_000.0
    }

    #[inline]
    pub fn abs(self) -> Self {
        ClockOffset(self.0.abs())
    }
}

impl Neg for ClockOffset {
    type Output = ClockOffset;

    #[inline]
    fn neg(self) -> Self::Output {
        ClockOffset(-self.0)
    }
}

impl fmt::Debug for ClockOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Δ({:+.3}ms)", self.0 as f64 / 1000.0)
    }
}
