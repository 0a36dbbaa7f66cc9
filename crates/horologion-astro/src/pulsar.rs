//! Pulsar phase simulation
//!
//! Each pulsar is a fixed-period rotator phased against the Unix
//! epoch. Phase is a pure function of the instant, so two snapshots
//! taken at the same instant agree exactly, with no per-pulsar state
//! to drift.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use horologion_core::{HorologionError, HorologionResult, UtcInstant};

/// One simulated pulsar: a name, a rotation period, and a phase
/// offset against the epoch
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pulsar {
    name: String,
    period: Duration,
    phase_offset: Duration,
}

impl Pulsar {
    pub fn new(
        name: impl Into<String>,
        period: Duration,
        phase_offset: Duration,
    ) -> HorologionResult<Pulsar> {
        let name = name.into();
        if period.is_zero() {
            return Err(HorologionError::NonPositivePulsarPeriod { name });
        }
        Ok(Pulsar {
            name,
            period,
            phase_offset,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn phase_offset(&self) -> Duration {
        self.phase_offset
    }

    /// Rotational phase in [0, 1) at `instant`
    pub fn phase_at(&self, instant: UtcInstant) -> f64 {
        let period = self.period.as_micros() as i64;
        let elapsed = instant.as_micros() - self.phase_offset.as_micros() as i64;
        elapsed.rem_euclid(period) as f64 / period as f64
    }

    /// Whether a pulse falls within `tick` of `instant`: true when
    /// less than one tick has elapsed since the last phase wrap
    pub fn pulsed_at(&self, instant: UtcInstant, tick: Duration) -> bool {
        let period = self.period.as_micros() as i64;
        let elapsed = instant.as_micros() - self.phase_offset.as_micros() as i64;
        elapsed.rem_euclid(period) < tick.as_micros() as i64
    }

    /// State of this pulsar at `instant`
    pub fn state_at(&self, instant: UtcInstant, tick: Duration) -> PulsarState {
        PulsarState {
            name: self.name.clone(),
            period: self.period,
            phase: self.phase_at(instant),
            pulsed: self.pulsed_at(instant, tick),
        }
    }
}

/// Snapshot of one pulsar at one instant
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PulsarState {
    pub name: String,
    pub period: Duration,
    /// Rotational phase in [0, 1)
    pub phase: f64,
    /// A pulse arrived within the last tick interval
    pub pulsed: bool,
}

/// The default catalog: four well-known pulsars spanning periods from
/// millisecond to second scale
pub fn default_catalog() -> Vec<Pulsar> {
    [
        ("Crab (PSR B0531+21)", Duration::from_micros(33_000)),
        ("PSR B1937+21", Duration::from_micros(1_558)),
        ("PSR J0737-3039A", Duration::from_micros(22_700)),
        ("PSR B1919+21", Duration::from_micros(1_337_000)),
    ]
    .into_iter()
    .map(|(name, period)| Pulsar {
        name: name.to_string(),
        period,
        phase_offset: Duration::ZERO,
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn crab() -> Pulsar {
        Pulsar::new("Crab", Duration::from_micros(33_000), Duration::ZERO).unwrap()
    }

    #[test]
    fn test_zero_period_rejected() {
        let err = Pulsar::new("broken", Duration::ZERO, Duration::ZERO).unwrap_err();
        assert!(matches!(
            err,
            HorologionError::NonPositivePulsarPeriod { .. }
        ));
    }

    #[test]
    fn test_phase_at_exact_multiples() {
        let p = crab();
        assert_eq!(p.phase_at(UtcInstant::from_micros(0)), 0.0);
        assert_eq!(p.phase_at(UtcInstant::from_micros(33_000)), 0.0);
        assert_eq!(p.phase_at(UtcInstant::from_micros(16_500)), 0.5);
    }

    #[test]
    fn test_phase_offset_shifts_wrap() {
        let p = Pulsar::new(
            "shifted",
            Duration::from_micros(1_000),
            Duration::from_micros(250),
        )
        .unwrap();
        assert_eq!(p.phase_at(UtcInstant::from_micros(250)), 0.0);
        assert_eq!(p.phase_at(UtcInstant::from_micros(750)), 0.5);
    }

    #[test]
    fn test_pulse_window() {
        let p = crab();
        let tick = Duration::from_micros(100);
        assert!(p.pulsed_at(UtcInstant::from_micros(33_000), tick));
        assert!(p.pulsed_at(UtcInstant::from_micros(33_099), tick));
        assert!(!p.pulsed_at(UtcInstant::from_micros(33_100), tick));
        assert!(!p.pulsed_at(UtcInstant::from_micros(16_500), tick));
    }

    #[test]
    fn test_pre_epoch_instants_wrap_cleanly() {
        let p = crab();
        let phase = p.phase_at(UtcInstant::from_micros(-16_500));
        assert_eq!(phase, 0.5);
    }

    #[test]
    fn test_default_catalog_is_valid() {
        let catalog = default_catalog();
        assert_eq!(catalog.len(), 4);
        for p in &catalog {
            assert!(!p.period().is_zero());
        }
        // Names are distinct
        let mut names: Vec<&str> = catalog.iter().map(|p| p.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), catalog.len());
    }

    proptest! {
        #[test]
        fn prop_phase_in_unit_interval(
            micros in i64::MIN / 2..i64::MAX / 2,
            period_us in 1u64..10_000_000,
        ) {
            let p = Pulsar::new("p", Duration::from_micros(period_us), Duration::ZERO)
                .unwrap();
            let phase = p.phase_at(UtcInstant::from_micros(micros));
            prop_assert!((0.0..1.0).contains(&phase));
        }

        #[test]
        fn prop_same_instant_same_state(micros in 0i64..u32::MAX as i64) {
            let p = crab();
            let t = UtcInstant::from_micros(micros);
            let tick = Duration::from_millis(50);
            prop_assert_eq!(p.state_at(t, tick), p.state_at(t, tick));
        }
    }
}
