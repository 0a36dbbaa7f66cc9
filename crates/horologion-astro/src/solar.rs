//! Solar ephemeris
//!
//! Low-precision formulas from the Astronomical Almanac, accurate to
//! about 0.01 degrees over 1950-2050. Good enough to place the Sun on
//! a ring; not an ephemeris for pointing telescopes.

use serde::{Deserialize, Serialize};

use horologion_core::UtcInstant;

/// Zodiacal signs, 30 degrees of ecliptic longitude each starting
/// from the vernal equinox
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ZodiacSign {
    Aries,
    Taurus,
    Gemini,
    Cancer,
    Leo,
    Virgo,
    Libra,
    Scorpio,
    Sagittarius,
    Capricorn,
    Aquarius,
    Pisces,
}

impl ZodiacSign {
    const ALL: [ZodiacSign; 12] = [
        ZodiacSign::Aries,
        ZodiacSign::Taurus,
        ZodiacSign::Gemini,
        ZodiacSign::Cancer,
        ZodiacSign::Leo,
        ZodiacSign::Virgo,
        ZodiacSign::Libra,
        ZodiacSign::Scorpio,
        ZodiacSign::Sagittarius,
        ZodiacSign::Capricorn,
        ZodiacSign::Aquarius,
        ZodiacSign::Pisces,
    ];

    /// Sign containing the given ecliptic longitude
    pub fn from_longitude(longitude_deg: f64) -> ZodiacSign {
        let lon = longitude_deg.rem_euclid(360.0);
        Self::ALL[(lon / 30.0) as usize % 12]
    }

    pub fn name(self) -> &'static str {
        match self {
            ZodiacSign::Aries => "Aries",
            ZodiacSign::Taurus => "Taurus",
            ZodiacSign::Gemini => "Gemini",
            ZodiacSign::Cancer => "Cancer",
            ZodiacSign::Leo => "Leo",
            ZodiacSign::Virgo => "Virgo",
            ZodiacSign::Libra => "Libra",
            ZodiacSign::Scorpio => "Scorpio",
            ZodiacSign::Sagittarius => "Sagittarius",
            ZodiacSign::Capricorn => "Capricorn",
            ZodiacSign::Aquarius => "Aquarius",
            ZodiacSign::Pisces => "Pisces",
        }
    }
}

/// Astronomical seasons, bounded by the equinoxes and solstices at
/// ecliptic longitudes 0, 90, 180 and 270 degrees. Named for the
/// northern hemisphere.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Season {
    Spring,
    Summer,
    Autumn,
    Winter,
}

impl Season {
    /// Season containing the given ecliptic longitude
    pub fn from_longitude(longitude_deg: f64) -> Season {
        match longitude_deg.rem_euclid(360.0) {
            l if l < 90.0 => Season::Spring,
            l if l < 180.0 => Season::Summer,
            l if l < 270.0 => Season::Autumn,
            _ => Season::Winter,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Season::Spring => "Spring",
            Season::Summer => "Summer",
            Season::Autumn => "Autumn",
            Season::Winter => "Winter",
        }
    }
}

/// Solar position at one instant
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SolarPosition {
    /// Apparent ecliptic longitude, degrees in [0, 360)
    pub ecliptic_longitude_deg: f64,
    /// Declination, degrees in roughly [-23.44, 23.44]
    pub declination_deg: f64,
    /// Right ascension, degrees in [0, 360)
    pub right_ascension_deg: f64,
    /// Obliquity of the ecliptic, degrees
    pub obliquity_deg: f64,
    /// Fraction of the tropical year elapsed since the vernal
    /// equinox, in [0, 1)
    pub year_fraction: f64,
    /// Season containing the Sun
    pub season: Season,
    /// Sign containing the Sun
    pub zodiac: ZodiacSign,
}

/// Compute the Sun's position at `instant`
pub fn solar_position(instant: UtcInstant) -> SolarPosition {
    let n = instant.days_since_j2000();

    // Mean longitude and mean anomaly
    let mean_longitude = (280.460 + 0.985_647_4 * n).rem_euclid(360.0);
    let mean_anomaly = (357.528 + 0.985_600_3 * n).rem_euclid(360.0);

    // Equation of center gives the apparent ecliptic longitude
    let g = mean_anomaly.to_radians();
    let longitude =
        (mean_longitude + 1.915 * g.sin() + 0.020 * (2.0 * g).sin()).rem_euclid(360.0);

    let obliquity = 23.439 - 4.0e-7 * n;

    let lambda = longitude.to_radians();
    let eps = obliquity.to_radians();
    let declination = (eps.sin() * lambda.sin()).asin().to_degrees();
    let right_ascension = (eps.cos() * lambda.sin())
        .atan2(lambda.cos())
        .to_degrees()
        .rem_euclid(360.0);

    SolarPosition {
        ecliptic_longitude_deg: longitude,
        declination_deg: declination,
        right_ascension_deg: right_ascension,
        obliquity_deg: obliquity,
        year_fraction: longitude / 360.0,
        season: Season::from_longitude(longitude),
        zodiac: ZodiacSign::from_longitude(longitude),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn instant_at(secs: i64) -> UtcInstant {
        UtcInstant::from_secs(secs)
    }

    #[test]
    fn test_march_equinox_2024() {
        // 2024-03-20T03:06Z: longitude crosses 0
        let pos = solar_position(instant_at(1_710_903_960));
        let lon = pos.ecliptic_longitude_deg;
        assert!(lon < 1.0 || lon > 359.0, "longitude {lon}");
        assert!(pos.declination_deg.abs() < 0.5);
    }

    #[test]
    fn test_september_equinox_2024() {
        // 2024-09-22T12:44Z: longitude crosses 180
        let pos = solar_position(instant_at(1_726_922_640));
        assert!(
            (pos.ecliptic_longitude_deg - 180.0).abs() < 1.0,
            "longitude {}",
            pos.ecliptic_longitude_deg
        );

        // A day later the Sun is unambiguously in Libra and autumn
        let later = solar_position(instant_at(1_727_092_800));
        assert_eq!(later.zodiac, ZodiacSign::Libra);
        assert_eq!(later.season, Season::Autumn);
    }

    #[test]
    fn test_june_solstice_2024() {
        // 2024-06-20T20:51Z: longitude 90, declination near maximum
        let pos = solar_position(instant_at(1_718_916_660));
        assert!((pos.ecliptic_longitude_deg - 90.0).abs() < 1.0);
        assert!((pos.declination_deg - 23.44).abs() < 0.1);
    }

    #[test]
    fn test_season_boundaries_exact() {
        // Transitions happen exactly at the 90-degree multiples
        assert_eq!(Season::from_longitude(0.0), Season::Spring);
        assert_eq!(Season::from_longitude(89.999), Season::Spring);
        assert_eq!(Season::from_longitude(90.0), Season::Summer);
        assert_eq!(Season::from_longitude(180.0), Season::Autumn);
        assert_eq!(Season::from_longitude(270.0), Season::Winter);
        assert_eq!(Season::from_longitude(359.999), Season::Winter);
        assert_eq!(Season::from_longitude(360.0), Season::Spring);
    }

    #[test]
    fn test_zodiac_boundaries() {
        assert_eq!(ZodiacSign::from_longitude(0.0), ZodiacSign::Aries);
        assert_eq!(ZodiacSign::from_longitude(29.9), ZodiacSign::Aries);
        assert_eq!(ZodiacSign::from_longitude(30.0), ZodiacSign::Taurus);
        assert_eq!(ZodiacSign::from_longitude(359.9), ZodiacSign::Pisces);
        assert_eq!(ZodiacSign::from_longitude(-10.0), ZodiacSign::Pisces);
        assert_eq!(ZodiacSign::from_longitude(720.0), ZodiacSign::Aries);
    }

    proptest! {
        #[test]
        fn prop_ranges_hold(secs in 0i64..4_102_444_800) {
            let pos = solar_position(instant_at(secs));
            prop_assert!((0.0..360.0).contains(&pos.ecliptic_longitude_deg));
            prop_assert!(pos.declination_deg.abs() <= 23.5);
            prop_assert!((0.0..1.0).contains(&pos.year_fraction));
            prop_assert!((0.0..360.0).contains(&pos.right_ascension_deg));
        }

        #[test]
        fn prop_determinism(secs in 0i64..4_102_444_800) {
            let a = solar_position(instant_at(secs));
            let b = solar_position(instant_at(secs));
            prop_assert_eq!(a, b);
        }
    }
}
