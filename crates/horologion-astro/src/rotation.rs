//! Earth rotation model
//!
//! Greenwich mean sidereal time and the subsolar point, plus the
//! sunrise-equation day fraction for an observer. Mean rotation only:
//! no nutation, no polar motion, no equation of the equinoxes.

use serde::{Deserialize, Serialize};

use horologion_core::{GeoLocation, UtcInstant};

use crate::solar::{solar_position, SolarPosition};

/// Earth orientation at one instant, for one observer
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RotationState {
    /// Greenwich mean sidereal time, degrees in [0, 360)
    pub gmst_deg: f64,
    /// Latitude under the Sun, degrees
    pub subsolar_latitude_deg: f64,
    /// Longitude under the Sun, degrees in (-180, 180]
    pub subsolar_longitude_deg: f64,
    /// Observer's rotation angle (GMST plus observer longitude),
    /// degrees in [0, 360)
    pub rotation_angle_deg: f64,
    /// Fraction of the day the Sun is above the observer's horizon,
    /// in [0, 1]. 0 is polar night, 1 is midnight sun.
    pub day_fraction_visible: f64,
}

/// Greenwich mean sidereal time in degrees at `instant`
pub fn gmst_deg(instant: UtcInstant) -> f64 {
    let n = instant.days_since_j2000();
    (280.460_618_37 + 360.985_647_366_29 * n).rem_euclid(360.0)
}

/// Earth orientation at `instant` as seen from `location`
pub fn rotation_state(instant: UtcInstant, location: &GeoLocation) -> RotationState {
    rotation_state_with_sun(instant, location, &solar_position(instant))
}

/// As [`rotation_state`], reusing an already-computed solar position
pub fn rotation_state_with_sun(
    instant: UtcInstant,
    location: &GeoLocation,
    sun: &SolarPosition,
) -> RotationState {
    let gmst = gmst_deg(instant);

    // The subsolar meridian is where the Sun's hour angle is zero:
    // the Sun's right ascension measured from the Greenwich meridian
    let mut subsolar_lon = sun.right_ascension_deg - gmst;
    subsolar_lon = subsolar_lon.rem_euclid(360.0);
    if subsolar_lon > 180.0 {
        subsolar_lon -= 360.0;
    }

    RotationState {
        gmst_deg: gmst,
        subsolar_latitude_deg: sun.declination_deg,
        subsolar_longitude_deg: subsolar_lon,
        rotation_angle_deg: (gmst + location.longitude_deg()).rem_euclid(360.0),
        day_fraction_visible: day_fraction(location.latitude_deg(), sun.declination_deg),
    }
}

/// Sunrise equation: fraction of the day with the Sun geometrically
/// above the horizon. The cosine is clamped so polar latitudes report
/// 0 or 1 rather than NaN.
pub fn day_fraction(latitude_deg: f64, declination_deg: f64) -> f64 {
    let phi = latitude_deg.to_radians();
    let delta = declination_deg.to_radians();
    let cos_h0 = (-phi.tan() * delta.tan()).clamp(-1.0, 1.0);
    cos_h0.acos() / std::f64::consts::PI
}
