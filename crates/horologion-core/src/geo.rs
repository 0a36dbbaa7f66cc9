//! Observer geography
//!
//! Coordinates are validated once, at configuration load. Every
//! calculator downstream may assume a `GeoLocation` is in range.

use serde::{Deserialize, Serialize};

use crate::{HorologionError, HorologionResult};

/// A validated observer location
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    latitude_deg: f64,
    longitude_deg: f64,
}

impl GeoLocation {
    /// Greenwich observatory, the default observer
    pub const GREENWICH: GeoLocation = GeoLocation {
        latitude_deg: 51.4769,
        longitude_deg: 0.0,
    };

    /// Validate and build a location.
    /// Latitude must be in [-90, 90], longitude in [-180, 180].
    pub fn new(latitude_deg: f64, longitude_deg: f64) -> HorologionResult<Self> {
        if !latitude_deg.is_finite() || !(-90.0..=90.0).contains(&latitude_deg) {
            return Err(HorologionError::LatitudeOutOfRange(latitude_deg));
        }
        if !longitude_deg.is_finite() || !(-180.0..=180.0).contains(&longitude_deg) {
            return Err(HorologionError::LongitudeOutOfRange(longitude_deg));
        }
        Ok(GeoLocation {
            latitude_deg,
            longitude_deg,
        })
    }

    #[inline]
    pub fn latitude_deg(&self) -> f64 {
        self.latitude_deg
    }

    #[inline]
    pub fn longitude_deg(&self) -> f64 {
        self.longitude_deg
    }
}

impl Default for GeoLocation {
    fn default() -> Self {
        GeoLocation::GREENWICH
    }
}
