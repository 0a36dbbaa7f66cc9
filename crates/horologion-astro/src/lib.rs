//! Horologion Astro - Astronomical models
//!
//! Low-precision solar ephemeris, Earth rotation (GMST and the
//! subsolar point), and deterministic pulsar phase simulation. All
//! functions are pure: the same instant always yields the same state.

pub mod pulsar;
pub mod rotation;
pub mod solar;

pub use pulsar::*;
pub use rotation::*;
pub use solar::*;
