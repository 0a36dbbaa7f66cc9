//! Horologion Core - Fundamental types and primitives
//!
//! This crate defines the types shared by every time system:
//! - `UtcInstant` / `ClockOffset`: the UTC-anchored time primitives
//! - `WallClock`: the local clock source seam
//! - `GeoLocation`: validated observer coordinates
//! - `HorologionError`: the unified error taxonomy

pub mod clock;
pub mod error;
pub mod geo;
pub mod time;

pub use clock::*;
pub use error::*;
pub use geo::*;
pub use time::*;
