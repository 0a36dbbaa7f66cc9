//! Horologion Engine - Snapshot assembly and the tick loop
//!
//! `TemporalModelEngine` reads one instant from the synchronized time
//! source per tick, fans it out to the calendar and astronomy
//! calculators, and publishes the resulting immutable `Snapshot`
//! through a watch channel for the renderer to consume.

pub mod config;
pub mod engine;
pub mod snapshot;

pub use config::*;
pub use engine::*;
pub use snapshot::*;
