//! Horologion Sync - Network time synchronization
//!
//! An SNTP (RFC 4330) client over UDP, a synchronized time source
//! that applies the measured offset to the local clock, and a
//! background service that keeps the offset fresh with coalesced
//! re-synchronization.

pub mod ntp;
pub mod service;
pub mod source;

pub use ntp::*;
pub use service::*;
pub use source::*;
