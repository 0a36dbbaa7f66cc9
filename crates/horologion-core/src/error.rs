//! Error types for the Horologion engine

use thiserror::Error;

/// Unified Horologion errors
#[derive(Error, Debug)]
pub enum HorologionError {
    // Configuration errors - fatal at load time
    #[error("Unknown timezone identifier: {0}")]
    InvalidTimezone(String),

    #[error("Latitude out of range [-90, 90]: {0}")]
    LatitudeOutOfRange(f64),

    #[error("Longitude out of range [-180, 180]: {0}")]
    LongitudeOutOfRange(f64),

    #[error("Pulsar {name:?} has non-positive period")]
    NonPositivePulsarPeriod { name: String },

    #[error("Duplicate pulsar name: {0:?}")]
    DuplicatePulsarName(String),

    #[error("Tick interval must be positive")]
    ZeroTickInterval,

    // Time source errors - recovered locally, surfaced as sync status
    #[error("DNS resolution failed for {server}: {reason}")]
    DnsResolutionFailed { server: String, reason: String },

    #[error("Timed out waiting for {server}")]
    SyncTimeout { server: String },

    #[error("Malformed reply from {server}")]
    MalformedReply { server: String },

    #[error("No time server reachable")]
    NoServerReachable,

    #[error("Transport error: {0}")]
    Transport(String),

    // Calendar errors
    #[error("Instant predates the Hebrew calendar epoch (rata die {0})")]
    BeforeHebrewEpoch(i64),
}

/// Result type for Horologion operations
pub type HorologionResult<T> = Result<T, HorologionError>;
