//! Error types for slot-engine operations.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Every failure is a deterministic validation error; none are retried by the engine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchedulingError {
    /// The booking link configuration is malformed (zero duration, zero
    /// increment, inverted working hours, bad weekday index, unknown timezone).
    #[error("Invalid booking link config: {0}")]
    InvalidConfig(String),

    /// The requested range is empty after clamping to the availability window.
    #[error("Invalid range: start {start} is after end {end}")]
    InvalidRange {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    /// The requested member cannot take the slot.
    #[error("Host unavailable: {0}")]
    HostUnavailable(String),

    #[error("No available host in the team pool")]
    NoAvailableHost,

    /// A conditional commit lost against an overlapping booking for the same host.
    #[error("Slot already taken for host {host_id} at {start}")]
    SlotTaken {
        host_id: String,
        start: DateTime<Utc>,
    },
}

pub type Result<T> = std::result::Result<T, SchedulingError>;
