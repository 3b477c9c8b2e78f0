//! Existing bookings as read from the persistence layer.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::interval::Interval;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    #[default]
    Confirmed,
    Cancelled,
}

/// Each team member's bookings, keyed by member id.
pub type BookingsByMember = BTreeMap<String, Vec<ExistingBooking>>;

/// A committed booking, `[start, end)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExistingBooking {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default)]
    pub status: BookingStatus,
    /// Host the booking belongs to; `None` when the list is already scoped
    /// to a single host.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_id: Option<String>,
}

impl ExistingBooking {
    pub fn confirmed(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start,
            end,
            status: BookingStatus::Confirmed,
            host_id: None,
        }
    }

    pub fn cancelled(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            status: BookingStatus::Cancelled,
            ..Self::confirmed(start, end)
        }
    }

    pub fn for_host(mut self, host_id: impl Into<String>) -> Self {
        self.host_id = Some(host_id.into());
        self
    }

    /// Only confirmed bookings block slots.
    pub fn is_blocking(&self) -> bool {
        self.status == BookingStatus::Confirmed
    }

    pub fn interval(&self) -> Interval {
        Interval::new(self.start, self.end)
    }
}

/// Split a mixed list into per-host lists. Bookings without a `host_id` are
/// dropped, since they cannot be attributed to anyone.
pub fn group_by_host(bookings: &[ExistingBooking]) -> BookingsByMember {
    let mut grouped = BookingsByMember::new();
    for booking in bookings {
        if let Some(host) = &booking.host_id {
            grouped.entry(host.clone()).or_default().push(booking.clone());
        }
    }
    grouped
}
