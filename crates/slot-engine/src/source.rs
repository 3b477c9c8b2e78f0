//! Persistence collaborator contracts.
//!
//! The engine never performs I/O itself. [`BookingSource`] is the read side
//! it expects from the persistence layer; [`InMemoryBookings`] is a reference
//! implementation whose [`InMemoryBookings::try_commit`] models the
//! conditional write that keeps two racing requests from booking one slot.

use std::convert::Infallible;
use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use crate::availability::{compute_available_slots, CandidateSlot};
use crate::booking::ExistingBooking;
use crate::config::BookingLinkConfig;
use crate::error::{Result, SchedulingError};
use crate::interval::{conflicts_with, saturating_add, Interval};

/// Read access to committed bookings.
pub trait BookingSource {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Confirmed bookings of any of `host_ids` that overlap `[range_start, range_end)`.
    fn list_confirmed_bookings(
        &self,
        host_ids: &[&str],
        range_start: DateTime<Utc>,
        range_end: DateTime<Utc>,
    ) -> std::result::Result<Vec<ExistingBooking>, Self::Error>;
}

/// Failure of [`available_slots_from_source`].
#[derive(Error, Debug)]
pub enum SourceError<E: std::error::Error + 'static> {
    #[error("booking source failed: {0}")]
    Source(#[source] E),

    #[error(transparent)]
    Scheduling(#[from] SchedulingError),
}

/// Load the hosts' bookings from `source` and compute the link's slots.
///
/// The read range is widened by a day plus the buffers on each side so that
/// bookings just outside the range still block through their buffers and
/// still count toward the daily cap of the first and last local day.
pub fn available_slots_from_source<S: BookingSource>(
    source: &S,
    config: &BookingLinkConfig,
    host_ids: &[&str],
    range_start: DateTime<Utc>,
    range_end: DateTime<Utc>,
    now: DateTime<Utc>,
) -> std::result::Result<Vec<CandidateSlot>, SourceError<S::Error>> {
    let read_start = saturating_add(range_start, -(Duration::days(1) + config.buffer_after()));
    let read_end = saturating_add(
        range_end,
        Duration::days(1) + config.buffer_before() + config.duration(),
    );
    let bookings = source
        .list_confirmed_bookings(host_ids, read_start, read_end)
        .map_err(SourceError::Source)?;
    Ok(compute_available_slots(config, &bookings, range_start, range_end, now)?)
}

/// Process-local booking store guarded by a read-write lock.
#[derive(Debug, Default)]
pub struct InMemoryBookings {
    bookings: RwLock<Vec<ExistingBooking>>,
}

impl InMemoryBookings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bookings(bookings: Vec<ExistingBooking>) -> Self {
        Self {
            bookings: RwLock::new(bookings),
        }
    }

    /// Insert `booking` unless it collides with a confirmed booking of the
    /// same host, buffers from `config` included. The check and the insert
    /// happen under one write lock.
    ///
    /// # Errors
    /// Returns `SchedulingError::HostUnavailable` if the booking names no host
    /// and `SchedulingError::SlotTaken` if the interval is no longer free.
    pub fn try_commit(&self, booking: ExistingBooking, config: &BookingLinkConfig) -> Result<()> {
        let Some(host_id) = booking.host_id.clone() else {
            return Err(SchedulingError::HostUnavailable(
                "booking has no host to commit against".to_string(),
            ));
        };

        let mut bookings = self.bookings.write().unwrap_or_else(PoisonError::into_inner);
        let same_host: Vec<ExistingBooking> = bookings
            .iter()
            .filter(|b| b.host_id.as_deref() == Some(host_id.as_str()))
            .cloned()
            .collect();
        let candidate = Interval::new(booking.start, booking.end);
        if booking.is_blocking()
            && conflicts_with(&candidate, &same_host, config.buffer_before(), config.buffer_after())
        {
            return Err(SchedulingError::SlotTaken {
                host_id,
                start: booking.start,
            });
        }

        bookings.push(booking);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.bookings.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl BookingSource for InMemoryBookings {
    type Error = Infallible;

    fn list_confirmed_bookings(
        &self,
        host_ids: &[&str],
        range_start: DateTime<Utc>,
        range_end: DateTime<Utc>,
    ) -> std::result::Result<Vec<ExistingBooking>, Self::Error> {
        let window = Interval::new(range_start, range_end);
        let bookings = self.bookings.read().unwrap_or_else(PoisonError::into_inner);
        Ok(bookings
            .iter()
            .filter(|b| b.is_blocking())
            .filter(|b| {
                b.host_id
                    .as_deref()
                    .is_some_and(|host| host_ids.contains(&host))
            })
            .filter(|b| b.interval().overlaps(&window))
            .cloned()
            .collect())
    }
}
