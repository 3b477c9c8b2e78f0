//! Slot generation for a booking link.
//!
//! Walks every local calendar day of the requested range in the link's
//! timezone, steps through the day's working hours by the configured
//! increment, and rejects candidates that violate lead time, collide with a
//! buffered confirmed booking, or fall on a day whose booking cap is already
//! reached. The computation is pure: identical inputs give identical output.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::booking::{BookingsByMember, ExistingBooking};
use crate::config::{BookingLinkConfig, WorkingHours};
use crate::dst::{resolve_local, DstPolicy};
use crate::error::{Result, SchedulingError};
use crate::interval::{saturating_add, BlockedTimeline, Interval};

/// Why a candidate was not offered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotRejection {
    /// Starts before `now + lead_time`.
    LeadTime,
    /// Overlaps a confirmed booking once its buffers are applied.
    Conflict,
    /// The day already holds `max_bookings_per_day` confirmed bookings.
    DailyCap,
}

/// A computed `[start, end)` slot. Never persisted by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateSlot {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub available: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejection: Option<SlotRejection>,
}

impl CandidateSlot {
    /// An offerable slot.
    pub fn open(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start,
            end,
            available: true,
            rejection: None,
        }
    }

    pub fn interval(&self) -> Interval {
        Interval::new(self.start, self.end)
    }

    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }
}

/// A team slot with the members free to take it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamSlot {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub available_members: Vec<String>,
}

/// Compute the offerable slots for a link between `range_start` and
/// `range_end`, as seen at `now`.
///
/// `existing_bookings` are the responsible host's bookings; cancelled entries
/// are ignored. The result is sorted by start and free of duplicates.
///
/// # Errors
/// Returns `SchedulingError::InvalidConfig` if the config fails validation and
/// `SchedulingError::InvalidRange` if `range_start` is after `range_end` once
/// the latter is clamped to `now + availability_window_days`.
pub fn compute_available_slots(
    config: &BookingLinkConfig,
    existing_bookings: &[ExistingBooking],
    range_start: DateTime<Utc>,
    range_end: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<Vec<CandidateSlot>> {
    let grid = compute_slot_grid(config, existing_bookings, range_start, range_end, now)?;
    Ok(grid.into_iter().filter(|slot| slot.available).collect())
}

/// Like [`compute_available_slots`], but keeps rejected candidates, tagged
/// with `available: false` and the first rule they broke.
///
/// # Errors
/// Same as [`compute_available_slots`].
pub fn compute_slot_grid(
    config: &BookingLinkConfig,
    existing_bookings: &[ExistingBooking],
    range_start: DateTime<Utc>,
    range_end: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<Vec<CandidateSlot>> {
    let tz = config.validate()?;
    let range_end = clamp_range(config, range_start, range_end, now)?;

    let earliest_start = saturating_add(now, config.lead_time());
    let timeline = BlockedTimeline::from_bookings(
        existing_bookings,
        config.buffer_before(),
        config.buffer_after(),
    );
    let per_day = confirmed_per_day(existing_bookings, &tz);
    let duration = config.duration();

    let mut slots = Vec::new();
    for day in local_days(&tz, range_start, range_end) {
        let Some(hours) = config.hours_on(day) else {
            continue;
        };

        let capped = config.max_bookings_per_day > 0
            && per_day.get(&day).copied().unwrap_or(0) >= config.max_bookings_per_day;
        if capped {
            trace!(%day, cap = config.max_bookings_per_day, "daily booking cap reached");
        }

        for start in day_starts(config, &tz, day, hours) {
            if start < range_start || start > range_end {
                continue;
            }
            let candidate = Interval::new(start, saturating_add(start, duration));
            let rejection = if start < earliest_start {
                Some(SlotRejection::LeadTime)
            } else if timeline.blocks(&candidate) {
                Some(SlotRejection::Conflict)
            } else if capped {
                Some(SlotRejection::DailyCap)
            } else {
                None
            };
            slots.push(CandidateSlot {
                start: candidate.start,
                end: candidate.end,
                available: rejection.is_none(),
                rejection,
            });
        }
    }

    slots.sort_by_key(|s| (s.start, s.end));
    slots.dedup_by(|a, b| a.start == b.start && a.end == b.end);

    debug!(
        timezone = %tz,
        candidates = slots.len(),
        available = slots.iter().filter(|s| s.available).count(),
        blocked_intervals = timeline.intervals().len(),
        "computed slot grid"
    );

    Ok(slots)
}

/// Offerable slots for a team link: a slot is offered while at least one
/// member is free at it. Each member's daily cap is evaluated against that
/// member's own bookings.
///
/// # Errors
/// Same as [`compute_available_slots`].
pub fn compute_team_slots(
    config: &BookingLinkConfig,
    member_bookings: &BookingsByMember,
    range_start: DateTime<Utc>,
    range_end: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<Vec<TeamSlot>> {
    // Validate once up front so an empty team still reports a bad config or range.
    config.validate()?;
    clamp_range(config, range_start, range_end, now)?;

    let mut by_interval: BTreeMap<(DateTime<Utc>, DateTime<Utc>), Vec<String>> = BTreeMap::new();
    for (member_id, bookings) in member_bookings {
        for slot in compute_available_slots(config, bookings, range_start, range_end, now)? {
            by_interval
                .entry((slot.start, slot.end))
                .or_default()
                .push(member_id.clone());
        }
    }

    Ok(by_interval
        .into_iter()
        .map(|((start, end), available_members)| TeamSlot {
            start,
            end,
            available_members,
        })
        .collect())
}

/// Clamp `range_end` to the availability window and check the range.
fn clamp_range(
    config: &BookingLinkConfig,
    range_start: DateTime<Utc>,
    range_end: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<DateTime<Utc>> {
    let range_end = range_end.min(saturating_add(now, config.availability_window()));
    if range_start > range_end {
        return Err(SchedulingError::InvalidRange {
            start: range_start,
            end: range_end,
        });
    }
    Ok(range_end)
}

/// Local calendar days touched by `[start, end]`, inclusive.
fn local_days(
    tz: &Tz,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> impl Iterator<Item = NaiveDate> {
    let first = start.with_timezone(tz).date_naive();
    let last = end.with_timezone(tz).date_naive();
    first.iter_days().take_while(move |day| *day <= last)
}

/// Candidate start instants for one working day, in wall-clock order.
///
/// Starts step through the day's hours on the wall clock, but the fit against
/// closing time is judged on real elapsed time, so a slot never runs past
/// closing on a day the clocks change.
fn day_starts<'a>(
    config: &'a BookingLinkConfig,
    tz: &'a Tz,
    day: NaiveDate,
    hours: WorkingHours,
) -> impl Iterator<Item = DateTime<Utc>> + 'a {
    let close = hours.close_on(day);
    // A closing time inside a DST gap closes at the transition instant.
    let close_utc = resolve_local(tz, close, DstPolicy::ShiftForward);
    let duration = config.duration();
    let step = config.increment();

    let mut next = Some(hours.open_on(day));
    std::iter::from_fn(move || {
        let local = next.filter(|local| *local < close)?;
        next = local.checked_add_signed(step);
        Some(local)
    })
    .filter_map(move |local| resolve_local(tz, local, config.dst_policy))
    .filter(move |start| close_utc.is_some_and(|close| saturating_add(*start, duration) <= close))
}

/// Confirmed bookings per local start date.
fn confirmed_per_day(bookings: &[ExistingBooking], tz: &Tz) -> HashMap<NaiveDate, u32> {
    let mut counts = HashMap::new();
    for booking in bookings.iter().filter(|b| b.is_blocking()) {
        *counts
            .entry(booking.start.with_timezone(tz).date_naive())
            .or_insert(0) += 1;
    }
    counts
}
