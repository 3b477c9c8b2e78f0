//! Half-open interval arithmetic.
//!
//! Two intervals overlap when `a.start < b.end && b.start < a.end`, so
//! touching boundaries (one ends exactly when the other starts) never count
//! as an overlap.

use chrono::{DateTime, Duration, Utc};

use crate::booking::ExistingBooking;

/// `instant + delta`, pinned to the representable range instead of panicking.
pub fn saturating_add(instant: DateTime<Utc>, delta: Duration) -> DateTime<Utc> {
    instant.checked_add_signed(delta).unwrap_or(if delta < Duration::zero() {
        DateTime::<Utc>::MIN_UTC
    } else {
        DateTime::<Utc>::MAX_UTC
    })
}

/// A `[start, end)` span of time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Interval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Interval {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    pub fn overlaps(&self, other: &Interval) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Grow the interval by `before` on the left and `after` on the right.
    pub fn expand(&self, before: Duration, after: Duration) -> Interval {
        Interval::new(
            saturating_add(self.start, -before),
            saturating_add(self.end, after),
        )
    }
}

/// Sorted, merged blocking intervals for one host, answering overlap queries
/// with a binary search.
#[derive(Debug, Clone, Default)]
pub struct BlockedTimeline {
    merged: Vec<Interval>,
}

impl BlockedTimeline {
    /// Build from the confirmed bookings in `bookings`, each expanded by the
    /// link buffers. Cancelled bookings are ignored.
    pub fn from_bookings(bookings: &[ExistingBooking], before: Duration, after: Duration) -> Self {
        let mut intervals: Vec<Interval> = bookings
            .iter()
            .filter(|b| b.is_blocking())
            .map(|b| b.interval().expand(before, after))
            .filter(|i| i.start < i.end)
            .collect();

        intervals.sort();

        // Merging touching intervals is safe: the union covers the same instants.
        let mut merged: Vec<Interval> = Vec::with_capacity(intervals.len());
        for interval in intervals {
            if let Some(last) = merged.last_mut() {
                if interval.start <= last.end {
                    last.end = last.end.max(interval.end);
                    continue;
                }
            }
            merged.push(interval);
        }

        Self { merged }
    }

    /// Whether `candidate` overlaps any blocked interval.
    pub fn blocks(&self, candidate: &Interval) -> bool {
        // First merged interval that ends after the candidate starts; it is the
        // only one that can overlap, since the list is disjoint and sorted.
        let idx = self.merged.partition_point(|b| b.end <= candidate.start);
        self.merged
            .get(idx)
            .is_some_and(|b| b.start < candidate.end)
    }

    pub fn intervals(&self) -> &[Interval] {
        &self.merged
    }

    pub fn is_empty(&self) -> bool {
        self.merged.is_empty()
    }
}

/// Pairwise overlap check between a candidate and raw bookings, without the
/// merge step. Used for single-slot questions such as a member's availability.
pub fn conflicts_with(
    candidate: &Interval,
    bookings: &[ExistingBooking],
    before: Duration,
    after: Duration,
) -> bool {
    bookings
        .iter()
        .filter(|b| b.is_blocking())
        .any(|b| b.interval().expand(before, after).overlaps(candidate))
}
