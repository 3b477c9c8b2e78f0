//! DST transition policies for wall-clock slot starts.

use chrono::{DateTime, Duration, LocalResult, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Longest DST gap observed in the tz database is two hours; anything past
/// that is not a gap.
const MAX_GAP_MINUTES: i64 = 180;

/// Policy for candidate starts that fall in a DST gap (e.g. 02:30 on the
/// spring-forward night). Ambiguous times on the fall-back night always
/// resolve to the earlier instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DstPolicy {
    /// Drop the candidate.
    #[default]
    Skip,
    /// Move the candidate to the first valid instant after the gap.
    ShiftForward,
}

/// Resolve a wall-clock time in `tz` to a UTC instant under `policy`.
///
/// Returns `None` when the time does not exist and the policy is `Skip`.
pub fn resolve_local(tz: &Tz, local: NaiveDateTime, policy: DstPolicy) -> Option<DateTime<Utc>> {
    match tz.from_local_datetime(&local) {
        LocalResult::Single(dt) => Some(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(earliest, _) => Some(earliest.with_timezone(&Utc)),
        LocalResult::None => match policy {
            DstPolicy::Skip => None,
            DstPolicy::ShiftForward => (1..=MAX_GAP_MINUTES).find_map(|m| {
                tz.from_local_datetime(&(local + Duration::minutes(m)))
                    .earliest()
                    .map(|dt| dt.with_timezone(&Utc))
            }),
        },
    }
}
