//! Booking link configuration and its validation rules.
//!
//! A [`BookingLinkConfig`] is read on every availability query and never
//! mutated during one. Weekday indices follow the JavaScript convention used
//! by the booking front end: `0 = Sunday` through `6 = Saturday`.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::dst::DstPolicy;
use crate::error::{Result, SchedulingError};

const DEFAULT_WINDOW_DAYS: u32 = 60;
const DEFAULT_INCREMENT_MINUTES: u32 = 30;

/// Wall-clock opening hours for a single day, `[start, end)`.
///
/// An `end` of `00:00` (written `"24:00"` in JSON) closes the day at the
/// following midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkingHours {
    #[serde(with = "hhmm")]
    pub start: NaiveTime,
    #[serde(with = "hhmm::end_of_day")]
    pub end: NaiveTime,
}

impl WorkingHours {
    /// Build from `(hour, minute)` pairs. `(24, 0)` is accepted as an end.
    ///
    /// # Errors
    /// Returns `SchedulingError::InvalidConfig` if either pair is not a valid
    /// wall-clock time.
    pub fn new(start: (u32, u32), end: (u32, u32)) -> Result<Self> {
        let end = if end == (24, 0) {
            NaiveTime::MIN
        } else {
            hm(end)?
        };
        Ok(Self {
            start: hm(start)?,
            end,
        })
    }

    /// Whether the day runs until the next midnight.
    pub fn closes_at_midnight(&self) -> bool {
        self.end == NaiveTime::MIN
    }

    /// Opening instant on `date`, as a wall-clock time.
    pub fn open_on(&self, date: NaiveDate) -> NaiveDateTime {
        date.and_time(self.start)
    }

    /// Closing instant on `date`, as a wall-clock time.
    pub fn close_on(&self, date: NaiveDate) -> NaiveDateTime {
        if self.closes_at_midnight() {
            date.and_time(NaiveTime::MIN) + Duration::days(1)
        } else {
            date.and_time(self.end)
        }
    }

    fn is_empty(&self) -> bool {
        !self.closes_at_midnight() && self.start >= self.end
    }
}

fn hm((hour, minute): (u32, u32)) -> Result<NaiveTime> {
    NaiveTime::from_hms_opt(hour, minute, 0)
        .ok_or_else(|| invalid(format!("invalid wall-clock time {hour:02}:{minute:02}")))
}

/// One bookable offering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingLinkConfig {
    /// Length of every slot, in minutes.
    pub duration_minutes: u32,
    /// How many days past `now` a booking may start.
    #[serde(default = "default_window_days")]
    pub availability_window_days: u32,
    /// Enabled weekdays, `0 = Sunday`.
    pub working_days: BTreeSet<u8>,
    /// Hours used for every enabled day without an override.
    pub working_hours: WorkingHours,
    /// Per-weekday overrides of `working_hours`.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub hours_by_day: BTreeMap<u8, WorkingHours>,
    #[serde(default)]
    pub buffer_before_minutes: u32,
    #[serde(default)]
    pub buffer_after_minutes: u32,
    /// Minimum notice before the earliest bookable instant.
    #[serde(default)]
    pub lead_time_minutes: u32,
    /// `0` means unlimited.
    #[serde(default)]
    pub max_bookings_per_day: u32,
    #[serde(default = "default_increment")]
    pub start_time_increment_minutes: u32,
    /// IANA zone id the working hours are expressed in.
    pub timezone: String,
    #[serde(default)]
    pub dst_policy: DstPolicy,
}

fn default_window_days() -> u32 {
    DEFAULT_WINDOW_DAYS
}

fn default_increment() -> u32 {
    DEFAULT_INCREMENT_MINUTES
}

impl BookingLinkConfig {
    /// A Monday–Friday, 09:00–17:00 link with no buffers, caps, or lead time.
    pub fn new(duration_minutes: u32, timezone: &str) -> Self {
        Self {
            duration_minutes,
            availability_window_days: DEFAULT_WINDOW_DAYS,
            working_days: (1..=5).collect(),
            working_hours: WorkingHours {
                start: NaiveTime::MIN + Duration::hours(9),
                end: NaiveTime::MIN + Duration::hours(17),
            },
            hours_by_day: BTreeMap::new(),
            buffer_before_minutes: 0,
            buffer_after_minutes: 0,
            lead_time_minutes: 0,
            max_bookings_per_day: 0,
            start_time_increment_minutes: DEFAULT_INCREMENT_MINUTES,
            timezone: timezone.to_string(),
            dst_policy: DstPolicy::default(),
        }
    }

    /// Parse a config from JSON and validate it.
    ///
    /// # Errors
    /// Returns `SchedulingError::InvalidConfig` for malformed JSON or any rule
    /// violation reported by [`BookingLinkConfig::validate`].
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| SchedulingError::InvalidConfig(format!("malformed JSON: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Check every structural rule and return the parsed timezone.
    ///
    /// # Errors
    /// Returns `SchedulingError::InvalidConfig` when the duration or increment
    /// is zero, a weekday index is above 6, an enabled day's hours start at or
    /// after their end, or the timezone is not a known IANA id.
    pub fn validate(&self) -> Result<Tz> {
        if self.duration_minutes == 0 {
            return Err(invalid("duration must be greater than zero"));
        }
        if self.start_time_increment_minutes == 0 {
            return Err(invalid("start time increment must be greater than zero"));
        }
        if let Some(day) = self
            .working_days
            .iter()
            .chain(self.hours_by_day.keys())
            .find(|&&d| d > 6)
        {
            return Err(invalid(format!("weekday index {day} is outside 0-6")));
        }
        for &day in &self.working_days {
            let hours = self.effective_hours(day);
            if hours.is_empty() {
                return Err(invalid(format!(
                    "working hours for weekday {day} start at {} but end at {}",
                    hours.start.format("%H:%M"),
                    hours.end.format("%H:%M")
                )));
            }
        }
        self.timezone
            .parse::<Tz>()
            .map_err(|_| invalid(format!("unknown timezone '{}'", self.timezone)))
    }

    /// Working hours for `date`, or `None` when the weekday is disabled.
    pub fn hours_on(&self, date: NaiveDate) -> Option<WorkingHours> {
        let day = weekday_index(date.weekday());
        self.working_days
            .contains(&day)
            .then(|| self.effective_hours(day))
    }

    fn effective_hours(&self, day: u8) -> WorkingHours {
        self.hours_by_day
            .get(&day)
            .copied()
            .unwrap_or(self.working_hours)
    }

    pub fn duration(&self) -> Duration {
        minutes(self.duration_minutes)
    }

    pub fn increment(&self) -> Duration {
        minutes(self.start_time_increment_minutes)
    }

    pub fn buffer_before(&self) -> Duration {
        minutes(self.buffer_before_minutes)
    }

    pub fn buffer_after(&self) -> Duration {
        minutes(self.buffer_after_minutes)
    }

    pub fn lead_time(&self) -> Duration {
        minutes(self.lead_time_minutes)
    }

    pub fn availability_window(&self) -> Duration {
        Duration::days(i64::from(self.availability_window_days))
    }
}

/// Weekday index with `0 = Sunday`.
pub fn weekday_index(weekday: Weekday) -> u8 {
    weekday.num_days_from_sunday() as u8
}

fn minutes(value: u32) -> Duration {
    Duration::minutes(i64::from(value))
}

fn invalid(message: impl Into<String>) -> SchedulingError {
    SchedulingError::InvalidConfig(message.into())
}

/// `HH:MM` (optionally `HH:MM:SS`) wall-clock times.
mod hhmm {
    use chrono::NaiveTime;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&time.format("%H:%M"))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw)
            .ok_or_else(|| de::Error::custom(format!("invalid time '{raw}', expected HH:MM")))
    }

    fn parse(raw: &str) -> Option<NaiveTime> {
        NaiveTime::parse_from_str(raw, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
            .ok()
    }

    /// Closing times, where midnight is written `"24:00"`.
    pub mod end_of_day {
        use chrono::NaiveTime;
        use serde::{de, Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            time: &NaiveTime,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            if *time == NaiveTime::MIN {
                serializer.serialize_str("24:00")
            } else {
                super::serialize(time, serializer)
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<NaiveTime, D::Error> {
            let raw = String::deserialize(deserializer)?;
            if raw == "24:00" || raw == "24:00:00" {
                return Ok(NaiveTime::MIN);
            }
            super::parse(&raw)
                .ok_or_else(|| de::Error::custom(format!("invalid time '{raw}', expected HH:MM")))
        }
    }
}
