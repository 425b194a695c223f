//! Mentor availability: weekly rules, concrete slots, blocked periods and
//! booking settings.
//!
//! Weekly rules are expressed in the mentor's local time; slots and
//! exceptions are concrete UTC intervals. [`SlotGenerationPlan`] expands
//! rules into candidate slots, resolving local wall-clock times through the
//! mentor's [`Timezone`](super::Timezone).

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc, Weekday};
use chrono_tz::Tz;
use uuid::Uuid;

use super::UserId;

/// Longest span, in days between first and last date, a generation request
/// may cover.
pub const MAX_GENERATION_SPAN_DAYS: i64 = 90;
/// Bounds for a generated session length in minutes.
pub const SESSION_MINUTES_RANGE: std::ops::RangeInclusive<i64> = 15..=480;
/// Bounds for a break between generated sessions in minutes.
pub const BREAK_MINUTES_RANGE: std::ops::RangeInclusive<i64> = 0..=60;

/// Validation errors for availability values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AvailabilityValidationError {
    #[error("start must be before end")]
    EmptyInterval,
    #[error("weekday must be between 0 (Monday) and 6 (Sunday), got {value}")]
    InvalidWeekday { value: i16 },
    #[error("start time must be before end time")]
    InvalidTimeWindow,
    #[error("start date must not be after end date")]
    InvalidDateRange,
    #[error("date range cannot exceed {max} days")]
    DateRangeTooLong { max: i64 },
    #[error("{field} must be between {min} and {max}")]
    OutOfRange {
        field: &'static str,
        min: i64,
        max: i64,
    },
    #[error("pattern must name at least one weekday")]
    EmptyPattern,
    #[error("no weekly availability rules to generate from")]
    NoRules,
}

/// Half-open UTC interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Interval {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl Interval {
    /// Build an interval, rejecting empty or inverted ranges.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, AvailabilityValidationError> {
        if start >= end {
            return Err(AvailabilityValidationError::EmptyInterval);
        }
        Ok(Self { start, end })
    }

    /// Wrap bounds whose ordering was checked when they were stored.
    pub(crate) const fn from_ordered(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    #[must_use]
    pub const fn start(&self) -> DateTime<Utc> {
        self.start
    }

    #[must_use]
    pub const fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// True when the two intervals share any instant.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// True when `other` lies entirely within `self`.
    #[must_use]
    pub fn contains(&self, other: &Self) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Whole minutes covered by the interval.
    #[must_use]
    pub fn minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }
}

/// Map a Monday-based index (0 = Monday) to a [`Weekday`].
pub fn weekday_from_index(value: i16) -> Result<Weekday, AvailabilityValidationError> {
    let index = u8::try_from(value).map_err(|_| AvailabilityValidationError::InvalidWeekday { value })?;
    Weekday::try_from(index).map_err(|_| AvailabilityValidationError::InvalidWeekday { value })
}

/// Monday-based index of `weekday`.
#[must_use]
pub fn weekday_index(weekday: Weekday) -> i16 {
    i16::try_from(weekday.num_days_from_monday()).unwrap_or_default()
}

/// Recurring local-time window on one weekday.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeeklyWindow {
    pub weekday: Weekday,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

impl WeeklyWindow {
    pub fn new(
        weekday: Weekday,
        start_time: NaiveTime,
        end_time: NaiveTime,
    ) -> Result<Self, AvailabilityValidationError> {
        if start_time >= end_time {
            return Err(AvailabilityValidationError::InvalidTimeWindow);
        }
        Ok(Self {
            weekday,
            start_time,
            end_time,
        })
    }
}

/// Stored weekly rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeeklyRule {
    pub id: Uuid,
    pub mentor_id: UserId,
    pub window: WeeklyWindow,
}

/// Concrete bookable slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailabilitySlot {
    pub id: Uuid,
    pub mentor_id: UserId,
    pub start_utc: DateTime<Utc>,
    pub end_utc: DateTime<Utc>,
    pub is_booked: bool,
    pub created_at: DateTime<Utc>,
}

impl AvailabilitySlot {
    #[must_use]
    pub const fn interval(&self) -> Interval {
        Interval {
            start: self.start_utc,
            end: self.end_utc,
        }
    }
}

/// Blocked period during which no slot is offered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailabilityException {
    pub id: Uuid,
    pub mentor_id: UserId,
    pub start_utc: DateTime<Utc>,
    pub end_utc: DateTime<Utc>,
    pub reason: String,
}

impl AvailabilityException {
    #[must_use]
    pub const fn interval(&self) -> Interval {
        Interval {
            start: self.start_utc,
            end: self.end_utc,
        }
    }
}

/// Per-mentor booking constraints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AvailabilitySettings {
    pub min_booking_notice_hours: i32,
    pub max_booking_advance_days: i32,
    pub default_session_minutes: i32,
}

impl Default for AvailabilitySettings {
    fn default() -> Self {
        Self {
            min_booking_notice_hours: 2,
            max_booking_advance_days: 90,
            default_session_minutes: 60,
        }
    }
}

fn check_range(
    field: &'static str,
    value: i64,
    range: std::ops::RangeInclusive<i64>,
) -> Result<(), AvailabilityValidationError> {
    if range.contains(&value) {
        Ok(())
    } else {
        Err(AvailabilityValidationError::OutOfRange {
            field,
            min: *range.start(),
            max: *range.end(),
        })
    }
}

impl AvailabilitySettings {
    /// Check every field against its permitted range.
    pub fn validate(self) -> Result<Self, AvailabilityValidationError> {
        check_range(
            "minBookingNoticeHours",
            i64::from(self.min_booking_notice_hours),
            0..=168,
        )?;
        check_range(
            "maxBookingAdvanceDays",
            i64::from(self.max_booking_advance_days),
            1..=365,
        )?;
        check_range(
            "defaultSessionMinutes",
            i64::from(self.default_session_minutes),
            SESSION_MINUTES_RANGE,
        )?;
        Ok(self)
    }

    #[must_use]
    pub fn min_notice(&self) -> Duration {
        Duration::hours(i64::from(self.min_booking_notice_hours))
    }

    #[must_use]
    pub fn max_advance(&self) -> Duration {
        Duration::days(i64::from(self.max_booking_advance_days))
    }
}

/// Resolve a local wall-clock time in `tz` to UTC.
///
/// Times falling in a DST gap yield `None`; ambiguous times resolve to the
/// earliest instant.
#[must_use]
pub fn resolve_local(tz: Tz, date: NaiveDate, time: NaiveTime) -> Option<DateTime<Utc>> {
    tz.from_local_datetime(&date.and_time(time))
        .earliest()
        .map(|local| local.with_timezone(&Utc))
}

/// How a weekly window is cut into slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionLayout {
    session: Option<Duration>,
    gap: Duration,
}

impl SessionLayout {
    /// Validate optional session and break lengths in minutes.
    pub fn new(
        session_minutes: Option<i64>,
        break_minutes: Option<i64>,
    ) -> Result<Self, AvailabilityValidationError> {
        if let Some(minutes) = session_minutes {
            check_range("sessionDurationMinutes", minutes, SESSION_MINUTES_RANGE)?;
        }
        let gap = break_minutes.unwrap_or(0);
        check_range("breakDurationMinutes", gap, BREAK_MINUTES_RANGE)?;
        Ok(Self {
            session: session_minutes.map(Duration::minutes),
            gap: Duration::minutes(gap),
        })
    }

    fn split(&self, window: Interval) -> Vec<Interval> {
        let Some(session) = self.session else {
            return vec![window];
        };
        let mut out = Vec::new();
        let mut cursor = window.start;
        while cursor + session <= window.end {
            out.push(Interval {
                start: cursor,
                end: cursor + session,
            });
            cursor = cursor + session + self.gap;
        }
        out
    }
}

/// Validated request to expand weekly windows into slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotGenerationPlan {
    start_date: NaiveDate,
    end_date: NaiveDate,
    windows: Vec<WeeklyWindow>,
    layout: SessionLayout,
}

impl SlotGenerationPlan {
    pub fn new(
        start_date: NaiveDate,
        end_date: NaiveDate,
        windows: Vec<WeeklyWindow>,
        layout: SessionLayout,
    ) -> Result<Self, AvailabilityValidationError> {
        if start_date > end_date {
            return Err(AvailabilityValidationError::InvalidDateRange);
        }
        if (end_date - start_date).num_days() > MAX_GENERATION_SPAN_DAYS {
            return Err(AvailabilityValidationError::DateRangeTooLong {
                max: MAX_GENERATION_SPAN_DAYS,
            });
        }
        if windows.is_empty() {
            return Err(AvailabilityValidationError::NoRules);
        }
        Ok(Self {
            start_date,
            end_date,
            windows,
            layout,
        })
    }

    /// Expand the plan into UTC candidates, in chronological order per day.
    ///
    /// Windows whose local start or end falls into a DST gap are skipped and
    /// counted in the returned tally.
    #[must_use]
    pub fn candidates(&self, tz: Tz) -> (Vec<Interval>, usize) {
        let mut out = Vec::new();
        let mut unresolved = 0;
        for date in self.start_date.iter_days().take_while(|d| *d <= self.end_date) {
            for window in self.windows.iter().filter(|w| w.weekday == date.weekday()) {
                let start = resolve_local(tz, date, window.start_time);
                let end = resolve_local(tz, date, window.end_time);
                let (Some(start), Some(end)) = (start, end) else {
                    unresolved += 1;
                    continue;
                };
                let Ok(resolved) = Interval::new(start, end) else {
                    unresolved += 1;
                    continue;
                };
                out.extend(self.layout.split(resolved));
            }
        }
        (out, unresolved)
    }
}

/// Outcome of filtering candidates against existing state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CandidateFilter {
    pub accepted: Vec<Interval>,
    pub skipped: usize,
}

/// Drop candidates that start in the past or collide with an exception,
/// an existing slot or an earlier accepted candidate.
#[must_use]
pub fn filter_candidates(
    candidates: Vec<Interval>,
    now: DateTime<Utc>,
    exceptions: &[Interval],
    existing: &[Interval],
) -> CandidateFilter {
    let mut result = CandidateFilter::default();
    for candidate in candidates {
        let blocked = candidate.start <= now
            || exceptions.iter().any(|e| e.overlaps(&candidate))
            || existing.iter().any(|s| s.overlaps(&candidate))
            || result.accepted.iter().any(|a| a.overlaps(&candidate));
        if blocked {
            result.skipped += 1;
        } else {
            result.accepted.push(candidate);
        }
    }
    result
}

#[cfg(test)]
#[path = "availability_tests.rs"]
mod tests;
