//! Bookings and their lifecycle.
//!
//! A booking moves through a small state machine:
//!
//! ```text
//! pending ──confirm──▶ confirmed ──complete──▶ completed
//!    │                    │
//!    ├──decline──▶ declined
//!    └──cancel───▶ cancelled ◀──cancel──┘
//! ```
//!
//! Transition methods mutate the booking in place and refuse moves the
//! machine does not allow, leaving the booking untouched.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{Interval, UserId};

/// Minimum lead time before a session in which cancellation is still allowed.
pub const CANCELLATION_CUTOFF_HOURS: i64 = 2;
/// Maximum length of free-text booking fields.
pub const BOOKING_TEXT_MAX: usize = 2000;
/// Inclusive learner rating bounds.
pub const RATING_RANGE: std::ops::RangeInclusive<i16> = 1..=5;

/// Lifecycle state of a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Declined,
    Cancelled,
    Completed,
}

impl BookingStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 5] = [
        Self::Pending,
        Self::Confirmed,
        Self::Declined,
        Self::Cancelled,
        Self::Completed,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Declined => "declined",
            Self::Cancelled => "cancelled",
            Self::Completed => "completed",
        }
    }

    /// Statuses that hold the mentor's time.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Pending | Self::Confirmed)
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when parsing an unknown status string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown booking status: {value}")]
pub struct UnknownBookingStatus {
    pub value: String,
}

impl FromStr for BookingStatus {
    type Err = UnknownBookingStatus;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == value)
            .ok_or_else(|| UnknownBookingStatus {
                value: value.to_owned(),
            })
    }
}

/// Transition failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BookingTransitionError {
    #[error("cannot {action} a {status} booking")]
    InvalidState {
        action: &'static str,
        status: BookingStatus,
    },
    #[error("Cannot cancel booking less than 2 hours before session")]
    TooLateToCancel,
    #[error("cannot complete a session before it ends")]
    NotFinished,
    #[error("booking has already been rated")]
    AlreadyRated,
    #[error("rating must be between 1 and 5")]
    RatingOutOfRange,
}

/// Scheduled or requested mentoring session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Booking {
    pub id: Uuid,
    pub learner_id: UserId,
    pub mentor_id: UserId,
    pub slot_id: Option<Uuid>,
    pub start_utc: DateTime<Utc>,
    pub end_utc: DateTime<Utc>,
    pub status: BookingStatus,
    pub price_cents: i64,
    pub notes: String,
    pub decline_reason: Option<String>,
    pub cancellation_reason: Option<String>,
    pub cancelled_by: Option<UserId>,
    pub session_notes: Option<String>,
    pub learner_rating: Option<i16>,
    pub learner_feedback: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// Start a new pending booking.
    #[must_use]
    pub fn request(
        id: Uuid,
        learner_id: UserId,
        mentor_id: UserId,
        interval: Interval,
        price_cents: i64,
        notes: String,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            learner_id,
            mentor_id,
            slot_id: None,
            start_utc: interval.start(),
            end_utc: interval.end(),
            status: BookingStatus::Pending,
            price_cents,
            notes,
            decline_reason: None,
            cancellation_reason: None,
            cancelled_by: None,
            session_notes: None,
            learner_rating: None,
            learner_feedback: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[must_use]
    pub const fn interval(&self) -> Interval {
        Interval::from_ordered(self.start_utc, self.end_utc)
    }

    /// Session length in whole minutes.
    #[must_use]
    pub fn duration_minutes(&self) -> i64 {
        (self.end_utc - self.start_utc).num_minutes()
    }

    /// True when `user` is the learner or mentor.
    #[must_use]
    pub fn involves(&self, user: UserId) -> bool {
        self.learner_id == user || self.mentor_id == user
    }

    /// The participant on the other side from `user`.
    #[must_use]
    pub fn counterpart_of(&self, user: UserId) -> UserId {
        if user == self.learner_id {
            self.mentor_id
        } else {
            self.learner_id
        }
    }

    fn require(
        &self,
        action: &'static str,
        allowed: &[BookingStatus],
    ) -> Result<(), BookingTransitionError> {
        if allowed.contains(&self.status) {
            Ok(())
        } else {
            Err(BookingTransitionError::InvalidState {
                action,
                status: self.status,
            })
        }
    }

    /// `pending → confirmed`.
    pub fn confirm(&mut self, now: DateTime<Utc>) -> Result<(), BookingTransitionError> {
        self.require("confirm", &[BookingStatus::Pending])?;
        self.status = BookingStatus::Confirmed;
        self.updated_at = now;
        Ok(())
    }

    /// `pending → declined`.
    pub fn decline(
        &mut self,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(), BookingTransitionError> {
        self.require("decline", &[BookingStatus::Pending])?;
        self.status = BookingStatus::Declined;
        self.decline_reason = reason;
        self.updated_at = now;
        Ok(())
    }

    /// `pending | confirmed → cancelled`, only while the session is more than
    /// [`CANCELLATION_CUTOFF_HOURS`] away.
    pub fn cancel(
        &mut self,
        by: UserId,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(), BookingTransitionError> {
        self.require("cancel", &[BookingStatus::Pending, BookingStatus::Confirmed])?;
        if now + Duration::hours(CANCELLATION_CUTOFF_HOURS) >= self.start_utc {
            return Err(BookingTransitionError::TooLateToCancel);
        }
        self.status = BookingStatus::Cancelled;
        self.cancellation_reason = reason;
        self.cancelled_by = Some(by);
        self.updated_at = now;
        Ok(())
    }

    /// `confirmed → completed`, once the session has ended.
    pub fn complete(
        &mut self,
        session_notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(), BookingTransitionError> {
        self.require("complete", &[BookingStatus::Confirmed])?;
        if now < self.end_utc {
            return Err(BookingTransitionError::NotFinished);
        }
        self.status = BookingStatus::Completed;
        self.session_notes = session_notes;
        self.updated_at = now;
        Ok(())
    }

    /// Record the learner's rating of a completed session.
    pub fn record_feedback(
        &mut self,
        rating: i16,
        comment: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(), BookingTransitionError> {
        self.require("rate", &[BookingStatus::Completed])?;
        if !RATING_RANGE.contains(&rating) {
            return Err(BookingTransitionError::RatingOutOfRange);
        }
        if self.learner_rating.is_some() {
            return Err(BookingTransitionError::AlreadyRated);
        }
        self.learner_rating = Some(rating);
        self.learner_feedback = comment;
        self.updated_at = now;
        Ok(())
    }
}

/// Price for a session of `minutes` at `hourly_rate_cents`, rounded down.
///
/// # Examples
/// ```
/// use mentorship::domain::session_price_cents;
///
/// assert_eq!(session_price_cents(Some(6000), 90), 9000);
/// assert_eq!(session_price_cents(Some(1000), 50), 833);
/// assert_eq!(session_price_cents(None, 60), 0);
/// ```
#[must_use]
pub fn session_price_cents(hourly_rate_cents: Option<i64>, minutes: i64) -> i64 {
    hourly_rate_cents
        .map_or(0, |rate| rate.saturating_mul(minutes).div_euclid(60))
}

/// Which bookings a caller may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingScope {
    Learner(UserId),
    Mentor(UserId),
    All,
}

impl BookingScope {
    /// True when `booking` falls inside the scope.
    #[must_use]
    pub fn admits(&self, booking: &Booking) -> bool {
        match self {
            Self::Learner(id) => booking.learner_id == *id,
            Self::Mentor(id) => booking.mentor_id == *id,
            Self::All => true,
        }
    }
}

/// Filter for listing bookings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookingFilter {
    pub scope: BookingScope,
    pub status: Option<BookingStatus>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl BookingFilter {
    /// Everything visible within `scope`.
    #[must_use]
    pub const fn scoped(scope: BookingScope) -> Self {
        Self {
            scope,
            status: None,
            from: None,
            to: None,
        }
    }

    /// True when `booking` passes every criterion.
    #[must_use]
    pub fn admits(&self, booking: &Booking) -> bool {
        self.scope.admits(booking)
            && self.status.is_none_or(|status| booking.status == status)
            && self.from.is_none_or(|from| booking.start_utc >= from)
            && self.to.is_none_or(|to| booking.start_utc < to)
    }
}

#[cfg(test)]
#[path = "booking_tests.rs"]
mod tests;
