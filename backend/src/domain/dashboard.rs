//! Role-specific dashboard figures computed from bookings.
//!
//! Calendar windows are evaluated in UTC and weeks start on Monday.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Duration, NaiveTime, TimeZone, Utc};

use super::{Booking, BookingStatus, MentorRating, Role};

/// Number of upcoming sessions shown on a dashboard.
pub const UPCOMING_LIMIT: usize = 5;

/// Start of the Monday-based week containing `now`.
#[must_use]
pub fn week_start(now: DateTime<Utc>) -> DateTime<Utc> {
    let date = now.date_naive() - Duration::days(i64::from(now.weekday().num_days_from_monday()));
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

/// Start of the calendar month containing `now`.
#[must_use]
pub fn month_start(now: DateTime<Utc>) -> DateTime<Utc> {
    let date = now.date_naive().with_day(1).unwrap_or_else(|| now.date_naive());
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

/// Confirmed sessions still ahead, soonest first, capped at
/// [`UPCOMING_LIMIT`].
#[must_use]
pub fn upcoming<'a>(bookings: &'a [Booking], now: DateTime<Utc>) -> Vec<&'a Booking> {
    let mut upcoming: Vec<&Booking> = bookings
        .iter()
        .filter(|b| b.status == BookingStatus::Confirmed && b.start_utc > now)
        .collect();
    upcoming.sort_by_key(|b| b.start_utc);
    upcoming.truncate(UPCOMING_LIMIT);
    upcoming
}

fn count(bookings: &[Booking], status: BookingStatus) -> u64 {
    bookings.iter().filter(|b| b.status == status).count() as u64
}

fn held_since(bookings: &[Booking], since: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    bookings
        .iter()
        .filter(|b| {
            matches!(b.status, BookingStatus::Confirmed | BookingStatus::Completed)
                && b.start_utc >= since
                && b.start_utc <= now
        })
        .count() as u64
}

fn completed_sum(bookings: &[Booking], value: impl Fn(&Booking) -> i64) -> i64 {
    bookings
        .iter()
        .filter(|b| b.status == BookingStatus::Completed)
        .map(value)
        .sum()
}

/// Figures shown to a mentor.
#[derive(Debug, Clone, PartialEq)]
pub struct MentorDashboard {
    pub pending_requests: u64,
    pub upcoming_sessions: Vec<Booking>,
    pub completed_sessions: u64,
    pub sessions_this_week: u64,
    pub sessions_this_month: u64,
    pub total_earnings_cents: i64,
    pub average_rating: f64,
    pub total_reviews: u32,
}

impl MentorDashboard {
    /// Summarise the mentor's bookings and rating.
    #[must_use]
    pub fn compute(bookings: &[Booking], rating: &MentorRating, now: DateTime<Utc>) -> Self {
        Self {
            pending_requests: count(bookings, BookingStatus::Pending),
            upcoming_sessions: upcoming(bookings, now).into_iter().cloned().collect(),
            completed_sessions: count(bookings, BookingStatus::Completed),
            sessions_this_week: held_since(bookings, week_start(now), now),
            sessions_this_month: held_since(bookings, month_start(now), now),
            total_earnings_cents: completed_sum(bookings, |b| b.price_cents),
            average_rating: rating.average_rating,
            total_reviews: rating.total_reviews,
        }
    }
}

/// Figures shown to a learner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LearnerDashboard {
    pub upcoming_sessions: Vec<Booking>,
    pub pending_requests: u64,
    pub completed_sessions: u64,
    pub total_spent_cents: i64,
    /// Completed hours with one decimal place, e.g. `"2.5"`.
    pub hours_learned: String,
    pub badges: u64,
}

impl LearnerDashboard {
    #[must_use]
    pub fn compute(bookings: &[Booking], badges: u64, now: DateTime<Utc>) -> Self {
        let minutes = completed_sum(bookings, Booking::duration_minutes);
        Self {
            upcoming_sessions: upcoming(bookings, now).into_iter().cloned().collect(),
            pending_requests: count(bookings, BookingStatus::Pending),
            completed_sessions: count(bookings, BookingStatus::Completed),
            total_spent_cents: completed_sum(bookings, |b| b.price_cents),
            hours_learned: format_hours(minutes),
            badges,
        }
    }
}

/// Render minutes as hours with one decimal place, rounding half up.
///
/// # Examples
/// ```
/// use mentorship::domain::format_hours;
///
/// assert_eq!(format_hours(90), "1.5");
/// assert_eq!(format_hours(0), "0.0");
/// assert_eq!(format_hours(100), "1.7");
/// ```
#[must_use]
pub fn format_hours(minutes: i64) -> String {
    let tenths = (minutes.max(0) * 10 + 30).div_euclid(60);
    format!("{}.{}", tenths.div_euclid(10), tenths.rem_euclid(10))
}

/// Platform-wide counts shown to administrators.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdminDashboard {
    pub users_by_role: BTreeMap<String, u64>,
    pub bookings_by_status: BTreeMap<String, u64>,
}

impl AdminDashboard {
    #[must_use]
    pub fn compute(role_counts: &[(Role, u64)], bookings: &[Booking]) -> Self {
        let mut users_by_role: BTreeMap<String, u64> = [Role::Learner, Role::Mentor, Role::Admin]
            .into_iter()
            .map(|role| (role.as_str().to_owned(), 0))
            .collect();
        for (role, n) in role_counts {
            *users_by_role.entry(role.as_str().to_owned()).or_default() += n;
        }
        Self {
            users_by_role,
            bookings_by_status: status_counts(bookings),
        }
    }
}

/// Count bookings per status, including zero entries.
#[must_use]
pub fn status_counts(bookings: &[Booking]) -> BTreeMap<String, u64> {
    BookingStatus::ALL
        .into_iter()
        .map(|status| (status.as_str().to_owned(), count(bookings, status)))
        .collect()
}

/// Dashboard for the caller's role.
#[derive(Debug, Clone, PartialEq)]
pub enum Dashboard {
    Mentor(MentorDashboard),
    Learner(LearnerDashboard),
    Admin(AdminDashboard),
}
