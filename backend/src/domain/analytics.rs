//! Platform and per-skill analytics over a trailing window of days.
//!
//! Days are UTC calendar dates. Bookings are placed in the window by
//! `created_at`, so a session requested last week but held next month
//! counts towards last week's demand.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use chrono::{DateTime, Duration, NaiveDate, Utc};
use thiserror::Error;
use uuid::Uuid;

use super::{Booking, BookingStatus, Role, Skill, User, UserId};

/// Number of skills listed in platform analytics.
pub const TOP_SKILLS_LIMIT: usize = 10;

/// Validation errors for analytics queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AnalyticsValidationError {
    #[error("period must be between {min} and {max} days")]
    PeriodOutOfRange { min: u16, max: u16 },
    #[error("period must be a whole number of days")]
    PeriodNotANumber,
}

/// Trailing window measured in whole days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalyticsPeriod(u16);

impl AnalyticsPeriod {
    pub const MIN_DAYS: u16 = 1;
    pub const MAX_DAYS: u16 = 365;
    pub const DEFAULT_DAYS: u16 = 30;

    pub const fn new(days: u16) -> Result<Self, AnalyticsValidationError> {
        if days < Self::MIN_DAYS || days > Self::MAX_DAYS {
            return Err(AnalyticsValidationError::PeriodOutOfRange {
                min: Self::MIN_DAYS,
                max: Self::MAX_DAYS,
            });
        }
        Ok(Self(days))
    }

    /// Parse an optional query value, falling back to thirty days.
    pub fn parse(raw: Option<&str>) -> Result<Self, AnalyticsValidationError> {
        match raw.map(str::trim) {
            None | Some("") => Self::new(Self::DEFAULT_DAYS),
            Some(value) => value
                .parse::<u16>()
                .map_err(|_| AnalyticsValidationError::PeriodNotANumber)
                .and_then(Self::new),
        }
    }

    #[must_use]
    pub const fn days(self) -> u16 {
        self.0
    }

    /// First instant inside the window ending at `now`.
    #[must_use]
    pub fn start(self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - Duration::days(i64::from(self.0))
    }
}

impl Default for AnalyticsPeriod {
    fn default() -> Self {
        Self(Self::DEFAULT_DAYS)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserStatistics {
    pub total_users: u64,
    pub total_mentors: u64,
    pub total_learners: u64,
    pub new_users: u64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionStatistics {
    pub total_sessions: u64,
    pub completed_sessions: u64,
    pub cancelled_sessions: u64,
    pub total_revenue_cents: i64,
    pub average_rating: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyGrowth {
    pub date: NaiveDate,
    pub new_users: u64,
    pub new_mentors: u64,
    pub new_learners: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailySessions {
    pub date: NaiveDate,
    pub sessions: u64,
    pub revenue_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkillRanking {
    pub skill: Skill,
    pub sessions: u64,
    pub revenue_cents: i64,
}

/// Administrator view of platform activity.
#[derive(Debug, Clone, PartialEq)]
pub struct PlatformAnalytics {
    pub period: AnalyticsPeriod,
    pub user_statistics: UserStatistics,
    pub session_statistics: SessionStatistics,
    pub growth_trends: Vec<DailyGrowth>,
    pub session_trends: Vec<DailySessions>,
    pub top_skills: Vec<SkillRanking>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SkillDemand {
    pub total_sessions: u64,
    pub unique_learners: u64,
    pub average_rating: Option<f64>,
    pub total_revenue_cents: i64,
}

/// Hourly rates of the mentors teaching a skill.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MentorPricing {
    pub total_mentors: u64,
    pub average_rate_cents: Option<f64>,
    pub min_rate_cents: Option<i64>,
    pub max_rate_cents: Option<i64>,
}

/// Demand and supply for one skill.
#[derive(Debug, Clone, PartialEq)]
pub struct SkillAnalytics {
    pub period: AnalyticsPeriod,
    pub skill: Skill,
    pub demand: SkillDemand,
    pub mentors: MentorPricing,
    pub timeline: Vec<DailySessions>,
}

fn in_window<'a>(bookings: &'a [Booking], since: DateTime<Utc>) -> Vec<&'a Booking> {
    bookings.iter().filter(|b| b.created_at >= since).collect()
}

fn completed_revenue(booking: &Booking) -> i64 {
    if booking.status == BookingStatus::Completed {
        booking.price_cents
    } else {
        0
    }
}

/// Mean learner rating across completed sessions.
fn average_rating(bookings: &[&Booking]) -> Option<f64> {
    let ratings: Vec<f64> = bookings
        .iter()
        .filter(|b| b.status == BookingStatus::Completed)
        .filter_map(|b| b.learner_rating.map(f64::from))
        .collect();
    if ratings.is_empty() {
        return None;
    }
    Some(ratings.iter().sum::<f64>() / ratings.len() as f64)
}

fn session_trends(bookings: &[&Booking]) -> Vec<DailySessions> {
    let mut days: BTreeMap<NaiveDate, (u64, i64)> = BTreeMap::new();
    for booking in bookings {
        let entry = days.entry(booking.created_at.date_naive()).or_default();
        entry.0 += 1;
        entry.1 += completed_revenue(booking);
    }
    days.into_iter()
        .map(|(date, (sessions, revenue_cents))| DailySessions {
            date,
            sessions,
            revenue_cents,
        })
        .collect()
}

fn growth_trends(signups: &[(Role, DateTime<Utc>)]) -> Vec<DailyGrowth> {
    let mut days: BTreeMap<NaiveDate, DailyGrowth> = BTreeMap::new();
    for (role, at) in signups {
        let date = at.date_naive();
        let day = days.entry(date).or_insert(DailyGrowth {
            date,
            new_users: 0,
            new_mentors: 0,
            new_learners: 0,
        });
        day.new_users += 1;
        match role {
            Role::Mentor => day.new_mentors += 1,
            Role::Learner => day.new_learners += 1,
            Role::Admin => {}
        }
    }
    days.into_values().collect()
}

/// Skill ids taught by each mentor.
fn skills_by_mentor(links: &[(Uuid, UserId)]) -> HashMap<UserId, Vec<Uuid>> {
    let mut by_mentor: HashMap<UserId, Vec<Uuid>> = HashMap::new();
    for (skill_id, mentor_id) in links {
        by_mentor.entry(*mentor_id).or_default().push(*skill_id);
    }
    by_mentor
}

/// Inputs gathered from the stores for platform analytics.
#[derive(Debug, Clone, Copy)]
pub struct PlatformFacts<'a> {
    pub role_counts: &'a [(Role, u64)],
    pub signups: &'a [(Role, DateTime<Utc>)],
    pub bookings: &'a [Booking],
    pub skills: &'a [Skill],
    pub skill_links: &'a [(Uuid, UserId)],
}

impl PlatformAnalytics {
    /// Aggregate platform activity for the window ending at `now`.
    ///
    /// A booking counts towards every skill its mentor teaches.
    #[must_use]
    pub fn compute(facts: PlatformFacts<'_>, period: AnalyticsPeriod, now: DateTime<Utc>) -> Self {
        let since = period.start(now);
        let signups: Vec<(Role, DateTime<Utc>)> = facts
            .signups
            .iter()
            .copied()
            .filter(|(_, at)| *at >= since)
            .collect();
        let role_total = |wanted: Role| -> u64 {
            facts
                .role_counts
                .iter()
                .filter(|(role, _)| *role == wanted)
                .map(|(_, n)| n)
                .sum()
        };
        let user_statistics = UserStatistics {
            total_users: facts.role_counts.iter().map(|(_, n)| n).sum(),
            total_mentors: role_total(Role::Mentor),
            total_learners: role_total(Role::Learner),
            new_users: signups.len() as u64,
        };

        let bookings = in_window(facts.bookings, since);
        let session_statistics = SessionStatistics {
            total_sessions: bookings.len() as u64,
            completed_sessions: bookings
                .iter()
                .filter(|b| b.status == BookingStatus::Completed)
                .count() as u64,
            cancelled_sessions: bookings
                .iter()
                .filter(|b| b.status == BookingStatus::Cancelled)
                .count() as u64,
            total_revenue_cents: bookings.iter().map(|b| completed_revenue(b)).sum(),
            average_rating: average_rating(&bookings),
        };

        Self {
            period,
            user_statistics,
            session_statistics,
            growth_trends: growth_trends(&signups),
            session_trends: session_trends(&bookings),
            top_skills: top_skills(&bookings, facts.skills, facts.skill_links),
        }
    }
}

fn top_skills(bookings: &[&Booking], skills: &[Skill], links: &[(Uuid, UserId)]) -> Vec<SkillRanking> {
    let by_mentor = skills_by_mentor(links);
    let mut totals: HashMap<Uuid, (u64, i64)> = HashMap::new();
    for booking in bookings {
        for skill_id in by_mentor.get(&booking.mentor_id).into_iter().flatten() {
            let entry = totals.entry(*skill_id).or_default();
            entry.0 += 1;
            entry.1 += completed_revenue(booking);
        }
    }
    let mut ranking: Vec<SkillRanking> = skills
        .iter()
        .filter_map(|skill| {
            totals.get(&skill.id).map(|(sessions, revenue_cents)| SkillRanking {
                skill: skill.clone(),
                sessions: *sessions,
                revenue_cents: *revenue_cents,
            })
        })
        .collect();
    ranking.sort_by(|a, b| {
        b.sessions
            .cmp(&a.sessions)
            .then_with(|| a.skill.name.cmp(&b.skill.name))
    });
    ranking.truncate(TOP_SKILLS_LIMIT);
    ranking
}

impl SkillAnalytics {
    /// Demand for `skill` from bookings with any of `mentors`, plus their
    /// hourly rates.
    #[must_use]
    pub fn compute(
        skill: Skill,
        mentors: &[User],
        bookings: &[Booking],
        period: AnalyticsPeriod,
        now: DateTime<Utc>,
    ) -> Self {
        let teaching: HashSet<UserId> = mentors.iter().map(|m| m.id).collect();
        let bookings: Vec<&Booking> = in_window(bookings, period.start(now))
            .into_iter()
            .filter(|b| teaching.contains(&b.mentor_id))
            .collect();
        let learners: BTreeSet<UserId> = bookings.iter().map(|b| b.learner_id).collect();
        let demand = SkillDemand {
            total_sessions: bookings.len() as u64,
            unique_learners: learners.len() as u64,
            average_rating: average_rating(&bookings),
            total_revenue_cents: bookings.iter().map(|b| completed_revenue(b)).sum(),
        };

        let rates: Vec<i64> = mentors.iter().filter_map(|m| m.hourly_rate_cents).collect();
        let mentors = MentorPricing {
            total_mentors: mentors.len() as u64,
            average_rate_cents: (!rates.is_empty())
                .then(|| rates.iter().sum::<i64>() as f64 / rates.len() as f64),
            min_rate_cents: rates.iter().min().copied(),
            max_rate_cents: rates.iter().max().copied(),
        };

        Self {
            period,
            skill,
            demand,
            mentors,
            timeline: session_trends(&bookings),
        }
    }
}

#[cfg(test)]
#[path = "analytics_tests.rs"]
mod tests;
