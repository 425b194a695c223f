//! Mentor discovery filters.

use std::cmp::Ordering;
use std::str::FromStr;

use chrono::{DateTime, Days, Duration, Utc};

use super::{MentorRating, MentorSkill, User};

/// Validation errors for search parameters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SearchValidationError {
    #[error("minRate must not exceed maxRate")]
    InvertedRateRange,
    #[error("minRating must be between 0 and 5")]
    RatingOutOfRange,
    #[error("available must be `today` or `week`, got {value}")]
    UnknownWindow { value: String },
}

/// Window in which a mentor must have an open slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AvailabilityWindow {
    Today,
    Week,
}

impl FromStr for AvailabilityWindow {
    type Err = SearchValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "today" => Ok(Self::Today),
            "week" => Ok(Self::Week),
            other => Err(SearchValidationError::UnknownWindow {
                value: other.to_owned(),
            }),
        }
    }
}

impl AvailabilityWindow {
    /// `[now, end)` for the window: the rest of the UTC day, or seven days.
    #[must_use]
    pub fn bounds(self, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        match self {
            Self::Today => {
                let midnight = now
                    .date_naive()
                    .checked_add_days(Days::new(1))
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
                    .map_or(now + Duration::days(1), |d| d.and_utc());
                (now, midnight)
            }
            Self::Week => (now, now + Duration::days(7)),
        }
    }
}

/// Validated search parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MentorSearchQuery {
    pub text: Option<String>,
    pub skill_slug: Option<String>,
    pub min_rating: Option<f64>,
    pub min_rate_cents: Option<i64>,
    pub max_rate_cents: Option<i64>,
    pub timezone: Option<String>,
    pub available: Option<AvailabilityWindow>,
}

impl MentorSearchQuery {
    /// Check cross-field constraints.
    pub fn validate(self) -> Result<Self, SearchValidationError> {
        if let (Some(min), Some(max)) = (self.min_rate_cents, self.max_rate_cents)
            && min > max
        {
            return Err(SearchValidationError::InvertedRateRange);
        }
        if let Some(rating) = self.min_rating
            && !(0.0..=5.0).contains(&rating)
        {
            return Err(SearchValidationError::RatingOutOfRange);
        }
        Ok(self)
    }

    /// Apply every filter that does not need slot data.
    #[must_use]
    pub fn admits(&self, card: &MentorCard) -> bool {
        let mentor = &card.mentor;
        let text_ok = self.text.as_deref().is_none_or(|needle| {
            let lowered = needle.to_lowercase();
            mentor.display_name.as_ref().to_lowercase().contains(&lowered)
                || mentor.bio.to_lowercase().contains(&lowered)
        });
        let skill_ok = self
            .skill_slug
            .as_deref()
            .is_none_or(|slug| card.skills.iter().any(|s| s.skill.slug == slug));
        let rating_ok = self
            .min_rating
            .is_none_or(|min| card.rating.average_rating >= min);
        let rate = mentor.hourly_rate_cents;
        let min_rate_ok = self
            .min_rate_cents
            .is_none_or(|min| rate.is_some_and(|r| r >= min));
        let max_rate_ok = self
            .max_rate_cents
            .is_none_or(|max| rate.is_some_and(|r| r <= max));
        let tz_ok = self
            .timezone
            .as_deref()
            .is_none_or(|tz| mentor.timezone.name() == tz);
        text_ok && skill_ok && rating_ok && min_rate_ok && max_rate_ok && tz_ok
    }
}

/// Mentor with the data shown on profile and search results.
#[derive(Debug, Clone, PartialEq)]
pub struct MentorCard {
    pub mentor: User,
    pub rating: MentorRating,
    pub skills: Vec<MentorSkill>,
}

/// Order by rating (highest first), then display name.
pub fn sort_cards(cards: &mut [MentorCard]) {
    cards.sort_by(|a, b| {
        b.rating
            .average_rating
            .partial_cmp(&a.rating.average_rating)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.mentor.display_name.as_ref().cmp(b.mentor.display_name.as_ref()))
    });
}
