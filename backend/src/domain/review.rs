//! Mentor reviews and the rating aggregate derived from them.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{RATING_RANGE, UserId};

/// Maximum review text length in characters.
pub const REVIEW_TEXT_MAX: usize = 2000;

/// Validation errors for review drafts.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReviewValidationError {
    #[error("{field} must be between 1 and 5")]
    RatingOutOfRange { field: &'static str },
    #[error("review text must be at most {max} characters")]
    TextTooLong { max: usize },
}

/// Star ratings supplied by the reviewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReviewRatings {
    pub overall: i16,
    pub communication: Option<i16>,
    pub knowledge: Option<i16>,
    pub punctuality: Option<i16>,
}

impl ReviewRatings {
    pub fn validate(self) -> Result<Self, ReviewValidationError> {
        let check = |field: &'static str, value: Option<i16>| {
            value.map_or(Ok(()), |v| {
                if RATING_RANGE.contains(&v) {
                    Ok(())
                } else {
                    Err(ReviewValidationError::RatingOutOfRange { field })
                }
            })
        };
        check("overallRating", Some(self.overall))?;
        check("communicationRating", self.communication)?;
        check("knowledgeRating", self.knowledge)?;
        check("punctualityRating", self.punctuality)?;
        Ok(self)
    }
}

/// Validate review text, trimming surrounding whitespace.
pub fn validate_review_text(raw: &str) -> Result<String, ReviewValidationError> {
    let trimmed = raw.trim();
    if trimmed.chars().count() > REVIEW_TEXT_MAX {
        return Err(ReviewValidationError::TextTooLong {
            max: REVIEW_TEXT_MAX,
        });
    }
    Ok(trimmed.to_owned())
}

/// Learner's review of a completed session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Review {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub reviewer_id: UserId,
    pub mentor_id: UserId,
    pub ratings: ReviewRatings,
    pub text: String,
    pub would_recommend: bool,
    pub helpful_count: i32,
    pub created_at: DateTime<Utc>,
}

/// Aggregate of a mentor's overall ratings.
#[derive(Debug, Clone, PartialEq)]
pub struct MentorRating {
    pub mentor_id: UserId,
    pub average_rating: f64,
    pub total_reviews: u32,
    /// Counts for 1 through 5 stars.
    pub rating_distribution: [u32; 5],
}

impl MentorRating {
    /// Aggregate the overall ratings of `reviews`.
    ///
    /// The average is rounded to two decimal places and is `0.0` without
    /// reviews.
    #[must_use]
    pub fn from_reviews<'a>(
        mentor_id: UserId,
        reviews: impl IntoIterator<Item = &'a Review>,
    ) -> Self {
        let mut distribution = [0_u32; 5];
        let mut sum = 0_u32;
        let mut total = 0_u32;
        for review in reviews {
            let stars = review.ratings.overall.clamp(1, 5);
            let bucket = usize::try_from(stars - 1).unwrap_or_default();
            if let Some(count) = distribution.get_mut(bucket) {
                *count += 1;
            }
            sum += u32::try_from(stars).unwrap_or_default();
            total += 1;
        }
        Self {
            mentor_id,
            average_rating: average(sum, total),
            total_reviews: total,
            rating_distribution: distribution,
        }
    }

    /// Whether the aggregate meets a threshold with enough reviews behind it.
    #[must_use]
    pub fn at_least(&self, average: f64, min_reviews: u32) -> bool {
        self.total_reviews >= min_reviews && self.average_rating >= average
    }
}

#[expect(
    clippy::float_arithmetic,
    reason = "ratings are presented as a rounded decimal average"
)]
fn average(sum: u32, total: u32) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let raw = f64::from(sum) / f64::from(total);
    (raw * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    fn review(overall: i16) -> Review {
        Review {
            id: Uuid::new_v4(),
            booking_id: Uuid::new_v4(),
            reviewer_id: UserId::random(),
            mentor_id: UserId::random(),
            ratings: ReviewRatings {
                overall,
                communication: None,
                knowledge: None,
                punctuality: None,
            },
            text: String::new(),
            would_recommend: true,
            helpful_count: 0,
            created_at: Utc::now(),
        }
    }

    #[rstest]
    fn aggregates_distribution_and_average() {
        let reviews = [review(5), review(4), review(4), review(1)];
        let rating = MentorRating::from_reviews(UserId::random(), &reviews);
        assert_eq!(rating.total_reviews, 4);
        assert_eq!(rating.rating_distribution, [1, 0, 0, 2, 1]);
        assert!((rating.average_rating - 3.5).abs() < f64::EPSILON);
    }

    #[rstest]
    fn empty_aggregate_is_zero() {
        let rating = MentorRating::from_reviews(UserId::random(), std::iter::empty());
        assert_eq!(rating.total_reviews, 0);
        assert!(rating.average_rating.abs() < f64::EPSILON);
        assert!(!rating.at_least(0.0, 1));
    }

    #[rstest]
    fn averages_round_to_two_places() {
        let reviews = [review(5), review(4), review(4)];
        let rating = MentorRating::from_reviews(UserId::random(), &reviews);
        assert!((rating.average_rating - 4.33).abs() < 1e-9);
    }

    #[rstest]
    #[case(ReviewRatings { overall: 0, communication: None, knowledge: None, punctuality: None }, "overallRating")]
    #[case(ReviewRatings { overall: 5, communication: Some(6), knowledge: None, punctuality: None }, "communicationRating")]
    #[case(ReviewRatings { overall: 5, communication: None, knowledge: None, punctuality: Some(0) }, "punctualityRating")]
    fn rejects_out_of_range_ratings(#[case] ratings: ReviewRatings, #[case] field: &'static str) {
        assert_eq!(
            ratings.validate(),
            Err(ReviewValidationError::RatingOutOfRange { field })
        );
    }

    #[rstest]
    fn rejects_overlong_text() {
        let text = "x".repeat(REVIEW_TEXT_MAX + 1);
        assert!(validate_review_text(&text).is_err());
        assert_eq!(validate_review_text("  Great  "), Ok("Great".to_owned()));
    }
}
