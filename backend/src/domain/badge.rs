//! Achievement badges.
//!
//! The catalogue is static; a user's progress is summarised in
//! [`BadgeProgress`] and each badge decides whether that progress qualifies.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::{MentorRating, UserId};

/// Grouping shown alongside badges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BadgeCategory {
    Learning,
    Teaching,
    Quality,
    Milestones,
}

/// What a badge measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadgeRequirement {
    SessionsLearned(u32),
    SessionsTaught(u32),
    SessionsTotal(u32),
    ReviewsWritten(u32),
    /// Average rating in hundredths of a star, with a minimum review count.
    MentorRating { min_hundredths: u32, min_reviews: u32 },
}

/// Catalogue entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Badge {
    pub slug: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub category: BadgeCategory,
    pub requirement: BadgeRequirement,
}

/// Every badge a user can earn.
pub static CATALOGUE: [Badge; 8] = [
    Badge {
        slug: "first-steps",
        name: "First Steps",
        description: "Complete your first session as a learner",
        category: BadgeCategory::Learning,
        requirement: BadgeRequirement::SessionsLearned(1),
    },
    Badge {
        slug: "getting-started",
        name: "Getting Started",
        description: "Complete 5 sessions as a learner",
        category: BadgeCategory::Learning,
        requirement: BadgeRequirement::SessionsLearned(5),
    },
    Badge {
        slug: "dedicated-learner",
        name: "Dedicated Learner",
        description: "Complete 20 sessions as a learner",
        category: BadgeCategory::Learning,
        requirement: BadgeRequirement::SessionsLearned(20),
    },
    Badge {
        slug: "first-mentor",
        name: "First Mentor",
        description: "Teach your first session",
        category: BadgeCategory::Teaching,
        requirement: BadgeRequirement::SessionsTaught(1),
    },
    Badge {
        slug: "helpful-teacher",
        name: "Helpful Teacher",
        description: "Teach 10 sessions",
        category: BadgeCategory::Teaching,
        requirement: BadgeRequirement::SessionsTaught(10),
    },
    Badge {
        slug: "highly-rated",
        name: "Highly Rated",
        description: "Hold an average rating of 4.5 or more across at least 5 reviews",
        category: BadgeCategory::Quality,
        requirement: BadgeRequirement::MentorRating {
            min_hundredths: 450,
            min_reviews: 5,
        },
    },
    Badge {
        slug: "century-club",
        name: "Century Club",
        description: "Complete 100 sessions in any role",
        category: BadgeCategory::Milestones,
        requirement: BadgeRequirement::SessionsTotal(100),
    },
    Badge {
        slug: "feedback-champion",
        name: "Feedback Champion",
        description: "Write 10 reviews",
        category: BadgeCategory::Quality,
        requirement: BadgeRequirement::ReviewsWritten(10),
    },
];

/// Look up a catalogue entry by slug.
#[must_use]
pub fn find_badge(slug: &str) -> Option<&'static Badge> {
    CATALOGUE.iter().find(|badge| badge.slug == slug)
}

/// Counters a user's badges are judged against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BadgeProgress {
    pub sessions_learned: u32,
    pub sessions_taught: u32,
    pub reviews_written: u32,
    pub rating_hundredths: u32,
    pub reviews_received: u32,
}

impl BadgeProgress {
    /// Fold a mentor rating aggregate into the progress counters.
    #[must_use]
    pub fn with_rating(mut self, rating: &MentorRating) -> Self {
        self.rating_hundredths = hundredths(rating.average_rating);
        self.reviews_received = rating.total_reviews;
        self
    }
}

#[expect(
    clippy::float_arithmetic,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "ratings are bounded to 0..=5 before scaling"
)]
fn hundredths(average: f64) -> u32 {
    (average.clamp(0.0, 5.0) * 100.0).round() as u32
}

impl Badge {
    /// Whether `progress` satisfies this badge.
    #[must_use]
    pub const fn is_earned_by(&self, progress: &BadgeProgress) -> bool {
        match self.requirement {
            BadgeRequirement::SessionsLearned(n) => progress.sessions_learned >= n,
            BadgeRequirement::SessionsTaught(n) => progress.sessions_taught >= n,
            BadgeRequirement::SessionsTotal(n) => {
                progress.sessions_learned + progress.sessions_taught >= n
            }
            BadgeRequirement::ReviewsWritten(n) => progress.reviews_written >= n,
            BadgeRequirement::MentorRating {
                min_hundredths,
                min_reviews,
            } => {
                progress.reviews_received >= min_reviews
                    && progress.rating_hundredths >= min_hundredths
            }
        }
    }
}

/// Catalogue entries `progress` qualifies for, minus those already held.
#[must_use]
pub fn newly_earned(progress: &BadgeProgress, held: &[&str]) -> Vec<&'static Badge> {
    CATALOGUE
        .iter()
        .filter(|badge| !held.contains(&badge.slug) && badge.is_earned_by(progress))
        .collect()
}

/// Badge held by a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EarnedBadge {
    pub user_id: UserId,
    pub slug: String,
    pub earned_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    fn slugs(badges: &[&Badge]) -> Vec<&'static str> {
        badges.iter().map(|b| b.slug).collect()
    }

    #[rstest]
    fn catalogue_slugs_are_unique() {
        let mut all: Vec<_> = CATALOGUE.iter().map(|b| b.slug).collect();
        all.sort_unstable();
        all.dedup();
        assert_eq!(all.len(), CATALOGUE.len());
    }

    #[rstest]
    fn first_session_earns_first_steps() {
        let progress = BadgeProgress {
            sessions_learned: 1,
            ..BadgeProgress::default()
        };
        assert_eq!(slugs(&newly_earned(&progress, &[])), vec!["first-steps"]);
    }

    #[rstest]
    fn held_badges_are_not_awarded_again() {
        let progress = BadgeProgress {
            sessions_learned: 5,
            ..BadgeProgress::default()
        };
        assert_eq!(
            slugs(&newly_earned(&progress, &["first-steps"])),
            vec!["getting-started"]
        );
    }

    #[rstest]
    #[case(449, 10, false)]
    #[case(450, 4, false)]
    #[case(450, 5, true)]
    fn highly_rated_needs_score_and_volume(
        #[case] rating_hundredths: u32,
        #[case] reviews_received: u32,
        #[case] expected: bool,
    ) {
        let progress = BadgeProgress {
            rating_hundredths,
            reviews_received,
            ..BadgeProgress::default()
        };
        let badge = find_badge("highly-rated").expect("catalogued");
        assert_eq!(badge.is_earned_by(&progress), expected);
    }

    #[rstest]
    fn century_club_counts_both_roles() {
        let progress = BadgeProgress {
            sessions_learned: 40,
            sessions_taught: 60,
            ..BadgeProgress::default()
        };
        let badge = find_badge("century-club").expect("catalogued");
        assert!(badge.is_earned_by(&progress));
    }
}
