//! Badge awarding service.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;
use tracing::{info, warn};

use crate::domain::ports::{BadgeRepository, BadgeService, BookingRepository, ReviewRepository};
use crate::domain::{
    BadgeProgress, BookingFilter, BookingScope, BookingStatus, EarnedBadge, Error, MentorRating,
    NotificationDraft, NotificationKind, Notifier, UserId, newly_earned,
};

/// Evaluates the badge catalogue against a user's history.
#[derive(Clone)]
pub struct BadgeAwards {
    badges: Arc<dyn BadgeRepository>,
    bookings: Arc<dyn BookingRepository>,
    reviews: Arc<dyn ReviewRepository>,
    notifier: Notifier,
    clock: Arc<dyn Clock>,
}

impl BadgeAwards {
    pub fn new(
        badges: Arc<dyn BadgeRepository>,
        bookings: Arc<dyn BookingRepository>,
        reviews: Arc<dyn ReviewRepository>,
        notifier: Notifier,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            badges,
            bookings,
            reviews,
            notifier,
            clock,
        }
    }

    async fn completed_count(&self, scope: BookingScope) -> Result<u32, Error> {
        let filter = BookingFilter {
            status: Some(BookingStatus::Completed),
            ..BookingFilter::scoped(scope)
        };
        let completed = self.bookings.list(&filter).await?;
        Ok(u32::try_from(completed.len()).unwrap_or(u32::MAX))
    }

    async fn progress(&self, user_id: &UserId) -> Result<BadgeProgress, Error> {
        let reviews_received = self.reviews.for_mentor(user_id).await?;
        let rating = MentorRating::from_reviews(*user_id, &reviews_received);
        let reviews_written = self.reviews.count_by_reviewer(user_id).await?;
        Ok(BadgeProgress {
            sessions_learned: self.completed_count(BookingScope::Learner(*user_id)).await?,
            sessions_taught: self.completed_count(BookingScope::Mentor(*user_id)).await?,
            reviews_written: u32::try_from(reviews_written).unwrap_or(u32::MAX),
            ..BadgeProgress::default()
        }
        .with_rating(&rating))
    }

    /// Run [`BadgeService::check_and_award`] and log rather than return any
    /// failure.
    pub async fn award_quietly(&self, user_id: &UserId) {
        if let Err(error) = self.check_and_award(user_id).await {
            warn!(%user_id, %error, "badge evaluation failed");
        }
    }
}

#[async_trait]
impl BadgeService for BadgeAwards {
    async fn check_and_award(&self, user_id: &UserId) -> Result<Vec<EarnedBadge>, Error> {
        let progress = self.progress(user_id).await?;
        let held = self.badges.for_user(user_id).await?;
        let held_slugs: Vec<&str> = held.iter().map(|b| b.slug.as_str()).collect();

        let mut awarded = Vec::new();
        for badge in newly_earned(&progress, &held_slugs) {
            let earned = EarnedBadge {
                user_id: *user_id,
                slug: badge.slug.to_owned(),
                earned_at: self.clock.utc(),
            };
            if !self.badges.award(&earned).await? {
                continue;
            }
            info!(%user_id, badge = badge.slug, "badge awarded");
            self.notifier
                .notify(NotificationDraft::new(
                    *user_id,
                    NotificationKind::BadgeEarned,
                    format!("Badge earned: {}", badge.name),
                    badge.description,
                    json!({ "badge": badge.slug }),
                ))
                .await;
            awarded.push(earned);
        }
        Ok(awarded)
    }

    async fn earned(&self, user_id: &UserId) -> Result<Vec<EarnedBadge>, Error> {
        Ok(self.badges.for_user(user_id).await?)
    }
}
