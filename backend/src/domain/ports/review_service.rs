//! Driving port for reviews and rating aggregates.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Actor, Error, MentorRating, Review, ReviewRatings, UserId};

/// Review as submitted by a learner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewSubmission {
    pub booking_id: Uuid,
    pub ratings: ReviewRatings,
    pub text: Option<String>,
    pub would_recommend: bool,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReviewService: Send + Sync {
    async fn submit(&self, actor: &Actor, submission: ReviewSubmission) -> Result<Review, Error>;

    async fn for_mentor(&self, mentor_id: &UserId) -> Result<Vec<Review>, Error>;

    async fn rating(&self, mentor_id: &UserId) -> Result<MentorRating, Error>;

    /// Record a helpful vote and return the new count.
    async fn mark_helpful(&self, actor: &Actor, review_id: &Uuid) -> Result<i32, Error>;
}
