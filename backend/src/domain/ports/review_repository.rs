//! Port for reviews and helpfulness votes.
use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Review, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by review repository adapters.
    pub enum ReviewRepositoryError {
        Connection { message: String } => "review repository connection failed: {message}",
        Query { message: String } => "review repository query failed: {message}",
        /// The reviewer already reviewed the booking.
        DuplicateReview => "booking has already been reviewed",
        /// The user already voted on the review.
        DuplicateVote => "review already marked helpful by this user",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReviewRepository: Send + Sync {
    async fn insert(&self, review: &Review) -> Result<(), ReviewRepositoryError>;

    async fn find(&self, review_id: &Uuid) -> Result<Option<Review>, ReviewRepositoryError>;

    /// Reviews of a mentor, newest first.
    async fn for_mentor(&self, mentor_id: &UserId) -> Result<Vec<Review>, ReviewRepositoryError>;

    /// Number of reviews written by a user.
    async fn count_by_reviewer(&self, reviewer_id: &UserId) -> Result<u64, ReviewRepositoryError>;

    /// Record a helpful vote and return the updated count.
    async fn record_helpful(
        &self,
        review_id: &Uuid,
        voter_id: &UserId,
    ) -> Result<i32, ReviewRepositoryError>;
}
