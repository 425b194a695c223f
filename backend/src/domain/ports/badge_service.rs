//! Driving port for gamification.

use async_trait::async_trait;

use crate::domain::{EarnedBadge, Error, UserId};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BadgeService: Send + Sync {
    /// Award every badge the user newly qualifies for and return them.
    async fn check_and_award(&self, user_id: &UserId) -> Result<Vec<EarnedBadge>, Error>;

    /// Badges held by the user, newest first.
    async fn earned(&self, user_id: &UserId) -> Result<Vec<EarnedBadge>, Error>;
}
