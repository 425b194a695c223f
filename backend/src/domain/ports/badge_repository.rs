//! Port for earned badges.
use async_trait::async_trait;

use crate::domain::{EarnedBadge, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by badge repository adapters.
    pub enum BadgeRepositoryError {
        Connection { message: String } => "badge repository connection failed: {message}",
        Query { message: String } => "badge repository query failed: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BadgeRepository: Send + Sync {
    /// Store an award; returns `false` when the user already held the badge.
    async fn award(&self, badge: &EarnedBadge) -> Result<bool, BadgeRepositoryError>;

    /// Badges held by a user, newest first.
    async fn for_user(&self, user_id: &UserId) -> Result<Vec<EarnedBadge>, BadgeRepositoryError>;
}
