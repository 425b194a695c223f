//! Driving port for a user's notification inbox.

use async_trait::async_trait;
use pagination::Paginated;
use uuid::Uuid;

use crate::domain::{Error, Notification, NotificationStats, PageKey, UserId};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationService: Send + Sync {
    async fn list(
        &self,
        user_id: &UserId,
        unread_only: bool,
        before: Option<PageKey>,
        limit: usize,
    ) -> Result<Paginated<Notification>, Error>;

    async fn mark_read(&self, user_id: &UserId, notification_id: &Uuid) -> Result<(), Error>;

    /// Returns the number of notifications changed.
    async fn mark_all_read(&self, user_id: &UserId) -> Result<u64, Error>;

    async fn stats(&self, user_id: &UserId) -> Result<NotificationStats, Error>;
}
