//! Port for stored notifications.
use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Notification, NotificationStats, PageKey, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by notification repository adapters.
    pub enum NotificationRepositoryError {
        Connection { message: String } =>
            "notification repository connection failed: {message}",
        Query { message: String } => "notification repository query failed: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn insert(&self, notification: &Notification) -> Result<(), NotificationRepositoryError>;

    /// Store every notification or none of them.
    async fn insert_all(
        &self,
        notifications: &[Notification],
    ) -> Result<(), NotificationRepositoryError>;

    /// Up to `limit` notifications older than `before`, newest first.
    async fn page(
        &self,
        user_id: &UserId,
        unread_only: bool,
        before: Option<PageKey>,
        limit: usize,
    ) -> Result<Vec<Notification>, NotificationRepositoryError>;

    /// Mark one of the user's notifications read; `false` when the user owns
    /// no such notification.
    async fn mark_read(
        &self,
        user_id: &UserId,
        notification_id: &Uuid,
    ) -> Result<bool, NotificationRepositoryError>;

    /// Mark every unread notification read and return how many changed.
    async fn mark_all_read(&self, user_id: &UserId) -> Result<u64, NotificationRepositoryError>;

    async fn stats(&self, user_id: &UserId) -> Result<NotificationStats, NotificationRepositoryError>;

    /// Whether a session reminder referencing the booking exists.
    async fn has_reminder_for(&self, booking_id: &Uuid) -> Result<bool, NotificationRepositoryError>;
}
