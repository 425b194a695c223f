//! Reviews, chat, notifications, badges and the audit logs.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::ports::{
    AiResponseRepository, AiResponseRepositoryError, BadgeRepository, BadgeRepositoryError,
    ChatRepository, ChatRepositoryError, NotificationRepository, NotificationRepositoryError,
    ReviewRepository, ReviewRepositoryError, WebhookEventRepository, WebhookEventRepositoryError,
};
use crate::domain::{
    AiResponse, ChatMessage, ChatRoom, EarnedBadge, Notification, NotificationKind,
    NotificationStats, PageKey, ParticipantPair, Review, UserId, WebhookEvent,
    WebhookRecordOutcome,
};

use super::{MemoryStore, newest_first};

#[async_trait]
impl ReviewRepository for MemoryStore {
    async fn insert(&self, review: &Review) -> Result<(), ReviewRepositoryError> {
        let mut tables = self.tables.write().await;
        if tables
            .reviews
            .values()
            .any(|existing| existing.booking_id == review.booking_id)
        {
            return Err(ReviewRepositoryError::duplicate_review());
        }
        tables.reviews.insert(review.id, review.clone());
        Ok(())
    }

    async fn find(&self, review_id: &Uuid) -> Result<Option<Review>, ReviewRepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.reviews.get(review_id).cloned())
    }

    async fn for_mentor(&self, mentor_id: &UserId) -> Result<Vec<Review>, ReviewRepositoryError> {
        let tables = self.tables.read().await;
        Ok(newest_first(
            tables
                .reviews
                .values()
                .filter(|review| review.mentor_id == *mentor_id)
                .cloned(),
            |review| PageKey::new(review.created_at, review.id),
            None,
            usize::MAX,
        ))
    }

    async fn count_by_reviewer(&self, reviewer_id: &UserId) -> Result<u64, ReviewRepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .reviews
            .values()
            .filter(|review| review.reviewer_id == *reviewer_id)
            .count() as u64)
    }

    async fn record_helpful(
        &self,
        review_id: &Uuid,
        voter_id: &UserId,
    ) -> Result<i32, ReviewRepositoryError> {
        let mut tables = self.tables.write().await;
        if !tables.reviews.contains_key(review_id) {
            return Err(ReviewRepositoryError::query(format!(
                "review {review_id} not found"
            )));
        }
        if !tables.helpful_votes.insert((*review_id, *voter_id)) {
            return Err(ReviewRepositoryError::duplicate_vote());
        }
        let review = tables
            .reviews
            .get_mut(review_id)
            .ok_or_else(|| ReviewRepositoryError::query(format!("review {review_id} not found")))?;
        review.helpful_count += 1;
        Ok(review.helpful_count)
    }
}

#[async_trait]
impl ChatRepository for MemoryStore {
    async fn open_room(&self, room: &ChatRoom) -> Result<ChatRoom, ChatRepositoryError> {
        let mut tables = self.tables.write().await;
        if let Some(existing) = tables
            .rooms
            .values()
            .find(|existing| existing.participants == room.participants)
        {
            return Ok(existing.clone());
        }
        tables.rooms.insert(room.id, room.clone());
        Ok(room.clone())
    }

    async fn find_room(&self, room_id: &Uuid) -> Result<Option<ChatRoom>, ChatRepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.rooms.get(room_id).cloned())
    }

    async fn find_room_for_pair(
        &self,
        pair: &ParticipantPair,
    ) -> Result<Option<ChatRoom>, ChatRepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .rooms
            .values()
            .find(|room| room.participants == *pair)
            .cloned())
    }

    async fn rooms_for(&self, user_id: &UserId) -> Result<Vec<ChatRoom>, ChatRepositoryError> {
        let tables = self.tables.read().await;
        Ok(newest_first(
            tables
                .rooms
                .values()
                .filter(|room| room.participants.contains(*user_id))
                .cloned(),
            |room| PageKey::new(room.created_at, room.id),
            None,
            usize::MAX,
        ))
    }

    async fn insert_message(&self, message: &ChatMessage) -> Result<(), ChatRepositoryError> {
        let mut tables = self.tables.write().await;
        tables.messages.insert(message.id, message.clone());
        Ok(())
    }

    async fn find_message(
        &self,
        message_id: &Uuid,
    ) -> Result<Option<ChatMessage>, ChatRepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.messages.get(message_id).cloned())
    }

    async fn update_message(&self, message: &ChatMessage) -> Result<(), ChatRepositoryError> {
        let mut tables = self.tables.write().await;
        match tables.messages.get_mut(&message.id) {
            Some(stored) => {
                *stored = message.clone();
                Ok(())
            }
            None => Err(ChatRepositoryError::query(format!(
                "message {} not found",
                message.id
            ))),
        }
    }

    async fn messages(
        &self,
        room_id: &Uuid,
        before: Option<PageKey>,
        limit: usize,
    ) -> Result<Vec<ChatMessage>, ChatRepositoryError> {
        let tables = self.tables.read().await;
        Ok(newest_first(
            tables
                .messages
                .values()
                .filter(|message| message.room_id == *room_id)
                .cloned(),
            |message| PageKey::new(message.created_at, message.id),
            before,
            limit,
        ))
    }
}

#[async_trait]
impl NotificationRepository for MemoryStore {
    async fn insert(&self, notification: &Notification) -> Result<(), NotificationRepositoryError> {
        let mut tables = self.tables.write().await;
        tables
            .notifications
            .insert(notification.id, notification.clone());
        Ok(())
    }

    async fn insert_all(
        &self,
        notifications: &[Notification],
    ) -> Result<(), NotificationRepositoryError> {
        let mut tables = self.tables.write().await;
        tables.notifications.extend(
            notifications
                .iter()
                .map(|notification| (notification.id, notification.clone())),
        );
        Ok(())
    }

    async fn page(
        &self,
        user_id: &UserId,
        unread_only: bool,
        before: Option<PageKey>,
        limit: usize,
    ) -> Result<Vec<Notification>, NotificationRepositoryError> {
        let tables = self.tables.read().await;
        Ok(newest_first(
            tables
                .notifications
                .values()
                .filter(|n| n.user_id == *user_id && (!unread_only || !n.is_read))
                .cloned(),
            |n| PageKey::new(n.created_at, n.id),
            before,
            limit,
        ))
    }

    async fn mark_read(
        &self,
        user_id: &UserId,
        notification_id: &Uuid,
    ) -> Result<bool, NotificationRepositoryError> {
        let mut tables = self.tables.write().await;
        Ok(match tables.notifications.get_mut(notification_id) {
            Some(notification) if notification.user_id == *user_id => {
                notification.is_read = true;
                true
            }
            _ => false,
        })
    }

    async fn mark_all_read(&self, user_id: &UserId) -> Result<u64, NotificationRepositoryError> {
        let mut tables = self.tables.write().await;
        let mut marked = 0;
        for notification in tables.notifications.values_mut() {
            if notification.user_id == *user_id && !notification.is_read {
                notification.is_read = true;
                marked += 1;
            }
        }
        Ok(marked)
    }

    async fn stats(
        &self,
        user_id: &UserId,
    ) -> Result<NotificationStats, NotificationRepositoryError> {
        let tables = self.tables.read().await;
        Ok(NotificationStats::tally(
            tables
                .notifications
                .values()
                .filter(|n| n.user_id == *user_id),
        ))
    }

    async fn has_reminder_for(
        &self,
        booking_id: &Uuid,
    ) -> Result<bool, NotificationRepositoryError> {
        let tables = self.tables.read().await;
        let wanted = booking_id.to_string();
        Ok(tables.notifications.values().any(|n| {
            n.kind == NotificationKind::SessionReminder
                && n.payload.get("bookingId").and_then(|v| v.as_str()) == Some(wanted.as_str())
        }))
    }
}

#[async_trait]
impl BadgeRepository for MemoryStore {
    async fn award(&self, badge: &EarnedBadge) -> Result<bool, BadgeRepositoryError> {
        let mut tables = self.tables.write().await;
        if tables
            .badges
            .iter()
            .any(|held| held.user_id == badge.user_id && held.slug == badge.slug)
        {
            return Ok(false);
        }
        tables.badges.push(badge.clone());
        Ok(true)
    }

    async fn for_user(&self, user_id: &UserId) -> Result<Vec<EarnedBadge>, BadgeRepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .badges
            .iter()
            .filter(|badge| badge.user_id == *user_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl AiResponseRepository for MemoryStore {
    async fn insert(&self, response: &AiResponse) -> Result<(), AiResponseRepositoryError> {
        let mut tables = self.tables.write().await;
        tables.ai_log.push(response.clone());
        Ok(())
    }

    async fn for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<AiResponse>, AiResponseRepositoryError> {
        let tables = self.tables.read().await;
        Ok(newest_first(
            tables
                .ai_log
                .iter()
                .filter(|entry| entry.user_id == *user_id)
                .cloned(),
            |entry| PageKey::new(entry.created_at, entry.id),
            None,
            usize::MAX,
        ))
    }
}

#[async_trait]
impl WebhookEventRepository for MemoryStore {
    async fn record(
        &self,
        event: &WebhookEvent,
    ) -> Result<WebhookRecordOutcome, WebhookEventRepositoryError> {
        let mut tables = self.tables.write().await;
        if let Some(event_id) = event.event_id.as_deref()
            && let Some(existing) = tables.webhook_events.iter().find(|stored| {
                stored.provider == event.provider && stored.event_id.as_deref() == Some(event_id)
            })
        {
            return Ok(WebhookRecordOutcome::Duplicate { id: existing.id });
        }
        tables.webhook_events.push(event.clone());
        Ok(WebhookRecordOutcome::Recorded)
    }
}
