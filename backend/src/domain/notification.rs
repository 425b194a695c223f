//! In-app notifications.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use super::UserId;

/// What a notification is about.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    BookingRequest,
    BookingConfirmed,
    BookingDeclined,
    BookingCancelled,
    BookingCompleted,
    SessionReminder,
    FeedbackReceived,
    ReviewReceived,
    BadgeEarned,
    General,
}

impl NotificationKind {
    pub const ALL: [Self; 10] = [
        Self::BookingRequest,
        Self::BookingConfirmed,
        Self::BookingDeclined,
        Self::BookingCancelled,
        Self::BookingCompleted,
        Self::SessionReminder,
        Self::FeedbackReceived,
        Self::ReviewReceived,
        Self::BadgeEarned,
        Self::General,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BookingRequest => "booking_request",
            Self::BookingConfirmed => "booking_confirmed",
            Self::BookingDeclined => "booking_declined",
            Self::BookingCancelled => "booking_cancelled",
            Self::BookingCompleted => "booking_completed",
            Self::SessionReminder => "session_reminder",
            Self::FeedbackReceived => "feedback_received",
            Self::ReviewReceived => "review_received",
            Self::BadgeEarned => "badge_earned",
            Self::General => "general",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when a stored kind is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown notification kind: {value}")]
pub struct UnknownNotificationKind {
    pub value: String,
}

impl FromStr for NotificationKind {
    type Err = UnknownNotificationKind;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == value)
            .ok_or_else(|| UnknownNotificationKind {
                value: value.to_owned(),
            })
    }
}

/// Stored notification.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: UserId,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub payload: Value,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// Notification about to be delivered.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationDraft {
    pub user_id: UserId,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub payload: Value,
}

impl NotificationDraft {
    #[must_use]
    pub fn new(
        user_id: UserId,
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
        payload: Value,
    ) -> Self {
        Self {
            user_id,
            kind,
            title: title.into(),
            message: message.into(),
            payload,
        }
    }

    /// Materialise the draft as an unread notification.
    #[must_use]
    pub fn into_notification(self, id: Uuid, now: DateTime<Utc>) -> Notification {
        Notification {
            id,
            user_id: self.user_id,
            kind: self.kind,
            title: self.title,
            message: self.message,
            payload: self.payload,
            is_read: false,
            created_at: now,
        }
    }
}

/// Per-user counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotificationStats {
    pub total: u64,
    pub unread: u64,
    pub by_kind: BTreeMap<NotificationKind, u64>,
}

impl NotificationStats {
    /// Tally an iterator of notifications.
    #[must_use]
    pub fn tally<'a>(notifications: impl IntoIterator<Item = &'a Notification>) -> Self {
        notifications
            .into_iter()
            .fold(Self::default(), |mut stats, notification| {
                stats.total += 1;
                if !notification.is_read {
                    stats.unread += 1;
                }
                *stats.by_kind.entry(notification.kind).or_default() += 1;
                stats
            })
    }
}
