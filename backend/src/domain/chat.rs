//! Two-party chat rooms, messages and the events broadcast to room members.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::UserId;

/// Maximum message length in characters.
pub const MESSAGE_MAX: usize = 5000;

/// Validation errors for chat values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChatValidationError {
    #[error("message content must not be empty")]
    EmptyContent,
    #[error("message content must be at most {max} characters")]
    ContentTooLong { max: usize },
    #[error("cannot open a chat with yourself")]
    SelfChat,
}

/// Validated message body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageContent(String);

impl MessageContent {
    pub fn new(raw: impl AsRef<str>) -> Result<Self, ChatValidationError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(ChatValidationError::EmptyContent);
        }
        if trimmed.chars().count() > MESSAGE_MAX {
            return Err(ChatValidationError::ContentTooLong { max: MESSAGE_MAX });
        }
        Ok(Self(trimmed.to_owned()))
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl AsRef<str> for MessageContent {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Unordered pair of distinct participants, stored sorted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParticipantPair([UserId; 2]);

impl ParticipantPair {
    pub fn new(a: UserId, b: UserId) -> Result<Self, ChatValidationError> {
        if a == b {
            return Err(ChatValidationError::SelfChat);
        }
        Ok(if a < b { Self([a, b]) } else { Self([b, a]) })
    }

    #[must_use]
    pub const fn first_user(&self) -> UserId {
        self.0[0]
    }

    #[must_use]
    pub const fn second_user(&self) -> UserId {
        self.0[1]
    }

    #[must_use]
    pub fn contains(&self, user: UserId) -> bool {
        self.0.contains(&user)
    }

    #[must_use]
    pub const fn as_array(&self) -> [UserId; 2] {
        self.0
    }
}

/// Private conversation between two users.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRoom {
    pub id: Uuid,
    pub participants: ParticipantPair,
    pub created_at: DateTime<Utc>,
}

/// Message posted to a room. Deleted messages keep their row with the
/// content cleared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub id: Uuid,
    pub room_id: Uuid,
    pub sender_id: UserId,
    pub content: String,
    pub edited_at: Option<DateTime<Utc>>,
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    /// The message as shown to readers: deleted content is blanked.
    #[must_use]
    pub fn redacted(mut self) -> Self {
        if self.deleted {
            self.content.clear();
        }
        self
    }
}

/// Event fanned out to everyone connected to a room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    MessagePosted(ChatMessage),
    MessageEdited(ChatMessage),
    MessageDeleted { message_id: Uuid, room_id: Uuid },
    Typing { user_id: UserId, is_typing: bool },
    UserJoined { user_id: UserId },
    UserLeft { user_id: UserId },
}
