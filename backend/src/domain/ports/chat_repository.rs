//! Port for chat rooms and their messages.
use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{ChatMessage, ChatRoom, PageKey, ParticipantPair, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by chat repository adapters.
    pub enum ChatRepositoryError {
        Connection { message: String } => "chat repository connection failed: {message}",
        Query { message: String } => "chat repository query failed: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatRepository: Send + Sync {
    /// Insert `room` unless the pair already has one; returns the stored room.
    async fn open_room(&self, room: &ChatRoom) -> Result<ChatRoom, ChatRepositoryError>;

    async fn find_room(&self, room_id: &Uuid) -> Result<Option<ChatRoom>, ChatRepositoryError>;

    async fn find_room_for_pair(
        &self,
        pair: &ParticipantPair,
    ) -> Result<Option<ChatRoom>, ChatRepositoryError>;

    /// Rooms a user participates in, newest first.
    async fn rooms_for(&self, user_id: &UserId) -> Result<Vec<ChatRoom>, ChatRepositoryError>;

    async fn insert_message(&self, message: &ChatMessage) -> Result<(), ChatRepositoryError>;

    async fn find_message(
        &self,
        message_id: &Uuid,
    ) -> Result<Option<ChatMessage>, ChatRepositoryError>;

    /// Persist edits and soft deletion of an existing message.
    async fn update_message(&self, message: &ChatMessage) -> Result<(), ChatRepositoryError>;

    /// Up to `limit` messages older than `before`, newest first.
    async fn messages(
        &self,
        room_id: &Uuid,
        before: Option<PageKey>,
        limit: usize,
    ) -> Result<Vec<ChatMessage>, ChatRepositoryError>;
}
