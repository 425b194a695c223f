//! Driving port for chat rooms and messages, shared by REST and WebSocket
//! adapters.

use async_trait::async_trait;
use pagination::Paginated;
use uuid::Uuid;

use crate::domain::{Actor, ChatMessage, ChatRoom, Error, PageKey, UserId};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatService: Send + Sync {
    /// Existing room for the pair, or a new one.
    async fn open_room(&self, actor: &Actor, participant_id: &UserId) -> Result<ChatRoom, Error>;

    async fn rooms(&self, actor: &Actor) -> Result<Vec<ChatRoom>, Error>;

    /// Room the actor participates in; 404 otherwise.
    async fn room(&self, actor: &Actor, room_id: &Uuid) -> Result<ChatRoom, Error>;

    async fn messages(
        &self,
        actor: &Actor,
        room_id: &Uuid,
        before: Option<PageKey>,
        limit: usize,
    ) -> Result<Paginated<ChatMessage>, Error>;

    async fn post(&self, actor: &Actor, room_id: &Uuid, content: &str)
    -> Result<ChatMessage, Error>;

    async fn edit(&self, actor: &Actor, message_id: &Uuid, content: &str)
    -> Result<ChatMessage, Error>;

    async fn delete(&self, actor: &Actor, message_id: &Uuid) -> Result<ChatMessage, Error>;

    /// Broadcast a typing indicator to the room.
    async fn typing(&self, actor: &Actor, room_id: &Uuid, is_typing: bool) -> Result<(), Error>;
}
