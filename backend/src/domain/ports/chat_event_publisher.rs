//! Driven port for fanning chat events out to connected clients.
use uuid::Uuid;

use crate::domain::ChatEvent;

/// Delivers events to whoever is currently connected to a room.
///
/// Delivery is best effort: events for rooms without listeners are dropped.
#[cfg_attr(test, mockall::automock)]
pub trait ChatEventPublisher: Send + Sync {
    fn publish(&self, room_id: Uuid, event: ChatEvent);
}

/// Publisher that drops every event, for contexts without live clients.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpChatEventPublisher;

impl ChatEventPublisher for NoOpChatEventPublisher {
    fn publish(&self, _room_id: Uuid, _event: ChatEvent) {}
}
