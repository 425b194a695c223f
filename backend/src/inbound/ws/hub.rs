//! In-process fan-out of chat events to connected sockets.
//!
//! Each room gets its own broadcast channel the first time someone
//! subscribes. Channels are dropped again once the last subscriber leaves,
//! so publishing to a quiet room costs a map lookup.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::broadcast;
use tracing::debug;
use uuid::Uuid;

use crate::domain::ChatEvent;
use crate::domain::ports::ChatEventPublisher;

/// Events buffered per room before slow receivers start lagging.
pub const ROOM_CAPACITY: usize = 256;

/// Room-keyed broadcast registry.
#[derive(Debug, Default)]
pub struct ChatHub {
    rooms: Mutex<HashMap<Uuid, broadcast::Sender<ChatEvent>>>,
}

impl ChatHub {
    pub fn new() -> Self {
        Self::default()
    }

    fn rooms(&self) -> MutexGuard<'_, HashMap<Uuid, broadcast::Sender<ChatEvent>>> {
        self.rooms.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Receive every event published to `room_id` from now on.
    pub fn subscribe(&self, room_id: Uuid) -> broadcast::Receiver<ChatEvent> {
        self.rooms()
            .entry(room_id)
            .or_insert_with(|| broadcast::channel(ROOM_CAPACITY).0)
            .subscribe()
    }

    /// Number of live subscribers in a room.
    pub fn listeners(&self, room_id: &Uuid) -> usize {
        self.rooms()
            .get(room_id)
            .map_or(0, broadcast::Sender::receiver_count)
    }
}

impl ChatEventPublisher for ChatHub {
    fn publish(&self, room_id: Uuid, event: ChatEvent) {
        let mut rooms = self.rooms();
        let Some(sender) = rooms.get(&room_id) else {
            return;
        };
        if sender.send(event).is_err() {
            debug!(%room_id, "dropping idle chat room channel");
            rooms.remove(&room_id);
        }
    }
}
