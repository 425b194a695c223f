//! Shared WebSocket adapter state.
//!
//! The socket depends on the same driving ports as the REST handlers plus
//! the hub it subscribes to, which keeps the adapter testable with mocks.

use std::sync::Arc;

use crate::domain::ports::{AccountService, ChatService};
use crate::inbound::ws::hub::ChatHub;
use crate::inbound::ws::origin::OriginPolicy;

/// Dependency bundle for the chat socket.
#[derive(Clone)]
pub struct WsState {
    pub accounts: Arc<dyn AccountService>,
    pub chat: Arc<dyn ChatService>,
    pub hub: Arc<ChatHub>,
    pub origins: OriginPolicy,
}

impl WsState {
    /// Construct state from explicit port implementations.
    pub fn new(
        accounts: Arc<dyn AccountService>,
        chat: Arc<dyn ChatService>,
        hub: Arc<ChatHub>,
        origins: OriginPolicy,
    ) -> Self {
        Self {
            accounts,
            chat,
            hub,
            origins,
        }
    }
}
