//! Per-connection chat socket handler.
//!
//! Keeps WebSocket framing and heartbeats at the edge while deferring every
//! chat change to the injected [`ChatService`]. The public contract pings
//! every 5s and considers a connection idle after 10s without client
//! traffic. Tests shorten these intervals to speed up feedback.

use std::sync::Arc;
use std::time::{Duration, Instant};

use actix_ws::{CloseCode, CloseReason, Closed, Message, MessageStream, ProtocolError, Session};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::time;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::ports::{ChatEventPublisher, ChatService};
use crate::domain::{Actor, ChatEvent, Error};
use crate::inbound::ws::hub::ChatHub;
use crate::inbound::ws::messages::{ClientMessage, ServerMessage};

/// Time between heartbeats to the client (5s in production, shorter in tests).
#[cfg(not(test))]
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);
#[cfg(test)]
const HEARTBEAT_INTERVAL: Duration = Duration::from_millis(50);

/// Max idle time before disconnecting the client (10s in production, shorter in tests).
#[cfg(not(test))]
const CLIENT_TIMEOUT: Duration = Duration::from_secs(10);
#[cfg(test)]
const CLIENT_TIMEOUT: Duration = Duration::from_millis(100);

/// Everything a running session needs besides its socket.
pub(super) struct RoomMembership {
    pub actor: Actor,
    pub room_id: Uuid,
    pub chat: Arc<dyn ChatService>,
    pub hub: Arc<ChatHub>,
}

/// Drive one participant's socket until it closes, announcing the join and
/// the departure to the rest of the room.
///
/// `events` must be subscribed before the upgrade response is sent so no
/// event published after the handshake is missed.
pub(super) async fn handle_ws_session(
    membership: RoomMembership,
    events: broadcast::Receiver<ChatEvent>,
    session: Session,
    stream: MessageStream,
) {
    let user_id = membership.actor.user_id;
    let room_id = membership.room_id;
    let hub = Arc::clone(&membership.hub);

    hub.publish(room_id, ChatEvent::UserJoined { user_id });
    WsSession::new(membership).run(session, stream, events).await;
    hub.publish(room_id, ChatEvent::UserLeft { user_id });
}

enum SessionError {
    ClientClosed(Option<CloseReason>),
    StreamClosed,
    HeartbeatTimeout,
    Protocol(ProtocolError),
    HubClosed,
    Network(Closed),
}

enum CloseAction {
    None,
    Close(Option<CloseReason>),
}

struct WsSession {
    membership: RoomMembership,
}

impl WsSession {
    fn new(membership: RoomMembership) -> Self {
        Self { membership }
    }

    async fn run(
        &self,
        mut session: Session,
        mut stream: MessageStream,
        mut events: broadcast::Receiver<ChatEvent>,
    ) {
        let mut last_heartbeat = Instant::now();
        let mut heartbeat = time::interval(HEARTBEAT_INTERVAL);

        loop {
            let result = tokio::select! {
                _ = heartbeat.tick() => {
                    Self::handle_heartbeat_tick(&mut session, &last_heartbeat).await
                }
                message = stream.recv() => {
                    self.handle_stream_message(&mut session, &mut last_heartbeat, message)
                        .await
                }
                event = events.recv() => {
                    self.handle_room_event(&mut session, event).await
                }
            };

            if let Err(error) = result {
                Self::log_shutdown_reason(&error);
                let close_action = Self::close_action_for(&error);
                Self::close_session_if_needed(session, close_action).await;
                return;
            }
        }
    }

    async fn handle_heartbeat_tick(
        session: &mut Session,
        last_heartbeat: &Instant,
    ) -> Result<(), SessionError> {
        if Instant::now().duration_since(*last_heartbeat) > CLIENT_TIMEOUT {
            return Err(SessionError::HeartbeatTimeout);
        }

        session.ping(b"").await.map_err(SessionError::Network)
    }

    async fn handle_stream_message(
        &self,
        session: &mut Session,
        last_heartbeat: &mut Instant,
        message: Option<Result<Message, ProtocolError>>,
    ) -> Result<(), SessionError> {
        let Some(message) = message else {
            return Err(SessionError::StreamClosed);
        };

        match message {
            Ok(message) => self.handle_message(session, last_heartbeat, message).await,
            Err(error) => Err(SessionError::Protocol(error)),
        }
    }

    async fn handle_message(
        &self,
        session: &mut Session,
        last_heartbeat: &mut Instant,
        message: Message,
    ) -> Result<(), SessionError> {
        match message {
            Message::Ping(payload) => {
                *last_heartbeat = Instant::now();
                session.pong(&payload).await.map_err(SessionError::Network)
            }
            Message::Text(text) => {
                *last_heartbeat = Instant::now();
                self.handle_text_message(session, text.as_ref()).await
            }
            Message::Pong(_) | Message::Binary(_) | Message::Continuation(_) | Message::Nop => {
                *last_heartbeat = Instant::now();
                Ok(())
            }
            Message::Close(reason) => Err(SessionError::ClientClosed(reason)),
        }
    }

    async fn handle_text_message(
        &self,
        session: &mut Session,
        text: &str,
    ) -> Result<(), SessionError> {
        let request = match serde_json::from_str::<ClientMessage>(text) {
            Ok(request) => request,
            Err(error) => {
                debug!(error = %error, "Rejected malformed WebSocket payload");
                return send_json(session, &ServerMessage::error("Invalid JSON"))
                    .await
                    .map_err(SessionError::Network);
            }
        };

        if let Err(error) = self.apply(request).await {
            return send_json(session, &ServerMessage::error(error.message()))
                .await
                .map_err(SessionError::Network);
        }
        Ok(())
    }

    /// Forward a client request to the chat service. Results reach this
    /// socket, like every other participant's, through the hub.
    async fn apply(&self, request: ClientMessage) -> Result<(), Error> {
        let RoomMembership {
            actor,
            room_id,
            chat,
            ..
        } = &self.membership;
        match request {
            ClientMessage::ChatMessage { content } => {
                chat.post(actor, room_id, &content).await?;
            }
            ClientMessage::EditMessage {
                message_id,
                content,
            } => {
                chat.edit(actor, &message_id, &content).await?;
            }
            ClientMessage::DeleteMessage { message_id } => {
                chat.delete(actor, &message_id).await?;
            }
            ClientMessage::Typing { is_typing } => {
                chat.typing(actor, room_id, is_typing).await?;
            }
        }
        Ok(())
    }

    async fn handle_room_event(
        &self,
        session: &mut Session,
        event: Result<ChatEvent, RecvError>,
    ) -> Result<(), SessionError> {
        match event {
            Ok(event) if self.is_own_presence(&event) => Ok(()),
            Ok(event) => send_json(session, &ServerMessage::from(&event))
                .await
                .map_err(SessionError::Network),
            Err(RecvError::Lagged(skipped)) => {
                warn!(
                    room_id = %self.membership.room_id,
                    skipped,
                    "chat socket lagged behind its room"
                );
                Ok(())
            }
            Err(RecvError::Closed) => Err(SessionError::HubClosed),
        }
    }

    /// Typing and presence events are not echoed to the user who caused them.
    fn is_own_presence(&self, event: &ChatEvent) -> bool {
        let me = self.membership.actor.user_id;
        match event {
            ChatEvent::Typing { user_id, .. }
            | ChatEvent::UserJoined { user_id }
            | ChatEvent::UserLeft { user_id } => *user_id == me,
            ChatEvent::MessagePosted(_)
            | ChatEvent::MessageEdited(_)
            | ChatEvent::MessageDeleted { .. } => false,
        }
    }

    fn log_shutdown_reason(error: &SessionError) {
        match error {
            SessionError::HeartbeatTimeout => {
                warn!("WebSocket heartbeat timeout; closing connection");
            }
            SessionError::Protocol(error) => {
                warn!(error = %error, "WebSocket protocol error");
            }
            SessionError::Network(error) => {
                warn!(error = %error, "WebSocket send failed; closing connection");
            }
            SessionError::HubClosed => {
                warn!("chat room channel closed; closing connection");
            }
            SessionError::ClientClosed(_) | SessionError::StreamClosed => {}
        }
    }

    fn close_action_for(error: &SessionError) -> CloseAction {
        match error {
            SessionError::HeartbeatTimeout => CloseAction::Close(Some(CloseReason {
                code: CloseCode::Normal,
                description: Some("heartbeat timeout".to_owned()),
            })),
            SessionError::Protocol(_) => CloseAction::Close(Some(CloseReason {
                code: CloseCode::Protocol,
                description: Some("protocol error".to_owned()),
            })),
            SessionError::HubClosed => CloseAction::Close(Some(CloseReason {
                code: CloseCode::Away,
                description: Some("room closed".to_owned()),
            })),
            SessionError::ClientClosed(reason) => CloseAction::Close(reason.clone()),
            SessionError::StreamClosed | SessionError::Network(_) => CloseAction::None,
        }
    }

    async fn close_session_if_needed(session: Session, close_action: CloseAction) {
        if let CloseAction::Close(reason) = close_action
            && let Err(error) = session.close(reason).await
        {
            warn!(error = %error, "Failed to close WebSocket session");
        }
    }
}

async fn send_json(session: &mut Session, payload: &ServerMessage) -> Result<(), Closed> {
    match serde_json::to_string(payload) {
        Ok(body) => session.text(body).await,
        Err(error) => {
            warn!(error = %error, "Failed to serialize WebSocket payload");
            Ok(())
        }
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
