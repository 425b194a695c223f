//! Wire-level message definitions for the chat socket.
//!
//! Both directions are JSON objects tagged by `type`. Hub events are turned
//! into [`ServerMessage`] values before being serialised to clients.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::ChatEvent;
use crate::inbound::http::schemas::ChatMessageBody;

/// Frame sent by a connected participant.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    ChatMessage {
        content: String,
    },
    EditMessage {
        #[serde(rename = "messageId")]
        message_id: Uuid,
        content: String,
    },
    DeleteMessage {
        #[serde(rename = "messageId")]
        message_id: Uuid,
    },
    Typing {
        #[serde(rename = "isTyping")]
        is_typing: bool,
    },
}

/// Frame pushed to connected participants.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    ChatMessage {
        message: ChatMessageBody,
    },
    MessageEdited {
        message: ChatMessageBody,
    },
    MessageDeleted {
        #[serde(rename = "messageId")]
        message_id: Uuid,
        #[serde(rename = "roomId")]
        room_id: Uuid,
    },
    Typing {
        #[serde(rename = "userId")]
        user_id: Uuid,
        #[serde(rename = "isTyping")]
        is_typing: bool,
    },
    UserJoined {
        #[serde(rename = "userId")]
        user_id: Uuid,
    },
    UserLeft {
        #[serde(rename = "userId")]
        user_id: Uuid,
    },
    Error {
        message: String,
    },
}

impl ServerMessage {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }
}

impl From<&ChatEvent> for ServerMessage {
    fn from(event: &ChatEvent) -> Self {
        match event {
            ChatEvent::MessagePosted(message) => Self::ChatMessage {
                message: message.into(),
            },
            ChatEvent::MessageEdited(message) => Self::MessageEdited {
                message: message.into(),
            },
            ChatEvent::MessageDeleted {
                message_id,
                room_id,
            } => Self::MessageDeleted {
                message_id: *message_id,
                room_id: *room_id,
            },
            ChatEvent::Typing { user_id, is_typing } => Self::Typing {
                user_id: *user_id.as_uuid(),
                is_typing: *is_typing,
            },
            ChatEvent::UserJoined { user_id } => Self::UserJoined {
                user_id: *user_id.as_uuid(),
            },
            ChatEvent::UserLeft { user_id } => Self::UserLeft {
                user_id: *user_id.as_uuid(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::{ChatMessage, UserId};
    use chrono::Utc;
    use rstest::rstest;
    use serde_json::{Value, json};

    #[rstest]
    #[case::post(
        json!({"type": "chat_message", "content": "hi"}),
        ClientMessage::ChatMessage { content: "hi".to_owned() }
    )]
    #[case::typing(
        json!({"type": "typing", "isTyping": true}),
        ClientMessage::Typing { is_typing: true }
    )]
    #[case::delete(
        json!({"type": "delete_message", "messageId": Uuid::nil()}),
        ClientMessage::DeleteMessage { message_id: Uuid::nil() }
    )]
    fn parses_client_frames(#[case] raw: Value, #[case] expected: ClientMessage) {
        let parsed: ClientMessage = serde_json::from_value(raw).expect("valid frame");
        assert_eq!(parsed, expected);
    }

    #[rstest]
    #[case::unknown_type(json!({"type": "react_message"}))]
    #[case::missing_content(json!({"type": "edit_message", "messageId": Uuid::nil()}))]
    fn rejects_unknown_or_incomplete_frames(#[case] raw: Value) {
        assert!(serde_json::from_value::<ClientMessage>(raw).is_err());
    }

    #[rstest]
    fn deleted_events_carry_both_ids() {
        let message_id = Uuid::new_v4();
        let room_id = Uuid::new_v4();
        let value = serde_json::to_value(ServerMessage::from(&ChatEvent::MessageDeleted {
            message_id,
            room_id,
        }))
        .expect("serialises");
        assert_eq!(
            value,
            json!({"type": "message_deleted", "messageId": message_id, "roomId": room_id})
        );
    }

    #[rstest]
    fn posted_messages_nest_the_message_body() {
        let message = ChatMessage {
            id: Uuid::new_v4(),
            room_id: Uuid::new_v4(),
            sender_id: UserId::random(),
            content: "hello".to_owned(),
            edited_at: None,
            deleted: false,
            created_at: Utc::now(),
        };
        let value = serde_json::to_value(ServerMessage::from(&ChatEvent::MessagePosted(
            message.clone(),
        )))
        .expect("serialises");
        assert_eq!(value["type"], json!("chat_message"));
        assert_eq!(value["message"]["content"], json!("hello"));
        assert_eq!(value["message"]["senderId"], json!(message.sender_id));
    }
}
