//! Chat rooms and messages.
//!
//! Rooms are visible only to their two participants; any other caller is
//! told the room does not exist. Changes are announced through the
//! [`ChatEventPublisher`] after they are stored.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use pagination::Paginated;
use uuid::Uuid;

use crate::domain::ports::{ChatEventPublisher, ChatRepository, ChatService, UserRepository};
use crate::domain::{
    Actor, ChatEvent, ChatMessage, ChatRoom, Error, MessageContent, PageKey, ParticipantPair,
    UserId,
};

#[derive(Clone)]
pub struct ChatRooms {
    chats: Arc<dyn ChatRepository>,
    users: Arc<dyn UserRepository>,
    publisher: Arc<dyn ChatEventPublisher>,
    clock: Arc<dyn Clock>,
}

impl ChatRooms {
    pub fn new(
        chats: Arc<dyn ChatRepository>,
        users: Arc<dyn UserRepository>,
        publisher: Arc<dyn ChatEventPublisher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            chats,
            users,
            publisher,
            clock,
        }
    }

    async fn joined_room(&self, actor: &Actor, room_id: &Uuid) -> Result<ChatRoom, Error> {
        self.chats
            .find_room(room_id)
            .await?
            .filter(|room| room.participants.contains(actor.user_id))
            .ok_or_else(|| Error::not_found(format!("chat room {room_id} not found")))
    }

    /// Load a message the actor sent, in a room they still belong to.
    async fn own_message(&self, actor: &Actor, message_id: &Uuid) -> Result<ChatMessage, Error> {
        let missing = || Error::not_found(format!("message {message_id} not found"));
        let message = self
            .chats
            .find_message(message_id)
            .await?
            .ok_or_else(missing)?;
        self.joined_room(actor, &message.room_id)
            .await
            .map_err(|_| missing())?;
        if message.sender_id != actor.user_id {
            return Err(Error::forbidden("only the sender may change a message"));
        }
        Ok(message)
    }
}

fn content(raw: &str) -> Result<MessageContent, Error> {
    MessageContent::new(raw).map_err(|err| Error::invalid_request(err.to_string()))
}

#[async_trait]
impl ChatService for ChatRooms {
    async fn open_room(&self, actor: &Actor, participant_id: &UserId) -> Result<ChatRoom, Error> {
        let pair = ParticipantPair::new(actor.user_id, *participant_id)
            .map_err(|err| Error::invalid_request(err.to_string()))?;
        if self.users.find_by_id(participant_id).await?.is_none() {
            return Err(Error::not_found(format!("user {participant_id} not found")));
        }
        if let Some(room) = self.chats.find_room_for_pair(&pair).await? {
            return Ok(room);
        }
        let room = ChatRoom {
            id: Uuid::new_v4(),
            participants: pair,
            created_at: self.clock.utc(),
        };
        Ok(self.chats.open_room(&room).await?)
    }

    async fn rooms(&self, actor: &Actor) -> Result<Vec<ChatRoom>, Error> {
        Ok(self.chats.rooms_for(&actor.user_id).await?)
    }

    async fn room(&self, actor: &Actor, room_id: &Uuid) -> Result<ChatRoom, Error> {
        self.joined_room(actor, room_id).await
    }

    async fn messages(
        &self,
        actor: &Actor,
        room_id: &Uuid,
        before: Option<PageKey>,
        limit: usize,
    ) -> Result<Paginated<ChatMessage>, Error> {
        self.joined_room(actor, room_id).await?;
        let items = self
            .chats
            .messages(room_id, before, limit.saturating_add(1))
            .await?
            .into_iter()
            .map(ChatMessage::redacted)
            .collect();
        Paginated::from_overfetched(items, limit, |m| PageKey::new(m.created_at, m.id))
            .map_err(|err| Error::internal(format!("failed to encode cursor: {err}")))
    }

    async fn post(&self, actor: &Actor, room_id: &Uuid, raw: &str) -> Result<ChatMessage, Error> {
        let body = content(raw)?;
        self.joined_room(actor, room_id).await?;
        let message = ChatMessage {
            id: Uuid::new_v4(),
            room_id: *room_id,
            sender_id: actor.user_id,
            content: body.into_inner(),
            edited_at: None,
            deleted: false,
            created_at: self.clock.utc(),
        };
        self.chats.insert_message(&message).await?;
        self.publisher
            .publish(message.room_id, ChatEvent::MessagePosted(message.clone()));
        Ok(message)
    }

    async fn edit(&self, actor: &Actor, message_id: &Uuid, raw: &str) -> Result<ChatMessage, Error> {
        let body = content(raw)?;
        let mut message = self.own_message(actor, message_id).await?;
        if message.deleted {
            return Err(Error::conflict("cannot edit a deleted message"));
        }
        message.content = body.into_inner();
        message.edited_at = Some(self.clock.utc());
        self.chats.update_message(&message).await?;
        self.publisher
            .publish(message.room_id, ChatEvent::MessageEdited(message.clone()));
        Ok(message)
    }

    async fn delete(&self, actor: &Actor, message_id: &Uuid) -> Result<ChatMessage, Error> {
        let mut message = self.own_message(actor, message_id).await?;
        if message.deleted {
            return Ok(message.redacted());
        }
        message.deleted = true;
        message.content.clear();
        self.chats.update_message(&message).await?;
        self.publisher.publish(
            message.room_id,
            ChatEvent::MessageDeleted {
                message_id: message.id,
                room_id: message.room_id,
            },
        );
        Ok(message)
    }

    async fn typing(&self, actor: &Actor, room_id: &Uuid, is_typing: bool) -> Result<(), Error> {
        self.joined_room(actor, room_id).await?;
        self.publisher.publish(
            *room_id,
            ChatEvent::Typing {
                user_id: actor.user_id,
                is_typing,
            },
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::ports::{MockChatEventPublisher, MockChatRepository, MockUserRepository};
    use crate::domain::{ErrorCode, Role};
    use crate::test_support::MutableClock;
    use chrono::{TimeZone, Utc};
    use rstest::rstest;

    fn actor() -> Actor {
        Actor {
            user_id: UserId::random(),
            role: Role::Learner,
        }
    }

    fn rooms(
        chats: MockChatRepository,
        users: MockUserRepository,
        publisher: MockChatEventPublisher,
    ) -> ChatRooms {
        ChatRooms::new(
            Arc::new(chats),
            Arc::new(users),
            Arc::new(publisher),
            Arc::new(MutableClock::at(2030, 1, 7, 9)),
        )
    }

    fn room_of(a: UserId, b: UserId) -> ChatRoom {
        ChatRoom {
            id: Uuid::new_v4(),
            participants: ParticipantPair::new(a, b).expect("pair"),
            created_at: Utc::now(),
        }
    }

    fn message(room: &ChatRoom, sender: UserId, minute: u32) -> ChatMessage {
        ChatMessage {
            id: Uuid::new_v4(),
            room_id: room.id,
            sender_id: sender,
            content: format!("message {minute}"),
            edited_at: None,
            deleted: false,
            created_at: Utc
                .with_ymd_and_hms(2030, 1, 7, 9, minute, 0)
                .single()
                .expect("instant"),
        }
    }

    fn stored_room(chats: &mut MockChatRepository, room: &ChatRoom) {
        let found = room.clone();
        chats
            .expect_find_room()
            .returning(move |_| Ok(Some(found.clone())));
    }

    #[rstest]
    #[tokio::test]
    async fn chatting_with_yourself_is_invalid() {
        let me = actor();
        let err = rooms(
            MockChatRepository::new(),
            MockUserRepository::new(),
            MockChatEventPublisher::new(),
        )
        .open_room(&me, &me.user_id)
        .await
        .expect_err("self chat");
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
    }

    #[rstest]
    #[tokio::test]
    async fn existing_rooms_are_reused() {
        let me = actor();
        let other = UserId::random();
        let existing = room_of(me.user_id, other);
        let expected = existing.id;
        let mut users = MockUserRepository::new();
        users.expect_find_by_id().return_once(move |id| {
            Ok(Some(crate::domain::User {
                id: *id,
                email: crate::domain::Email::new("o@example.com").expect("email"),
                display_name: crate::domain::DisplayName::new("Other").expect("name"),
                role: Role::Mentor,
                bio: String::new(),
                timezone: crate::domain::Timezone::utc(),
                hourly_rate_cents: None,
                is_mentor_approved: true,
                created_at: Utc::now(),
            }))
        });
        let mut chats = MockChatRepository::new();
        chats
            .expect_find_room_for_pair()
            .return_once(move |_| Ok(Some(existing)));
        chats.expect_open_room().never();

        let room = rooms(chats, users, MockChatEventPublisher::new())
            .open_room(&me, &other)
            .await
            .expect("room");
        assert_eq!(room.id, expected);
    }

    #[rstest]
    #[tokio::test]
    async fn outsiders_cannot_read_rooms() {
        let room = room_of(UserId::random(), UserId::random());
        let mut chats = MockChatRepository::new();
        stored_room(&mut chats, &room);
        chats.expect_messages().never();

        let err = rooms(chats, MockUserRepository::new(), MockChatEventPublisher::new())
            .messages(&actor(), &room.id, None, 10)
            .await
            .expect_err("outsider");
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[rstest]
    #[tokio::test]
    async fn history_pages_redact_deleted_messages() {
        let me = actor();
        let room = room_of(me.user_id, UserId::random());
        let mut deleted = message(&room, me.user_id, 3);
        deleted.deleted = true;
        let page = vec![deleted, message(&room, me.user_id, 2), message(&room, me.user_id, 1)];
        let mut chats = MockChatRepository::new();
        stored_room(&mut chats, &room);
        chats
            .expect_messages()
            .withf(|_, before, limit| before.is_none() && *limit == 3)
            .return_once(move |_, _, _| Ok(page));

        let listed = rooms(chats, MockUserRepository::new(), MockChatEventPublisher::new())
            .messages(&me, &room.id, None, 2)
            .await
            .expect("messages");

        assert_eq!(listed.data.len(), 2);
        assert!(listed.data[0].deleted && listed.data[0].content.is_empty());
        assert!(listed.next_cursor.is_some());
    }

    #[rstest]
    #[tokio::test]
    async fn posts_are_published_to_the_room() {
        let me = actor();
        let room = room_of(me.user_id, UserId::random());
        let room_id = room.id;
        let mut chats = MockChatRepository::new();
        stored_room(&mut chats, &room);
        chats.expect_insert_message().times(1).returning(|_| Ok(()));
        let mut publisher = MockChatEventPublisher::new();
        publisher
            .expect_publish()
            .withf(move |id, event| {
                *id == room_id
                    && matches!(event, ChatEvent::MessagePosted(m) if m.content == "hello")
            })
            .times(1)
            .return_const(());

        rooms(chats, MockUserRepository::new(), publisher)
            .post(&me, &room_id, "  hello ")
            .await
            .expect("posted");
    }

    #[rstest]
    #[tokio::test]
    async fn only_senders_edit() {
        let me = actor();
        let other = UserId::random();
        let room = room_of(me.user_id, other);
        let theirs = message(&room, other, 1);
        let id = theirs.id;
        let mut chats = MockChatRepository::new();
        stored_room(&mut chats, &room);
        chats
            .expect_find_message()
            .return_once(move |_| Ok(Some(theirs)));
        chats.expect_update_message().never();

        let err = rooms(chats, MockUserRepository::new(), MockChatEventPublisher::new())
            .edit(&me, &id, "changed")
            .await
            .expect_err("not sender");
        assert_eq!(err.code(), ErrorCode::Forbidden);
    }

    #[rstest]
    #[tokio::test]
    async fn deleted_messages_cannot_be_edited() {
        let me = actor();
        let room = room_of(me.user_id, UserId::random());
        let mut gone = message(&room, me.user_id, 1);
        gone.deleted = true;
        let id = gone.id;
        let mut chats = MockChatRepository::new();
        stored_room(&mut chats, &room);
        chats.expect_find_message().return_once(move |_| Ok(Some(gone)));

        let err = rooms(chats, MockUserRepository::new(), MockChatEventPublisher::new())
            .edit(&me, &id, "changed")
            .await
            .expect_err("deleted");
        assert_eq!(err.code(), ErrorCode::Conflict);
    }

    #[rstest]
    #[tokio::test]
    async fn deletion_blanks_content_and_announces_it() {
        let me = actor();
        let room = room_of(me.user_id, UserId::random());
        let mine = message(&room, me.user_id, 1);
        let id = mine.id;
        let mut chats = MockChatRepository::new();
        stored_room(&mut chats, &room);
        chats.expect_find_message().return_once(move |_| Ok(Some(mine)));
        chats
            .expect_update_message()
            .withf(|m| m.deleted && m.content.is_empty())
            .times(1)
            .returning(|_| Ok(()));
        let mut publisher = MockChatEventPublisher::new();
        publisher
            .expect_publish()
            .withf(move |_, event| {
                matches!(event, ChatEvent::MessageDeleted { message_id, .. } if *message_id == id)
            })
            .times(1)
            .return_const(());

        let deleted = rooms(chats, MockUserRepository::new(), publisher)
            .delete(&me, &id)
            .await
            .expect("deleted");
        assert!(deleted.deleted);
    }
}
