//! PostgreSQL-backed `ChatRepository`.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::ports::{ChatRepository, ChatRepositoryError};
use crate::domain::{ChatMessage, ChatRoom, PageKey, ParticipantPair, UserId};

use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::diesel_helpers::{collect_rows, limit};
use super::models::{ChatMessageRow, ChatMessageUpdate, ChatRoomRow, NewChatMessageRow};
use super::pool::{DbPool, PoolError};
use super::schema::{chat_messages, chat_rooms};

#[derive(Clone)]
pub struct DieselChatRepository {
    pool: DbPool,
}

impl DieselChatRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> ChatRepositoryError {
    map_basic_pool_error(error, |message| ChatRepositoryError::connection(message))
}

fn map_diesel_error(error: diesel::result::Error) -> ChatRepositoryError {
    map_basic_diesel_error(
        error,
        ChatRepositoryError::query,
        ChatRepositoryError::connection,
    )
}

fn row_to_room(row: ChatRoomRow) -> Result<ChatRoom, String> {
    let participants = ParticipantPair::new(
        UserId::from_uuid(row.first_participant),
        UserId::from_uuid(row.second_participant),
    )
    .map_err(|err| format!("stored chat room {}: {err}", row.id))?;
    Ok(ChatRoom {
        id: row.id,
        participants,
        created_at: row.created_at,
    })
}

fn row_to_message(row: ChatMessageRow) -> ChatMessage {
    ChatMessage {
        id: row.id,
        room_id: row.room_id,
        sender_id: UserId::from_uuid(row.sender_id),
        content: row.content,
        edited_at: row.edited_at,
        deleted: row.deleted,
        created_at: row.created_at,
    }
}

impl DieselChatRepository {
    async fn room_where_pair(
        &self,
        pair: &ParticipantPair,
    ) -> Result<Option<ChatRoom>, ChatRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<ChatRoomRow> = chat_rooms::table
            .filter(chat_rooms::first_participant.eq(*pair.first_user().as_uuid()))
            .filter(chat_rooms::second_participant.eq(*pair.second_user().as_uuid()))
            .select(ChatRoomRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(row_to_room)
            .transpose()
            .map_err(ChatRepositoryError::query)
    }
}

#[async_trait]
impl ChatRepository for DieselChatRepository {
    async fn open_room(&self, room: &ChatRoom) -> Result<ChatRoom, ChatRepositoryError> {
        {
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;
            let row = ChatRoomRow {
                id: room.id,
                first_participant: *room.participants.first_user().as_uuid(),
                second_participant: *room.participants.second_user().as_uuid(),
                created_at: room.created_at,
            };
            diesel::insert_into(chat_rooms::table)
                .values(&row)
                .on_conflict((
                    chat_rooms::first_participant,
                    chat_rooms::second_participant,
                ))
                .do_nothing()
                .execute(&mut conn)
                .await
                .map_err(map_diesel_error)?;
        }
        self.room_where_pair(&room.participants)
            .await?
            .ok_or_else(|| ChatRepositoryError::query("chat room vanished after insert"))
    }

    async fn find_room(&self, room_id: &Uuid) -> Result<Option<ChatRoom>, ChatRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<ChatRoomRow> = chat_rooms::table
            .filter(chat_rooms::id.eq(room_id))
            .select(ChatRoomRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(row_to_room)
            .transpose()
            .map_err(ChatRepositoryError::query)
    }

    async fn find_room_for_pair(
        &self,
        pair: &ParticipantPair,
    ) -> Result<Option<ChatRoom>, ChatRepositoryError> {
        self.room_where_pair(pair).await
    }

    async fn rooms_for(&self, user_id: &UserId) -> Result<Vec<ChatRoom>, ChatRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let user = *user_id.as_uuid();
        let rows: Vec<ChatRoomRow> = chat_rooms::table
            .filter(
                chat_rooms::first_participant
                    .eq(user)
                    .or(chat_rooms::second_participant.eq(user)),
            )
            .select(ChatRoomRow::as_select())
            .order_by((chat_rooms::created_at.desc(), chat_rooms::id.desc()))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        collect_rows(rows.into_iter().map(row_to_room), ChatRepositoryError::query)
    }

    async fn insert_message(&self, message: &ChatMessage) -> Result<(), ChatRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = NewChatMessageRow {
            id: message.id,
            room_id: message.room_id,
            sender_id: *message.sender_id.as_uuid(),
            content: &message.content,
            edited_at: message.edited_at,
            deleted: message.deleted,
            created_at: message.created_at,
        };
        diesel::insert_into(chat_messages::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn find_message(
        &self,
        message_id: &Uuid,
    ) -> Result<Option<ChatMessage>, ChatRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<ChatMessageRow> = chat_messages::table
            .filter(chat_messages::id.eq(message_id))
            .select(ChatMessageRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        Ok(row.map(row_to_message))
    }

    async fn update_message(&self, message: &ChatMessage) -> Result<(), ChatRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let changes = ChatMessageUpdate {
            content: &message.content,
            edited_at: message.edited_at,
            deleted: message.deleted,
        };
        diesel::update(chat_messages::table.filter(chat_messages::id.eq(message.id)))
            .set(&changes)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn messages(
        &self,
        room_id: &Uuid,
        before: Option<PageKey>,
        page_size: usize,
    ) -> Result<Vec<ChatMessage>, ChatRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let mut query = chat_messages::table
            .filter(chat_messages::room_id.eq(room_id))
            .select(ChatMessageRow::as_select())
            .order_by((chat_messages::created_at.desc(), chat_messages::id.desc()))
            .limit(limit(page_size))
            .into_boxed();
        if let Some(key) = before {
            query = query.filter(
                chat_messages::created_at.lt(key.created_at).or(chat_messages::created_at
                    .eq(key.created_at)
                    .and(chat_messages::id.lt(key.id))),
            );
        }
        let rows: Vec<ChatMessageRow> = query.load(&mut conn).await.map_err(map_diesel_error)?;
        Ok(rows.into_iter().map(row_to_message).collect())
    }
}
