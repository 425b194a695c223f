//! Chat room and message handlers.
//!
//! ```text
//! POST   /api/v1/chat/rooms {"participantId":"..."}
//! GET    /api/v1/chat/rooms
//! GET    /api/v1/chat/rooms/{id}/messages?cursor&limit
//! POST   /api/v1/chat/rooms/{id}/messages {"content":"..."}
//! PATCH  /api/v1/chat/messages/{id} {"content":"..."}
//! DELETE /api/v1/chat/messages/{id}
//! ```
//!
//! Writes publish to the room's live connections through the chat service.

use actix_web::{HttpRequest, HttpResponse, delete, get, patch, post, web};
use pagination::PageParams;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::Error;
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::Authenticated;
use crate::inbound::http::paging::{PageBody, decode_page_key, page_body};
use crate::inbound::http::schemas::{ChatMessageBody, ChatRoomBody};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_user_id, parse_uuid};

#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OpenRoomRequest {
    pub participant_id: String,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MessageRequest {
    #[schema(example = "See you at ten!")]
    pub content: String,
}

/// Cursor and page size for message listings.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MessagePageQuery {
    /// Opaque cursor from a previous page.
    pub cursor: Option<String>,
    /// Page size, default 50, maximum 100.
    pub limit: Option<usize>,
}

impl From<MessagePageQuery> for PageParams {
    fn from(query: MessagePageQuery) -> Self {
        Self {
            cursor: query.cursor,
            limit: query.limit,
        }
    }
}

/// Return the caller's room with another user, creating it if needed.
#[utoipa::path(
    post,
    path = "/api/v1/chat/rooms",
    request_body = OpenRoomRequest,
    responses(
        (status = 200, description = "Room for the pair", body = ChatRoomBody),
        (status = 400, description = "Self chat or malformed id", body = Error),
        (status = 404, description = "Unknown participant", body = Error)
    ),
    tags = ["chat"],
    operation_id = "openChatRoom"
)]
#[post("/chat/rooms")]
pub async fn open_room(
    state: web::Data<HttpState>,
    caller: Authenticated,
    payload: web::Json<OpenRoomRequest>,
) -> ApiResult<web::Json<ChatRoomBody>> {
    let participant =
        parse_user_id(payload.into_inner().participant_id, FieldName::new("participantId"))?;
    let room = state.chat.open_room(&caller.actor, &participant).await?;
    Ok(web::Json(ChatRoomBody::from(&room)))
}

#[utoipa::path(
    get,
    path = "/api/v1/chat/rooms",
    responses((status = 200, description = "Caller's rooms", body = [ChatRoomBody])),
    tags = ["chat"],
    operation_id = "listChatRooms"
)]
#[get("/chat/rooms")]
pub async fn list_rooms(
    state: web::Data<HttpState>,
    caller: Authenticated,
) -> ApiResult<web::Json<Vec<ChatRoomBody>>> {
    let rooms = state.chat.rooms(&caller.actor).await?;
    Ok(web::Json(rooms.iter().map(ChatRoomBody::from).collect()))
}

/// Messages in a room, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/chat/rooms/{id}/messages",
    params(("id" = String, Path, description = "Room identifier"), MessagePageQuery),
    responses(
        (status = 200, description = "Page of messages", body = PageBody<ChatMessageBody>),
        (status = 400, description = "Malformed cursor", body = Error),
        (status = 404, description = "Unknown room or not a participant", body = Error)
    ),
    tags = ["chat"],
    operation_id = "listChatMessages"
)]
#[get("/chat/rooms/{id}/messages")]
pub async fn list_messages(
    request: HttpRequest,
    state: web::Data<HttpState>,
    caller: Authenticated,
    path: web::Path<String>,
    query: web::Query<MessagePageQuery>,
) -> ApiResult<web::Json<PageBody<ChatMessageBody>>> {
    let room_id = parse_uuid(path.into_inner(), FieldName::new("id"))?;
    let params = PageParams::from(query.into_inner());
    let before = decode_page_key(&params)?;
    let page = state
        .chat
        .messages(&caller.actor, &room_id, before, params.limit())
        .await?;
    let body = page_body(&request, page.map(|message| ChatMessageBody::from(&message)))?;
    Ok(web::Json(body))
}

#[utoipa::path(
    post,
    path = "/api/v1/chat/rooms/{id}/messages",
    params(("id" = String, Path, description = "Room identifier")),
    request_body = MessageRequest,
    responses(
        (status = 201, description = "Message posted", body = ChatMessageBody),
        (status = 400, description = "Empty or too long", body = Error),
        (status = 404, description = "Unknown room or not a participant", body = Error)
    ),
    tags = ["chat"],
    operation_id = "postChatMessage"
)]
#[post("/chat/rooms/{id}/messages")]
pub async fn post_message(
    state: web::Data<HttpState>,
    caller: Authenticated,
    path: web::Path<String>,
    payload: web::Json<MessageRequest>,
) -> ApiResult<HttpResponse> {
    let room_id = parse_uuid(path.into_inner(), FieldName::new("id"))?;
    let message = state
        .chat
        .post(&caller.actor, &room_id, &payload.content)
        .await?;
    Ok(HttpResponse::Created().json(ChatMessageBody::from(&message)))
}

#[utoipa::path(
    patch,
    path = "/api/v1/chat/messages/{id}",
    params(("id" = String, Path, description = "Message identifier")),
    request_body = MessageRequest,
    responses(
        (status = 200, description = "Message edited", body = ChatMessageBody),
        (status = 403, description = "Not the sender", body = Error),
        (status = 409, description = "Message was deleted", body = Error)
    ),
    tags = ["chat"],
    operation_id = "editChatMessage"
)]
#[patch("/chat/messages/{id}")]
pub async fn edit_message(
    state: web::Data<HttpState>,
    caller: Authenticated,
    path: web::Path<String>,
    payload: web::Json<MessageRequest>,
) -> ApiResult<web::Json<ChatMessageBody>> {
    let message_id = parse_uuid(path.into_inner(), FieldName::new("id"))?;
    let message = state
        .chat
        .edit(&caller.actor, &message_id, &payload.content)
        .await?;
    Ok(web::Json(ChatMessageBody::from(&message)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/chat/messages/{id}",
    params(("id" = String, Path, description = "Message identifier")),
    responses(
        (status = 200, description = "Message soft-deleted", body = ChatMessageBody),
        (status = 403, description = "Not the sender", body = Error)
    ),
    tags = ["chat"],
    operation_id = "deleteChatMessage"
)]
#[delete("/chat/messages/{id}")]
pub async fn delete_message(
    state: web::Data<HttpState>,
    caller: Authenticated,
    path: web::Path<String>,
) -> ApiResult<web::Json<ChatMessageBody>> {
    let message_id = parse_uuid(path.into_inner(), FieldName::new("id"))?;
    let message = state.chat.delete(&caller.actor, &message_id).await?;
    Ok(web::Json(ChatMessageBody::from(&message)))
}

#[cfg(test)]
#[path = "chat_tests.rs"]
mod tests;
