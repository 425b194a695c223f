//! WebSocket inbound adapter for realtime chat.
//!
//! Responsibilities:
//! - validate upgrade requests (origin allow-list, then bearer token)
//! - confirm the caller participates in the requested room
//! - hand the upgraded socket to a per-connection session task

use actix_web::web::{self, Payload};
use actix_web::{HttpRequest, HttpResponse, get, http::header::ORIGIN};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info};

use crate::domain::{Actor, BearerToken, Error};
use crate::inbound::http::auth::bearer_token;
use crate::inbound::http::validation::{FieldName, parse_uuid};

mod session;

pub mod hub;
pub mod messages;
pub mod origin;
pub mod state;

pub use hub::ChatHub;
pub use origin::OriginPolicy;
pub use state::WsState;

/// Browsers cannot set headers on upgrade requests, so the token may ride
/// in the query string instead.
#[derive(Debug, Default, Deserialize)]
pub struct TokenQuery {
    pub token: Option<String>,
}

fn presented_token(req: &HttpRequest, query: &TokenQuery) -> Result<BearerToken, Error> {
    match query.token.as_deref().map(str::trim) {
        Some(token) if !token.is_empty() => Ok(BearerToken::from_presented(token)),
        _ => bearer_token(req.headers()),
    }
}

/// Handle the upgrade for `/ws/chat/{room_id}`.
#[get("/ws/chat/{room_id}")]
pub async fn ws_entry(
    state: web::Data<WsState>,
    req: HttpRequest,
    path: web::Path<String>,
    query: web::Query<TokenQuery>,
    stream: Payload,
) -> actix_web::Result<HttpResponse> {
    let mut origin_iter = req.headers().get_all(ORIGIN);
    let origin_header = origin_iter.next().ok_or_else(|| {
        error!("Missing Origin header on WebSocket upgrade");
        actix_web::error::ErrorForbidden("Origin not allowed")
    })?;
    if origin_iter.next().is_some() {
        error!("Multiple Origin headers on WebSocket upgrade");
        return Err(actix_web::error::ErrorBadRequest("Invalid Origin header"));
    }
    state.origins.validate(origin_header)?;

    let room_id = parse_uuid(path.into_inner(), FieldName::new("room_id"))?;
    let token = presented_token(&req, &query)?;
    let user = state.accounts.authenticate(&token).await?;
    let actor = Actor::of(&user);
    state.chat.room(&actor, &room_id).await?;

    let (response, session, stream) = actix_ws::handle(&req, stream).map_err(|error| {
        error!(error = %error, "WebSocket upgrade failed");
        actix_web::error::ErrorInternalServerError("WebSocket upgrade failed")
    })?;

    info!(%room_id, user_id = %actor.user_id, "chat socket connected");
    let events = state.hub.subscribe(room_id);
    let membership = session::RoomMembership {
        actor,
        room_id,
        chat: Arc::clone(&state.chat),
        hub: Arc::clone(&state.hub),
    };
    actix_web::rt::spawn(session::handle_ws_session(
        membership, events, session, stream,
    ));
    Ok(response)
}
