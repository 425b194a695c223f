//! Signed webhook intake.
//!
//! The body is read raw so the signature is checked over the exact bytes
//! the provider sent.

use actix_web::http::header::HeaderMap;
use actix_web::{HttpRequest, post, web};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::Error;
use crate::domain::ports::WebhookDelivery;
use crate::inbound::http::ApiResult;
use crate::inbound::http::state::HttpState;

pub const EVENT_TYPE_HEADER: &str = "X-Event-Type";
pub const EVENT_ID_HEADER: &str = "X-Event-Id";
pub const SIGNATURE_HEADER: &str = "X-Signature";

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WebhookAck {
    pub received: bool,
    pub event_id: Uuid,
    pub duplicate: bool,
}

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
}

/// Receive a provider event signed with HMAC-SHA256.
#[utoipa::path(
    post,
    path = "/api/v1/webhooks/{provider}",
    params(
        ("provider" = String, Path, description = "Provider name"),
        ("X-Event-Type" = Option<String>, Header, description = "Event type, `unknown` when absent"),
        ("X-Event-Id" = Option<String>, Header, description = "Provider event id used for deduplication"),
        ("X-Signature" = String, Header, description = "Hex HMAC-SHA256 of the raw body")
    ),
    request_body(content = Object, content_type = "application/json"),
    responses(
        (status = 200, description = "Event acknowledged", body = WebhookAck),
        (status = 400, description = "Body is not JSON", body = Error),
        (status = 401, description = "Missing or invalid signature", body = Error),
        (status = 404, description = "Unknown provider", body = Error)
    ),
    tags = ["webhooks"],
    operation_id = "receiveWebhook",
    security([])
)]
#[post("/webhooks/{provider}")]
pub async fn receive_webhook(
    request: HttpRequest,
    state: web::Data<HttpState>,
    path: web::Path<String>,
    body: web::Bytes,
) -> ApiResult<web::Json<WebhookAck>> {
    let headers = request.headers();
    let delivery = WebhookDelivery {
        provider: path.into_inner(),
        event_type: header(headers, EVENT_TYPE_HEADER),
        event_id: header(headers, EVENT_ID_HEADER),
        signature: header(headers, SIGNATURE_HEADER),
        body: body.to_vec(),
    };
    let receipt = state.webhooks.receive(delivery).await?;
    Ok(web::Json(WebhookAck {
        received: true,
        event_id: receipt.event_id,
        duplicate: receipt.duplicate,
    }))
}
