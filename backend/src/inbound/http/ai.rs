//! AI assistance handlers.
//!
//! Provider failures still answer 200; the body carries `response: null`
//! and the recorded `error`.

use actix_web::{get, post, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::{AiKind, AiResponse, Error};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::Authenticated;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_uuid};

#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationsRequest {
    #[schema(example = "Prepare for a systems programming interview")]
    pub goals: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AskRequest {
    pub question: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AiResponseBody {
    pub id: Uuid,
    pub kind: AiKind,
    pub model: String,
    pub prompt: String,
    pub response: Option<String>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<AiResponse> for AiResponseBody {
    fn from(value: AiResponse) -> Self {
        Self {
            id: value.id,
            kind: value.kind,
            model: value.model,
            prompt: value.prompt,
            response: value.response,
            error: value.error,
            created_at: value.created_at,
        }
    }
}

/// Summarise a completed session for one of its participants.
#[utoipa::path(
    post,
    path = "/api/v1/ai/bookings/{id}/summary",
    params(("id" = String, Path, description = "Booking identifier")),
    responses(
        (status = 200, description = "Summary or recorded failure", body = AiResponseBody),
        (status = 400, description = "Booking is not completed", body = Error),
        (status = 404, description = "Unknown or not visible", body = Error)
    ),
    tags = ["ai"],
    operation_id = "sessionSummary"
)]
#[post("/ai/bookings/{id}/summary")]
pub async fn session_summary(
    state: web::Data<HttpState>,
    caller: Authenticated,
    path: web::Path<String>,
) -> ApiResult<web::Json<AiResponseBody>> {
    let booking_id = parse_uuid(path.into_inner(), FieldName::new("id"))?;
    let response = state.ai.session_summary(&caller.actor, &booking_id).await?;
    Ok(web::Json(response.into()))
}

/// Mentor recommendations for a learner.
#[utoipa::path(
    post,
    path = "/api/v1/ai/recommendations",
    request_body(content = RecommendationsRequest, content_type = "application/json"),
    responses(
        (status = 200, description = "Recommendations or recorded failure", body = AiResponseBody),
        (status = 403, description = "Learners only", body = Error)
    ),
    tags = ["ai"],
    operation_id = "recommendations"
)]
#[post("/ai/recommendations")]
pub async fn recommendations(
    state: web::Data<HttpState>,
    caller: Authenticated,
    payload: Option<web::Json<RecommendationsRequest>>,
) -> ApiResult<web::Json<AiResponseBody>> {
    let goals = payload.and_then(|body| body.into_inner().goals);
    let response = state.ai.recommendations(&caller.actor, goals).await?;
    Ok(web::Json(response.into()))
}

#[utoipa::path(
    post,
    path = "/api/v1/ai/ask",
    request_body = AskRequest,
    responses(
        (status = 200, description = "Answer or recorded failure", body = AiResponseBody),
        (status = 400, description = "Empty or too long", body = Error)
    ),
    tags = ["ai"],
    operation_id = "ask"
)]
#[post("/ai/ask")]
pub async fn ask(
    state: web::Data<HttpState>,
    caller: Authenticated,
    payload: web::Json<AskRequest>,
) -> ApiResult<web::Json<AiResponseBody>> {
    let response = state.ai.ask(&caller.actor, &payload.question).await?;
    Ok(web::Json(response.into()))
}

#[utoipa::path(
    get,
    path = "/api/v1/ai/responses",
    responses((status = 200, description = "Caller's AI log, newest first", body = [AiResponseBody])),
    tags = ["ai"],
    operation_id = "aiResponses"
)]
#[get("/ai/responses")]
pub async fn history(
    state: web::Data<HttpState>,
    caller: Authenticated,
) -> ApiResult<web::Json<Vec<AiResponseBody>>> {
    let responses = state.ai.history(&caller.actor).await?;
    Ok(web::Json(
        responses.into_iter().map(AiResponseBody::from).collect(),
    ))
}
