//! Booking request, lifecycle, calendar export and statistics handlers.
//!
//! ```text
//! POST /api/v1/bookings {"mentorId":"...","startUtc":"...","endUtc":"..."}
//! GET  /api/v1/bookings?status&from&to
//! GET  /api/v1/bookings/calendar.ics
//! GET  /api/v1/bookings/stats
//! GET  /api/v1/bookings/{id}
//! POST /api/v1/bookings/{id}/{confirm|decline|cancel|complete|feedback}
//! GET  /api/v1/bookings/{id}/calendar.ics
//! ```
//!
//! The literal `calendar.ics` and `stats` routes must be registered before
//! `/bookings/{id}` so they are not captured as identifiers.

use std::collections::BTreeMap;

use actix_web::http::header::CONTENT_TYPE;
use actix_web::{HttpResponse, get, post, web};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::domain::ports::{BookingQuery, BookingRequest};
use crate::domain::{BookingStatus, Error};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::Authenticated;
use crate::inbound::http::cache_control::private_no_cache_header;
use crate::inbound::http::schemas::BookingBody;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, invalid_value_error, parse_optional_rfc3339_timestamp, parse_rfc3339_timestamp,
    parse_user_id, parse_uuid,
};

const CALENDAR_CONTENT_TYPE: &str = "text/calendar; charset=utf-8";

#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    pub mentor_id: String,
    #[schema(example = "2030-01-07T10:00:00Z")]
    pub start_utc: String,
    #[schema(example = "2030-01-07T11:00:00Z")]
    pub end_utc: String,
    pub notes: Option<String>,
    pub slot_id: Option<String>,
}

impl TryFrom<CreateBookingRequest> for BookingRequest {
    type Error = Error;

    fn try_from(value: CreateBookingRequest) -> Result<Self, Self::Error> {
        let start_utc = parse_rfc3339_timestamp(value.start_utc, FieldName::new("startUtc"))?;
        let end_raw = value.end_utc.clone();
        let end_utc = parse_rfc3339_timestamp(value.end_utc, FieldName::new("endUtc"))?;
        if end_utc <= start_utc {
            return Err(invalid_value_error(
                FieldName::new("endUtc"),
                &end_raw,
                "endUtc must be after startUtc",
            ));
        }
        Ok(Self {
            mentor_id: parse_user_id(value.mentor_id, FieldName::new("mentorId"))?,
            start_utc,
            end_utc,
            notes: value.notes,
            slot_id: value
                .slot_id
                .map(|raw| parse_uuid(raw, FieldName::new("slotId")))
                .transpose()?,
        })
    }
}

/// Filters for `GET /api/v1/bookings`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BookingListQuery {
    /// `pending`, `confirmed`, `declined`, `cancelled` or `completed`.
    pub status: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}

impl TryFrom<BookingListQuery> for BookingQuery {
    type Error = Error;

    fn try_from(value: BookingListQuery) -> Result<Self, Self::Error> {
        let status = value
            .status
            .map(|raw| {
                raw.parse::<BookingStatus>().map_err(|err| {
                    invalid_value_error(FieldName::new("status"), &raw, &err.to_string())
                })
            })
            .transpose()?;
        Ok(Self {
            status,
            from: parse_optional_rfc3339_timestamp(value.from, FieldName::new("from"))?,
            to: parse_optional_rfc3339_timestamp(value.to, FieldName::new("to"))?,
        })
    }
}

/// Optional free-text reason for declining or cancelling.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReasonRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompleteRequest {
    pub session_notes: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRequest {
    #[schema(minimum = 1, maximum = 5)]
    pub rating: i16,
    pub comment: Option<String>,
}

/// Decode a body that may be omitted. An empty body yields the default; a
/// malformed one is rejected like any other JSON body.
fn optional_body<T: DeserializeOwned + Default>(body: &web::Bytes) -> Result<T, Error> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|err| {
        debug!(error = %err, "rejected request body");
        Error::invalid_request(format!("invalid request body: {err}"))
    })
}

fn booking_id(path: web::Path<String>) -> Result<Uuid, Error> {
    parse_uuid(path.into_inner(), FieldName::new("id"))
}

fn calendar_response(body: String) -> HttpResponse {
    HttpResponse::Ok()
        .insert_header(private_no_cache_header())
        .insert_header((CONTENT_TYPE, CALENDAR_CONTENT_TYPE))
        .body(body)
}

/// Request a session with a mentor (learners only).
#[utoipa::path(
    post,
    path = "/api/v1/bookings",
    request_body = CreateBookingRequest,
    responses(
        (status = 201, description = "Booking requested", body = BookingBody),
        (status = 400, description = "Invalid times, notice or slot", body = Error),
        (status = 403, description = "Learners only", body = Error),
        (status = 404, description = "Mentor not found", body = Error),
        (status = 409, description = "Overlaps an active booking", body = Error)
    ),
    tags = ["bookings"],
    operation_id = "createBooking"
)]
#[post("/bookings")]
pub async fn create_booking(
    state: web::Data<HttpState>,
    caller: Authenticated,
    payload: web::Json<CreateBookingRequest>,
) -> ApiResult<HttpResponse> {
    let request = BookingRequest::try_from(payload.into_inner())?;
    let booking = state.bookings.create(&caller.actor, request).await?;
    Ok(HttpResponse::Created().json(BookingBody::from(&booking)))
}

/// Bookings visible to the caller, newest request first.
#[utoipa::path(
    get,
    path = "/api/v1/bookings",
    params(BookingListQuery),
    responses(
        (status = 200, description = "Bookings", body = [BookingBody]),
        (status = 400, description = "Invalid filter", body = Error)
    ),
    tags = ["bookings"],
    operation_id = "listBookings"
)]
#[get("/bookings")]
pub async fn list_bookings(
    state: web::Data<HttpState>,
    caller: Authenticated,
    query: web::Query<BookingListQuery>,
) -> ApiResult<web::Json<Vec<BookingBody>>> {
    let query = BookingQuery::try_from(query.into_inner())?;
    let bookings = state.bookings.list(&caller.actor, query).await?;
    Ok(web::Json(bookings.iter().map(BookingBody::from).collect()))
}

/// Confirmed and completed bookings as an iCalendar feed.
#[utoipa::path(
    get,
    path = "/api/v1/bookings/calendar.ics",
    responses((status = 200, description = "iCalendar feed", content_type = "text/calendar", body = String)),
    tags = ["bookings"],
    operation_id = "bookingsCalendar"
)]
#[get("/bookings/calendar.ics")]
pub async fn calendar(
    state: web::Data<HttpState>,
    caller: Authenticated,
) -> ApiResult<HttpResponse> {
    let body = state.bookings.calendar(&caller.actor).await?;
    Ok(calendar_response(body))
}

/// Booking counts keyed by status for the caller's scope.
#[utoipa::path(
    get,
    path = "/api/v1/bookings/stats",
    responses((status = 200, description = "Counts by status", body = BTreeMap<String, u64>)),
    tags = ["bookings"],
    operation_id = "bookingStats"
)]
#[get("/bookings/stats")]
pub async fn stats(
    state: web::Data<HttpState>,
    caller: Authenticated,
) -> ApiResult<web::Json<BTreeMap<String, u64>>> {
    Ok(web::Json(state.bookings.stats(&caller.actor).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/bookings/{id}",
    params(("id" = String, Path, description = "Booking identifier")),
    responses(
        (status = 200, description = "Booking", body = BookingBody),
        (status = 404, description = "Unknown or not visible", body = Error)
    ),
    tags = ["bookings"],
    operation_id = "getBooking"
)]
#[get("/bookings/{id}")]
pub async fn get_booking(
    state: web::Data<HttpState>,
    caller: Authenticated,
    path: web::Path<String>,
) -> ApiResult<web::Json<BookingBody>> {
    let id = booking_id(path)?;
    let booking = state.bookings.get(&caller.actor, &id).await?;
    Ok(web::Json(BookingBody::from(&booking)))
}

#[utoipa::path(
    post,
    path = "/api/v1/bookings/{id}/confirm",
    params(("id" = String, Path, description = "Booking identifier")),
    responses(
        (status = 200, description = "Booking confirmed", body = BookingBody),
        (status = 403, description = "Not the booking's mentor", body = Error),
        (status = 409, description = "Not pending or overlaps", body = Error)
    ),
    tags = ["bookings"],
    operation_id = "confirmBooking"
)]
#[post("/bookings/{id}/confirm")]
pub async fn confirm_booking(
    state: web::Data<HttpState>,
    caller: Authenticated,
    path: web::Path<String>,
) -> ApiResult<web::Json<BookingBody>> {
    let id = booking_id(path)?;
    let booking = state.bookings.confirm(&caller.actor, &id).await?;
    Ok(web::Json(BookingBody::from(&booking)))
}

#[utoipa::path(
    post,
    path = "/api/v1/bookings/{id}/decline",
    params(("id" = String, Path, description = "Booking identifier")),
    request_body(content = ReasonRequest, content_type = "application/json"),
    responses(
        (status = 200, description = "Booking declined", body = BookingBody),
        (status = 403, description = "Not the booking's mentor", body = Error),
        (status = 409, description = "Not pending", body = Error)
    ),
    tags = ["bookings"],
    operation_id = "declineBooking"
)]
#[post("/bookings/{id}/decline")]
pub async fn decline_booking(
    state: web::Data<HttpState>,
    caller: Authenticated,
    path: web::Path<String>,
    body: web::Bytes,
) -> ApiResult<web::Json<BookingBody>> {
    let id = booking_id(path)?;
    let ReasonRequest { reason } = optional_body(&body)?;
    let booking = state.bookings.decline(&caller.actor, &id, reason).await?;
    Ok(web::Json(BookingBody::from(&booking)))
}

/// Cancel a pending or confirmed booking at least two hours ahead.
#[utoipa::path(
    post,
    path = "/api/v1/bookings/{id}/cancel",
    params(("id" = String, Path, description = "Booking identifier")),
    request_body(content = ReasonRequest, content_type = "application/json"),
    responses(
        (status = 200, description = "Booking cancelled", body = BookingBody),
        (status = 400, description = "Inside the cancellation cutoff", body = Error),
        (status = 403, description = "Not a participant", body = Error),
        (status = 409, description = "Not cancellable", body = Error)
    ),
    tags = ["bookings"],
    operation_id = "cancelBooking"
)]
#[post("/bookings/{id}/cancel")]
pub async fn cancel_booking(
    state: web::Data<HttpState>,
    caller: Authenticated,
    path: web::Path<String>,
    body: web::Bytes,
) -> ApiResult<web::Json<BookingBody>> {
    let id = booking_id(path)?;
    let ReasonRequest { reason } = optional_body(&body)?;
    let booking = state.bookings.cancel(&caller.actor, &id, reason).await?;
    Ok(web::Json(BookingBody::from(&booking)))
}

#[utoipa::path(
    post,
    path = "/api/v1/bookings/{id}/complete",
    params(("id" = String, Path, description = "Booking identifier")),
    request_body(content = CompleteRequest, content_type = "application/json"),
    responses(
        (status = 200, description = "Booking completed", body = BookingBody),
        (status = 400, description = "Session has not ended", body = Error),
        (status = 403, description = "Not the booking's mentor", body = Error),
        (status = 409, description = "Not confirmed", body = Error)
    ),
    tags = ["bookings"],
    operation_id = "completeBooking"
)]
#[post("/bookings/{id}/complete")]
pub async fn complete_booking(
    state: web::Data<HttpState>,
    caller: Authenticated,
    path: web::Path<String>,
    body: web::Bytes,
) -> ApiResult<web::Json<BookingBody>> {
    let id = booking_id(path)?;
    let CompleteRequest {
        session_notes: notes,
    } = optional_body(&body)?;
    let booking = state.bookings.complete(&caller.actor, &id, notes).await?;
    Ok(web::Json(BookingBody::from(&booking)))
}

#[utoipa::path(
    post,
    path = "/api/v1/bookings/{id}/feedback",
    params(("id" = String, Path, description = "Booking identifier")),
    request_body = FeedbackRequest,
    responses(
        (status = 200, description = "Feedback stored", body = BookingBody),
        (status = 400, description = "Rating out of range or not completed", body = Error),
        (status = 403, description = "Not the booking's learner", body = Error),
        (status = 409, description = "Already rated", body = Error)
    ),
    tags = ["bookings"],
    operation_id = "bookingFeedback"
)]
#[post("/bookings/{id}/feedback")]
pub async fn booking_feedback(
    state: web::Data<HttpState>,
    caller: Authenticated,
    path: web::Path<String>,
    payload: web::Json<FeedbackRequest>,
) -> ApiResult<web::Json<BookingBody>> {
    let id = booking_id(path)?;
    let FeedbackRequest { rating, comment } = payload.into_inner();
    let booking = state
        .bookings
        .feedback(&caller.actor, &id, rating, comment)
        .await?;
    Ok(web::Json(BookingBody::from(&booking)))
}

/// Single booking as an iCalendar event.
#[utoipa::path(
    get,
    path = "/api/v1/bookings/{id}/calendar.ics",
    params(("id" = String, Path, description = "Booking identifier")),
    responses(
        (status = 200, description = "iCalendar event", content_type = "text/calendar", body = String),
        (status = 404, description = "Unknown or not visible", body = Error),
        (status = 409, description = "Booking is not confirmed or completed", body = Error)
    ),
    tags = ["bookings"],
    operation_id = "bookingCalendar"
)]
#[get("/bookings/{id}/calendar.ics")]
pub async fn booking_calendar(
    state: web::Data<HttpState>,
    caller: Authenticated,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id = booking_id(path)?;
    let body = state.bookings.booking_calendar(&caller.actor, &id).await?;
    Ok(calendar_response(body))
}

#[cfg(test)]
#[path = "bookings_tests.rs"]
mod tests;
