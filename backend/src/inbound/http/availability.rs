//! Mentor availability handlers: weekly rules, slots, exceptions and
//! booking settings, plus the public open-slot view.
//!
//! ```text
//! GET|PUT /api/v1/availability/weekly
//! POST|GET /api/v1/availability/slots, DELETE /api/v1/availability/slots/{id}
//! POST /api/v1/availability/slots/generate
//! POST|GET /api/v1/availability/exceptions, DELETE /api/v1/availability/exceptions/{id}
//! GET|PUT /api/v1/availability/settings
//! GET /api/v1/mentors/{id}/slots?from&to
//! ```

use actix_web::{HttpResponse, delete, get, post, put, web};
use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::domain::ports::{GenerateSlotsRequest, SlotPattern};
use crate::domain::{
    AvailabilityException, AvailabilitySettings, AvailabilitySlot, Error, Interval, WeeklyRule,
    WeeklyWindow, weekday_from_index, weekday_index,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::Authenticated;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, invalid_field, parse_date, parse_optional_rfc3339_timestamp,
    parse_rfc3339_timestamp, parse_time, parse_user_id, parse_uuid,
};

const TIME_FORMAT: &str = "%H:%M";

fn format_time(time: NaiveTime) -> String {
    time.format(TIME_FORMAT).to_string()
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyWindowRequest {
    /// 0 = Monday through 6 = Sunday.
    #[schema(minimum = 0, maximum = 6)]
    pub weekday: i16,
    #[schema(example = "09:00")]
    pub start_time: String,
    #[schema(example = "12:00")]
    pub end_time: String,
}

impl TryFrom<WeeklyWindowRequest> for WeeklyWindow {
    type Error = Error;

    fn try_from(value: WeeklyWindowRequest) -> Result<Self, Self::Error> {
        let weekday =
            weekday_from_index(value.weekday).map_err(invalid_field(FieldName::new("weekday")))?;
        let start_time = parse_time(value.start_time, FieldName::new("startTime"))?;
        let end_time = parse_time(value.end_time, FieldName::new("endTime"))?;
        Self::new(weekday, start_time, end_time).map_err(invalid_field(FieldName::new("endTime")))
    }
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyRulesRequest {
    pub rules: Vec<WeeklyWindowRequest>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyRuleBody {
    pub id: Uuid,
    pub weekday: i16,
    pub start_time: String,
    pub end_time: String,
}

impl From<&WeeklyRule> for WeeklyRuleBody {
    fn from(rule: &WeeklyRule) -> Self {
        Self {
            id: rule.id,
            weekday: weekday_index(rule.window.weekday),
            start_time: format_time(rule.window.start_time),
            end_time: format_time(rule.window.end_time),
        }
    }
}

/// Explicit `[startUtc, endUtc)` range in RFC 3339.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IntervalRequest {
    #[schema(example = "2030-01-07T10:00:00Z")]
    pub start_utc: String,
    #[schema(example = "2030-01-07T11:00:00Z")]
    pub end_utc: String,
}

fn parse_interval(start: String, end: String) -> Result<Interval, Error> {
    let start = parse_rfc3339_timestamp(start, FieldName::new("startUtc"))?;
    let end = parse_rfc3339_timestamp(end, FieldName::new("endUtc"))?;
    Interval::new(start, end).map_err(invalid_field(FieldName::new("endUtc")))
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SlotBody {
    pub id: Uuid,
    pub mentor_id: Uuid,
    pub start_utc: DateTime<Utc>,
    pub end_utc: DateTime<Utc>,
    pub is_booked: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&AvailabilitySlot> for SlotBody {
    fn from(slot: &AvailabilitySlot) -> Self {
        Self {
            id: slot.id,
            mentor_id: *slot.mentor_id.as_uuid(),
            start_utc: slot.start_utc,
            end_utc: slot.end_utc,
            is_booked: slot.is_booked,
            created_at: slot.created_at,
        }
    }
}

/// Optional RFC 3339 bounds on a slot listing.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RangeQuery {
    pub from: Option<String>,
    pub to: Option<String>,
}

impl RangeQuery {
    fn parse(self) -> Result<(Option<DateTime<Utc>>, Option<DateTime<Utc>>), Error> {
        Ok((
            parse_optional_rfc3339_timestamp(self.from, FieldName::new("from"))?,
            parse_optional_rfc3339_timestamp(self.to, FieldName::new("to"))?,
        ))
    }
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SlotPatternRequest {
    pub weekdays: Vec<i16>,
    #[schema(example = "09:00")]
    pub start_time: String,
    #[schema(example = "17:00")]
    pub end_time: String,
}

/// Bulk slot generation over an inclusive date range.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateSlotsBody {
    #[schema(example = "2030-01-07")]
    pub start_date: String,
    #[schema(example = "2030-01-20")]
    pub end_date: String,
    /// Inline pattern; the stored weekly rules apply when omitted.
    pub pattern: Option<SlotPatternRequest>,
    #[schema(minimum = 15, maximum = 480)]
    pub session_duration_minutes: Option<i64>,
    #[schema(minimum = 0, maximum = 60)]
    pub break_duration_minutes: Option<i64>,
}

impl TryFrom<GenerateSlotsBody> for GenerateSlotsRequest {
    type Error = Error;

    fn try_from(value: GenerateSlotsBody) -> Result<Self, Self::Error> {
        let pattern = value
            .pattern
            .map(|pattern| -> Result<SlotPattern, Error> {
                Ok(SlotPattern {
                    weekdays: pattern.weekdays,
                    start_time: parse_time(pattern.start_time, FieldName::new("startTime"))?,
                    end_time: parse_time(pattern.end_time, FieldName::new("endTime"))?,
                })
            })
            .transpose()?;
        Ok(Self {
            start_date: parse_date(value.start_date, FieldName::new("startDate"))?,
            end_date: parse_date(value.end_date, FieldName::new("endDate"))?,
            pattern,
            session_minutes: value.session_duration_minutes,
            break_minutes: value.break_duration_minutes,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedSlotsBody {
    pub created_count: usize,
    pub skipped_count: usize,
    pub slots: Vec<SlotBody>,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExceptionRequest {
    pub start_utc: String,
    pub end_utc: String,
    #[schema(example = "Conference")]
    pub reason: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExceptionBody {
    pub id: Uuid,
    pub mentor_id: Uuid,
    pub start_utc: DateTime<Utc>,
    pub end_utc: DateTime<Utc>,
    pub reason: String,
}

impl From<&AvailabilityException> for ExceptionBody {
    fn from(exception: &AvailabilityException) -> Self {
        Self {
            id: exception.id,
            mentor_id: *exception.mentor_id.as_uuid(),
            start_utc: exception.start_utc,
            end_utc: exception.end_utc,
            reason: exception.reason.clone(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SettingsBody {
    #[schema(minimum = 0, maximum = 168)]
    pub min_booking_notice_hours: i32,
    #[schema(minimum = 1, maximum = 365)]
    pub max_booking_advance_days: i32,
    #[schema(minimum = 15, maximum = 480)]
    pub default_session_minutes: i32,
}

impl From<AvailabilitySettings> for SettingsBody {
    fn from(value: AvailabilitySettings) -> Self {
        Self {
            min_booking_notice_hours: value.min_booking_notice_hours,
            max_booking_advance_days: value.max_booking_advance_days,
            default_session_minutes: value.default_session_minutes,
        }
    }
}

impl From<SettingsBody> for AvailabilitySettings {
    fn from(body: SettingsBody) -> Self {
        Self {
            min_booking_notice_hours: body.min_booking_notice_hours,
            max_booking_advance_days: body.max_booking_advance_days,
            default_session_minutes: body.default_session_minutes,
        }
    }
}

fn slot_bodies(slots: &[AvailabilitySlot]) -> Vec<SlotBody> {
    slots.iter().map(SlotBody::from).collect()
}

#[utoipa::path(
    get,
    path = "/api/v1/availability/weekly",
    responses(
        (status = 200, description = "Weekly rules", body = [WeeklyRuleBody]),
        (status = 403, description = "Mentors only", body = Error)
    ),
    tags = ["availability"],
    operation_id = "weeklyRules"
)]
#[get("/availability/weekly")]
pub async fn weekly_rules(
    state: web::Data<HttpState>,
    caller: Authenticated,
) -> ApiResult<web::Json<Vec<WeeklyRuleBody>>> {
    let rules = state.availability.weekly_rules(&caller.actor).await?;
    Ok(web::Json(rules.iter().map(WeeklyRuleBody::from).collect()))
}

/// Replace the caller's weekly rules.
#[utoipa::path(
    put,
    path = "/api/v1/availability/weekly",
    request_body = WeeklyRulesRequest,
    responses(
        (status = 200, description = "Stored rules", body = [WeeklyRuleBody]),
        (status = 400, description = "Invalid weekday or time window", body = Error),
        (status = 403, description = "Mentors only", body = Error)
    ),
    tags = ["availability"],
    operation_id = "replaceWeeklyRules"
)]
#[put("/availability/weekly")]
pub async fn replace_weekly_rules(
    state: web::Data<HttpState>,
    caller: Authenticated,
    payload: web::Json<WeeklyRulesRequest>,
) -> ApiResult<web::Json<Vec<WeeklyRuleBody>>> {
    let windows = payload
        .into_inner()
        .rules
        .into_iter()
        .map(WeeklyWindow::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    let rules = state
        .availability
        .replace_weekly_rules(&caller.actor, windows)
        .await?;
    Ok(web::Json(rules.iter().map(WeeklyRuleBody::from).collect()))
}

#[utoipa::path(
    post,
    path = "/api/v1/availability/slots",
    request_body = IntervalRequest,
    responses(
        (status = 201, description = "Slot created", body = SlotBody),
        (status = 400, description = "Empty or inverted range", body = Error),
        (status = 409, description = "Overlaps an existing slot", body = Error)
    ),
    tags = ["availability"],
    operation_id = "createSlot"
)]
#[post("/availability/slots")]
pub async fn create_slot(
    state: web::Data<HttpState>,
    caller: Authenticated,
    payload: web::Json<IntervalRequest>,
) -> ApiResult<HttpResponse> {
    let IntervalRequest { start_utc, end_utc } = payload.into_inner();
    let interval = parse_interval(start_utc, end_utc)?;
    let slot = state
        .availability
        .create_slot(&caller.actor, interval)
        .await?;
    Ok(HttpResponse::Created().json(SlotBody::from(&slot)))
}

#[utoipa::path(
    get,
    path = "/api/v1/availability/slots",
    params(RangeQuery),
    responses(
        (status = 200, description = "Caller's slots", body = [SlotBody]),
        (status = 403, description = "Mentors only", body = Error)
    ),
    tags = ["availability"],
    operation_id = "listSlots"
)]
#[get("/availability/slots")]
pub async fn list_slots(
    state: web::Data<HttpState>,
    caller: Authenticated,
    query: web::Query<RangeQuery>,
) -> ApiResult<web::Json<Vec<SlotBody>>> {
    let (from, to) = query.into_inner().parse()?;
    let slots = state
        .availability
        .list_slots(&caller.actor, from, to)
        .await?;
    Ok(web::Json(slot_bodies(&slots)))
}

/// Generate slots from an inline pattern or the stored weekly rules.
#[utoipa::path(
    post,
    path = "/api/v1/availability/slots/generate",
    request_body = GenerateSlotsBody,
    responses(
        (status = 201, description = "Slots generated", body = GeneratedSlotsBody),
        (status = 400, description = "Invalid range, pattern or durations", body = Error),
        (status = 403, description = "Mentors only", body = Error)
    ),
    tags = ["availability"],
    operation_id = "generateSlots"
)]
#[post("/availability/slots/generate")]
pub async fn generate_slots(
    state: web::Data<HttpState>,
    caller: Authenticated,
    payload: web::Json<GenerateSlotsBody>,
) -> ApiResult<HttpResponse> {
    let request = GenerateSlotsRequest::try_from(payload.into_inner())?;
    let generated = state
        .availability
        .generate_slots(&caller.actor, request)
        .await?;
    Ok(HttpResponse::Created().json(GeneratedSlotsBody {
        created_count: generated.slots.len(),
        skipped_count: generated.skipped_count,
        slots: slot_bodies(&generated.slots),
    }))
}

#[utoipa::path(
    delete,
    path = "/api/v1/availability/slots/{id}",
    params(("id" = String, Path, description = "Slot identifier")),
    responses(
        (status = 204, description = "Slot deleted"),
        (status = 404, description = "Unknown slot", body = Error),
        (status = 409, description = "Slot is booked", body = Error)
    ),
    tags = ["availability"],
    operation_id = "deleteSlot"
)]
#[delete("/availability/slots/{id}")]
pub async fn delete_slot(
    state: web::Data<HttpState>,
    caller: Authenticated,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let slot_id = parse_uuid(path.into_inner(), FieldName::new("id"))?;
    state
        .availability
        .delete_slot(&caller.actor, &slot_id)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

#[utoipa::path(
    post,
    path = "/api/v1/availability/exceptions",
    request_body = ExceptionRequest,
    responses(
        (status = 201, description = "Exception created", body = ExceptionBody),
        (status = 400, description = "Empty or inverted range", body = Error)
    ),
    tags = ["availability"],
    operation_id = "createException"
)]
#[post("/availability/exceptions")]
pub async fn create_exception(
    state: web::Data<HttpState>,
    caller: Authenticated,
    payload: web::Json<ExceptionRequest>,
) -> ApiResult<HttpResponse> {
    let ExceptionRequest {
        start_utc,
        end_utc,
        reason,
    } = payload.into_inner();
    let interval = parse_interval(start_utc, end_utc)?;
    let exception = state
        .availability
        .create_exception(&caller.actor, interval, reason)
        .await?;
    Ok(HttpResponse::Created().json(ExceptionBody::from(&exception)))
}

#[utoipa::path(
    get,
    path = "/api/v1/availability/exceptions",
    responses((status = 200, description = "Caller's exceptions", body = [ExceptionBody])),
    tags = ["availability"],
    operation_id = "listExceptions"
)]
#[get("/availability/exceptions")]
pub async fn list_exceptions(
    state: web::Data<HttpState>,
    caller: Authenticated,
) -> ApiResult<web::Json<Vec<ExceptionBody>>> {
    let exceptions = state.availability.exceptions(&caller.actor).await?;
    Ok(web::Json(
        exceptions.iter().map(ExceptionBody::from).collect(),
    ))
}

#[utoipa::path(
    delete,
    path = "/api/v1/availability/exceptions/{id}",
    params(("id" = String, Path, description = "Exception identifier")),
    responses(
        (status = 204, description = "Exception deleted"),
        (status = 404, description = "Unknown exception", body = Error)
    ),
    tags = ["availability"],
    operation_id = "deleteException"
)]
#[delete("/availability/exceptions/{id}")]
pub async fn delete_exception(
    state: web::Data<HttpState>,
    caller: Authenticated,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let exception_id = parse_uuid(path.into_inner(), FieldName::new("id"))?;
    state
        .availability
        .delete_exception(&caller.actor, &exception_id)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

#[utoipa::path(
    get,
    path = "/api/v1/availability/settings",
    responses((status = 200, description = "Booking settings", body = SettingsBody)),
    tags = ["availability"],
    operation_id = "availabilitySettings"
)]
#[get("/availability/settings")]
pub async fn settings(
    state: web::Data<HttpState>,
    caller: Authenticated,
) -> ApiResult<web::Json<SettingsBody>> {
    let stored = state.availability.settings(&caller.actor).await?;
    Ok(web::Json(SettingsBody::from(stored)))
}

#[utoipa::path(
    put,
    path = "/api/v1/availability/settings",
    request_body = SettingsBody,
    responses(
        (status = 200, description = "Stored settings", body = SettingsBody),
        (status = 400, description = "Value out of range", body = Error)
    ),
    tags = ["availability"],
    operation_id = "updateAvailabilitySettings"
)]
#[put("/availability/settings")]
pub async fn update_settings(
    state: web::Data<HttpState>,
    caller: Authenticated,
    payload: web::Json<SettingsBody>,
) -> ApiResult<web::Json<SettingsBody>> {
    let stored = state
        .availability
        .update_settings(&caller.actor, payload.into_inner().into())
        .await?;
    Ok(web::Json(SettingsBody::from(stored)))
}

/// Open slots of a mentor: unbooked, upcoming and not blocked.
#[utoipa::path(
    get,
    path = "/api/v1/mentors/{id}/slots",
    params(("id" = String, Path, description = "Mentor identifier"), RangeQuery),
    responses(
        (status = 200, description = "Open slots", body = [SlotBody]),
        (status = 400, description = "Invalid identifier or range", body = Error)
    ),
    tags = ["availability"],
    operation_id = "mentorOpenSlots",
    security([])
)]
#[get("/mentors/{id}/slots")]
pub async fn mentor_open_slots(
    state: web::Data<HttpState>,
    path: web::Path<String>,
    query: web::Query<RangeQuery>,
) -> ApiResult<web::Json<Vec<SlotBody>>> {
    let mentor_id = parse_user_id(path.into_inner(), FieldName::new("id"))?;
    let (from, to) = query.into_inner().parse()?;
    let slots = state
        .availability
        .open_slots(&mentor_id, from, to)
        .await?;
    Ok(web::Json(slot_bodies(&slots)))
}

#[cfg(test)]
#[path = "availability_tests.rs"]
mod tests;
