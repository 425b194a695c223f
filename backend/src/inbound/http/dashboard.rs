//! Role-specific dashboard handler.

use std::collections::BTreeMap;

use actix_web::{HttpResponse, get, web};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{AdminDashboard, Dashboard, Error, LearnerDashboard, MentorDashboard};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::Authenticated;
use crate::inbound::http::cache_control::private_no_cache_header;
use crate::inbound::http::schemas::BookingBody;
use crate::inbound::http::state::HttpState;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MentorDashboardBody {
    pub pending_requests: u64,
    pub upcoming_sessions: Vec<BookingBody>,
    pub completed_sessions: u64,
    pub sessions_this_week: u64,
    pub sessions_this_month: u64,
    pub total_earnings_cents: i64,
    pub average_rating: f64,
    pub total_reviews: u32,
}

impl From<&MentorDashboard> for MentorDashboardBody {
    fn from(d: &MentorDashboard) -> Self {
        Self {
            pending_requests: d.pending_requests,
            upcoming_sessions: d.upcoming_sessions.iter().map(BookingBody::from).collect(),
            completed_sessions: d.completed_sessions,
            sessions_this_week: d.sessions_this_week,
            sessions_this_month: d.sessions_this_month,
            total_earnings_cents: d.total_earnings_cents,
            average_rating: d.average_rating,
            total_reviews: d.total_reviews,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LearnerDashboardBody {
    pub upcoming_sessions: Vec<BookingBody>,
    pub pending_requests: u64,
    pub completed_sessions: u64,
    pub total_spent_cents: i64,
    /// Completed hours with one decimal place, e.g. `"2.5"`.
    #[schema(example = "2.5")]
    pub hours_learned: String,
    pub badges: u64,
}

impl From<&LearnerDashboard> for LearnerDashboardBody {
    fn from(d: &LearnerDashboard) -> Self {
        Self {
            upcoming_sessions: d.upcoming_sessions.iter().map(BookingBody::from).collect(),
            pending_requests: d.pending_requests,
            completed_sessions: d.completed_sessions,
            total_spent_cents: d.total_spent_cents,
            hours_learned: d.hours_learned.clone(),
            badges: d.badges,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminDashboardBody {
    pub users_by_role: BTreeMap<String, u64>,
    pub bookings_by_status: BTreeMap<String, u64>,
}

impl From<&AdminDashboard> for AdminDashboardBody {
    fn from(d: &AdminDashboard) -> Self {
        Self {
            users_by_role: d.users_by_role.clone(),
            bookings_by_status: d.bookings_by_status.clone(),
        }
    }
}

/// Dashboard tagged with the caller's role.
#[derive(Debug, Serialize, ToSchema)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum DashboardBody {
    Mentor(MentorDashboardBody),
    Learner(LearnerDashboardBody),
    Admin(AdminDashboardBody),
}

impl From<&Dashboard> for DashboardBody {
    fn from(value: &Dashboard) -> Self {
        match value {
            Dashboard::Mentor(d) => Self::Mentor(MentorDashboardBody::from(d)),
            Dashboard::Learner(d) => Self::Learner(LearnerDashboardBody::from(d)),
            Dashboard::Admin(d) => Self::Admin(AdminDashboardBody::from(d)),
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/dashboard",
    responses(
        (status = 200, description = "Dashboard for the caller's role", body = DashboardBody),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["dashboard"],
    operation_id = "dashboard"
)]
#[get("/dashboard")]
pub async fn dashboard(
    state: web::Data<HttpState>,
    caller: Authenticated,
) -> ApiResult<HttpResponse> {
    let view = state.dashboard.dashboard(&caller.actor).await?;
    Ok(HttpResponse::Ok()
        .insert_header(private_no_cache_header())
        .json(DashboardBody::from(&view)))
}
