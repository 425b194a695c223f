//! Platform and per-skill analytics handlers.
//!
//! ```text
//! GET /api/v1/analytics/platform?period=30
//! GET /api/v1/analytics/skills/{id}?period=7
//! ```

use actix_web::{HttpResponse, get, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{
    AnalyticsPeriod, DailyGrowth, DailySessions, Error, MentorPricing, PlatformAnalytics,
    SessionStatistics, SkillAnalytics, SkillDemand, SkillRanking, UserStatistics,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::Authenticated;
use crate::inbound::http::cache_control::private_no_cache_header;
use crate::inbound::http::schemas::SkillBody;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, invalid_field, parse_uuid};

/// Trailing window in days, 1 to 365. Defaults to 30.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PeriodParams {
    pub period: Option<String>,
}

impl TryFrom<PeriodParams> for AnalyticsPeriod {
    type Error = Error;

    fn try_from(value: PeriodParams) -> Result<Self, Self::Error> {
        Self::parse(value.period.as_deref()).map_err(invalid_field(FieldName::new("period")))
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserStatisticsBody {
    pub total_users: u64,
    pub total_mentors: u64,
    pub total_learners: u64,
    pub new_users: u64,
}

impl From<&UserStatistics> for UserStatisticsBody {
    fn from(s: &UserStatistics) -> Self {
        Self {
            total_users: s.total_users,
            total_mentors: s.total_mentors,
            total_learners: s.total_learners,
            new_users: s.new_users,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatisticsBody {
    pub total_sessions: u64,
    pub completed_sessions: u64,
    pub cancelled_sessions: u64,
    pub total_revenue_cents: i64,
    pub average_rating: Option<f64>,
}

impl From<&SessionStatistics> for SessionStatisticsBody {
    fn from(s: &SessionStatistics) -> Self {
        Self {
            total_sessions: s.total_sessions,
            completed_sessions: s.completed_sessions,
            cancelled_sessions: s.cancelled_sessions,
            total_revenue_cents: s.total_revenue_cents,
            average_rating: s.average_rating,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DailyGrowthBody {
    #[schema(value_type = String, format = Date)]
    pub date: NaiveDate,
    pub new_users: u64,
    pub new_mentors: u64,
    pub new_learners: u64,
}

impl From<&DailyGrowth> for DailyGrowthBody {
    fn from(d: &DailyGrowth) -> Self {
        Self {
            date: d.date,
            new_users: d.new_users,
            new_mentors: d.new_mentors,
            new_learners: d.new_learners,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DailySessionsBody {
    #[schema(value_type = String, format = Date)]
    pub date: NaiveDate,
    pub sessions: u64,
    pub revenue_cents: i64,
}

impl From<&DailySessions> for DailySessionsBody {
    fn from(d: &DailySessions) -> Self {
        Self {
            date: d.date,
            sessions: d.sessions,
            revenue_cents: d.revenue_cents,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SkillRankingBody {
    pub skill: SkillBody,
    pub sessions: u64,
    pub revenue_cents: i64,
}

impl From<&SkillRanking> for SkillRankingBody {
    fn from(r: &SkillRanking) -> Self {
        Self {
            skill: SkillBody::from(&r.skill),
            sessions: r.sessions,
            revenue_cents: r.revenue_cents,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlatformAnalyticsBody {
    /// Window length in days.
    pub period: u16,
    pub user_statistics: UserStatisticsBody,
    pub session_statistics: SessionStatisticsBody,
    pub growth_trends: Vec<DailyGrowthBody>,
    pub session_trends: Vec<DailySessionsBody>,
    pub top_skills: Vec<SkillRankingBody>,
}

impl From<&PlatformAnalytics> for PlatformAnalyticsBody {
    fn from(a: &PlatformAnalytics) -> Self {
        Self {
            period: a.period.days(),
            user_statistics: UserStatisticsBody::from(&a.user_statistics),
            session_statistics: SessionStatisticsBody::from(&a.session_statistics),
            growth_trends: a.growth_trends.iter().map(DailyGrowthBody::from).collect(),
            session_trends: a.session_trends.iter().map(DailySessionsBody::from).collect(),
            top_skills: a.top_skills.iter().map(SkillRankingBody::from).collect(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SkillDemandBody {
    pub total_sessions: u64,
    pub unique_learners: u64,
    pub average_rating: Option<f64>,
    pub total_revenue_cents: i64,
}

impl From<&SkillDemand> for SkillDemandBody {
    fn from(d: &SkillDemand) -> Self {
        Self {
            total_sessions: d.total_sessions,
            unique_learners: d.unique_learners,
            average_rating: d.average_rating,
            total_revenue_cents: d.total_revenue_cents,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MentorPricingBody {
    pub total_mentors: u64,
    pub average_rate_cents: Option<f64>,
    pub min_rate_cents: Option<i64>,
    pub max_rate_cents: Option<i64>,
}

impl From<&MentorPricing> for MentorPricingBody {
    fn from(p: &MentorPricing) -> Self {
        Self {
            total_mentors: p.total_mentors,
            average_rate_cents: p.average_rate_cents,
            min_rate_cents: p.min_rate_cents,
            max_rate_cents: p.max_rate_cents,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SkillAnalyticsBody {
    pub period: u16,
    pub skill: SkillBody,
    pub demand: SkillDemandBody,
    pub mentors: MentorPricingBody,
    pub timeline: Vec<DailySessionsBody>,
}

impl From<&SkillAnalytics> for SkillAnalyticsBody {
    fn from(a: &SkillAnalytics) -> Self {
        Self {
            period: a.period.days(),
            skill: SkillBody::from(&a.skill),
            demand: SkillDemandBody::from(&a.demand),
            mentors: MentorPricingBody::from(&a.mentors),
            timeline: a.timeline.iter().map(DailySessionsBody::from).collect(),
        }
    }
}

/// Platform activity over the trailing window (admin only).
#[utoipa::path(
    get,
    path = "/api/v1/analytics/platform",
    params(PeriodParams),
    responses(
        (status = 200, description = "Platform analytics", body = PlatformAnalyticsBody),
        (status = 400, description = "Invalid period", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Admins only", body = Error)
    ),
    tags = ["analytics"],
    operation_id = "platformAnalytics"
)]
#[get("/analytics/platform")]
pub async fn platform_analytics(
    state: web::Data<HttpState>,
    caller: Authenticated,
    query: web::Query<PeriodParams>,
) -> ApiResult<HttpResponse> {
    let period = AnalyticsPeriod::try_from(query.into_inner())?;
    let report = state.analytics.platform(&caller.actor, period).await?;
    Ok(HttpResponse::Ok()
        .insert_header(private_no_cache_header())
        .json(PlatformAnalyticsBody::from(&report)))
}

/// Demand and mentor supply for one skill.
#[utoipa::path(
    get,
    path = "/api/v1/analytics/skills/{id}",
    params(("id" = String, Path, description = "Skill identifier"), PeriodParams),
    responses(
        (status = 200, description = "Skill analytics", body = SkillAnalyticsBody),
        (status = 400, description = "Invalid identifier or period", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Unknown skill", body = Error)
    ),
    tags = ["analytics"],
    operation_id = "skillAnalytics"
)]
#[get("/analytics/skills/{id}")]
pub async fn skill_analytics(
    state: web::Data<HttpState>,
    _caller: Authenticated,
    path: web::Path<String>,
    query: web::Query<PeriodParams>,
) -> ApiResult<HttpResponse> {
    let skill_id = parse_uuid(path.into_inner(), FieldName::new("id"))?;
    let period = AnalyticsPeriod::try_from(query.into_inner())?;
    let report = state.analytics.skill(&skill_id, period).await?;
    Ok(HttpResponse::Ok()
        .insert_header(private_no_cache_header())
        .json(SkillAnalyticsBody::from(&report)))
}
