//! Badge catalogue and earned badge handlers.

use actix_web::{get, web};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{Badge, BadgeCategory, CATALOGUE, EarnedBadge, Error, find_badge};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::Authenticated;
use crate::inbound::http::state::HttpState;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BadgeBody {
    #[schema(example = "first-steps")]
    pub slug: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub category: BadgeCategory,
}

impl From<&Badge> for BadgeBody {
    fn from(badge: &Badge) -> Self {
        Self {
            slug: badge.slug,
            name: badge.name,
            description: badge.description,
            category: badge.category,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EarnedBadgeBody {
    #[serde(flatten)]
    pub badge: BadgeBody,
    pub earned_at: DateTime<Utc>,
}

impl EarnedBadgeBody {
    fn from_earned(earned: &EarnedBadge) -> Option<Self> {
        find_badge(&earned.slug).map(|badge| Self {
            badge: badge.into(),
            earned_at: earned.earned_at,
        })
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/badges",
    responses((status = 200, description = "Badge catalogue", body = [BadgeBody])),
    tags = ["badges"],
    operation_id = "listBadges",
    security([])
)]
#[get("/badges")]
pub async fn list_badges() -> web::Json<Vec<BadgeBody>> {
    web::Json(CATALOGUE.iter().map(BadgeBody::from).collect())
}

/// Badges the caller has earned, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/users/me/badges",
    responses(
        (status = 200, description = "Earned badges", body = [EarnedBadgeBody]),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["badges"],
    operation_id = "myBadges"
)]
#[get("/users/me/badges")]
pub async fn my_badges(
    state: web::Data<HttpState>,
    caller: Authenticated,
) -> ApiResult<web::Json<Vec<EarnedBadgeBody>>> {
    let mut earned = state.badges.earned(&caller.actor.user_id).await?;
    earned.sort_by(|a, b| b.earned_at.cmp(&a.earned_at));
    Ok(web::Json(
        earned.iter().filter_map(EarnedBadgeBody::from_earned).collect(),
    ))
}
