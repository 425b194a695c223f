//! Skill catalogue and mentor skill handlers.
//!
//! ```text
//! GET  /api/v1/skills
//! POST /api/v1/skills {"name":"Rust"}
//! PUT  /api/v1/mentors/me/skills {"skills":[{"skillId":"...","proficiency":7}]}
//! GET  /api/v1/mentors/{id}/skills
//! ```

use actix_web::{HttpResponse, get, post, put, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::Error;
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::Authenticated;
use crate::inbound::http::schemas::{MentorSkillBody, SkillBody};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_user_id};

#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSkillRequest {
    #[schema(example = "Distributed systems")]
    pub name: String,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MentorSkillEntry {
    pub skill_id: Uuid,
    #[schema(minimum = 1, maximum = 10)]
    pub proficiency: i16,
}

/// Replacement set of skills for the calling mentor.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MentorSkillsRequest {
    pub skills: Vec<MentorSkillEntry>,
}

/// List every skill in name order.
#[utoipa::path(
    get,
    path = "/api/v1/skills",
    responses((status = 200, description = "Skill catalogue", body = [SkillBody])),
    tags = ["skills"],
    operation_id = "listSkills",
    security([])
)]
#[get("/skills")]
pub async fn list_skills(state: web::Data<HttpState>) -> ApiResult<web::Json<Vec<SkillBody>>> {
    let skills = state.skills.list().await?;
    Ok(web::Json(skills.iter().map(SkillBody::from).collect()))
}

/// Add a skill to the catalogue (admin only).
#[utoipa::path(
    post,
    path = "/api/v1/skills",
    request_body = CreateSkillRequest,
    responses(
        (status = 201, description = "Skill created", body = SkillBody),
        (status = 400, description = "Invalid name", body = Error),
        (status = 403, description = "Admins only", body = Error),
        (status = 409, description = "Slug already taken", body = Error)
    ),
    tags = ["skills"],
    operation_id = "createSkill"
)]
#[post("/skills")]
pub async fn create_skill(
    state: web::Data<HttpState>,
    caller: Authenticated,
    payload: web::Json<CreateSkillRequest>,
) -> ApiResult<HttpResponse> {
    let skill = state.skills.create(&caller.actor, &payload.name).await?;
    Ok(HttpResponse::Created().json(SkillBody::from(&skill)))
}

/// Replace the calling mentor's skill set.
#[utoipa::path(
    put,
    path = "/api/v1/mentors/me/skills",
    request_body = MentorSkillsRequest,
    responses(
        (status = 200, description = "Stored skills", body = [MentorSkillBody]),
        (status = 400, description = "Unknown skill or proficiency out of range", body = Error),
        (status = 403, description = "Mentors only", body = Error)
    ),
    tags = ["skills"],
    operation_id = "setMentorSkills"
)]
#[put("/mentors/me/skills")]
pub async fn set_mentor_skills(
    state: web::Data<HttpState>,
    caller: Authenticated,
    payload: web::Json<MentorSkillsRequest>,
) -> ApiResult<web::Json<Vec<MentorSkillBody>>> {
    let entries = payload
        .into_inner()
        .skills
        .into_iter()
        .map(|entry| (entry.skill_id, entry.proficiency))
        .collect();
    let stored = state
        .skills
        .set_mentor_skills(&caller.actor, entries)
        .await?;
    Ok(web::Json(stored.iter().map(MentorSkillBody::from).collect()))
}

#[utoipa::path(
    get,
    path = "/api/v1/mentors/{id}/skills",
    params(("id" = String, Path, description = "Mentor identifier")),
    responses(
        (status = 200, description = "Mentor skills", body = [MentorSkillBody]),
        (status = 400, description = "Invalid identifier", body = Error)
    ),
    tags = ["skills"],
    operation_id = "mentorSkills",
    security([])
)]
#[get("/mentors/{id}/skills")]
pub async fn mentor_skills(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<Vec<MentorSkillBody>>> {
    let mentor_id = parse_user_id(path.into_inner(), FieldName::new("id"))?;
    let skills = state.skills.mentor_skills(&mentor_id).await?;
    Ok(web::Json(skills.iter().map(MentorSkillBody::from).collect()))
}
