//! Review submission, listing, rating aggregate and helpful votes.

use actix_web::{HttpResponse, get, post, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::ports::ReviewSubmission;
use crate::domain::{Error, Review, ReviewRatings};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::Authenticated;
use crate::inbound::http::schemas::RatingBody;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_user_id, parse_uuid};

#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRequest {
    pub booking_id: String,
    #[schema(minimum = 1, maximum = 5)]
    pub overall_rating: i16,
    pub communication_rating: Option<i16>,
    pub knowledge_rating: Option<i16>,
    pub punctuality_rating: Option<i16>,
    pub text: Option<String>,
    #[serde(default = "recommend_by_default")]
    pub would_recommend: bool,
}

const fn recommend_by_default() -> bool {
    true
}

impl TryFrom<ReviewRequest> for ReviewSubmission {
    type Error = Error;

    fn try_from(value: ReviewRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            booking_id: parse_uuid(value.booking_id, FieldName::new("bookingId"))?,
            ratings: ReviewRatings {
                overall: value.overall_rating,
                communication: value.communication_rating,
                knowledge: value.knowledge_rating,
                punctuality: value.punctuality_rating,
            },
            text: value.text,
            would_recommend: value.would_recommend,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReviewBody {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub reviewer_id: Uuid,
    pub mentor_id: Uuid,
    pub overall_rating: i16,
    pub communication_rating: Option<i16>,
    pub knowledge_rating: Option<i16>,
    pub punctuality_rating: Option<i16>,
    pub text: String,
    pub would_recommend: bool,
    pub helpful_count: i32,
    pub created_at: DateTime<Utc>,
}

impl From<&Review> for ReviewBody {
    fn from(review: &Review) -> Self {
        Self {
            id: review.id,
            booking_id: review.booking_id,
            reviewer_id: *review.reviewer_id.as_uuid(),
            mentor_id: *review.mentor_id.as_uuid(),
            overall_rating: review.ratings.overall,
            communication_rating: review.ratings.communication,
            knowledge_rating: review.ratings.knowledge,
            punctuality_rating: review.ratings.punctuality,
            text: review.text.clone(),
            would_recommend: review.would_recommend,
            helpful_count: review.helpful_count,
            created_at: review.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HelpfulBody {
    pub helpful_count: i32,
}

/// Review a completed session (the booking's learner only).
#[utoipa::path(
    post,
    path = "/api/v1/reviews",
    request_body = ReviewRequest,
    responses(
        (status = 201, description = "Review stored", body = ReviewBody),
        (status = 400, description = "Rating out of range or booking not completed", body = Error),
        (status = 403, description = "Not the booking's learner", body = Error),
        (status = 409, description = "Already reviewed", body = Error)
    ),
    tags = ["reviews"],
    operation_id = "submitReview"
)]
#[post("/reviews")]
pub async fn submit_review(
    state: web::Data<HttpState>,
    caller: Authenticated,
    payload: web::Json<ReviewRequest>,
) -> ApiResult<HttpResponse> {
    let submission = ReviewSubmission::try_from(payload.into_inner())?;
    let review = state.reviews.submit(&caller.actor, submission).await?;
    Ok(HttpResponse::Created().json(ReviewBody::from(&review)))
}

#[utoipa::path(
    get,
    path = "/api/v1/mentors/{id}/reviews",
    params(("id" = String, Path, description = "Mentor identifier")),
    responses((status = 200, description = "Reviews, newest first", body = [ReviewBody])),
    tags = ["reviews"],
    operation_id = "mentorReviews",
    security([])
)]
#[get("/mentors/{id}/reviews")]
pub async fn mentor_reviews(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<Vec<ReviewBody>>> {
    let mentor_id = parse_user_id(path.into_inner(), FieldName::new("id"))?;
    let reviews = state.reviews.for_mentor(&mentor_id).await?;
    Ok(web::Json(reviews.iter().map(ReviewBody::from).collect()))
}

#[utoipa::path(
    get,
    path = "/api/v1/mentors/{id}/rating",
    params(("id" = String, Path, description = "Mentor identifier")),
    responses((status = 200, description = "Rating aggregate", body = RatingBody)),
    tags = ["reviews"],
    operation_id = "mentorRating",
    security([])
)]
#[get("/mentors/{id}/rating")]
pub async fn mentor_rating(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<RatingBody>> {
    let mentor_id = parse_user_id(path.into_inner(), FieldName::new("id"))?;
    let rating = state.reviews.rating(&mentor_id).await?;
    Ok(web::Json(RatingBody::from(&rating)))
}

/// Vote a review helpful; each user votes once.
#[utoipa::path(
    post,
    path = "/api/v1/reviews/{id}/helpful",
    params(("id" = String, Path, description = "Review identifier")),
    responses(
        (status = 200, description = "Updated vote count", body = HelpfulBody),
        (status = 400, description = "Own review", body = Error),
        (status = 409, description = "Already voted", body = Error)
    ),
    tags = ["reviews"],
    operation_id = "markReviewHelpful"
)]
#[post("/reviews/{id}/helpful")]
pub async fn mark_helpful(
    state: web::Data<HttpState>,
    caller: Authenticated,
    path: web::Path<String>,
) -> ApiResult<web::Json<HelpfulBody>> {
    let review_id = parse_uuid(path.into_inner(), FieldName::new("id"))?;
    let helpful_count = state.reviews.mark_helpful(&caller.actor, &review_id).await?;
    Ok(web::Json(HelpfulBody { helpful_count }))
}
