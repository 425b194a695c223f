//! Mentor discovery handler.

use actix_web::{get, web};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::domain::{AvailabilityWindow, Error, MentorSearchQuery};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::MentorCardBody;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, invalid_field, invalid_value_error};

/// Filters for `GET /api/v1/search/mentors`; all optional.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query, rename_all = "camelCase")]
pub struct SearchParams {
    /// Case-insensitive substring of display name or bio.
    pub q: Option<String>,
    /// Skill slug.
    pub skill: Option<String>,
    /// Minimum average rating, 0 to 5.
    pub min_rating: Option<f64>,
    /// Minimum hourly rate in cents.
    pub min_rate: Option<i64>,
    /// Maximum hourly rate in cents.
    pub max_rate: Option<i64>,
    /// IANA timezone name.
    pub timezone: Option<String>,
    /// `today` or `week`.
    pub available: Option<String>,
}

impl TryFrom<SearchParams> for MentorSearchQuery {
    type Error = Error;

    fn try_from(value: SearchParams) -> Result<Self, Self::Error> {
        let available = value
            .available
            .map(|raw| {
                raw.parse::<AvailabilityWindow>().map_err(|err| {
                    invalid_value_error(FieldName::new("available"), &raw, &err.to_string())
                })
            })
            .transpose()?;
        let query = Self {
            text: value.q.filter(|q| !q.trim().is_empty()),
            skill_slug: value.skill,
            min_rating: value.min_rating,
            min_rate_cents: value.min_rate,
            max_rate_cents: value.max_rate,
            timezone: value.timezone,
            available,
        };
        query
            .validate()
            .map_err(invalid_field(FieldName::new("query")))
    }
}

/// Approved mentors matching every supplied filter, best rated first.
#[utoipa::path(
    get,
    path = "/api/v1/search/mentors",
    params(SearchParams),
    responses(
        (status = 200, description = "Matching mentors", body = [MentorCardBody]),
        (status = 400, description = "Invalid filter", body = Error)
    ),
    tags = ["mentors"],
    operation_id = "searchMentors",
    security([])
)]
#[get("/search/mentors")]
pub async fn search_mentors(
    state: web::Data<HttpState>,
    query: web::Query<SearchParams>,
) -> ApiResult<web::Json<Vec<MentorCardBody>>> {
    let query = MentorSearchQuery::try_from(query.into_inner())?;
    let cards = state.search.search_mentors(query).await?;
    Ok(web::Json(cards.iter().map(MentorCardBody::from).collect()))
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::inbound::http::test_utils::TestPorts;
    use actix_web::http::StatusCode;
    use actix_web::{App, test as actix_test};
    use rstest::rstest;
    use serde_json::{Value, json};

    #[rstest]
    #[case::inverted("minRate=5000&maxRate=1000", "minRate must not exceed maxRate")]
    #[case::rating("minRating=6", "minRating must be between 0 and 5")]
    #[case::window("available=month", "available must be `today` or `week`, got month")]
    #[actix_web::test]
    async fn invalid_filters_are_rejected(#[case] query: &str, #[case] message: &str) {
        let app = actix_test::init_service(
            App::new()
                .app_data(TestPorts::default().into_state())
                .service(web::scope("/api/v1").service(search_mentors)),
        )
        .await;
        let req = actix_test::TestRequest::get()
            .uri(&format!("/api/v1/search/mentors?{query}"))
            .to_request();
        let res = actix_test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body["message"], json!(message));
    }

    #[rstest]
    #[actix_web::test]
    async fn filters_are_forwarded() {
        let mut ports = TestPorts::default();
        ports
            .search
            .expect_search_mentors()
            .withf(|query| {
                query.text.as_deref() == Some("rust")
                    && query.skill_slug.as_deref() == Some("systems")
                    && query.min_rating == Some(4.5)
                    && query.max_rate_cents == Some(9000)
                    && query.available == Some(AvailabilityWindow::Week)
            })
            .returning(|_| Ok(Vec::new()));
        let app = actix_test::init_service(
            App::new()
                .app_data(ports.into_state())
                .service(web::scope("/api/v1").service(search_mentors)),
        )
        .await;
        let req = actix_test::TestRequest::get()
            .uri("/api/v1/search/mentors?q=rust&skill=systems&minRating=4.5&maxRate=9000&available=week")
            .to_request();
        let res = actix_test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body, json!([]));
    }

    #[rstest]
    fn blank_text_is_ignored() {
        let query = MentorSearchQuery::try_from(SearchParams {
            q: Some("   ".to_owned()),
            ..SearchParams::default()
        })
        .expect("valid");
        assert_eq!(query.text, None);
    }
}
