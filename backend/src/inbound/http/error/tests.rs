//! Tests for HTTP error mapping.

use super::*;
use actix_web::body::to_bytes;
use actix_web::{App, test as actix_test};
use rstest::rstest;
use serde_json::{Value, json};

const TRACE_ID: &str = "00000000-0000-0000-0000-000000000000";

async fn render(error: &Error) -> (StatusCode, Option<String>, Value) {
    let response = ResponseError::error_response(error);
    let status = response.status();
    let trace = response
        .headers()
        .get(TRACE_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);
    let bytes = to_bytes(response.into_body()).await.expect("body");
    (status, trace, serde_json::from_slice(&bytes).expect("JSON body"))
}

#[rstest]
#[case::invalid(ErrorCode::InvalidRequest, StatusCode::BAD_REQUEST)]
#[case::unauthorised(ErrorCode::Unauthorized, StatusCode::UNAUTHORIZED)]
#[case::forbidden(ErrorCode::Forbidden, StatusCode::FORBIDDEN)]
#[case::missing(ErrorCode::NotFound, StatusCode::NOT_FOUND)]
#[case::conflict(ErrorCode::Conflict, StatusCode::CONFLICT)]
#[case::unavailable(ErrorCode::ServiceUnavailable, StatusCode::SERVICE_UNAVAILABLE)]
#[case::internal(ErrorCode::InternalError, StatusCode::INTERNAL_SERVER_ERROR)]
fn codes_map_to_statuses(#[case] code: ErrorCode, #[case] expected: StatusCode) {
    assert_eq!(status_for(code), expected);
    assert_eq!(Error::new(code, "x").status_code(), expected);
}

#[rstest]
#[actix_web::test]
async fn internal_errors_are_redacted_but_keep_the_trace_id() {
    let error = Error::internal("connection string leaked")
        .with_trace_id(TRACE_ID)
        .with_details(json!({"dsn": "postgres://secret"}));

    let (status, trace, body) = render(&error).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(trace.as_deref(), Some(TRACE_ID));
    assert_eq!(body["code"], "internal_error");
    assert_eq!(body["message"], "Internal server error");
    assert!(body.get("details").is_none());
}

#[rstest]
#[actix_web::test]
async fn client_errors_keep_message_and_details() {
    let error = Error::conflict("mentor already has a booking in this time range")
        .with_details(json!({"field": "startUtc"}));

    let (status, trace, body) = render(&error).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(trace.is_none());
    assert_eq!(body["message"], "mentor already has a booking in this time range");
    assert_eq!(body["details"], json!({"field": "startUtc"}));
}

#[rstest]
fn actix_errors_become_generic_internal_errors() {
    let err: Error = actix_web::error::ErrorBadRequest("boom").into();
    assert_eq!(err.code(), ErrorCode::InternalError);
    assert_eq!(err.message(), "Internal server error");
    assert!(err.details().is_none());
}

#[derive(Debug, serde::Deserialize)]
struct Payload {
    #[expect(dead_code, reason = "only deserialisation is exercised")]
    name: String,
}

async fn accept(_body: web::Json<Payload>, _query: web::Query<Vec<(String, u8)>>) -> HttpResponse {
    HttpResponse::NoContent().finish()
}

#[rstest]
#[case::body("/echo", "{not json")]
#[case::query("/echo?limit=lots", r#"{"name":"ada"}"#)]
#[actix_web::test]
async fn extractor_rejections_use_the_error_envelope(#[case] uri: &str, #[case] body: &str) {
    let app = actix_test::init_service(
        App::new()
            .app_data(json_config())
            .app_data(query_config())
            .route("/echo", web::post().to(accept)),
    )
    .await;
    let req = actix_test::TestRequest::post()
        .uri(uri)
        .insert_header(("content-type", "application/json"))
        .set_payload(body.to_owned())
        .to_request();
    let res = actix_test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = actix_test::read_body_json(res).await;
    assert_eq!(body["code"], "invalid_request");
}
