//! End-to-end route wiring over the in-memory adapters.

use super::*;
use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::test;
use mockable::DefaultClock;
use rstest::{fixture, rstest};
use serde_json::{Value, json};

use mentorship::domain::WebhookSecrets;
use mentorship::inbound::ws::OriginPolicy;
use mentorship::outbound::ai::ChatCompletionsConfig;
use mentorship::outbound::memory::MemoryStore;

use super::state_builders::{Repositories, build_states};

#[fixture]
fn deps() -> AppDependencies {
    let options = ServiceOptions {
        token_ttl: chrono::Duration::hours(1),
        calendar_domain: "mentorship.local".to_owned(),
        ai: ChatCompletionsConfig::new(None, None, None).expect("default AI config"),
        webhook_secrets: WebhookSecrets::default(),
        origins: OriginPolicy::new("mentors.example"),
    };
    let states = build_states(
        Repositories::in_memory(&MemoryStore::new()),
        &options,
        Arc::new(DefaultClock),
    )
    .expect("states");
    AppDependencies {
        health_state: web::Data::new(HealthState::new()),
        http_state: states.http,
        ws_state: states.ws,
    }
}

async fn login<S>(app: &S) -> String
where
    S: actix_web::dev::Service<
            actix_http::Request,
            Response = ServiceResponse,
            Error = actix_web::Error,
        >,
{
    let register = test::TestRequest::post()
        .uri("/api/v1/auth/register")
        .set_json(json!({
            "email": "ada@example.com",
            "password": "correct horse",
            "displayName": "Ada",
            "role": "learner"
        }))
        .to_request();
    assert_eq!(
        test::call_service(app, register).await.status(),
        StatusCode::CREATED
    );
    let login = test::TestRequest::post()
        .uri("/api/v1/auth/login")
        .set_json(json!({"email": "ada@example.com", "password": "correct horse"}))
        .to_request();
    let body: Value = test::call_and_read_body_json(app, login).await;
    body["token"].as_str().expect("token").to_owned()
}

#[rstest]
#[case::stats("/api/v1/bookings/stats")]
#[case::calendar("/api/v1/bookings/calendar.ics")]
#[case::notification_stats("/api/v1/notifications/stats")]
#[case::badges("/api/v1/users/me/badges")]
#[case::two_factor_status("/api/v1/auth/2fa/status")]
#[actix_web::test]
async fn literal_segments_win_over_identifiers(deps: AppDependencies, #[case] uri: &str) {
    let app = test::init_service(build_app(deps)).await;
    let token = login(&app).await;

    let req = test::TestRequest::get()
        .uri(uri)
        .insert_header(("Authorization", format!("Bearer {token}")))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK, "{uri}");
}

#[rstest]
#[actix_web::test]
async fn pending_mentors_route_is_not_an_identifier(deps: AppDependencies) {
    let app = test::init_service(build_app(deps)).await;
    let token = login(&app).await;

    let req = test::TestRequest::get()
        .uri("/api/v1/admin/mentors/pending")
        .insert_header(("Authorization", format!("Bearer {token}")))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[rstest]
#[actix_web::test]
async fn changed_passwords_replace_the_old_one(deps: AppDependencies) {
    let app = test::init_service(build_app(deps)).await;
    let token = login(&app).await;

    let change = test::TestRequest::post()
        .uri("/api/v1/auth/change-password")
        .insert_header(("Authorization", format!("Bearer {token}")))
        .set_json(json!({
            "currentPassword": "correct horse",
            "newPassword": "battery staple",
            "newPasswordConfirm": "battery staple"
        }))
        .to_request();
    assert_eq!(
        test::call_service(&app, change).await.status(),
        StatusCode::NO_CONTENT
    );

    let stale = test::TestRequest::post()
        .uri("/api/v1/auth/login")
        .set_json(json!({"email": "ada@example.com", "password": "correct horse"}))
        .to_request();
    assert_eq!(
        test::call_service(&app, stale).await.status(),
        StatusCode::UNAUTHORIZED
    );
    let fresh = test::TestRequest::post()
        .uri("/api/v1/auth/login")
        .set_json(json!({"email": "ada@example.com", "password": "battery staple"}))
        .to_request();
    assert_eq!(test::call_service(&app, fresh).await.status(), StatusCode::OK);
}

#[rstest]
#[actix_web::test]
async fn protected_routes_reject_anonymous_callers(deps: AppDependencies) {
    let app = test::init_service(build_app(deps)).await;
    let req = test::TestRequest::get().uri("/api/v1/users/me").to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["code"], "unauthorized");
}

#[rstest]
#[actix_web::test]
async fn readiness_follows_the_health_state(deps: AppDependencies) {
    let health = deps.health_state.clone();
    let app = test::init_service(build_app(deps)).await;

    let before = test::call_service(
        &app,
        test::TestRequest::get().uri("/health/ready").to_request(),
    )
    .await;
    assert_eq!(before.status(), StatusCode::SERVICE_UNAVAILABLE);

    health.mark_ready();
    let after = test::call_service(
        &app,
        test::TestRequest::get().uri("/health/ready").to_request(),
    )
    .await;
    assert_eq!(after.status(), StatusCode::OK);
}

#[rstest]
#[actix_web::test]
async fn openapi_document_is_served(deps: AppDependencies) {
    let app = test::init_service(build_app(deps)).await;
    let req = test::TestRequest::get()
        .uri("/api-docs/openapi.json")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert!(body["paths"].get("/api/v1/bookings/{id}").is_some());
}
