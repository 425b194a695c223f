//! Server construction and middleware wiring.

mod config;
#[cfg(feature = "metrics")]
mod metrics;
mod state_builders;

pub use config::{ServerConfig, ServerSettings, ServiceOptions};
#[cfg(feature = "metrics")]
pub(crate) use metrics::make_metrics;

#[cfg(feature = "metrics")]
use metrics::MetricsLayer;
use state_builders::{AdapterStates, build_adapter_states};

use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};

use mentorship::Trace;
use mentorship::doc::ApiDoc;
use mentorship::inbound::http::error::{json_config, query_config};
use mentorship::inbound::http::health::{HealthState, live, ready};
use mentorship::inbound::http::state::HttpState;
use mentorship::inbound::http::{
    accounts, ai, analytics, availability, badges, bookings, chat, dashboard, notifications,
    reviews, search, skills, two_factor, webhooks,
};
use mentorship::inbound::ws;
use mentorship::inbound::ws::state::WsState;
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

/// Register every `/api/v1` handler.
///
/// Actix matches in registration order, so literal segments such as
/// `/bookings/stats` are registered before their `{id}` siblings.
pub fn api_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(accounts::register)
        .service(accounts::login)
        .service(accounts::logout)
        .service(badges::my_badges)
        .service(accounts::current_user)
        .service(accounts::update_current_user)
        .service(accounts::change_password)
        .service(two_factor::status)
        .service(two_factor::setup)
        .service(two_factor::enable)
        .service(two_factor::disable)
        .service(two_factor::recovery_codes)
        .service(two_factor::verify)
        .service(accounts::pending_mentors)
        .service(accounts::approve_mentor)
        .service(accounts::list_mentors)
        .service(skills::set_mentor_skills)
        .service(skills::mentor_skills)
        .service(availability::mentor_open_slots)
        .service(reviews::mentor_reviews)
        .service(reviews::mentor_rating)
        .service(accounts::mentor_profile)
        .service(skills::list_skills)
        .service(skills::create_skill)
        .service(availability::weekly_rules)
        .service(availability::replace_weekly_rules)
        .service(availability::generate_slots)
        .service(availability::create_slot)
        .service(availability::list_slots)
        .service(availability::delete_slot)
        .service(availability::create_exception)
        .service(availability::list_exceptions)
        .service(availability::delete_exception)
        .service(availability::settings)
        .service(availability::update_settings)
        .service(bookings::calendar)
        .service(bookings::stats)
        .service(bookings::create_booking)
        .service(bookings::list_bookings)
        .service(bookings::booking_calendar)
        .service(bookings::get_booking)
        .service(bookings::confirm_booking)
        .service(bookings::decline_booking)
        .service(bookings::cancel_booking)
        .service(bookings::complete_booking)
        .service(bookings::booking_feedback)
        .service(reviews::submit_review)
        .service(reviews::mark_helpful)
        .service(chat::open_room)
        .service(chat::list_rooms)
        .service(chat::list_messages)
        .service(chat::post_message)
        .service(chat::edit_message)
        .service(chat::delete_message)
        .service(notifications::mark_all_read)
        .service(notifications::notification_stats)
        .service(notifications::list_notifications)
        .service(notifications::mark_read)
        .service(search::search_mentors)
        .service(dashboard::dashboard)
        .service(analytics::platform_analytics)
        .service(analytics::skill_analytics)
        .service(ai::session_summary)
        .service(ai::recommendations)
        .service(ai::ask)
        .service(ai::history)
        .service(webhooks::receive_webhook)
        .service(badges::list_badges);
}

#[derive(Clone)]
struct AppDependencies {
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
    ws_state: web::Data<WsState>,
}

fn build_app(
    deps: AppDependencies,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let AppDependencies {
        health_state,
        http_state,
        ws_state,
    } = deps;

    let app = App::new()
        .app_data(health_state)
        .app_data(http_state)
        .app_data(ws_state)
        .app_data(json_config())
        .app_data(query_config())
        .wrap(Trace)
        .service(web::scope("/api/v1").configure(api_routes))
        .service(ws::ws_entry)
        .service(ready)
        .service(live);

    #[cfg(debug_assertions)]
    let app = app.service(SwaggerUi::new("/docs").url(OPENAPI_PATH, ApiDoc::openapi()));
    #[cfg(not(debug_assertions))]
    let app = app.route(OPENAPI_PATH, web::get().to(openapi_document));

    app
}

const OPENAPI_PATH: &str = "/api-docs/openapi.json";

/// Serve the OpenAPI document without Swagger UI in release builds.
#[cfg(not(debug_assertions))]
async fn openapi_document() -> actix_web::HttpResponse {
    actix_web::HttpResponse::Ok().json(ApiDoc::openapi())
}

/// Construct an Actix HTTP server using the provided health state and configuration.
///
/// # Errors
/// Propagates [`std::io::Error`] when the adapters cannot be built or the
/// socket cannot be bound.
pub fn create_server(
    health_state: web::Data<HealthState>,
    config: ServerConfig,
) -> std::io::Result<Server> {
    let server_health_state = health_state.clone();
    let AdapterStates { http, ws } = build_adapter_states(&config)?;
    let ServerConfig {
        bind_addr,
        #[cfg(feature = "metrics")]
        prometheus,
        ..
    } = config;

    #[cfg(feature = "metrics")]
    let metrics_layer = MetricsLayer::from_option(prometheus);

    let server = HttpServer::new(move || {
        let app = build_app(AppDependencies {
            health_state: server_health_state.clone(),
            http_state: http.clone(),
            ws_state: ws.clone(),
        });

        #[cfg(feature = "metrics")]
        let app = app.wrap(metrics_layer.clone());

        app
    })
    .bind(bind_addr)?
    .run();

    health_state.mark_ready();
    Ok(server)
}

#[cfg(test)]
#[path = "tests.rs"]
mod tests;
