//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every REST handler under `/api/v1` plus the health
//! health checks, the bearer-token security scheme, and the response schemas.
//! Request and nested schemas referenced by the handlers are collected
//! automatically.
//!
//! The generated document is served by Swagger UI at `/docs` and exported
//! via `cargo run --bin openapi-dump` for external tooling.

use crate::domain::{Error, ErrorCode};
use crate::inbound::http::schemas::{
    BookingBody, ChatMessageBody, ChatRoomBody, MentorBody, MentorCardBody, RatingBody, SkillBody,
    UserBody,
};
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Name of the bearer security scheme in the generated document.
pub const BEARER_SCHEME: &str = "BearerToken";

/// Enrich the generated document with the bearer token security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        let mut scheme = Http::new(HttpAuthScheme::Bearer);
        scheme.description = Some("Opaque token issued by POST /api/v1/auth/login.".to_owned());
        components.add_security_scheme(BEARER_SCHEME, SecurityScheme::Http(scheme));
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Mentorship marketplace API",
        description = "Accounts, availability, bookings, reviews, chat and notifications for a mentoring marketplace.",
        license(
            name = "Apache-2.0",
            url = "https://www.apache.org/licenses/LICENSE-2.0.html"
        )
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("BearerToken" = [])),
    paths(
        crate::inbound::http::accounts::register,
        crate::inbound::http::accounts::login,
        crate::inbound::http::accounts::logout,
        crate::inbound::http::accounts::change_password,
        crate::inbound::http::two_factor::status,
        crate::inbound::http::two_factor::setup,
        crate::inbound::http::two_factor::enable,
        crate::inbound::http::two_factor::disable,
        crate::inbound::http::two_factor::recovery_codes,
        crate::inbound::http::two_factor::verify,
        crate::inbound::http::accounts::current_user,
        crate::inbound::http::accounts::update_current_user,
        crate::inbound::http::accounts::list_mentors,
        crate::inbound::http::accounts::mentor_profile,
        crate::inbound::http::accounts::pending_mentors,
        crate::inbound::http::accounts::approve_mentor,
        crate::inbound::http::skills::list_skills,
        crate::inbound::http::skills::create_skill,
        crate::inbound::http::skills::set_mentor_skills,
        crate::inbound::http::skills::mentor_skills,
        crate::inbound::http::availability::weekly_rules,
        crate::inbound::http::availability::replace_weekly_rules,
        crate::inbound::http::availability::create_slot,
        crate::inbound::http::availability::list_slots,
        crate::inbound::http::availability::generate_slots,
        crate::inbound::http::availability::delete_slot,
        crate::inbound::http::availability::create_exception,
        crate::inbound::http::availability::list_exceptions,
        crate::inbound::http::availability::delete_exception,
        crate::inbound::http::availability::settings,
        crate::inbound::http::availability::update_settings,
        crate::inbound::http::availability::mentor_open_slots,
        crate::inbound::http::bookings::create_booking,
        crate::inbound::http::bookings::list_bookings,
        crate::inbound::http::bookings::calendar,
        crate::inbound::http::bookings::stats,
        crate::inbound::http::bookings::get_booking,
        crate::inbound::http::bookings::confirm_booking,
        crate::inbound::http::bookings::decline_booking,
        crate::inbound::http::bookings::cancel_booking,
        crate::inbound::http::bookings::complete_booking,
        crate::inbound::http::bookings::booking_feedback,
        crate::inbound::http::bookings::booking_calendar,
        crate::inbound::http::reviews::submit_review,
        crate::inbound::http::reviews::mentor_reviews,
        crate::inbound::http::reviews::mentor_rating,
        crate::inbound::http::reviews::mark_helpful,
        crate::inbound::http::chat::open_room,
        crate::inbound::http::chat::list_rooms,
        crate::inbound::http::chat::list_messages,
        crate::inbound::http::chat::post_message,
        crate::inbound::http::chat::edit_message,
        crate::inbound::http::chat::delete_message,
        crate::inbound::http::notifications::list_notifications,
        crate::inbound::http::notifications::mark_all_read,
        crate::inbound::http::notifications::notification_stats,
        crate::inbound::http::notifications::mark_read,
        crate::inbound::http::search::search_mentors,
        crate::inbound::http::dashboard::dashboard,
        crate::inbound::http::analytics::platform_analytics,
        crate::inbound::http::analytics::skill_analytics,
        crate::inbound::http::ai::session_summary,
        crate::inbound::http::ai::recommendations,
        crate::inbound::http::ai::ask,
        crate::inbound::http::ai::history,
        crate::inbound::http::webhooks::receive_webhook,
        crate::inbound::http::badges::list_badges,
        crate::inbound::http::badges::my_badges,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        Error,
        ErrorCode,
        UserBody,
        MentorBody,
        MentorCardBody,
        SkillBody,
        RatingBody,
        BookingBody,
        ChatRoomBody,
        ChatMessageBody,
    )),
    tags(
        (name = "accounts", description = "Registration, login and the caller's profile"),
        (name = "users", description = "Profiles and administration"),
        (name = "mentors", description = "Public mentor directory and search"),
        (name = "skills", description = "Skill catalogue and mentor proficiencies"),
        (name = "availability", description = "Mentor weekly rules, slots and exceptions"),
        (name = "bookings", description = "Session booking lifecycle and calendar export"),
        (name = "reviews", description = "Post-session reviews and ratings"),
        (name = "chat", description = "Direct messaging; realtime delivery uses /ws/chat/{room_id}"),
        (name = "notifications", description = "In-app notification inbox"),
        (name = "two-factor", description = "Authenticator enrolment, recovery codes and login challenges"),
        (name = "dashboard", description = "Role-specific summaries"),
        (name = "analytics", description = "Platform and per-skill activity over a trailing window"),
        (name = "ai", description = "Language-model assistance"),
        (name = "webhooks", description = "Signed third-party callbacks"),
        (name = "badges", description = "Achievement catalogue and awards"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    //! Regression coverage for the generated document.

    use super::*;
    use utoipa::OpenApi;
    use utoipa::openapi::RefOr;
    use utoipa::openapi::schema::Schema;

    fn schema_fields(name: &str) -> Vec<String> {
        let doc = ApiDoc::openapi();
        let schemas = &doc.components.as_ref().expect("components").schemas;
        let schema = schemas
            .iter()
            .find(|(key, _)| key.ends_with(name))
            .map(|(_, schema)| schema)
            .unwrap_or_else(|| panic!("{name} schema registered"));
        match schema {
            RefOr::T(Schema::Object(obj)) => obj.properties.keys().cloned().collect(),
            _ => panic!("expected Object schema for {name}"),
        }
    }

    #[test]
    fn documented_paths_are_stable() {
        let doc = ApiDoc::openapi();
        let paths: Vec<String> = doc
            .paths
            .paths
            .iter()
            .flat_map(|(path, item)| {
                let mut methods = Vec::new();
                for (method, op) in [
                    ("GET", &item.get),
                    ("POST", &item.post),
                    ("PUT", &item.put),
                    ("PATCH", &item.patch),
                    ("DELETE", &item.delete),
                ] {
                    if op.is_some() {
                        methods.push(format!("{method} {path}"));
                    }
                }
                methods
            })
            .collect();
        insta::assert_json_snapshot!("documented_paths", paths);
    }

    #[test]
    fn error_schema_has_code_and_message() {
        let fields = schema_fields("Error");
        assert!(fields.iter().any(|f| f == "code"));
        assert!(fields.iter().any(|f| f == "message"));
    }

    #[test]
    fn user_schema_is_camel_case() {
        let fields = schema_fields("UserBody");
        assert!(fields.iter().any(|f| f == "displayName"));
        assert!(fields.iter().any(|f| f == "hourlyRateCents"));
    }

    #[test]
    fn analytics_schema_lists_trends() {
        let fields = schema_fields("PlatformAnalyticsBody");
        assert!(fields.iter().any(|f| f == "growthTrends"));
        assert!(fields.iter().any(|f| f == "topSkills"));
    }

    #[test]
    fn bearer_scheme_is_registered() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key(BEARER_SCHEME));
    }
}
