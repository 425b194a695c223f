//! Notification inbox handlers.
//!
//! ```text
//! GET  /api/v1/notifications?unreadOnly&cursor&limit
//! POST /api/v1/notifications/read-all
//! GET  /api/v1/notifications/stats
//! POST /api/v1/notifications/{id}/read
//! ```

use std::collections::BTreeMap;

use actix_web::{HttpRequest, HttpResponse, get, post, web};
use chrono::{DateTime, Utc};
use pagination::PageParams;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::domain::{Error, Notification, NotificationKind, NotificationStats};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::Authenticated;
use crate::inbound::http::cache_control::private_no_cache_header;
use crate::inbound::http::paging::{PageBody, decode_page_key, page_body};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_uuid};

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query, rename_all = "camelCase")]
pub struct NotificationQuery {
    /// Only unread notifications when true.
    #[serde(default)]
    pub unread_only: bool,
    pub cursor: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NotificationBody {
    pub id: Uuid,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    #[schema(value_type = Object)]
    pub payload: Value,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Notification> for NotificationBody {
    fn from(notification: Notification) -> Self {
        Self {
            id: notification.id,
            kind: notification.kind,
            title: notification.title,
            message: notification.message,
            payload: notification.payload,
            is_read: notification.is_read,
            created_at: notification.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReadAllBody {
    pub updated: u64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NotificationStatsBody {
    pub total: u64,
    pub unread: u64,
    pub by_kind: BTreeMap<NotificationKind, u64>,
}

impl From<NotificationStats> for NotificationStatsBody {
    fn from(stats: NotificationStats) -> Self {
        Self {
            total: stats.total,
            unread: stats.unread,
            by_kind: stats.by_kind,
        }
    }
}

/// The caller's notifications, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/notifications",
    params(NotificationQuery),
    responses(
        (status = 200, description = "Page of notifications", body = PageBody<NotificationBody>),
        (status = 400, description = "Malformed cursor", body = Error)
    ),
    tags = ["notifications"],
    operation_id = "listNotifications"
)]
#[get("/notifications")]
pub async fn list_notifications(
    request: HttpRequest,
    state: web::Data<HttpState>,
    caller: Authenticated,
    query: web::Query<NotificationQuery>,
) -> ApiResult<HttpResponse> {
    let NotificationQuery {
        unread_only,
        cursor,
        limit,
    } = query.into_inner();
    let params = PageParams { cursor, limit };
    let before = decode_page_key(&params)?;
    let page = state
        .notifications
        .list(&caller.actor.user_id, unread_only, before, params.limit())
        .await?;
    let body = page_body(&request, page.map(NotificationBody::from))?;
    Ok(HttpResponse::Ok()
        .insert_header(private_no_cache_header())
        .json(body))
}

#[utoipa::path(
    post,
    path = "/api/v1/notifications/read-all",
    responses((status = 200, description = "Number marked read", body = ReadAllBody)),
    tags = ["notifications"],
    operation_id = "markAllNotificationsRead"
)]
#[post("/notifications/read-all")]
pub async fn mark_all_read(
    state: web::Data<HttpState>,
    caller: Authenticated,
) -> ApiResult<web::Json<ReadAllBody>> {
    let updated = state
        .notifications
        .mark_all_read(&caller.actor.user_id)
        .await?;
    Ok(web::Json(ReadAllBody { updated }))
}

#[utoipa::path(
    get,
    path = "/api/v1/notifications/stats",
    responses((status = 200, description = "Inbox counts", body = NotificationStatsBody)),
    tags = ["notifications"],
    operation_id = "notificationStats"
)]
#[get("/notifications/stats")]
pub async fn notification_stats(
    state: web::Data<HttpState>,
    caller: Authenticated,
) -> ApiResult<web::Json<NotificationStatsBody>> {
    let stats = state.notifications.stats(&caller.actor.user_id).await?;
    Ok(web::Json(NotificationStatsBody::from(stats)))
}

#[utoipa::path(
    post,
    path = "/api/v1/notifications/{id}/read",
    params(("id" = String, Path, description = "Notification identifier")),
    responses(
        (status = 204, description = "Marked read"),
        (status = 404, description = "Unknown or not owned", body = Error)
    ),
    tags = ["notifications"],
    operation_id = "markNotificationRead"
)]
#[post("/notifications/{id}/read")]
pub async fn mark_read(
    state: web::Data<HttpState>,
    caller: Authenticated,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id = parse_uuid(path.into_inner(), FieldName::new("id"))?;
    state
        .notifications
        .mark_read(&caller.actor.user_id, &id)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::Role;
    use crate::inbound::http::test_utils::{TestPorts, bearer, user};
    use actix_web::http::StatusCode;
    use actix_web::{App, test as actix_test};
    use pagination::Paginated;
    use rstest::rstest;
    use serde_json::json;

    async fn call(
        state: web::Data<HttpState>,
        req: actix_test::TestRequest,
    ) -> actix_web::dev::ServiceResponse {
        let app = actix_test::init_service(
            App::new().app_data(state).service(
                web::scope("/api/v1")
                    .service(list_notifications)
                    .service(mark_all_read)
                    .service(notification_stats)
                    .service(mark_read),
            ),
        )
        .await;
        actix_test::call_service(&app, req.to_request()).await
    }

    #[rstest]
    #[actix_web::test]
    async fn unread_filter_reaches_the_inbox() {
        let caller = user(Role::Learner);
        let caller_id = caller.id;
        let mut ports = TestPorts::authenticating(&caller);
        ports
            .notifications
            .expect_list()
            .withf(move |user_id, unread_only, before, limit| {
                *user_id == caller_id && *unread_only && before.is_none() && *limit == 50
            })
            .returning(move |user_id, _, _, limit| {
                Ok(Paginated {
                    data: vec![Notification {
                        id: Uuid::new_v4(),
                        user_id: *user_id,
                        kind: NotificationKind::BookingConfirmed,
                        title: "Booking confirmed".to_owned(),
                        message: "Your session is confirmed".to_owned(),
                        payload: json!({"bookingId": Uuid::nil()}),
                        is_read: false,
                        created_at: Utc::now(),
                    }],
                    limit,
                    next_cursor: None,
                })
            });

        let res = call(
            ports.into_state(),
            actix_test::TestRequest::get()
                .uri("/api/v1/notifications?unreadOnly=true")
                .insert_header(bearer()),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body["data"][0]["kind"], json!("booking_confirmed"));
        assert_eq!(body["data"][0]["isRead"], json!(false));
        assert!(body["links"].get("next").is_none());
    }

    #[rstest]
    #[actix_web::test]
    async fn read_all_reports_the_update_count() {
        let caller = user(Role::Mentor);
        let mut ports = TestPorts::authenticating(&caller);
        ports
            .notifications
            .expect_mark_all_read()
            .returning(|_| Ok(4));

        let res = call(
            ports.into_state(),
            actix_test::TestRequest::post()
                .uri("/api/v1/notifications/read-all")
                .insert_header(bearer()),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body, json!({"updated": 4}));
    }

    #[rstest]
    #[actix_web::test]
    async fn stats_group_by_kind() {
        let caller = user(Role::Mentor);
        let mut ports = TestPorts::authenticating(&caller);
        ports.notifications.expect_stats().returning(|_| {
            Ok(NotificationStats {
                total: 3,
                unread: 1,
                by_kind: BTreeMap::from([
                    (NotificationKind::BookingRequest, 2),
                    (NotificationKind::ReviewReceived, 1),
                ]),
            })
        });

        let res = call(
            ports.into_state(),
            actix_test::TestRequest::get()
                .uri("/api/v1/notifications/stats")
                .insert_header(bearer()),
        )
        .await;
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(
            body,
            json!({
                "total": 3,
                "unread": 1,
                "byKind": {"booking_request": 2, "review_received": 1}
            })
        );
    }

    #[rstest]
    #[actix_web::test]
    async fn foreign_notifications_are_not_found() {
        let caller = user(Role::Learner);
        let mut ports = TestPorts::authenticating(&caller);
        ports
            .notifications
            .expect_mark_read()
            .returning(|_, id| Err(Error::not_found(format!("notification {id} not found"))));

        let res = call(
            ports.into_state(),
            actix_test::TestRequest::post()
                .uri(&format!("/api/v1/notifications/{}/read", Uuid::new_v4()))
                .insert_header(bearer()),
        )
        .await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }
}
