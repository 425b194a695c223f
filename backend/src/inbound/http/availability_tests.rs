//! Tests for availability handlers.

use super::*;
use crate::domain::ports::GeneratedSlots;
use crate::domain::{Role, UserId};
use crate::inbound::http::test_utils::{TestPorts, bearer, user};
use actix_web::http::StatusCode;
use actix_web::{App, test as actix_test};
use chrono::{NaiveDate, TimeZone, Weekday};
use rstest::rstest;
use serde_json::{Value, json};

async fn send(state: web::Data<HttpState>, req: actix_test::TestRequest) -> (StatusCode, Value) {
    let app = actix_test::init_service(
        App::new().app_data(state).service(
            web::scope("/api/v1")
                .service(weekly_rules)
                .service(replace_weekly_rules)
                .service(generate_slots)
                .service(create_slot)
                .service(list_slots)
                .service(delete_slot)
                .service(create_exception)
                .service(list_exceptions)
                .service(delete_exception)
                .service(settings)
                .service(update_settings)
                .service(mentor_open_slots),
        ),
    )
    .await;
    let res = actix_test::call_service(&app, req.to_request()).await;
    let status = res.status();
    let body = actix_test::read_body(res).await;
    let value = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).expect("JSON body")
    };
    (status, value)
}

fn slot(mentor_id: UserId, hour: u32) -> AvailabilitySlot {
    let start = Utc
        .with_ymd_and_hms(2030, 1, 7, hour, 0, 0)
        .single()
        .expect("instant");
    AvailabilitySlot {
        id: Uuid::new_v4(),
        mentor_id,
        start_utc: start,
        end_utc: start + chrono::Duration::hours(1),
        is_booked: false,
        created_at: start - chrono::Duration::days(7),
    }
}

#[rstest]
#[actix_web::test]
async fn weekly_rules_round_trip_local_times() {
    let mentor = user(Role::Mentor);
    let mentor_id = mentor.id;
    let mut ports = TestPorts::authenticating(&mentor);
    ports
        .availability
        .expect_replace_weekly_rules()
        .withf(|_, windows| {
            windows.len() == 1
                && windows[0].weekday == Weekday::Tue
                && windows[0].start_time == NaiveTime::from_hms_opt(9, 0, 0).expect("time")
        })
        .returning(move |_, windows| {
            Ok(windows
                .into_iter()
                .map(|window| WeeklyRule {
                    id: Uuid::new_v4(),
                    mentor_id,
                    window,
                })
                .collect())
        });

    let (status, body) = send(
        ports.into_state(),
        actix_test::TestRequest::put()
            .uri("/api/v1/availability/weekly")
            .insert_header(bearer())
            .set_json(json!({"rules": [{"weekday": 1, "startTime": "09:00", "endTime": "12:30"}]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["weekday"], json!(1));
    assert_eq!(body[0]["startTime"], json!("09:00"));
    assert_eq!(body[0]["endTime"], json!("12:30"));
}

#[rstest]
#[case::weekday(json!({"weekday": 7, "startTime": "09:00", "endTime": "10:00"}), "weekday")]
#[case::order(json!({"weekday": 0, "startTime": "11:00", "endTime": "10:00"}), "endTime")]
#[case::format(json!({"weekday": 0, "startTime": "9am", "endTime": "10:00"}), "startTime")]
#[actix_web::test]
async fn weekly_rules_reject_invalid_windows(#[case] rule: Value, #[case] field: &str) {
    let mentor = user(Role::Mentor);
    let (status, body) = send(
        TestPorts::authenticating(&mentor).into_state(),
        actix_test::TestRequest::put()
            .uri("/api/v1/availability/weekly")
            .insert_header(bearer())
            .set_json(json!({"rules": [rule]})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["field"], json!(field));
}

#[rstest]
#[actix_web::test]
async fn inverted_slots_are_rejected_before_the_service() {
    let mentor = user(Role::Mentor);
    let (status, body) = send(
        TestPorts::authenticating(&mentor).into_state(),
        actix_test::TestRequest::post()
            .uri("/api/v1/availability/slots")
            .insert_header(bearer())
            .set_json(json!({
                "startUtc": "2030-01-07T11:00:00Z",
                "endUtc": "2030-01-07T10:00:00Z"
            })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], json!("start must be before end"));
}

#[rstest]
#[actix_web::test]
async fn overlapping_slots_conflict() {
    let mentor = user(Role::Mentor);
    let mut ports = TestPorts::authenticating(&mentor);
    ports
        .availability
        .expect_create_slot()
        .returning(|_, _| Err(Error::conflict("slot overlaps an existing slot")));

    let (status, _) = send(
        ports.into_state(),
        actix_test::TestRequest::post()
            .uri("/api/v1/availability/slots")
            .insert_header(bearer())
            .set_json(json!({
                "startUtc": "2030-01-07T10:00:00Z",
                "endUtc": "2030-01-07T11:00:00Z"
            })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[rstest]
#[actix_web::test]
async fn generation_reports_created_and_skipped_counts() {
    let mentor = user(Role::Mentor);
    let mentor_id = mentor.id;
    let mut ports = TestPorts::authenticating(&mentor);
    ports
        .availability
        .expect_generate_slots()
        .withf(|_, request| {
            request.start_date == NaiveDate::from_ymd_opt(2030, 1, 7).expect("date")
                && request.session_minutes == Some(60)
                && request.break_minutes == Some(15)
                && request
                    .pattern
                    .as_ref()
                    .is_some_and(|pattern| pattern.weekdays == [0, 2])
        })
        .returning(move |_, _| {
            Ok(GeneratedSlots {
                slots: vec![slot(mentor_id, 9), slot(mentor_id, 10)],
                skipped_count: 3,
            })
        });

    let (status, body) = send(
        ports.into_state(),
        actix_test::TestRequest::post()
            .uri("/api/v1/availability/slots/generate")
            .insert_header(bearer())
            .set_json(json!({
                "startDate": "2030-01-07",
                "endDate": "2030-01-20",
                "pattern": {"weekdays": [0, 2], "startTime": "09:00", "endTime": "12:00"},
                "sessionDurationMinutes": 60,
                "breakDurationMinutes": 15
            })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["createdCount"], json!(2));
    assert_eq!(body["skippedCount"], json!(3));
    assert_eq!(body["slots"].as_array().map(Vec::len), Some(2));
}

#[rstest]
#[actix_web::test]
async fn generation_rejects_malformed_dates() {
    let mentor = user(Role::Mentor);
    let (status, body) = send(
        TestPorts::authenticating(&mentor).into_state(),
        actix_test::TestRequest::post()
            .uri("/api/v1/availability/slots/generate")
            .insert_header(bearer())
            .set_json(json!({"startDate": "07/01/2030", "endDate": "2030-01-20"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["code"], json!("invalid_date"));
}

#[rstest]
#[actix_web::test]
async fn booked_slots_cannot_be_deleted() {
    let mentor = user(Role::Mentor);
    let mut ports = TestPorts::authenticating(&mentor);
    let target = Uuid::new_v4();
    ports
        .availability
        .expect_delete_slot()
        .withf(move |_, id| *id == target)
        .returning(|_, _| Err(Error::conflict("slot is booked")));

    let (status, _) = send(
        ports.into_state(),
        actix_test::TestRequest::delete()
            .uri(&format!("/api/v1/availability/slots/{target}"))
            .insert_header(bearer()),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[rstest]
#[actix_web::test]
async fn exceptions_carry_their_reason() {
    let mentor = user(Role::Mentor);
    let mentor_id = mentor.id;
    let mut ports = TestPorts::authenticating(&mentor);
    ports
        .availability
        .expect_create_exception()
        .withf(|_, _, reason| reason.as_deref() == Some("Holiday"))
        .returning(move |_, interval, reason| {
            Ok(AvailabilityException {
                id: Uuid::new_v4(),
                mentor_id,
                start_utc: interval.start(),
                end_utc: interval.end(),
                reason: reason.unwrap_or_default(),
            })
        });

    let (status, body) = send(
        ports.into_state(),
        actix_test::TestRequest::post()
            .uri("/api/v1/availability/exceptions")
            .insert_header(bearer())
            .set_json(json!({
                "startUtc": "2030-02-01T00:00:00Z",
                "endUtc": "2030-02-08T00:00:00Z",
                "reason": "Holiday"
            })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["reason"], json!("Holiday"));
    assert_eq!(body["startUtc"], json!("2030-02-01T00:00:00Z"));
}

#[rstest]
#[actix_web::test]
async fn missing_settings_report_defaults() {
    let mentor = user(Role::Mentor);
    let mut ports = TestPorts::authenticating(&mentor);
    ports
        .availability
        .expect_settings()
        .returning(|_| Ok(AvailabilitySettings::default()));

    let (status, body) = send(
        ports.into_state(),
        actix_test::TestRequest::get()
            .uri("/api/v1/availability/settings")
            .insert_header(bearer()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "minBookingNoticeHours": 2,
            "maxBookingAdvanceDays": 90,
            "defaultSessionMinutes": 60
        })
    );
}

#[rstest]
#[actix_web::test]
async fn open_slots_are_public_and_accept_ranges() {
    let mut ports = TestPorts::default();
    let mentor_id = UserId::random();
    ports
        .availability
        .expect_open_slots()
        .withf(move |id, from, to| *id == mentor_id && from.is_some() && to.is_none())
        .returning(move |_, _, _| Ok(vec![slot(mentor_id, 9)]));

    let (status, body) = send(
        ports.into_state(),
        actix_test::TestRequest::get()
            .uri(&format!("/api/v1/mentors/{mentor_id}/slots?from=2030-01-07T00:00:00Z")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["isBooked"], json!(false));
}

#[rstest]
#[actix_web::test]
async fn open_slots_reject_malformed_bounds() {
    let mentor_id = UserId::random();
    let (status, body) = send(
        TestPorts::default().into_state(),
        actix_test::TestRequest::get()
            .uri(&format!("/api/v1/mentors/{mentor_id}/slots?to=tomorrow")),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["field"], json!("to"));
}
