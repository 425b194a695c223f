//! Tests for chat REST handlers.

use super::*;
use crate::domain::{ChatMessage, ChatRoom, ParticipantPair, Role, UserId};
use crate::inbound::http::test_utils::{TestPorts, bearer, user};
use actix_web::http::StatusCode;
use actix_web::{App, test as actix_test};
use chrono::{TimeZone, Utc};
use pagination::Paginated;
use rstest::rstest;
use serde_json::{Value, json};
use uuid::Uuid;

async fn send(state: web::Data<HttpState>, req: actix_test::TestRequest) -> (StatusCode, Value) {
    let app = actix_test::init_service(
        App::new().app_data(state).service(
            web::scope("/api/v1")
                .service(open_room)
                .service(list_rooms)
                .service(list_messages)
                .service(post_message)
                .service(edit_message)
                .service(delete_message),
        ),
    )
    .await;
    let res = actix_test::call_service(&app, req.to_request()).await;
    let status = res.status();
    let body: Value = actix_test::read_body_json(res).await;
    (status, body)
}

fn message(room_id: Uuid, sender_id: UserId, content: &str) -> ChatMessage {
    ChatMessage {
        id: Uuid::new_v4(),
        room_id,
        sender_id,
        content: content.to_owned(),
        edited_at: None,
        deleted: false,
        created_at: Utc
            .with_ymd_and_hms(2030, 1, 1, 9, 0, 0)
            .single()
            .expect("instant"),
    }
}

#[rstest]
#[actix_web::test]
async fn opening_a_room_returns_sorted_participants() {
    let learner = user(Role::Learner);
    let learner_id = learner.id;
    let other = UserId::random();
    let mut ports = TestPorts::authenticating(&learner);
    ports
        .chat
        .expect_open_room()
        .withf(move |actor, participant| actor.user_id == learner_id && *participant == other)
        .returning(move |_, participant| {
            Ok(ChatRoom {
                id: Uuid::new_v4(),
                participants: ParticipantPair::new(learner_id, *participant)
                    .expect("distinct users"),
                created_at: Utc::now(),
            })
        });

    let (status, body) = send(
        ports.into_state(),
        actix_test::TestRequest::post()
            .uri("/api/v1/chat/rooms")
            .insert_header(bearer())
            .set_json(json!({"participantId": other})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let ids = body["participantIds"].as_array().expect("participant ids");
    assert_eq!(ids.len(), 2);
    assert!(ids[0].as_str() < ids[1].as_str());
}

#[rstest]
#[actix_web::test]
async fn self_chat_is_a_bad_request() {
    let learner = user(Role::Learner);
    let learner_id = learner.id;
    let mut ports = TestPorts::authenticating(&learner);
    ports
        .chat
        .expect_open_room()
        .returning(|_, _| Err(Error::invalid_request("cannot open a chat with yourself")));

    let (status, _) = send(
        ports.into_state(),
        actix_test::TestRequest::post()
            .uri("/api/v1/chat/rooms")
            .insert_header(bearer())
            .set_json(json!({"participantId": learner_id})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[rstest]
#[actix_web::test]
async fn message_pages_include_links() {
    let learner = user(Role::Learner);
    let sender = learner.id;
    let room_id = Uuid::new_v4();
    let mut ports = TestPorts::authenticating(&learner);
    ports
        .chat
        .expect_messages()
        .withf(move |_, room, before, limit| *room == room_id && before.is_none() && *limit == 1)
        .returning(move |_, room, _, limit| {
            Ok(Paginated {
                data: vec![message(*room, sender, "hello")],
                limit,
                next_cursor: Some("next-token".to_owned()),
            })
        });

    let (status, body) = send(
        ports.into_state(),
        actix_test::TestRequest::get()
            .uri(&format!("/api/v1/chat/rooms/{room_id}/messages?limit=1"))
            .insert_header(bearer()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["content"], json!("hello"));
    assert_eq!(body["nextCursor"], json!("next-token"));
    let next = body["links"]["next"].as_str().expect("next link");
    assert!(next.ends_with("cursor=next-token&limit=1"));
}

#[rstest]
#[actix_web::test]
async fn malformed_cursors_are_rejected() {
    let learner = user(Role::Learner);
    let (status, body) = send(
        TestPorts::authenticating(&learner).into_state(),
        actix_test::TestRequest::get()
            .uri(&format!(
                "/api/v1/chat/rooms/{}/messages?cursor=!!",
                Uuid::new_v4()
            ))
            .insert_header(bearer()),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["field"], json!("cursor"));
}

#[rstest]
#[actix_web::test]
async fn posting_returns_created() {
    let learner = user(Role::Learner);
    let sender = learner.id;
    let mut ports = TestPorts::authenticating(&learner);
    ports
        .chat
        .expect_post()
        .withf(|_, _, content| content == "hi there")
        .returning(move |_, room, content| Ok(message(*room, sender, content)));

    let (status, body) = send(
        ports.into_state(),
        actix_test::TestRequest::post()
            .uri(&format!("/api/v1/chat/rooms/{}/messages", Uuid::new_v4()))
            .insert_header(bearer())
            .set_json(json!({"content": "hi there"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["senderId"], json!(sender.as_uuid()));
}

#[rstest]
#[actix_web::test]
async fn editing_someone_elses_message_is_forbidden() {
    let learner = user(Role::Learner);
    let mut ports = TestPorts::authenticating(&learner);
    ports
        .chat
        .expect_edit()
        .returning(|_, _, _| Err(Error::forbidden("only the sender may edit a message")));

    let (status, _) = send(
        ports.into_state(),
        actix_test::TestRequest::patch()
            .uri(&format!("/api/v1/chat/messages/{}", Uuid::new_v4()))
            .insert_header(bearer())
            .set_json(json!({"content": "changed"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[rstest]
#[actix_web::test]
async fn deletion_blanks_the_content() {
    let learner = user(Role::Learner);
    let sender = learner.id;
    let mut ports = TestPorts::authenticating(&learner);
    ports.chat.expect_delete().returning(move |_, _| {
        let mut gone = message(Uuid::new_v4(), sender, "");
        gone.deleted = true;
        Ok(gone)
    });

    let (status, body) = send(
        ports.into_state(),
        actix_test::TestRequest::delete()
            .uri(&format!("/api/v1/chat/messages/{}", Uuid::new_v4()))
            .insert_header(bearer()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deleted"], json!(true));
    assert_eq!(body["content"], json!(""));
}
