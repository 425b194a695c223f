//! Chat socket tests against a bound listener.

use super::*;
use crate::domain::ports::{MockAccountService, MockChatService};
use crate::domain::{ChatMessage, ChatRoom, ParticipantPair, Role, User};
use crate::inbound::http::test_utils::{TOKEN, user};
use crate::inbound::ws::{self, OriginPolicy, WsState};
use actix_web::{App, HttpServer, http::StatusCode, http::header};
use awc::error::WsClientError;
use awc::{BoxedSocket, ws::Codec, ws::Frame};
use chrono::Utc;
use futures_util::{SinkExt, StreamExt};
use rstest::rstest;
use serde_json::{Value, json};

type Socket = actix_codec::Framed<BoxedSocket, Codec>;

const ORIGIN: &str = "http://localhost:3000";

struct Fixture {
    caller: User,
    peer: User,
    room: ChatRoom,
    hub: Arc<ChatHub>,
    accounts: MockAccountService,
    chat: MockChatService,
}

impl Fixture {
    fn new() -> Self {
        let caller = user(Role::Learner);
        let peer = user(Role::Mentor);
        let room = ChatRoom {
            id: Uuid::new_v4(),
            participants: ParticipantPair::new(caller.id, peer.id).expect("pair"),
            created_at: Utc::now(),
        };
        let mut accounts = MockAccountService::new();
        let (learner, mentor) = (caller.clone(), peer.clone());
        accounts.expect_authenticate().returning(move |token| {
            match token.expose() {
                TOKEN => Ok(learner.clone()),
                "peer-token" => Ok(mentor.clone()),
                _ => Err(Error::unauthorized("invalid or expired token")),
            }
        });
        let mut chat = MockChatService::new();
        let known = room.clone();
        chat.expect_room().returning(move |actor, room_id| {
            if *room_id == known.id && known.participants.contains(actor.user_id) {
                Ok(known.clone())
            } else {
                Err(Error::not_found(format!("chat room {room_id} not found")))
            }
        });
        Self {
            caller,
            peer,
            room,
            hub: Arc::new(ChatHub::new()),
            accounts,
            chat,
        }
    }

    fn serve(self) -> (String, Served) {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind test listener");
        let addr = listener.local_addr().expect("listener addr");
        let state = WsState::new(
            Arc::new(self.accounts),
            Arc::new(self.chat),
            Arc::clone(&self.hub),
            OriginPolicy::new("mentors.example"),
        );
        let server = HttpServer::new(move || {
            App::new()
                .app_data(actix_web::web::Data::new(state.clone()))
                .service(ws::ws_entry)
        })
        .listen(listener)
        .expect("bind test server")
        .disable_signals()
        .run();
        actix_web::rt::spawn(server);
        (
            format!("http://{addr}"),
            Served {
                caller: self.caller,
                peer: self.peer,
                room: self.room,
            },
        )
    }
}

/// What a test still needs once the mocks have moved into the server.
struct Served {
    caller: User,
    peer: User,
    room: ChatRoom,
}

async fn connect(url: &str, room_id: Uuid, token: &str) -> Result<Socket, WsClientError> {
    let (_resp, socket) = awc::Client::default()
        .ws(format!("{url}/ws/chat/{room_id}?token={token}"))
        .set_header(header::ORIGIN, ORIGIN)
        .connect()
        .await?;
    Ok(socket)
}

async fn next_json(socket: &mut Socket) -> Value {
    loop {
        let frame = socket.next().await.expect("response frame").expect("frame");
        match frame {
            Frame::Text(bytes) => return serde_json::from_slice(&bytes).expect("json"),
            Frame::Ping(_) | Frame::Pong(_) => continue,
            other => panic!("expected text frame, got {other:?}"),
        }
    }
}

async fn send_text(socket: &mut Socket, text: String) {
    socket
        .send(awc::ws::Message::Text(text.into()))
        .await
        .expect("send text");
}

fn rejection_status(error: WsClientError) -> StatusCode {
    match error {
        WsClientError::InvalidResponseStatus(status) => status,
        other => panic!("expected HTTP rejection, got {other:?}"),
    }
}

#[rstest]
#[actix_rt::test]
async fn posted_messages_reach_the_sender_through_the_hub() {
    let mut fixture = Fixture::new();
    let hub = Arc::clone(&fixture.hub);
    fixture
        .chat
        .expect_post()
        .withf(|_, _, content| content == "hello there")
        .returning(move |actor, room_id, content| {
            let message = ChatMessage {
                id: Uuid::new_v4(),
                room_id: *room_id,
                sender_id: actor.user_id,
                content: content.to_owned(),
                edited_at: None,
                deleted: false,
                created_at: Utc::now(),
            };
            hub.publish(*room_id, ChatEvent::MessagePosted(message.clone()));
            Ok(message)
        });
    let (url, ctx) = fixture.serve();
    let mut socket = connect(&url, ctx.room.id, TOKEN).await.expect("connect");

    send_text(
        &mut socket,
        json!({"type": "chat_message", "content": "hello there"}).to_string(),
    )
    .await;

    let value = next_json(&mut socket).await;
    assert_eq!(value["type"], json!("chat_message"));
    assert_eq!(value["message"]["content"], json!("hello there"));
    assert_eq!(value["message"]["senderId"], json!(ctx.caller.id));
}

#[rstest]
#[actix_rt::test]
async fn malformed_json_keeps_the_connection_open() {
    let (url, ctx) = Fixture::new().serve();
    let mut socket = connect(&url, ctx.room.id, TOKEN).await.expect("connect");

    for _ in 0..2 {
        send_text(&mut socket, "not-json".to_owned()).await;
        let value = next_json(&mut socket).await;
        assert_eq!(value, json!({"type": "error", "message": "Invalid JSON"}));
    }
}

#[rstest]
#[actix_rt::test]
async fn service_failures_are_reported_as_error_frames() {
    let mut fixture = Fixture::new();
    fixture
        .chat
        .expect_edit()
        .returning(|_, _, _| Err(Error::forbidden("only the sender may change a message")));
    let (url, ctx) = fixture.serve();
    let mut socket = connect(&url, ctx.room.id, TOKEN).await.expect("connect");

    send_text(
        &mut socket,
        json!({"type": "edit_message", "messageId": Uuid::new_v4(), "content": "x"}).to_string(),
    )
    .await;

    let value = next_json(&mut socket).await;
    assert_eq!(
        value,
        json!({"type": "error", "message": "only the sender may change a message"})
    );
}

#[rstest]
#[actix_rt::test]
async fn peers_see_each_other_join() {
    let (url, ctx) = Fixture::new().serve();
    let mut first = connect(&url, ctx.room.id, TOKEN).await.expect("connect");
    let _second = connect(&url, ctx.room.id, "peer-token")
        .await
        .expect("connect");

    let value = next_json(&mut first).await;
    assert_eq!(value, json!({"type": "user_joined", "userId": ctx.peer.id}));
}

#[rstest]
#[case::stranger_room(false, TOKEN, StatusCode::NOT_FOUND)]
#[case::bad_token(true, "nope", StatusCode::UNAUTHORIZED)]
#[actix_rt::test]
async fn upgrades_require_a_participant(
    #[case] known_room: bool,
    #[case] token: &str,
    #[case] expected: StatusCode,
) {
    let (url, ctx) = Fixture::new().serve();
    let room_id = if known_room { ctx.room.id } else { Uuid::new_v4() };
    let error = connect(&url, room_id, token)
        .await
        .err()
        .expect("upgrade rejected");
    assert_eq!(rejection_status(error), expected);
}

#[rstest]
#[actix_rt::test]
async fn foreign_origins_are_rejected_before_authentication() {
    let (url, ctx) = Fixture::new().serve();
    let error = awc::Client::default()
        .ws(format!("{url}/ws/chat/{}?token={TOKEN}", ctx.room.id))
        .set_header(header::ORIGIN, "https://evil.example")
        .connect()
        .await
        .err()
        .expect("upgrade rejected");
    assert_eq!(rejection_status(error), StatusCode::FORBIDDEN);
}

#[rstest]
#[actix_rt::test]
async fn closes_after_timeout_without_client_messages() {
    let (url, ctx) = Fixture::new().serve();
    let mut socket = connect(&url, ctx.room.id, TOKEN).await.expect("connect");
    tokio::time::sleep(CLIENT_TIMEOUT + HEARTBEAT_INTERVAL * 3).await;

    let observed_close = tokio::time::timeout(Duration::from_secs(2), async {
        let mut observed = None;
        while let Some(frame) = socket.next().await {
            match frame.expect("frame") {
                Frame::Ping(_) | Frame::Pong(_) => continue,
                Frame::Close(reason) => {
                    observed = reason;
                    break;
                }
                other => panic!("unexpected frame before close: {other:?}"),
            }
        }
        observed
    })
    .await
    .expect("close frame missing within timeout")
    .expect("close frame missing after timeout");

    assert_eq!(observed_close.code, CloseCode::Normal);
    assert_eq!(
        observed_close.description.as_deref(),
        Some("heartbeat timeout")
    );
}
