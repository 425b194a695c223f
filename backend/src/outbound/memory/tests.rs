//! Regression coverage for the in-memory adapters.

use chrono::{DateTime, Duration, TimeZone, Utc};
use rstest::{fixture, rstest};
use serde_json::json;
use uuid::Uuid;

use super::MemoryStore;
use crate::domain::ports::{
    AvailabilityRepository, AvailabilityRepositoryError, BookingRepository,
    BookingRepositoryError, ChatRepository, NotificationRepository, ReviewRepository,
    ReviewRepositoryError, WebhookEventRepository,
};
use crate::domain::{
    AvailabilitySlot, Booking, BookingStatus, ChatMessage, ChatRoom, Interval, Notification,
    NotificationKind, PageKey, ParticipantPair, Review, ReviewRatings, UserId, WebhookEvent,
    WebhookRecordOutcome,
};

fn at(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2030, 1, 7, hour, 0, 0)
        .single()
        .expect("valid timestamp")
}

#[fixture]
fn store() -> MemoryStore {
    MemoryStore::new()
}

fn slot(mentor_id: UserId, start: u32, end: u32) -> AvailabilitySlot {
    AvailabilitySlot {
        id: Uuid::new_v4(),
        mentor_id,
        start_utc: at(start),
        end_utc: at(end),
        is_booked: false,
        created_at: at(0),
    }
}

fn booking(mentor_id: UserId, start: u32, end: u32) -> Booking {
    Booking::request(
        Uuid::new_v4(),
        UserId::random(),
        mentor_id,
        Interval::new(at(start), at(end)).expect("interval"),
        0,
        String::new(),
        at(0),
    )
}

#[rstest]
#[tokio::test]
async fn overlapping_slots_are_refused(store: MemoryStore) {
    let mentor = UserId::random();
    store
        .insert_slot(&slot(mentor, 10, 11))
        .await
        .expect("first slot");

    let err = store
        .insert_slot(&slot(mentor, 10, 12))
        .await
        .expect_err("overlap");
    assert_eq!(err, AvailabilityRepositoryError::overlap());

    store
        .insert_slot(&slot(mentor, 11, 12))
        .await
        .expect("adjacent slot");
    store
        .insert_slot(&slot(UserId::random(), 10, 11))
        .await
        .expect("other mentor");
}

#[rstest]
#[tokio::test]
async fn slots_are_claimed_once(store: MemoryStore) {
    let free = slot(UserId::random(), 9, 10);
    store.insert_slot(&free).await.expect("slot");

    assert!(store.claim_slot(&free.id).await.expect("claim"));
    assert!(!store.claim_slot(&free.id).await.expect("second claim"));
    store.release_slot(&free.id).await.expect("release");
    assert!(store.claim_slot(&free.id).await.expect("reclaim"));
}

#[rstest]
#[tokio::test]
async fn concurrent_bookings_for_one_interval_admit_one(store: MemoryStore) {
    let mentor = UserId::random();
    let first = booking(mentor, 10, 11);
    let second = booking(mentor, 10, 11);

    let (a, b) = tokio::join!(
        BookingRepository::insert(&store, &first),
        BookingRepository::insert(&store, &second),
    );

    let outcomes = [a, b];
    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(
        outcomes
            .iter()
            .any(|r| r == &Err(BookingRepositoryError::overlap()))
    );
}

#[rstest]
#[tokio::test]
async fn inactive_bookings_free_the_interval(store: MemoryStore) {
    let mentor = UserId::random();
    let mut first = booking(mentor, 10, 11);
    BookingRepository::insert(&store, &first)
        .await
        .expect("first");
    first.status = BookingStatus::Cancelled;
    store.update(&first).await.expect("cancel");

    BookingRepository::insert(&store, &booking(mentor, 10, 11))
        .await
        .expect("interval is free again");
}

#[rstest]
#[tokio::test]
async fn helpful_votes_count_once_per_voter(store: MemoryStore) {
    let review = Review {
        id: Uuid::new_v4(),
        booking_id: Uuid::new_v4(),
        reviewer_id: UserId::random(),
        mentor_id: UserId::random(),
        ratings: ReviewRatings {
            overall: 5,
            communication: None,
            knowledge: None,
            punctuality: None,
        },
        text: String::new(),
        would_recommend: true,
        helpful_count: 0,
        created_at: at(9),
    };
    ReviewRepository::insert(&store, &review)
        .await
        .expect("review");
    let voter = UserId::random();

    assert_eq!(store.record_helpful(&review.id, &voter).await, Ok(1));
    assert_eq!(
        store.record_helpful(&review.id, &voter).await,
        Err(ReviewRepositoryError::duplicate_vote())
    );
    assert_eq!(
        store.record_helpful(&review.id, &UserId::random()).await,
        Ok(2)
    );
}

#[rstest]
#[tokio::test]
async fn message_pages_run_newest_first(store: MemoryStore) {
    let pair = ParticipantPair::new(UserId::random(), UserId::random()).expect("pair");
    let room = store
        .open_room(&ChatRoom {
            id: Uuid::new_v4(),
            participants: pair,
            created_at: at(8),
        })
        .await
        .expect("room");
    for hour in 9..14 {
        store
            .insert_message(&ChatMessage {
                id: Uuid::new_v4(),
                room_id: room.id,
                sender_id: pair.first_user(),
                content: format!("at {hour}"),
                edited_at: None,
                deleted: false,
                created_at: at(hour),
            })
            .await
            .expect("message");
    }

    let first = store.messages(&room.id, None, 2).await.expect("page");
    assert_eq!(
        first.iter().map(|m| m.content.as_str()).collect::<Vec<_>>(),
        ["at 13", "at 12"]
    );
    let last = first.last().expect("non-empty page");
    let cursor = PageKey::new(last.created_at, last.id);
    let next = store
        .messages(&room.id, Some(cursor), 10)
        .await
        .expect("page");
    assert_eq!(next.len(), 3);
    assert_eq!(next[0].content, "at 11");
}

#[rstest]
#[tokio::test]
async fn reopening_a_pair_returns_the_existing_room(store: MemoryStore) {
    let pair = ParticipantPair::new(UserId::random(), UserId::random()).expect("pair");
    let first = store
        .open_room(&ChatRoom {
            id: Uuid::new_v4(),
            participants: pair,
            created_at: at(8),
        })
        .await
        .expect("room");
    let again = store
        .open_room(&ChatRoom {
            id: Uuid::new_v4(),
            participants: pair,
            created_at: at(9),
        })
        .await
        .expect("room");
    assert_eq!(again.id, first.id);
}

#[rstest]
#[tokio::test]
async fn reminders_are_found_by_booking(store: MemoryStore) {
    let booking_id = Uuid::new_v4();
    NotificationRepository::insert(
        &store,
        &Notification {
            id: Uuid::new_v4(),
            user_id: UserId::random(),
            kind: NotificationKind::SessionReminder,
            title: "Reminder".to_owned(),
            message: "Soon".to_owned(),
            payload: json!({ "bookingId": booking_id }),
            is_read: false,
            created_at: at(9),
        },
    )
    .await
    .expect("notification");

    assert!(store.has_reminder_for(&booking_id).await.expect("lookup"));
    assert!(
        !store
            .has_reminder_for(&Uuid::new_v4())
            .await
            .expect("lookup")
    );
}

#[rstest]
#[tokio::test]
async fn webhook_redeliveries_are_detected(store: MemoryStore) {
    let event = |event_id: Option<&str>| WebhookEvent {
        id: Uuid::new_v4(),
        provider: "zoom".to_owned(),
        event_type: "meeting.ended".to_owned(),
        event_id: event_id.map(str::to_owned),
        payload: json!({}),
        received_at: at(9) + Duration::minutes(1),
    };
    let first = event(Some("evt_1"));

    assert_eq!(
        store.record(&first).await,
        Ok(WebhookRecordOutcome::Recorded)
    );
    assert_eq!(
        store.record(&event(Some("evt_1"))).await,
        Ok(WebhookRecordOutcome::Duplicate { id: first.id })
    );
    assert_eq!(
        store.record(&event(None)).await,
        Ok(WebhookRecordOutcome::Recorded)
    );
}
