//! Notification delivery, the inbox driving port and session reminders.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use mockable::Clock;
use pagination::Paginated;
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::ports::{
    BookingRepository, NotificationRepository, NotificationService, UserRepository,
};
use crate::domain::{
    Booking, Error, Notification, NotificationDraft, NotificationKind, NotificationStats, PageKey,
    UserId,
};

/// Half-width of the window in which a session counts as due a reminder.
const REMINDER_TOLERANCE_MINUTES: i64 = 5;

/// Stores notifications on behalf of other services.
///
/// Delivery failures are logged and swallowed so they never fail the
/// operation that triggered them.
#[derive(Clone)]
pub struct Notifier {
    repo: Arc<dyn NotificationRepository>,
    clock: Arc<dyn Clock>,
}

impl Notifier {
    pub fn new(repo: Arc<dyn NotificationRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { repo, clock }
    }

    pub async fn notify(&self, draft: NotificationDraft) {
        let notification = draft.into_notification(Uuid::new_v4(), self.clock.utc());
        if let Err(error) = self.repo.insert(&notification).await {
            warn!(
                user_id = %notification.user_id,
                kind = %notification.kind,
                %error,
                "failed to store notification"
            );
        }
    }
}

/// Inbox use-cases backed by the notification repository.
#[derive(Clone)]
pub struct NotificationInbox {
    repo: Arc<dyn NotificationRepository>,
}

impl NotificationInbox {
    pub fn new(repo: Arc<dyn NotificationRepository>) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl NotificationService for NotificationInbox {
    async fn list(
        &self,
        user_id: &UserId,
        unread_only: bool,
        before: Option<PageKey>,
        limit: usize,
    ) -> Result<Paginated<Notification>, Error> {
        let items = self
            .repo
            .page(user_id, unread_only, before, limit.saturating_add(1))
            .await?;
        Paginated::from_overfetched(items, limit, |n| PageKey::new(n.created_at, n.id))
            .map_err(|err| Error::internal(format!("failed to encode cursor: {err}")))
    }

    async fn mark_read(&self, user_id: &UserId, notification_id: &Uuid) -> Result<(), Error> {
        if self.repo.mark_read(user_id, notification_id).await? {
            Ok(())
        } else {
            Err(Error::not_found("notification not found"))
        }
    }

    async fn mark_all_read(&self, user_id: &UserId) -> Result<u64, Error> {
        Ok(self.repo.mark_all_read(user_id).await?)
    }

    async fn stats(&self, user_id: &UserId) -> Result<NotificationStats, Error> {
        Ok(self.repo.stats(user_id).await?)
    }
}

/// Summary of one reminder sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReminderRun {
    /// Confirmed sessions in the reminder window.
    pub due: usize,
    /// Sessions reminded during this run.
    pub sent: usize,
    /// Sessions skipped because a reminder already exists.
    pub skipped: usize,
}

/// Remind both parties of confirmed sessions starting `minutes` from `now`,
/// give or take five minutes.
///
/// With `dry_run` nothing is written but the tally is still computed.
pub async fn send_reminders(
    bookings: &dyn BookingRepository,
    notifications: &dyn NotificationRepository,
    users: &dyn UserRepository,
    now: DateTime<Utc>,
    minutes: i64,
    dry_run: bool,
) -> Result<ReminderRun, Error> {
    let target = now + Duration::minutes(minutes);
    let tolerance = Duration::minutes(REMINDER_TOLERANCE_MINUTES);
    let due = bookings
        .confirmed_starting_between(target - tolerance, target + tolerance)
        .await?;

    let mut run = ReminderRun {
        due: due.len(),
        ..ReminderRun::default()
    };
    for booking in &due {
        if notifications.has_reminder_for(&booking.id).await? {
            run.skipped += 1;
            continue;
        }
        if !dry_run {
            let batch: Vec<Notification> = reminder_drafts(users, booking)
                .await?
                .into_iter()
                .map(|draft| draft.into_notification(Uuid::new_v4(), now))
                .collect();
            notifications.insert_all(&batch).await?;
            info!(booking_id = %booking.id, "session reminder sent");
        }
        run.sent += 1;
    }
    Ok(run)
}

async fn display_name(users: &dyn UserRepository, id: &UserId) -> Result<String, Error> {
    Ok(users
        .find_by_id(id)
        .await?
        .map_or_else(|| "your session partner".to_owned(), |u| u.display_name.to_string()))
}

async fn reminder_drafts(
    users: &dyn UserRepository,
    booking: &Booking,
) -> Result<Vec<NotificationDraft>, Error> {
    let mentor_name = display_name(users, &booking.mentor_id).await?;
    let learner_name = display_name(users, &booking.learner_id).await?;
    let starts = booking.start_utc.format("%Y-%m-%d %H:%M UTC");
    let payload = json!({
        "bookingId": booking.id,
        "startUtc": booking.start_utc,
    });
    Ok(vec![
        NotificationDraft::new(
            booking.learner_id,
            NotificationKind::SessionReminder,
            "Session reminder",
            format!("Your session with {mentor_name} starts at {starts}."),
            payload.clone(),
        ),
        NotificationDraft::new(
            booking.mentor_id,
            NotificationKind::SessionReminder,
            "Session reminder",
            format!("Your session with {learner_name} starts at {starts}."),
            payload,
        ),
    ])
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::ports::{
        MockBookingRepository, MockNotificationRepository, MockUserRepository,
        NotificationRepositoryError,
    };
    use crate::domain::{BookingStatus, Interval};
    use crate::outbound::memory::MemoryStore;
    use crate::test_support::MutableClock;
    use rstest::rstest;

    fn confirmed_at(start: DateTime<Utc>) -> Booking {
        let mut booking = Booking::request(
            Uuid::new_v4(),
            UserId::random(),
            UserId::random(),
            Interval::new(start, start + Duration::hours(1)).expect("interval"),
            0,
            String::new(),
            start - Duration::days(1),
        );
        booking.status = BookingStatus::Confirmed;
        booking
    }

    #[rstest]
    #[tokio::test]
    async fn notifier_swallows_storage_failures() {
        let mut repo = MockNotificationRepository::new();
        repo.expect_insert()
            .times(1)
            .return_once(|_| Err(NotificationRepositoryError::connection("down")));
        let notifier = Notifier::new(Arc::new(repo), Arc::new(MutableClock::at(2030, 1, 7, 9)));

        notifier
            .notify(NotificationDraft::new(
                UserId::random(),
                NotificationKind::General,
                "Hello",
                "World",
                json!({}),
            ))
            .await;
    }

    #[rstest]
    #[tokio::test]
    async fn unknown_notifications_are_not_found() {
        let mut repo = MockNotificationRepository::new();
        repo.expect_mark_read().times(1).return_once(|_, _| Ok(false));
        let inbox = NotificationInbox::new(Arc::new(repo));

        let err = inbox
            .mark_read(&UserId::random(), &Uuid::new_v4())
            .await
            .expect_err("missing notification");
        assert_eq!(err.code(), crate::domain::ErrorCode::NotFound);
    }

    #[rstest]
    #[tokio::test]
    async fn list_overfetches_to_find_the_next_page() {
        let user = UserId::random();
        let now = Utc::now();
        let mut repo = MockNotificationRepository::new();
        repo.expect_page()
            .withf(|_, unread, before, limit| *unread && before.is_none() && *limit == 3)
            .times(1)
            .return_once(move |_, _, _, _| {
                Ok((0..3)
                    .map(|i| {
                        NotificationDraft::new(
                            user,
                            NotificationKind::General,
                            "t",
                            "m",
                            json!({}),
                        )
                        .into_notification(Uuid::new_v4(), now - Duration::minutes(i))
                    })
                    .collect())
            });
        let inbox = NotificationInbox::new(Arc::new(repo));

        let page = inbox.list(&user, true, None, 2).await.expect("page");
        assert_eq!(page.data.len(), 2);
        assert!(page.next_cursor.is_some());
    }

    #[rstest]
    #[tokio::test]
    async fn reminders_skip_sessions_already_reminded() {
        let now = Utc::now();
        let fresh = confirmed_at(now + Duration::minutes(30));
        let reminded = confirmed_at(now + Duration::minutes(32));
        let reminded_id = reminded.id;

        let mut bookings = MockBookingRepository::new();
        bookings
            .expect_confirmed_starting_between()
            .withf(move |from, to| {
                *from == now + Duration::minutes(25) && *to == now + Duration::minutes(35)
            })
            .times(1)
            .return_once(move |_, _| Ok(vec![fresh, reminded]));
        let mut notifications = MockNotificationRepository::new();
        notifications
            .expect_has_reminder_for()
            .times(2)
            .returning(move |id| Ok(*id == reminded_id));
        notifications
            .expect_insert_all()
            .withf(|batch| batch.len() == 2)
            .times(1)
            .returning(|_| Ok(()));
        let mut users = MockUserRepository::new();
        users.expect_find_by_id().returning(|_| Ok(None));

        let run = send_reminders(&bookings, &notifications, &users, now, 30, false)
            .await
            .expect("reminders");

        assert_eq!(
            run,
            ReminderRun {
                due: 2,
                sent: 1,
                skipped: 1
            }
        );
    }

    #[rstest]
    #[tokio::test]
    async fn failed_reminder_batches_are_retried_for_both_parties() {
        let now = Utc::now();
        let booking = confirmed_at(now + Duration::minutes(30));
        let (learner, mentor) = (booking.learner_id, booking.mentor_id);
        let store = MemoryStore::new();

        let mut bookings = MockBookingRepository::new();
        bookings
            .expect_confirmed_starting_between()
            .times(2)
            .returning(move |_, _| Ok(vec![booking.clone()]));
        let mut users = MockUserRepository::new();
        users.expect_find_by_id().returning(|_| Ok(None));

        let mut failing = MockNotificationRepository::new();
        failing.expect_has_reminder_for().returning(|_| Ok(false));
        failing
            .expect_insert_all()
            .times(1)
            .return_once(|_| Err(NotificationRepositoryError::connection("down")));
        failing.expect_insert().never();
        send_reminders(&bookings, &failing, &users, now, 30, false)
            .await
            .expect_err("storage failure surfaces");

        let run = send_reminders(&bookings, &store, &users, now, 30, false)
            .await
            .expect("retry");
        assert_eq!(run.sent, 1);
        for user in [learner, mentor] {
            let inbox = NotificationRepository::page(&store, &user, false, None, 10)
                .await
                .expect("inbox");
            assert_eq!(inbox.len(), 1, "one reminder for {user}");
            assert_eq!(inbox[0].kind, NotificationKind::SessionReminder);
        }
    }

    #[rstest]
    #[tokio::test]
    async fn reminders_are_stored_once_per_participant() {
        let now = Utc::now();
        let booking = confirmed_at(now + Duration::minutes(30));
        let mentor = booking.mentor_id;
        let store = MemoryStore::new();
        let mut bookings = MockBookingRepository::new();
        bookings
            .expect_confirmed_starting_between()
            .times(2)
            .returning(move |_, _| Ok(vec![booking.clone()]));
        let mut users = MockUserRepository::new();
        users.expect_find_by_id().returning(|_| Ok(None));

        let first = send_reminders(&bookings, &store, &users, now, 30, false)
            .await
            .expect("first run");
        let second = send_reminders(&bookings, &store, &users, now, 30, false)
            .await
            .expect("second run");

        assert_eq!((first.sent, second.sent, second.skipped), (1, 0, 1));
        let inbox = NotificationRepository::page(&store, &mentor, false, None, 10)
            .await
            .expect("inbox");
        assert_eq!(inbox.len(), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn dry_runs_write_nothing() {
        let now = Utc::now();
        let booking = confirmed_at(now + Duration::minutes(30));
        let mut bookings = MockBookingRepository::new();
        bookings
            .expect_confirmed_starting_between()
            .return_once(move |_, _| Ok(vec![booking]));
        let mut notifications = MockNotificationRepository::new();
        notifications
            .expect_has_reminder_for()
            .returning(|_| Ok(false));
        notifications.expect_insert().never();
        notifications.expect_insert_all().never();
        let users = MockUserRepository::new();

        let run = send_reminders(&bookings, &notifications, &users, now, 30, true)
            .await
            .expect("dry run");
        assert_eq!(run.sent, 1);
    }
}
