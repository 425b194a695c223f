//! Review submission, rating aggregates and helpful votes.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::domain::ports::{BookingRepository, ReviewRepository, ReviewService, ReviewSubmission};
use crate::domain::{
    Actor, BadgeAwards, BookingStatus, Error, MentorRating, NotificationDraft, NotificationKind,
    Notifier, Review, UserId, validate_review_text,
};

#[derive(Clone)]
pub struct Reviews {
    reviews: Arc<dyn ReviewRepository>,
    bookings: Arc<dyn BookingRepository>,
    notifier: Notifier,
    badges: BadgeAwards,
    clock: Arc<dyn Clock>,
}

impl Reviews {
    pub fn new(
        reviews: Arc<dyn ReviewRepository>,
        bookings: Arc<dyn BookingRepository>,
        notifier: Notifier,
        badges: BadgeAwards,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            reviews,
            bookings,
            notifier,
            badges,
            clock,
        }
    }
}

#[async_trait]
impl ReviewService for Reviews {
    async fn submit(&self, actor: &Actor, submission: ReviewSubmission) -> Result<Review, Error> {
        let booking_id = submission.booking_id;
        let booking = self
            .bookings
            .find(&booking_id)
            .await?
            .filter(|booking| booking.involves(actor.user_id))
            .ok_or_else(|| Error::not_found(format!("booking {booking_id} not found")))?;
        if booking.learner_id != actor.user_id {
            return Err(Error::forbidden("only the booking's learner may review it"));
        }
        if booking.status != BookingStatus::Completed {
            return Err(Error::invalid_request(
                "only completed sessions can be reviewed",
            ));
        }
        let ratings = submission
            .ratings
            .validate()
            .map_err(|err| Error::invalid_request(err.to_string()))?;
        let text = validate_review_text(submission.text.as_deref().unwrap_or_default())
            .map_err(|err| Error::invalid_request(err.to_string()))?;

        let review = Review {
            id: Uuid::new_v4(),
            booking_id,
            reviewer_id: actor.user_id,
            mentor_id: booking.mentor_id,
            ratings,
            text,
            would_recommend: submission.would_recommend,
            helpful_count: 0,
            created_at: self.clock.utc(),
        };
        self.reviews.insert(&review).await?;
        info!(review_id = %review.id, mentor_id = %review.mentor_id, "review submitted");

        self.notifier
            .notify(NotificationDraft::new(
                review.mentor_id,
                NotificationKind::ReviewReceived,
                "New review",
                format!("You received a {}-star review", review.ratings.overall),
                json!({ "reviewId": review.id, "bookingId": booking_id }),
            ))
            .await;
        self.badges.award_quietly(&review.reviewer_id).await;
        self.badges.award_quietly(&review.mentor_id).await;
        Ok(review)
    }

    async fn for_mentor(&self, mentor_id: &UserId) -> Result<Vec<Review>, Error> {
        Ok(self.reviews.for_mentor(mentor_id).await?)
    }

    async fn rating(&self, mentor_id: &UserId) -> Result<MentorRating, Error> {
        let reviews = self.reviews.for_mentor(mentor_id).await?;
        Ok(MentorRating::from_reviews(*mentor_id, &reviews))
    }

    async fn mark_helpful(&self, actor: &Actor, review_id: &Uuid) -> Result<i32, Error> {
        let review = self
            .reviews
            .find(review_id)
            .await?
            .ok_or_else(|| Error::not_found(format!("review {review_id} not found")))?;
        if review.reviewer_id == actor.user_id {
            return Err(Error::invalid_request(
                "reviewers cannot mark their own review helpful",
            ));
        }
        Ok(self.reviews.record_helpful(review_id, &actor.user_id).await?)
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::ports::{
        MockBadgeRepository, MockBookingRepository, MockNotificationRepository,
        MockReviewRepository, ReviewRepositoryError,
    };
    use crate::domain::{Booking, ErrorCode, Interval, ReviewRatings, Role};
    use crate::test_support::MutableClock;
    use chrono::{Duration, Utc};
    use rstest::rstest;

    fn completed(learner: UserId, mentor: UserId, status: BookingStatus) -> Booking {
        let start = Utc::now() - Duration::days(1);
        let mut booking = Booking::request(
            Uuid::new_v4(),
            learner,
            mentor,
            Interval::new(start, start + Duration::hours(1)).expect("interval"),
            0,
            String::new(),
            start,
        );
        booking.status = status;
        booking
    }

    fn service(
        reviews: MockReviewRepository,
        bookings: MockBookingRepository,
        notifications: MockNotificationRepository,
        badges: MockBadgeRepository,
    ) -> Reviews {
        let clock: Arc<dyn Clock> = Arc::new(MutableClock::at(2030, 1, 7, 9));
        let reviews: Arc<dyn ReviewRepository> = Arc::new(reviews);
        let bookings: Arc<dyn BookingRepository> = Arc::new(bookings);
        let notifier = Notifier::new(Arc::new(notifications), clock.clone());
        let awards = BadgeAwards::new(
            Arc::new(badges),
            bookings.clone(),
            reviews.clone(),
            notifier.clone(),
            clock.clone(),
        );
        Reviews::new(reviews, bookings, notifier, awards, clock)
    }

    fn learner() -> Actor {
        Actor {
            user_id: UserId::random(),
            role: Role::Learner,
        }
    }

    fn submission(booking_id: Uuid, overall: i16) -> ReviewSubmission {
        ReviewSubmission {
            booking_id,
            ratings: ReviewRatings {
                overall,
                communication: Some(5),
                knowledge: None,
                punctuality: None,
            },
            text: Some("  Clear and patient.  ".to_owned()),
            would_recommend: true,
        }
    }

    fn with_booking(booking: Booking) -> MockBookingRepository {
        let mut bookings = MockBookingRepository::new();
        bookings
            .expect_find()
            .return_once(move |_| Ok(Some(booking)));
        bookings
    }

    #[rstest]
    #[tokio::test]
    async fn unfinished_sessions_cannot_be_reviewed() {
        let actor = learner();
        let booking = completed(actor.user_id, UserId::random(), BookingStatus::Confirmed);
        let id = booking.id;
        let mut reviews = MockReviewRepository::new();
        reviews.expect_insert().never();

        let err = service(
            reviews,
            with_booking(booking),
            MockNotificationRepository::new(),
            MockBadgeRepository::new(),
        )
        .submit(&actor, submission(id, 5))
        .await
        .expect_err("not completed");
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
    }

    #[rstest]
    #[tokio::test]
    async fn mentors_cannot_review_their_own_sessions() {
        let mentor = Actor {
            user_id: UserId::random(),
            role: Role::Mentor,
        };
        let booking = completed(UserId::random(), mentor.user_id, BookingStatus::Completed);
        let id = booking.id;

        let err = service(
            MockReviewRepository::new(),
            with_booking(booking),
            MockNotificationRepository::new(),
            MockBadgeRepository::new(),
        )
        .submit(&mentor, submission(id, 5))
        .await
        .expect_err("forbidden");
        assert_eq!(err.code(), ErrorCode::Forbidden);
    }

    #[rstest]
    #[case(0)]
    #[case(6)]
    #[tokio::test]
    async fn ratings_out_of_range_are_rejected(#[case] overall: i16) {
        let actor = learner();
        let booking = completed(actor.user_id, UserId::random(), BookingStatus::Completed);
        let id = booking.id;

        let err = service(
            MockReviewRepository::new(),
            with_booking(booking),
            MockNotificationRepository::new(),
            MockBadgeRepository::new(),
        )
        .submit(&actor, submission(id, overall))
        .await
        .expect_err("range");
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
    }

    #[rstest]
    #[tokio::test]
    async fn second_reviews_conflict() {
        let actor = learner();
        let booking = completed(actor.user_id, UserId::random(), BookingStatus::Completed);
        let id = booking.id;
        let mut reviews = MockReviewRepository::new();
        reviews
            .expect_insert()
            .return_once(|_| Err(ReviewRepositoryError::duplicate_review()));

        let err = service(
            reviews,
            with_booking(booking),
            MockNotificationRepository::new(),
            MockBadgeRepository::new(),
        )
        .submit(&actor, submission(id, 4))
        .await
        .expect_err("duplicate");
        assert_eq!(err.code(), ErrorCode::Conflict);
    }

    #[rstest]
    #[tokio::test]
    async fn accepted_reviews_notify_the_mentor() {
        let actor = learner();
        let mentor_id = UserId::random();
        let booking = completed(actor.user_id, mentor_id, BookingStatus::Completed);
        let id = booking.id;
        let mut bookings = with_booking(booking);
        bookings.expect_list().returning(|_| Ok(Vec::new()));
        let mut reviews = MockReviewRepository::new();
        reviews
            .expect_insert()
            .withf(|review| review.text == "Clear and patient.")
            .times(1)
            .return_once(|_| Ok(()));
        reviews.expect_for_mentor().returning(|_| Ok(Vec::new()));
        reviews.expect_count_by_reviewer().returning(|_| Ok(1));
        let mut badges = MockBadgeRepository::new();
        badges.expect_for_user().returning(|_| Ok(Vec::new()));
        let mut notifications = MockNotificationRepository::new();
        notifications
            .expect_insert()
            .withf(move |n| n.user_id == mentor_id && n.kind == NotificationKind::ReviewReceived)
            .times(1)
            .return_once(|_| Ok(()));

        let review = service(reviews, bookings, notifications, badges)
            .submit(&actor, submission(id, 4))
            .await
            .expect("submitted");
        assert_eq!(review.mentor_id, mentor_id);
    }

    #[rstest]
    #[tokio::test]
    async fn reviewers_cannot_vote_for_themselves() {
        let actor = learner();
        let review = Review {
            id: Uuid::new_v4(),
            booking_id: Uuid::new_v4(),
            reviewer_id: actor.user_id,
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
            created_at: Utc::now(),
        };
        let id = review.id;
        let mut reviews = MockReviewRepository::new();
        reviews.expect_find().return_once(move |_| Ok(Some(review)));
        reviews.expect_record_helpful().never();

        let err = service(
            reviews,
            MockBookingRepository::new(),
            MockNotificationRepository::new(),
            MockBadgeRepository::new(),
        )
        .mark_helpful(&actor, &id)
        .await
        .expect_err("own review");
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
    }
}
