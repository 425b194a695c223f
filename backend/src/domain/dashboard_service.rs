//! Role-specific dashboards.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;

use crate::domain::access::booking_scope;
use crate::domain::ports::{
    BadgeRepository, BookingRepository, DashboardService, ReviewRepository, UserRepository,
};
use crate::domain::{
    Actor, AdminDashboard, BookingFilter, Dashboard, Error, LearnerDashboard, MentorDashboard,
    MentorRating, Role,
};

#[derive(Clone)]
pub struct Dashboards {
    users: Arc<dyn UserRepository>,
    bookings: Arc<dyn BookingRepository>,
    reviews: Arc<dyn ReviewRepository>,
    badges: Arc<dyn BadgeRepository>,
    clock: Arc<dyn Clock>,
}

impl Dashboards {
    pub fn new(
        users: Arc<dyn UserRepository>,
        bookings: Arc<dyn BookingRepository>,
        reviews: Arc<dyn ReviewRepository>,
        badges: Arc<dyn BadgeRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            users,
            bookings,
            reviews,
            badges,
            clock,
        }
    }
}

#[async_trait]
impl DashboardService for Dashboards {
    async fn dashboard(&self, actor: &Actor) -> Result<Dashboard, Error> {
        let bookings = self
            .bookings
            .list(&BookingFilter::scoped(booking_scope(actor)))
            .await?;
        let now = self.clock.utc();
        Ok(match actor.role {
            Role::Mentor => {
                let reviews = self.reviews.for_mentor(&actor.user_id).await?;
                let rating = MentorRating::from_reviews(actor.user_id, &reviews);
                Dashboard::Mentor(MentorDashboard::compute(&bookings, &rating, now))
            }
            Role::Learner => {
                let badges = self.badges.for_user(&actor.user_id).await?.len() as u64;
                Dashboard::Learner(LearnerDashboard::compute(&bookings, badges, now))
            }
            Role::Admin => {
                let roles = self.users.count_by_role().await?;
                Dashboard::Admin(AdminDashboard::compute(&roles, &bookings))
            }
        })
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::ports::{
        MockBadgeRepository, MockBookingRepository, MockReviewRepository, MockUserRepository,
    };
    use crate::domain::{BookingScope, UserId};
    use crate::test_support::MutableClock;
    use rstest::rstest;

    fn dashboards(
        users: MockUserRepository,
        bookings: MockBookingRepository,
        reviews: MockReviewRepository,
        badges: MockBadgeRepository,
    ) -> Dashboards {
        Dashboards::new(
            Arc::new(users),
            Arc::new(bookings),
            Arc::new(reviews),
            Arc::new(badges),
            Arc::new(MutableClock::at(2030, 1, 7, 9)),
        )
    }

    fn empty_bookings(expected: BookingScope) -> MockBookingRepository {
        let mut bookings = MockBookingRepository::new();
        bookings
            .expect_list()
            .withf(move |filter| filter.scope == expected)
            .return_once(|_| Ok(Vec::new()));
        bookings
    }

    #[rstest]
    #[tokio::test]
    async fn admins_see_platform_counts() {
        let admin = Actor {
            user_id: UserId::random(),
            role: Role::Admin,
        };
        let mut users = MockUserRepository::new();
        users
            .expect_count_by_role()
            .return_once(|| Ok(vec![(Role::Learner, 3), (Role::Mentor, 2)]));

        let dashboard = dashboards(
            users,
            empty_bookings(BookingScope::All),
            MockReviewRepository::new(),
            MockBadgeRepository::new(),
        )
        .dashboard(&admin)
        .await
        .expect("dashboard");

        let Dashboard::Admin(admin) = dashboard else {
            panic!("expected an admin dashboard");
        };
        assert_eq!(admin.users_by_role.get("learner"), Some(&3));
        assert_eq!(admin.users_by_role.get("admin"), Some(&0));
    }

    #[rstest]
    #[tokio::test]
    async fn learners_see_their_badge_count() {
        let learner = Actor {
            user_id: UserId::random(),
            role: Role::Learner,
        };
        let mut badges = MockBadgeRepository::new();
        badges.expect_for_user().return_once(move |_| {
            Ok(vec![crate::domain::EarnedBadge {
                user_id: learner.user_id,
                slug: "first-steps".to_owned(),
                earned_at: chrono::Utc::now(),
            }])
        });

        let dashboard = dashboards(
            MockUserRepository::new(),
            empty_bookings(BookingScope::Learner(learner.user_id)),
            MockReviewRepository::new(),
            badges,
        )
        .dashboard(&learner)
        .await
        .expect("dashboard");

        let Dashboard::Learner(learner) = dashboard else {
            panic!("expected a learner dashboard");
        };
        assert_eq!(learner.badges, 1);
        assert_eq!(learner.hours_learned, "0.0");
    }
}
