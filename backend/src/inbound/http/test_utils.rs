//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_web::http::header::AUTHORIZATION;
use actix_web::web;
use chrono::{TimeZone, Utc};

use crate::domain::ports::{
    MockAccountService, MockAiService, MockAnalyticsService, MockAvailabilityService,
    MockBadgeService, MockBookingService, MockChatService, MockDashboardService,
    MockNotificationService, MockReviewService, MockSearchService, MockSkillService,
    MockTwoFactorService, MockWebhookService,
};
use crate::domain::{DisplayName, Email, Role, Timezone, User, UserId};
use crate::inbound::http::state::HttpState;

/// Token presented by [`bearer`].
pub const TOKEN: &str = "test-token";

/// `Authorization` header carrying [`TOKEN`].
pub fn bearer() -> (actix_web::http::header::HeaderName, String) {
    (AUTHORIZATION, format!("Bearer {TOKEN}"))
}

/// Approved account with the given role.
pub fn user(role: Role) -> User {
    let name = role.as_str();
    User {
        id: UserId::random(),
        email: Email::new(format!("{name}@example.com")).expect("fixture email"),
        display_name: DisplayName::new(format!("Test {name}")).expect("fixture name"),
        role,
        bio: String::new(),
        timezone: Timezone::utc(),
        hourly_rate_cents: (role == Role::Mentor).then_some(6000),
        is_mentor_approved: role == Role::Mentor,
        created_at: Utc
            .with_ymd_and_hms(2030, 1, 1, 0, 0, 0)
            .single()
            .expect("fixture instant"),
    }
}

/// One mock per driving port; unset expectations panic when called.
#[derive(Default)]
pub struct TestPorts {
    pub accounts: MockAccountService,
    pub two_factor: MockTwoFactorService,
    pub skills: MockSkillService,
    pub availability: MockAvailabilityService,
    pub bookings: MockBookingService,
    pub reviews: MockReviewService,
    pub chat: MockChatService,
    pub notifications: MockNotificationService,
    pub search: MockSearchService,
    pub dashboard: MockDashboardService,
    pub analytics: MockAnalyticsService,
    pub ai: MockAiService,
    pub webhooks: MockWebhookService,
    pub badges: MockBadgeService,
}

impl TestPorts {
    /// Ports whose account service resolves [`TOKEN`] to `caller`.
    pub fn authenticating(caller: &User) -> Self {
        let mut ports = Self::default();
        let caller = caller.clone();
        ports
            .accounts
            .expect_authenticate()
            .returning(move |_| Ok(caller.clone()));
        ports
    }

    pub fn into_state(self) -> web::Data<HttpState> {
        web::Data::new(HttpState {
            accounts: Arc::new(self.accounts),
            two_factor: Arc::new(self.two_factor),
            skills: Arc::new(self.skills),
            availability: Arc::new(self.availability),
            bookings: Arc::new(self.bookings),
            reviews: Arc::new(self.reviews),
            chat: Arc::new(self.chat),
            notifications: Arc::new(self.notifications),
            search: Arc::new(self.search),
            dashboard: Arc::new(self.dashboard),
            analytics: Arc::new(self.analytics),
            ai: Arc::new(self.ai),
            webhooks: Arc::new(self.webhooks),
            badges: Arc::new(self.badges),
        })
    }
}
