//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driven ports (`*Repository`, [`LanguageModel`], [`ChatEventPublisher`])
//! are implemented by outbound adapters. Driving ports (`*Service`) are
//! implemented by the domain services and called by inbound adapters.

mod macros;
pub(crate) use macros::define_port_error;

mod ai_response_repository;
mod auth_session_repository;
mod availability_repository;
mod badge_repository;
mod booking_repository;
mod chat_event_publisher;
mod chat_repository;
mod language_model;
mod notification_repository;
mod review_repository;
mod skill_repository;
mod two_factor_repository;
mod user_repository;
mod webhook_event_repository;

mod account_service;
mod ai_service;
mod analytics_service;
mod availability_service;
mod badge_service;
mod booking_service;
mod chat_service;
mod dashboard_service;
mod notification_service;
mod review_service;
mod search_service;
mod skill_service;
mod two_factor_service;
mod webhook_service;

#[cfg(test)]
pub use ai_response_repository::MockAiResponseRepository;
pub use ai_response_repository::{AiResponseRepository, AiResponseRepositoryError};
#[cfg(test)]
pub use auth_session_repository::MockAuthSessionRepository;
pub use auth_session_repository::{AuthSessionRepository, AuthSessionRepositoryError};
#[cfg(test)]
pub use availability_repository::MockAvailabilityRepository;
pub use availability_repository::{AvailabilityRepository, AvailabilityRepositoryError};
#[cfg(test)]
pub use badge_repository::MockBadgeRepository;
pub use badge_repository::{BadgeRepository, BadgeRepositoryError};
#[cfg(test)]
pub use booking_repository::MockBookingRepository;
pub use booking_repository::{BookingRepository, BookingRepositoryError};
#[cfg(test)]
pub use chat_event_publisher::MockChatEventPublisher;
pub use chat_event_publisher::{ChatEventPublisher, NoOpChatEventPublisher};
#[cfg(test)]
pub use chat_repository::MockChatRepository;
pub use chat_repository::{ChatRepository, ChatRepositoryError};
#[cfg(test)]
pub use language_model::MockLanguageModel;
pub use language_model::{LanguageModel, LanguageModelError};
#[cfg(test)]
pub use notification_repository::MockNotificationRepository;
pub use notification_repository::{NotificationRepository, NotificationRepositoryError};
#[cfg(test)]
pub use review_repository::MockReviewRepository;
pub use review_repository::{ReviewRepository, ReviewRepositoryError};
#[cfg(test)]
pub use skill_repository::MockSkillRepository;
pub use skill_repository::{SkillRepository, SkillRepositoryError};
#[cfg(test)]
pub use two_factor_repository::MockTwoFactorRepository;
pub use two_factor_repository::{TwoFactorRepository, TwoFactorRepositoryError};
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{UserRepository, UserRepositoryError};
#[cfg(test)]
pub use webhook_event_repository::MockWebhookEventRepository;
pub use webhook_event_repository::{WebhookEventRepository, WebhookEventRepositoryError};

#[cfg(test)]
pub use account_service::MockAccountService;
pub use account_service::{
    AccountService, IssuedToken, LoginOutcome, PasswordChange, Registration,
};
#[cfg(test)]
pub use ai_service::MockAiService;
pub use ai_service::AiService;
#[cfg(test)]
pub use analytics_service::MockAnalyticsService;
pub use analytics_service::AnalyticsService;
#[cfg(test)]
pub use availability_service::MockAvailabilityService;
pub use availability_service::{
    AvailabilityService, GenerateSlotsRequest, GeneratedSlots, SlotPattern,
};
#[cfg(test)]
pub use badge_service::MockBadgeService;
pub use badge_service::BadgeService;
#[cfg(test)]
pub use booking_service::MockBookingService;
pub use booking_service::{BookingQuery, BookingRequest, BookingService};
#[cfg(test)]
pub use chat_service::MockChatService;
pub use chat_service::ChatService;
#[cfg(test)]
pub use dashboard_service::MockDashboardService;
pub use dashboard_service::DashboardService;
#[cfg(test)]
pub use notification_service::MockNotificationService;
pub use notification_service::NotificationService;
#[cfg(test)]
pub use review_service::MockReviewService;
pub use review_service::{ReviewService, ReviewSubmission};
#[cfg(test)]
pub use search_service::MockSearchService;
pub use search_service::SearchService;
#[cfg(test)]
pub use skill_service::MockSkillService;
pub use skill_service::SkillService;
#[cfg(test)]
pub use two_factor_service::MockTwoFactorService;
pub use two_factor_service::TwoFactorService;
#[cfg(test)]
pub use webhook_service::MockWebhookService;
pub use webhook_service::{WebhookDelivery, WebhookReceipt, WebhookService};
