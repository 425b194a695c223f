//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Concrete implementations of the domain repository ports backed by
//! PostgreSQL via `diesel-async` and `bb8` connection pooling.
//!
//! # Architecture
//!
//! - **Thin adapters**: repositories only translate between Diesel rows and
//!   domain types. Business rules stay in the domain services.
//! - **Internal models**: row structs (`models.rs`) and table definitions
//!   (`schema.rs`) never leave this module.
//! - **Constraints as guards**: overlap and uniqueness invariants are backed
//!   by database constraints, and violations map onto the port's dedicated
//!   error variants.
//!
//! # Example
//!
//! ```ignore
//! use mentorship::outbound::persistence::{DbPool, DieselUserRepository, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/mentorship")).await?;
//! let users = DieselUserRepository::new(pool);
//! ```

mod diesel_ai_response_repository;
mod diesel_availability_repository;
mod diesel_badge_repository;
mod diesel_basic_error_mapping;
mod diesel_booking_repository;
mod diesel_chat_repository;
pub(crate) mod diesel_helpers;
mod diesel_notification_repository;
mod diesel_review_repository;
mod diesel_skill_repository;
mod diesel_two_factor_repository;
mod diesel_user_repository;
mod diesel_webhook_event_repository;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_ai_response_repository::DieselAiResponseRepository;
pub use diesel_availability_repository::DieselAvailabilityRepository;
pub use diesel_badge_repository::DieselBadgeRepository;
pub use diesel_booking_repository::DieselBookingRepository;
pub use diesel_chat_repository::DieselChatRepository;
pub use diesel_notification_repository::DieselNotificationRepository;
pub use diesel_review_repository::DieselReviewRepository;
pub use diesel_skill_repository::DieselSkillRepository;
pub use diesel_two_factor_repository::DieselTwoFactorRepository;
pub use diesel_user_repository::{DieselAuthSessionRepository, DieselUserRepository};
pub use diesel_webhook_event_repository::DieselWebhookEventRepository;
pub use migrations::{MigrationError, run_pending_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
