//! Domain primitives, aggregates and services.
//!
//! Purpose: define strongly typed entities for the mentoring marketplace and
//! the services implementing the driving ports in [`ports`]. Nothing here
//! depends on HTTP or Diesel; adapters convert at the boundary.
//!
//! Public surface:
//! - Error (alias to `error::Error`): API error response payload.
//! - User, Booking, AvailabilitySlot, Review, ChatMessage, Notification and
//!   the value types that validate them.
//! - Service implementations such as [`BookingWorkflow`] and [`Accounts`].

pub mod ai;
pub mod analytics;
pub mod auth;
pub mod availability;
pub mod badge;
pub mod booking;
pub mod calendar;
pub mod chat;
pub mod dashboard;
pub mod error;
pub mod notification;
pub mod page_key;
pub mod ports;
pub mod review;
pub mod search;
pub mod skill;
pub mod trace_id;
pub mod two_factor;
pub mod user;
pub mod webhook;

mod access;
mod repository_errors;

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

pub use self::ai::{
    AiKind, AiResponse, MentorCandidate, QUESTION_MAX, QuestionValidationError, SYSTEM_PROMPT,
    UnknownAiKind, question_prompt, recommendations_prompt, session_summary_prompt,
    validate_question,
};
pub use self::auth::{
    AuthSession, BearerToken, CredentialsValidationError, LoginCredentials, PASSWORD_MAX,
    PASSWORD_MIN, Password, PasswordHash, PasswordHashError, TokenDigest,
};
pub use self::analytics::{
    AnalyticsPeriod, AnalyticsValidationError, DailyGrowth, DailySessions, MentorPricing,
    PlatformAnalytics, PlatformFacts, SessionStatistics, SkillAnalytics, SkillDemand, SkillRanking,
    UserStatistics, TOP_SKILLS_LIMIT,
};
pub use self::availability::{
    AvailabilityException, AvailabilitySettings, AvailabilitySlot, AvailabilityValidationError,
    BREAK_MINUTES_RANGE, CandidateFilter, Interval, MAX_GENERATION_SPAN_DAYS,
    SESSION_MINUTES_RANGE, SessionLayout, SlotGenerationPlan, WeeklyRule, WeeklyWindow,
    filter_candidates, resolve_local, weekday_from_index, weekday_index,
};
pub use self::badge::{
    Badge, BadgeCategory, BadgeProgress, BadgeRequirement, CATALOGUE, EarnedBadge, find_badge,
    newly_earned,
};
pub use self::booking::{
    BOOKING_TEXT_MAX, Booking, BookingFilter, BookingScope, BookingStatus,
    BookingTransitionError, CANCELLATION_CUTOFF_HOURS, RATING_RANGE, UnknownBookingStatus,
    session_price_cents,
};
pub use self::calendar::{CalendarEntry, escape_text, is_exportable, quote_param, render_calendar};
pub use self::chat::{
    ChatEvent, ChatMessage, ChatRoom, ChatValidationError, MESSAGE_MAX, MessageContent,
    ParticipantPair,
};
pub use self::dashboard::{
    AdminDashboard, Dashboard, LearnerDashboard, MentorDashboard, UPCOMING_LIMIT, format_hours,
    month_start, status_counts, upcoming, week_start,
};
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::notification::{
    Notification, NotificationDraft, NotificationKind, NotificationStats,
    UnknownNotificationKind,
};
pub use self::page_key::PageKey;
pub use self::review::{
    MentorRating, REVIEW_TEXT_MAX, Review, ReviewRatings, ReviewValidationError,
    validate_review_text,
};
pub use self::search::{
    AvailabilityWindow, MentorCard, MentorSearchQuery, SearchValidationError, sort_cards,
};
pub use self::skill::{
    MentorSkill, PROFICIENCY_RANGE, SKILL_NAME_MAX, Skill, SkillValidationError, slugify,
    validate_proficiency,
};
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::two_factor::{
    BACKUP_CODE_COUNT, CHALLENGE_MAX_ATTEMPTS, CHALLENGE_TTL_MINUTES, FactorKind, LoginChallenge,
    SecondFactor, TOTP_DIGITS, TOTP_ISSUER, TOTP_PERIOD_SECONDS, TotpSecret, TwoFactorEnrolment,
    TwoFactorSettings, TwoFactorStatus, TwoFactorValidationError, totp_step,
};
pub use self::user::{
    Actor, BIO_MAX, DISPLAY_NAME_MAX, DisplayName, EMAIL_MAX, Email, ProfileUpdate, Role, Timezone,
    User, UserId, UserValidationError, validate_bio, validate_hourly_rate,
};
pub use self::webhook::{
    EVENT_ID_MAX, EVENT_TYPE_MAX, UNKNOWN_EVENT_TYPE, WebhookEvent, WebhookRecordOutcome,
    WebhookSecrets, WebhookSecretsError, sign, verify_signature,
};

pub use self::account_service::Accounts;
pub use self::ai_service::Assistant;
pub use self::analytics_service::Analytics;
pub use self::availability_service::AvailabilityPlanner;
pub use self::badge_service::BadgeAwards;
pub use self::booking_service::{BookingWorkflow, BookingWorkflowPorts};
pub use self::chat_service::ChatRooms;
pub use self::dashboard_service::Dashboards;
pub use self::notification_service::{Notifier, NotificationInbox, ReminderRun, send_reminders};
pub use self::review_service::Reviews;
pub use self::search_service::MentorSearch;
pub use self::skill_service::SkillCatalogue;
pub use self::two_factor_service::TwoFactor;
pub use self::webhook_service::WebhookReceiver;

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use mentorship::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::forbidden("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
