//! Internal Diesel row structs.
//!
//! These types never leave the persistence layer. Repositories convert them
//! to domain types at the boundary.

use chrono::{DateTime, NaiveTime, Utc};
use diesel::prelude::*;
use serde_json::Value;
use uuid::Uuid;

use super::schema::{
    ai_responses, auth_sessions, availability_exceptions, availability_settings,
    availability_slots, bookings, chat_messages, chat_rooms, earned_badges, login_challenges,
    mentor_skills, notifications, reviews, skills, two_factor_settings, users, webhook_events,
    weekly_rules,
};

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub display_name: String,
    pub role: String,
    pub bio: String,
    pub timezone: String,
    pub hourly_rate_cents: Option<i64>,
    pub is_mentor_approved: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub id: Uuid,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub display_name: &'a str,
    pub role: &'a str,
    pub bio: &'a str,
    pub timezone: &'a str,
    pub hourly_rate_cents: Option<i64>,
    pub is_mentor_approved: bool,
    pub created_at: DateTime<Utc>,
}

/// Profile columns a user update may touch. Email and password are immutable
/// through this path.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = users)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct UserUpdate<'a> {
    pub display_name: &'a str,
    pub role: &'a str,
    pub bio: &'a str,
    pub timezone: &'a str,
    pub hourly_rate_cents: Option<i64>,
    pub is_mentor_approved: bool,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = auth_sessions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct AuthSessionRow {
    pub token_digest: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
    pub revoked: bool,
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = two_factor_settings)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub(crate) struct TwoFactorRow {
    pub user_id: Uuid,
    pub secret_base32: Option<String>,
    pub enabled: bool,
    pub recovery_digests: Vec<String>,
    pub last_used_step: Option<i64>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub last_used_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = login_challenges)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct LoginChallengeRow {
    pub token_digest: String,
    pub user_id: Uuid,
    pub attempts: i32,
    pub expires_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Skills
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = skills)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct SkillRow {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = skills)]
pub(crate) struct NewSkillRow<'a> {
    pub id: Uuid,
    pub name: &'a str,
    pub slug: &'a str,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = mentor_skills)]
pub(crate) struct MentorSkillRow {
    pub mentor_id: Uuid,
    pub skill_id: Uuid,
    pub proficiency: i16,
}

// ---------------------------------------------------------------------------
// Availability
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = weekly_rules)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct WeeklyRuleRow {
    pub id: Uuid,
    pub mentor_id: Uuid,
    pub weekday: i16,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = availability_slots)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct SlotRow {
    pub id: Uuid,
    pub mentor_id: Uuid,
    pub start_utc: DateTime<Utc>,
    pub end_utc: DateTime<Utc>,
    pub is_booked: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = availability_exceptions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ExceptionRow {
    pub id: Uuid,
    pub mentor_id: Uuid,
    pub start_utc: DateTime<Utc>,
    pub end_utc: DateTime<Utc>,
    pub reason: String,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = availability_exceptions)]
pub(crate) struct NewExceptionRow<'a> {
    pub id: Uuid,
    pub mentor_id: Uuid,
    pub start_utc: DateTime<Utc>,
    pub end_utc: DateTime<Utc>,
    pub reason: &'a str,
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = availability_settings)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct SettingsRow {
    pub mentor_id: Uuid,
    pub min_booking_notice_hours: i32,
    pub max_booking_advance_days: i32,
    pub default_session_minutes: i32,
}

// ---------------------------------------------------------------------------
// Bookings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = bookings)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct BookingRow {
    pub id: Uuid,
    pub learner_id: Uuid,
    pub mentor_id: Uuid,
    pub slot_id: Option<Uuid>,
    pub start_utc: DateTime<Utc>,
    pub end_utc: DateTime<Utc>,
    pub status: String,
    pub price_cents: i64,
    pub notes: String,
    pub decline_reason: Option<String>,
    pub cancellation_reason: Option<String>,
    pub cancelled_by: Option<Uuid>,
    pub session_notes: Option<String>,
    pub learner_rating: Option<i16>,
    pub learner_feedback: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Full booking record used for both insert and update.
#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = bookings)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct BookingRecord<'a> {
    pub id: Uuid,
    pub learner_id: Uuid,
    pub mentor_id: Uuid,
    pub slot_id: Option<Uuid>,
    pub start_utc: DateTime<Utc>,
    pub end_utc: DateTime<Utc>,
    pub status: &'a str,
    pub price_cents: i64,
    pub notes: &'a str,
    pub decline_reason: Option<&'a str>,
    pub cancellation_reason: Option<&'a str>,
    pub cancelled_by: Option<Uuid>,
    pub session_notes: Option<&'a str>,
    pub learner_rating: Option<i16>,
    pub learner_feedback: Option<&'a str>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Reviews
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = reviews)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ReviewRow {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub reviewer_id: Uuid,
    pub mentor_id: Uuid,
    pub overall: i16,
    pub communication: Option<i16>,
    pub knowledge: Option<i16>,
    pub punctuality: Option<i16>,
    pub body: String,
    pub would_recommend: bool,
    pub helpful_count: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = reviews)]
pub(crate) struct NewReviewRow<'a> {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub reviewer_id: Uuid,
    pub mentor_id: Uuid,
    pub overall: i16,
    pub communication: Option<i16>,
    pub knowledge: Option<i16>,
    pub punctuality: Option<i16>,
    pub body: &'a str,
    pub would_recommend: bool,
    pub helpful_count: i32,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Chat
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = chat_rooms)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ChatRoomRow {
    pub id: Uuid,
    pub first_participant: Uuid,
    pub second_participant: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = chat_messages)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ChatMessageRow {
    pub id: Uuid,
    pub room_id: Uuid,
    pub sender_id: Uuid,
    pub content: String,
    pub edited_at: Option<DateTime<Utc>>,
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = chat_messages)]
pub(crate) struct NewChatMessageRow<'a> {
    pub id: Uuid,
    pub room_id: Uuid,
    pub sender_id: Uuid,
    pub content: &'a str,
    pub edited_at: Option<DateTime<Utc>>,
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = chat_messages)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct ChatMessageUpdate<'a> {
    pub content: &'a str,
    pub edited_at: Option<DateTime<Utc>>,
    pub deleted: bool,
}

// ---------------------------------------------------------------------------
// Notifications, badges and logs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = notifications)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct NotificationRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: String,
    pub title: String,
    pub message: String,
    pub payload: Value,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = notifications)]
pub(crate) struct NewNotificationRow<'a> {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: &'a str,
    pub title: &'a str,
    pub message: &'a str,
    pub payload: &'a Value,
    pub booking_id: Option<Uuid>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = earned_badges)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct EarnedBadgeRow {
    pub user_id: Uuid,
    pub slug: String,
    pub earned_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = earned_badges)]
pub(crate) struct NewEarnedBadgeRow<'a> {
    pub user_id: Uuid,
    pub slug: &'a str,
    pub earned_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = ai_responses)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct AiResponseRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: String,
    pub model: String,
    pub prompt: String,
    pub response: Option<String>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = ai_responses)]
pub(crate) struct NewAiResponseRow<'a> {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: &'a str,
    pub model: &'a str,
    pub prompt: &'a str,
    pub response: Option<&'a str>,
    pub error: Option<&'a str>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = webhook_events)]
pub(crate) struct NewWebhookEventRow<'a> {
    pub id: Uuid,
    pub provider: &'a str,
    pub event_type: &'a str,
    pub event_id: Option<&'a str>,
    pub payload: &'a Value,
    pub received_at: DateTime<Utc>,
}
