//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly. Regenerate with
//! `diesel print-schema` after changing a migration.

diesel::table! {
    /// Registered accounts with their credential hash.
    users (id) {
        id -> Uuid,
        email -> Varchar,
        password_hash -> Text,
        display_name -> Varchar,
        /// One of `learner`, `mentor` or `admin`.
        role -> Varchar,
        bio -> Text,
        /// IANA zone name.
        timezone -> Varchar,
        hourly_rate_cents -> Nullable<Int8>,
        is_mentor_approved -> Bool,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Issued bearer tokens, keyed by their SHA-256 digest.
    auth_sessions (token_digest) {
        token_digest -> Varchar,
        user_id -> Uuid,
        expires_at -> Timestamptz,
        revoked -> Bool,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    two_factor_settings (user_id) {
        user_id -> Uuid,
        /// Base32 TOTP secret; null before enrolment starts.
        secret_base32 -> Nullable<Varchar>,
        enabled -> Bool,
        /// SHA-256 hex digests of unused recovery codes.
        recovery_digests -> Array<Text>,
        last_used_step -> Nullable<Int8>,
        confirmed_at -> Nullable<Timestamptz>,
        last_used_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    login_challenges (token_digest) {
        token_digest -> Varchar,
        user_id -> Uuid,
        attempts -> Int4,
        expires_at -> Timestamptz,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    skills (id) {
        id -> Uuid,
        name -> Varchar,
        slug -> Varchar,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    mentor_skills (mentor_id, skill_id) {
        mentor_id -> Uuid,
        skill_id -> Uuid,
        proficiency -> Int2,
    }
}

diesel::table! {
    /// Recurring local-time availability; `weekday` counts from Monday = 0.
    weekly_rules (id) {
        id -> Uuid,
        mentor_id -> Uuid,
        weekday -> Int2,
        start_time -> Time,
        end_time -> Time,
    }
}

diesel::table! {
    /// Concrete slots. An exclusion constraint forbids overlap per mentor.
    availability_slots (id) {
        id -> Uuid,
        mentor_id -> Uuid,
        start_utc -> Timestamptz,
        end_utc -> Timestamptz,
        is_booked -> Bool,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    availability_exceptions (id) {
        id -> Uuid,
        mentor_id -> Uuid,
        start_utc -> Timestamptz,
        end_utc -> Timestamptz,
        reason -> Text,
    }
}

diesel::table! {
    availability_settings (mentor_id) {
        mentor_id -> Uuid,
        min_booking_notice_hours -> Int4,
        max_booking_advance_days -> Int4,
        default_session_minutes -> Int4,
    }
}

diesel::table! {
    /// Session bookings. Pending and confirmed rows may not overlap per mentor.
    bookings (id) {
        id -> Uuid,
        learner_id -> Uuid,
        mentor_id -> Uuid,
        slot_id -> Nullable<Uuid>,
        start_utc -> Timestamptz,
        end_utc -> Timestamptz,
        status -> Varchar,
        price_cents -> Int8,
        notes -> Text,
        decline_reason -> Nullable<Text>,
        cancellation_reason -> Nullable<Text>,
        cancelled_by -> Nullable<Uuid>,
        session_notes -> Nullable<Text>,
        learner_rating -> Nullable<Int2>,
        learner_feedback -> Nullable<Text>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    reviews (id) {
        id -> Uuid,
        booking_id -> Uuid,
        reviewer_id -> Uuid,
        mentor_id -> Uuid,
        overall -> Int2,
        communication -> Nullable<Int2>,
        knowledge -> Nullable<Int2>,
        punctuality -> Nullable<Int2>,
        body -> Text,
        would_recommend -> Bool,
        helpful_count -> Int4,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    review_helpful_votes (review_id, voter_id) {
        review_id -> Uuid,
        voter_id -> Uuid,
    }
}

diesel::table! {
    /// One room per unordered pair; `first_participant` sorts lower.
    chat_rooms (id) {
        id -> Uuid,
        first_participant -> Uuid,
        second_participant -> Uuid,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    chat_messages (id) {
        id -> Uuid,
        room_id -> Uuid,
        sender_id -> Uuid,
        content -> Text,
        edited_at -> Nullable<Timestamptz>,
        deleted -> Bool,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// In-app notifications. `booking_id` mirrors `payload.bookingId`.
    notifications (id) {
        id -> Uuid,
        user_id -> Uuid,
        kind -> Varchar,
        title -> Text,
        message -> Text,
        payload -> Jsonb,
        booking_id -> Nullable<Uuid>,
        is_read -> Bool,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    earned_badges (user_id, slug) {
        user_id -> Uuid,
        slug -> Varchar,
        earned_at -> Timestamptz,
    }
}

diesel::table! {
    /// Audit log of language-model calls.
    ai_responses (id) {
        id -> Uuid,
        user_id -> Uuid,
        kind -> Varchar,
        model -> Varchar,
        prompt -> Text,
        response -> Nullable<Text>,
        error -> Nullable<Text>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    webhook_events (id) {
        id -> Uuid,
        provider -> Varchar,
        event_type -> Varchar,
        event_id -> Nullable<Varchar>,
        payload -> Jsonb,
        received_at -> Timestamptz,
    }
}

diesel::joinable!(auth_sessions -> users (user_id));
diesel::joinable!(two_factor_settings -> users (user_id));
diesel::joinable!(login_challenges -> users (user_id));
diesel::joinable!(mentor_skills -> skills (skill_id));
diesel::joinable!(chat_messages -> chat_rooms (room_id));
diesel::joinable!(review_helpful_votes -> reviews (review_id));

diesel::allow_tables_to_appear_in_same_query!(
    users,
    auth_sessions,
    two_factor_settings,
    login_challenges,
    skills,
    mentor_skills,
    weekly_rules,
    availability_slots,
    availability_exceptions,
    availability_settings,
    bookings,
    reviews,
    review_helpful_votes,
    chat_rooms,
    chat_messages,
    notifications,
    earned_badges,
    ai_responses,
    webhook_events,
);
