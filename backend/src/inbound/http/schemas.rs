//! Response bodies shared by several handler modules.
//!
//! Domain types stay free of serde and utoipa derives. These bodies mirror
//! them in camelCase and carry the OpenAPI schema definitions.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::{
    Booking, BookingStatus, ChatMessage, ChatRoom, MentorCard, MentorRating, MentorSkill, Role,
    Skill, User,
};

/// Account as seen by its owner and by admins.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserBody {
    pub id: Uuid,
    #[schema(example = "ada@example.com")]
    pub email: String,
    #[schema(example = "Ada Lovelace")]
    pub display_name: String,
    pub role: Role,
    pub bio: String,
    #[schema(example = "Europe/London")]
    pub timezone: String,
    pub hourly_rate_cents: Option<i64>,
    pub is_mentor_approved: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserBody {
    fn from(user: &User) -> Self {
        Self {
            id: *user.id.as_uuid(),
            email: user.email.to_string(),
            display_name: user.display_name.to_string(),
            role: user.role,
            bio: user.bio.clone(),
            timezone: user.timezone.name().to_owned(),
            hourly_rate_cents: user.hourly_rate_cents,
            is_mentor_approved: user.is_mentor_approved,
            created_at: user.created_at,
        }
    }
}

/// Public mentor profile; omits the e-mail address.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MentorBody {
    pub id: Uuid,
    pub display_name: String,
    pub bio: String,
    pub timezone: String,
    pub hourly_rate_cents: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for MentorBody {
    fn from(user: &User) -> Self {
        Self {
            id: *user.id.as_uuid(),
            display_name: user.display_name.to_string(),
            bio: user.bio.clone(),
            timezone: user.timezone.name().to_owned(),
            hourly_rate_cents: user.hourly_rate_cents,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SkillBody {
    pub id: Uuid,
    #[schema(example = "Rust")]
    pub name: String,
    #[schema(example = "rust")]
    pub slug: String,
}

impl From<&Skill> for SkillBody {
    fn from(skill: &Skill) -> Self {
        Self {
            id: skill.id,
            name: skill.name.clone(),
            slug: skill.slug.clone(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MentorSkillBody {
    pub skill_id: Uuid,
    pub name: String,
    pub slug: String,
    #[schema(minimum = 1, maximum = 10)]
    pub proficiency: i16,
}

impl From<&MentorSkill> for MentorSkillBody {
    fn from(entry: &MentorSkill) -> Self {
        Self {
            skill_id: entry.skill.id,
            name: entry.skill.name.clone(),
            slug: entry.skill.slug.clone(),
            proficiency: entry.proficiency,
        }
    }
}

/// Rating aggregate; the distribution is keyed by star value `"1"`..`"5"`.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RatingBody {
    pub mentor_id: Uuid,
    #[schema(example = 4.5)]
    pub average_rating: f64,
    pub total_reviews: u32,
    pub rating_distribution: BTreeMap<String, u32>,
}

impl From<&MentorRating> for RatingBody {
    fn from(rating: &MentorRating) -> Self {
        let rating_distribution = (1..=5_u8)
            .zip(rating.rating_distribution)
            .map(|(stars, count)| (stars.to_string(), count))
            .collect();
        Self {
            mentor_id: *rating.mentor_id.as_uuid(),
            average_rating: rating.average_rating,
            total_reviews: rating.total_reviews,
            rating_distribution,
        }
    }
}

/// Mentor profile with rating aggregate and skills.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MentorCardBody {
    #[serde(flatten)]
    pub mentor: MentorBody,
    pub rating: RatingBody,
    pub skills: Vec<MentorSkillBody>,
}

impl From<&MentorCard> for MentorCardBody {
    fn from(card: &MentorCard) -> Self {
        Self {
            mentor: MentorBody::from(&card.mentor),
            rating: RatingBody::from(&card.rating),
            skills: card.skills.iter().map(MentorSkillBody::from).collect(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookingBody {
    pub id: Uuid,
    pub learner_id: Uuid,
    pub mentor_id: Uuid,
    pub slot_id: Option<Uuid>,
    pub start_utc: DateTime<Utc>,
    pub end_utc: DateTime<Utc>,
    pub status: BookingStatus,
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

impl From<&Booking> for BookingBody {
    fn from(booking: &Booking) -> Self {
        Self {
            id: booking.id,
            learner_id: *booking.learner_id.as_uuid(),
            mentor_id: *booking.mentor_id.as_uuid(),
            slot_id: booking.slot_id,
            start_utc: booking.start_utc,
            end_utc: booking.end_utc,
            status: booking.status,
            price_cents: booking.price_cents,
            notes: booking.notes.clone(),
            decline_reason: booking.decline_reason.clone(),
            cancellation_reason: booking.cancellation_reason.clone(),
            cancelled_by: booking.cancelled_by.map(|id| *id.as_uuid()),
            session_notes: booking.session_notes.clone(),
            learner_rating: booking.learner_rating,
            learner_feedback: booking.learner_feedback.clone(),
            created_at: booking.created_at,
            updated_at: booking.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatRoomBody {
    pub id: Uuid,
    /// Both participants, sorted.
    pub participant_ids: [Uuid; 2],
    pub created_at: DateTime<Utc>,
}

impl From<&ChatRoom> for ChatRoomBody {
    fn from(room: &ChatRoom) -> Self {
        let [first, second] = room.participants.as_array();
        Self {
            id: room.id,
            participant_ids: [*first.as_uuid(), *second.as_uuid()],
            created_at: room.created_at,
        }
    }
}

/// Chat message; deleted messages carry empty content.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessageBody {
    pub id: Uuid,
    pub room_id: Uuid,
    pub sender_id: Uuid,
    pub content: String,
    pub edited_at: Option<DateTime<Utc>>,
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&ChatMessage> for ChatMessageBody {
    fn from(message: &ChatMessage) -> Self {
        Self {
            id: message.id,
            room_id: message.room_id,
            sender_id: *message.sender_id.as_uuid(),
            content: if message.deleted {
                String::new()
            } else {
                message.content.clone()
            },
            edited_at: message.edited_at,
            deleted: message.deleted,
            created_at: message.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::UserId;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    fn distribution_is_keyed_by_star_value() {
        let rating = MentorRating {
            mentor_id: UserId::random(),
            average_rating: 4.0,
            total_reviews: 3,
            rating_distribution: [0, 0, 1, 1, 1],
        };
        let body = serde_json::to_value(RatingBody::from(&rating)).expect("serialises");
        assert_eq!(
            body.get("ratingDistribution"),
            Some(&json!({"1": 0, "2": 0, "3": 1, "4": 1, "5": 1}))
        );
        assert_eq!(body.get("totalReviews"), Some(&json!(3)));
    }

    #[rstest]
    fn deleted_messages_never_leak_content() {
        let message = ChatMessage {
            id: uuid::Uuid::nil(),
            room_id: uuid::Uuid::nil(),
            sender_id: UserId::random(),
            content: "secret".to_owned(),
            edited_at: None,
            deleted: true,
            created_at: chrono::Utc::now(),
        };
        let body = serde_json::to_value(ChatMessageBody::from(&message)).expect("serialises");
        assert_eq!(body.get("content"), Some(&json!("")));
        assert_eq!(body.get("deleted"), Some(&json!(true)));
    }
}
