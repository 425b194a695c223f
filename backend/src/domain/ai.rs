//! Language-model assisted features and their audit log.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{Booking, MentorRating, Skill, User, UserId};

/// Maximum question length in characters.
pub const QUESTION_MAX: usize = 2000;
/// Instruction sent ahead of every prompt.
pub const SYSTEM_PROMPT: &str = "You are an assistant for a mentoring marketplace. \
Give helpful, accurate and educational answers.";

/// Feature that produced a logged response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AiKind {
    SessionSummary,
    Recommendations,
    Question,
}

impl AiKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SessionSummary => "session_summary",
            Self::Recommendations => "recommendations",
            Self::Question => "question",
        }
    }
}

impl fmt::Display for AiKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown AI response kind: {value}")]
pub struct UnknownAiKind {
    pub value: String,
}

impl FromStr for AiKind {
    type Err = UnknownAiKind;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        [Self::SessionSummary, Self::Recommendations, Self::Question]
            .into_iter()
            .find(|kind| kind.as_str() == value)
            .ok_or_else(|| UnknownAiKind {
                value: value.to_owned(),
            })
    }
}

/// Logged model call; exactly one of `response` and `error` is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AiResponse {
    pub id: Uuid,
    pub user_id: UserId,
    pub kind: AiKind,
    pub model: String,
    pub prompt: String,
    pub response: Option<String>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QuestionValidationError {
    #[error("question must not be empty")]
    Empty,
    #[error("question must be at most {max} characters")]
    TooLong { max: usize },
}

/// Validate a free-form question.
pub fn validate_question(raw: &str) -> Result<String, QuestionValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(QuestionValidationError::Empty);
    }
    if trimmed.chars().count() > QUESTION_MAX {
        return Err(QuestionValidationError::TooLong { max: QUESTION_MAX });
    }
    Ok(trimmed.to_owned())
}

fn or_none(value: Option<&str>) -> &str {
    match value {
        Some(text) if !text.trim().is_empty() => text,
        _ => "None provided",
    }
}

/// Prompt asking for a summary of a completed session.
#[must_use]
pub fn session_summary_prompt(booking: &Booking, mentor: &User, learner: &User) -> String {
    format!(
        "Summarise this mentoring session.\n\n\
         Mentor: {mentor}\n\
         Learner: {learner}\n\
         Duration: {minutes} minutes\n\
         Learner's notes: {notes}\n\
         Mentor's session notes: {session_notes}\n\
         Learner's feedback: {feedback}\n\n\
         Cover what was discussed, key learning outcomes, progress shown and \
         recommended next steps.",
        mentor = mentor.display_name,
        learner = learner.display_name,
        minutes = booking.duration_minutes(),
        notes = or_none(Some(booking.notes.as_str())),
        session_notes = or_none(booking.session_notes.as_deref()),
        feedback = or_none(booking.learner_feedback.as_deref()),
    )
}

/// Mentor as offered to the recommendation prompt.
#[derive(Debug, Clone)]
pub struct MentorCandidate<'a> {
    pub mentor: &'a User,
    pub skills: &'a [Skill],
    pub rating: &'a MentorRating,
}

/// Prompt asking which mentors suit a learner.
#[must_use]
pub fn recommendations_prompt(
    learner: &User,
    goals: Option<&str>,
    candidates: &[MentorCandidate<'_>],
) -> String {
    let mut prompt = format!(
        "Recommend up to three mentors for this learner and explain each choice.\n\n\
         Learner: {name}\nLearner bio: {bio}\nGoals: {goals}\n\nAvailable mentors:\n",
        name = learner.display_name,
        bio = or_none(Some(learner.bio.as_str())),
        goals = or_none(goals),
    );
    if candidates.is_empty() {
        prompt.push_str("- none currently available\n");
    }
    for candidate in candidates {
        let skills = candidate
            .skills
            .iter()
            .map(|skill| skill.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        prompt.push_str(&format!(
            "- {name} (skills: {skills}; rating {rating:.1} from {reviews} reviews)\n",
            name = candidate.mentor.display_name,
            skills = if skills.is_empty() { "unspecified" } else { skills.as_str() },
            rating = candidate.rating.average_rating,
            reviews = candidate.rating.total_reviews,
        ));
    }
    prompt
}

/// Prompt wrapping a learner's question.
#[must_use]
pub fn question_prompt(asker: &User, question: &str) -> String {
    format!(
        "A {role} on the platform asks:\n\n{question}\n\nAnswer clearly and concisely.",
        role = asker.role,
    )
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::{DisplayName, Email, Interval, Role, Timezone};
    use rstest::rstest;

    fn user(name: &str, role: Role) -> User {
        User {
            id: UserId::random(),
            email: Email::new(format!("{}@example.com", name.to_lowercase())).expect("email"),
            display_name: DisplayName::new(name).expect("name"),
            role,
            bio: String::new(),
            timezone: Timezone::utc(),
            hourly_rate_cents: None,
            is_mentor_approved: true,
            created_at: Utc::now(),
        }
    }

    #[rstest]
    #[case("", QuestionValidationError::Empty)]
    #[case("   ", QuestionValidationError::Empty)]
    fn blank_questions_are_rejected(#[case] raw: &str, #[case] expected: QuestionValidationError) {
        assert_eq!(validate_question(raw), Err(expected));
    }

    #[rstest]
    fn long_questions_are_rejected() {
        let raw = "?".repeat(QUESTION_MAX + 1);
        assert_eq!(
            validate_question(&raw),
            Err(QuestionValidationError::TooLong { max: QUESTION_MAX })
        );
    }

    #[rstest]
    fn summary_prompt_names_both_parties() {
        let mentor = user("Grace", Role::Mentor);
        let learner = user("Ada", Role::Learner);
        let start = Utc::now();
        let booking = Booking::request(
            Uuid::new_v4(),
            learner.id,
            mentor.id,
            Interval::new(start, start + chrono::Duration::minutes(45)).expect("interval"),
            0,
            String::new(),
            start,
        );
        let prompt = session_summary_prompt(&booking, &mentor, &learner);
        assert!(prompt.contains("Mentor: Grace"));
        assert!(prompt.contains("Learner: Ada"));
        assert!(prompt.contains("45 minutes"));
        assert!(prompt.contains("Learner's notes: None provided"));
    }

    #[rstest]
    fn recommendations_prompt_lists_candidates() {
        let learner = user("Ada", Role::Learner);
        let mentor = user("Grace", Role::Mentor);
        let skills = [Skill::new(Uuid::new_v4(), "Compilers").expect("skill")];
        let rating = MentorRating::from_reviews(mentor.id, std::iter::empty());
        let prompt = recommendations_prompt(
            &learner,
            Some("learn Rust"),
            &[MentorCandidate {
                mentor: &mentor,
                skills: &skills,
                rating: &rating,
            }],
        );
        assert!(prompt.contains("Goals: learn Rust"));
        assert!(prompt.contains("- Grace (skills: Compilers; rating 0.0 from 0 reviews)"));
    }

    #[rstest]
    fn kinds_parse_from_storage() {
        assert_eq!("question".parse::<AiKind>(), Ok(AiKind::Question));
        assert!("poetry".parse::<AiKind>().is_err());
    }
}
