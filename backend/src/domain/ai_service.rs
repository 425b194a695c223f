//! Language-model assistance with an audit log of every call.
//!
//! Provider failures do not fail the request: the caller receives the logged
//! entry with `error` set and no response.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::access::require_role;
use crate::domain::ports::{
    AiResponseRepository, AiService, BookingRepository, LanguageModel, ReviewRepository,
    SkillRepository, UserRepository,
};
use crate::domain::{
    Actor, AiKind, AiResponse, BookingStatus, Error, MentorCandidate, MentorRating, Role, Skill,
    User, UserId, question_prompt, recommendations_prompt, session_summary_prompt,
    validate_question,
};

#[derive(Clone)]
pub struct Assistant {
    model: Arc<dyn LanguageModel>,
    log: Arc<dyn AiResponseRepository>,
    users: Arc<dyn UserRepository>,
    bookings: Arc<dyn BookingRepository>,
    reviews: Arc<dyn ReviewRepository>,
    skills: Arc<dyn SkillRepository>,
    clock: Arc<dyn Clock>,
}

impl Assistant {
    pub fn new(
        model: Arc<dyn LanguageModel>,
        log: Arc<dyn AiResponseRepository>,
        users: Arc<dyn UserRepository>,
        bookings: Arc<dyn BookingRepository>,
        reviews: Arc<dyn ReviewRepository>,
        skills: Arc<dyn SkillRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            model,
            log,
            users,
            bookings,
            reviews,
            skills,
            clock,
        }
    }

    async fn user(&self, user_id: &UserId) -> Result<User, Error> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| Error::not_found(format!("user {user_id} not found")))
    }

    /// Call the model and record the outcome, successful or not.
    async fn run(&self, user_id: UserId, kind: AiKind, prompt: String) -> Result<AiResponse, Error> {
        let (response, error) = match self.model.complete(&prompt).await {
            Ok(text) => (Some(text), None),
            Err(err) => {
                warn!(%user_id, %kind, error = %err, "language model call failed");
                (None, Some(err.to_string()))
            }
        };
        let entry = AiResponse {
            id: Uuid::new_v4(),
            user_id,
            kind,
            model: self.model.model(),
            prompt,
            response,
            error,
            created_at: self.clock.utc(),
        };
        self.log.insert(&entry).await?;
        info!(%user_id, %kind, ok = entry.error.is_none(), "assistant call logged");
        Ok(entry)
    }
}

#[async_trait]
impl AiService for Assistant {
    async fn session_summary(&self, actor: &Actor, booking_id: &Uuid) -> Result<AiResponse, Error> {
        let booking = self
            .bookings
            .find(booking_id)
            .await?
            .filter(|booking| booking.involves(actor.user_id))
            .ok_or_else(|| Error::not_found(format!("booking {booking_id} not found")))?;
        if booking.status != BookingStatus::Completed {
            return Err(Error::invalid_request(
                "summaries are only available for completed sessions",
            ));
        }
        let mentor = self.user(&booking.mentor_id).await?;
        let learner = self.user(&booking.learner_id).await?;
        let prompt = session_summary_prompt(&booking, &mentor, &learner);
        self.run(actor.user_id, AiKind::SessionSummary, prompt).await
    }

    async fn recommendations(
        &self,
        actor: &Actor,
        goals: Option<String>,
    ) -> Result<AiResponse, Error> {
        require_role(actor, Role::Learner)?;
        let learner = self.user(&actor.user_id).await?;

        let mut profiles: Vec<(User, Vec<Skill>, MentorRating)> = Vec::new();
        for mentor in self.users.list_approved_mentors().await? {
            let skills = self
                .skills
                .mentor_skills(&mentor.id)
                .await?
                .into_iter()
                .map(|entry| entry.skill)
                .collect();
            let reviews = self.reviews.for_mentor(&mentor.id).await?;
            let rating = MentorRating::from_reviews(mentor.id, &reviews);
            profiles.push((mentor, skills, rating));
        }
        let candidates: Vec<MentorCandidate<'_>> = profiles
            .iter()
            .map(|(mentor, skills, rating)| MentorCandidate {
                mentor,
                skills,
                rating,
            })
            .collect();
        let prompt = recommendations_prompt(&learner, goals.as_deref(), &candidates);
        self.run(actor.user_id, AiKind::Recommendations, prompt).await
    }

    async fn ask(&self, actor: &Actor, question: &str) -> Result<AiResponse, Error> {
        let question =
            validate_question(question).map_err(|err| Error::invalid_request(err.to_string()))?;
        let asker = self.user(&actor.user_id).await?;
        let prompt = question_prompt(&asker, &question);
        self.run(actor.user_id, AiKind::Question, prompt).await
    }

    async fn history(&self, actor: &Actor) -> Result<Vec<AiResponse>, Error> {
        Ok(self.log.for_user(&actor.user_id).await?)
    }
}
