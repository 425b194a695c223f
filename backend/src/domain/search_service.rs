//! Mentor search over approved mentors.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;

use crate::domain::ports::{
    AvailabilityService, ReviewRepository, SearchService, SkillRepository, UserRepository,
};
use crate::domain::{Error, MentorCard, MentorRating, MentorSearchQuery, sort_cards};

#[derive(Clone)]
pub struct MentorSearch {
    users: Arc<dyn UserRepository>,
    reviews: Arc<dyn ReviewRepository>,
    skills: Arc<dyn SkillRepository>,
    availability: Arc<dyn AvailabilityService>,
    clock: Arc<dyn Clock>,
}

impl MentorSearch {
    pub fn new(
        users: Arc<dyn UserRepository>,
        reviews: Arc<dyn ReviewRepository>,
        skills: Arc<dyn SkillRepository>,
        availability: Arc<dyn AvailabilityService>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            users,
            reviews,
            skills,
            availability,
            clock,
        }
    }
}

#[async_trait]
impl SearchService for MentorSearch {
    async fn search_mentors(&self, query: MentorSearchQuery) -> Result<Vec<MentorCard>, Error> {
        let query = query
            .validate()
            .map_err(|err| Error::invalid_request(err.to_string()))?;
        let window = query.available.map(|w| w.bounds(self.clock.utc()));

        let mut cards = Vec::new();
        for mentor in self.users.list_approved_mentors().await? {
            let reviews = self.reviews.for_mentor(&mentor.id).await?;
            let card = MentorCard {
                rating: MentorRating::from_reviews(mentor.id, &reviews),
                skills: self.skills.mentor_skills(&mentor.id).await?,
                mentor,
            };
            if !query.admits(&card) {
                continue;
            }
            if let Some((from, to)) = window {
                let open = self
                    .availability
                    .open_slots(&card.mentor.id, Some(from), Some(to))
                    .await?;
                if open.is_empty() {
                    continue;
                }
            }
            cards.push(card);
        }
        sort_cards(&mut cards);
        Ok(cards)
    }
}
