//! Analytics service: gathers facts from the stores and aggregates them.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::debug;
use uuid::Uuid;

use crate::domain::access::require_role;
use crate::domain::ports::{AnalyticsService, BookingRepository, SkillRepository, UserRepository};
use crate::domain::{
    Actor, AnalyticsPeriod, BookingFilter, BookingScope, Error, PlatformAnalytics, PlatformFacts,
    Role, SkillAnalytics,
};

#[derive(Clone)]
pub struct Analytics {
    users: Arc<dyn UserRepository>,
    bookings: Arc<dyn BookingRepository>,
    skills: Arc<dyn SkillRepository>,
    clock: Arc<dyn Clock>,
}

impl Analytics {
    pub fn new(
        users: Arc<dyn UserRepository>,
        bookings: Arc<dyn BookingRepository>,
        skills: Arc<dyn SkillRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            users,
            bookings,
            skills,
            clock,
        }
    }
}

#[async_trait]
impl AnalyticsService for Analytics {
    async fn platform(
        &self,
        actor: &Actor,
        period: AnalyticsPeriod,
    ) -> Result<PlatformAnalytics, Error> {
        require_role(actor, Role::Admin)?;
        let now = self.clock.utc();
        let role_counts = self.users.count_by_role().await?;
        let signups = self.users.signups_since(period.start(now)).await?;
        let bookings = self
            .bookings
            .list(&BookingFilter::scoped(BookingScope::All))
            .await?;
        let skills = self.skills.list().await?;
        let skill_links = self.skills.mentor_skill_links().await?;
        debug!(days = period.days(), bookings = bookings.len(), "platform analytics");
        Ok(PlatformAnalytics::compute(
            PlatformFacts {
                role_counts: &role_counts,
                signups: &signups,
                bookings: &bookings,
                skills: &skills,
                skill_links: &skill_links,
            },
            period,
            now,
        ))
    }

    async fn skill(&self, skill_id: &Uuid, period: AnalyticsPeriod) -> Result<SkillAnalytics, Error> {
        let skill = self
            .skills
            .find_many(std::slice::from_ref(skill_id))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::not_found(format!("skill {skill_id} not found")))?;
        let mut mentors = Vec::new();
        for (linked, mentor_id) in self.skills.mentor_skill_links().await? {
            if linked != *skill_id {
                continue;
            }
            if let Some(user) = self.users.find_by_id(&mentor_id).await?
                && user.role == Role::Mentor
            {
                mentors.push(user);
            }
        }
        let bookings = self
            .bookings
            .list(&BookingFilter::scoped(BookingScope::All))
            .await?;
        Ok(SkillAnalytics::compute(
            skill,
            &mentors,
            &bookings,
            period,
            self.clock.utc(),
        ))
    }
}
