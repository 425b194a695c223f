//! Driving port for the skill catalogue.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Actor, Error, MentorSkill, Skill, UserId};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SkillService: Send + Sync {
    async fn list(&self) -> Result<Vec<Skill>, Error>;

    /// Admin only.
    async fn create(&self, actor: &Actor, name: &str) -> Result<Skill, Error>;

    /// Replace the calling mentor's skills with `(skill_id, proficiency)` pairs.
    async fn set_mentor_skills(
        &self,
        actor: &Actor,
        entries: Vec<(Uuid, i16)>,
    ) -> Result<Vec<MentorSkill>, Error>;

    async fn mentor_skills(&self, mentor_id: &UserId) -> Result<Vec<MentorSkill>, Error>;
}
