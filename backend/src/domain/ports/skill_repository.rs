//! Port for the skill catalogue and mentor skill sets.
use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{MentorSkill, Skill, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by skill repository adapters.
    pub enum SkillRepositoryError {
        Connection { message: String } => "skill repository connection failed: {message}",
        Query { message: String } => "skill repository query failed: {message}",
        /// A skill with the same name or slug exists.
        DuplicateName { name: String } => "skill `{name}` already exists",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SkillRepository: Send + Sync {
    async fn create(&self, skill: &Skill) -> Result<(), SkillRepositoryError>;

    /// Every skill ordered by name.
    async fn list(&self) -> Result<Vec<Skill>, SkillRepositoryError>;

    /// Skills matching `ids`; unknown ids are absent from the result.
    async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<Skill>, SkillRepositoryError>;

    /// Replace the mentor's skill set with `(skill_id, proficiency)` pairs.
    async fn replace_mentor_skills(
        &self,
        mentor_id: &UserId,
        entries: &[(Uuid, i16)],
    ) -> Result<(), SkillRepositoryError>;

    /// The mentor's skills ordered by skill name.
    async fn mentor_skills(&self, mentor_id: &UserId)
    -> Result<Vec<MentorSkill>, SkillRepositoryError>;

    /// Every `(skill_id, mentor_id)` pairing.
    async fn mentor_skill_links(&self) -> Result<Vec<(Uuid, UserId)>, SkillRepositoryError>;
}
