//! Skill catalogue service.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use uuid::Uuid;

use crate::domain::access::require_role;
use crate::domain::ports::{SkillRepository, SkillService};
use crate::domain::{Actor, Error, MentorSkill, Role, Skill, UserId, validate_proficiency};

#[derive(Clone)]
pub struct SkillCatalogue {
    skills: Arc<dyn SkillRepository>,
}

impl SkillCatalogue {
    pub fn new(skills: Arc<dyn SkillRepository>) -> Self {
        Self { skills }
    }
}

#[async_trait]
impl SkillService for SkillCatalogue {
    async fn list(&self) -> Result<Vec<Skill>, Error> {
        Ok(self.skills.list().await?)
    }

    async fn create(&self, actor: &Actor, name: &str) -> Result<Skill, Error> {
        require_role(actor, Role::Admin)?;
        let skill = Skill::new(Uuid::new_v4(), name).map_err(|err| {
            Error::invalid_request(err.to_string())
                .with_details(json!({ "field": "name", "code": "invalid_skill_name" }))
        })?;
        self.skills.create(&skill).await?;
        Ok(skill)
    }

    async fn set_mentor_skills(
        &self,
        actor: &Actor,
        entries: Vec<(Uuid, i16)>,
    ) -> Result<Vec<MentorSkill>, Error> {
        require_role(actor, Role::Mentor)?;
        let mut seen = HashSet::new();
        for (skill_id, proficiency) in &entries {
            validate_proficiency(*proficiency).map_err(|err| {
                Error::invalid_request(err.to_string()).with_details(json!({
                    "field": "proficiency",
                    "value": proficiency,
                    "code": "out_of_range",
                }))
            })?;
            if !seen.insert(*skill_id) {
                return Err(Error::invalid_request(format!(
                    "skill {skill_id} listed more than once"
                )));
            }
        }

        let ids: Vec<Uuid> = entries.iter().map(|(id, _)| *id).collect();
        let known: HashSet<Uuid> = self
            .skills
            .find_many(&ids)
            .await?
            .into_iter()
            .map(|skill| skill.id)
            .collect();
        if let Some(unknown) = ids.iter().find(|id| !known.contains(id)) {
            return Err(Error::invalid_request(format!("unknown skill {unknown}"))
                .with_details(json!({ "field": "skillId", "value": unknown, "code": "unknown_skill" })));
        }

        self.skills
            .replace_mentor_skills(&actor.user_id, &entries)
            .await?;
        Ok(self.skills.mentor_skills(&actor.user_id).await?)
    }

    async fn mentor_skills(&self, mentor_id: &UserId) -> Result<Vec<MentorSkill>, Error> {
        Ok(self.skills.mentor_skills(mentor_id).await?)
    }
}
