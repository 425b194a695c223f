//! Users, bearer sessions and the skills catalogue.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::ports::{
    AuthSessionRepository, AuthSessionRepositoryError, SkillRepository, SkillRepositoryError,
    TwoFactorRepository, TwoFactorRepositoryError, UserRepository, UserRepositoryError,
};
use crate::domain::{
    AuthSession, Email, LoginChallenge, MentorSkill, PasswordHash, Role, Skill, TokenDigest,
    TwoFactorSettings, User, UserId,
};

use super::MemoryStore;

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create(&self, user: &User, password: &PasswordHash) -> Result<(), UserRepositoryError> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|(existing, _)| existing.email == user.email) {
            return Err(UserRepositoryError::duplicate_email());
        }
        tables.users.insert(user.id, (user.clone(), password.clone()));
        Ok(())
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserRepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.users.get(id).map(|(user, _)| user.clone()))
    }

    async fn find_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<(User, PasswordHash)>, UserRepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|(user, _)| user.email == *email)
            .cloned())
    }

    async fn update(&self, user: &User) -> Result<(), UserRepositoryError> {
        let mut tables = self.tables.write().await;
        match tables.users.get_mut(&user.id) {
            Some((stored, _)) => {
                *stored = user.clone();
                Ok(())
            }
            None => Err(UserRepositoryError::query(format!("user {} not found", user.id))),
        }
    }

    async fn list_approved_mentors(&self) -> Result<Vec<User>, UserRepositoryError> {
        let tables = self.tables.read().await;
        let mut mentors: Vec<User> = tables
            .users
            .values()
            .map(|(user, _)| user)
            .filter(|user| user.is_bookable_mentor())
            .cloned()
            .collect();
        mentors.sort_by(|a, b| {
            a.display_name
                .as_ref()
                .cmp(b.display_name.as_ref())
                .then(a.id.cmp(&b.id))
        });
        Ok(mentors)
    }

    async fn list_pending_mentors(&self) -> Result<Vec<User>, UserRepositoryError> {
        let tables = self.tables.read().await;
        let mut pending: Vec<User> = tables
            .users
            .values()
            .map(|(user, _)| user)
            .filter(|user| user.role == Role::Mentor && !user.is_mentor_approved)
            .cloned()
            .collect();
        pending.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(pending)
    }

    async fn find_password_hash(
        &self,
        id: &UserId,
    ) -> Result<Option<PasswordHash>, UserRepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.users.get(id).map(|(_, hash)| hash.clone()))
    }

    async fn update_password(
        &self,
        id: &UserId,
        password: &PasswordHash,
    ) -> Result<bool, UserRepositoryError> {
        let mut tables = self.tables.write().await;
        Ok(tables
            .users
            .get_mut(id)
            .map(|(_, hash)| *hash = password.clone())
            .is_some())
    }

    async fn signups_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<(Role, DateTime<Utc>)>, UserRepositoryError> {
        let tables = self.tables.read().await;
        let mut signups: Vec<(Role, DateTime<Utc>)> = tables
            .users
            .values()
            .map(|(user, _)| (user.role, user.created_at))
            .filter(|(_, at)| *at >= since)
            .collect();
        signups.sort_by_key(|(_, at)| *at);
        Ok(signups)
    }

    async fn count_by_role(&self) -> Result<Vec<(Role, u64)>, UserRepositoryError> {
        let tables = self.tables.read().await;
        Ok([Role::Learner, Role::Mentor, Role::Admin]
            .into_iter()
            .map(|role| {
                let count = tables
                    .users
                    .values()
                    .filter(|(user, _)| user.role == role)
                    .count() as u64;
                (role, count)
            })
            .filter(|(_, count)| *count > 0)
            .collect())
    }
}

#[async_trait]
impl AuthSessionRepository for MemoryStore {
    async fn insert(&self, session: &AuthSession) -> Result<(), AuthSessionRepositoryError> {
        let mut tables = self.tables.write().await;
        tables
            .sessions
            .insert(session.digest.as_ref().to_owned(), session.clone());
        Ok(())
    }

    async fn find(
        &self,
        digest: &TokenDigest,
    ) -> Result<Option<AuthSession>, AuthSessionRepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.sessions.get(digest.as_ref()).cloned())
    }

    async fn revoke(&self, digest: &TokenDigest) -> Result<(), AuthSessionRepositoryError> {
        let mut tables = self.tables.write().await;
        if let Some(session) = tables.sessions.get_mut(digest.as_ref()) {
            session.revoked = true;
        }
        Ok(())
    }

    async fn revoke_others(
        &self,
        user_id: &UserId,
        keep: &TokenDigest,
    ) -> Result<u64, AuthSessionRepositoryError> {
        let mut tables = self.tables.write().await;
        let mut revoked = 0;
        for session in tables.sessions.values_mut() {
            if session.user_id == *user_id && session.digest != *keep && !session.revoked {
                session.revoked = true;
                revoked += 1;
            }
        }
        Ok(revoked)
    }
}

#[async_trait]
impl TwoFactorRepository for MemoryStore {
    async fn find(
        &self,
        user_id: &UserId,
    ) -> Result<Option<TwoFactorSettings>, TwoFactorRepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.two_factor.get(user_id).cloned())
    }

    async fn save(&self, settings: &TwoFactorSettings) -> Result<(), TwoFactorRepositoryError> {
        let mut tables = self.tables.write().await;
        tables.two_factor.insert(settings.user_id, settings.clone());
        Ok(())
    }

    async fn delete(&self, user_id: &UserId) -> Result<(), TwoFactorRepositoryError> {
        let mut tables = self.tables.write().await;
        tables.two_factor.remove(user_id);
        Ok(())
    }

    async fn insert_challenge(
        &self,
        challenge: &LoginChallenge,
    ) -> Result<(), TwoFactorRepositoryError> {
        let mut tables = self.tables.write().await;
        tables
            .challenges
            .insert(challenge.digest.as_ref().to_owned(), challenge.clone());
        Ok(())
    }

    async fn find_challenge(
        &self,
        digest: &TokenDigest,
    ) -> Result<Option<LoginChallenge>, TwoFactorRepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.challenges.get(digest.as_ref()).cloned())
    }

    async fn record_attempt(
        &self,
        digest: &TokenDigest,
    ) -> Result<Option<LoginChallenge>, TwoFactorRepositoryError> {
        let mut tables = self.tables.write().await;
        Ok(tables.challenges.get_mut(digest.as_ref()).map(|challenge| {
            challenge.attempts += 1;
            challenge.clone()
        }))
    }

    async fn delete_challenge(&self, digest: &TokenDigest) -> Result<(), TwoFactorRepositoryError> {
        let mut tables = self.tables.write().await;
        tables.challenges.remove(digest.as_ref());
        Ok(())
    }
}

#[async_trait]
impl SkillRepository for MemoryStore {
    async fn create(&self, skill: &Skill) -> Result<(), SkillRepositoryError> {
        let mut tables = self.tables.write().await;
        if tables.skills.values().any(|existing| existing.slug == skill.slug) {
            return Err(SkillRepositoryError::duplicate_name(skill.name.clone()));
        }
        tables.skills.insert(skill.id, skill.clone());
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Skill>, SkillRepositoryError> {
        let tables = self.tables.read().await;
        let mut skills: Vec<Skill> = tables.skills.values().cloned().collect();
        skills.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(skills)
    }

    async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<Skill>, SkillRepositoryError> {
        let tables = self.tables.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| tables.skills.get(id))
            .cloned()
            .collect())
    }

    async fn replace_mentor_skills(
        &self,
        mentor_id: &UserId,
        entries: &[(Uuid, i16)],
    ) -> Result<(), SkillRepositoryError> {
        let mut tables = self.tables.write().await;
        tables.mentor_skills.insert(*mentor_id, entries.to_vec());
        Ok(())
    }

    async fn mentor_skills(
        &self,
        mentor_id: &UserId,
    ) -> Result<Vec<MentorSkill>, SkillRepositoryError> {
        let tables = self.tables.read().await;
        let mut skills: Vec<MentorSkill> = tables
            .mentor_skills
            .get(mentor_id)
            .into_iter()
            .flatten()
            .filter_map(|(skill_id, proficiency)| {
                tables.skills.get(skill_id).map(|skill| MentorSkill {
                    mentor_id: *mentor_id,
                    skill: skill.clone(),
                    proficiency: *proficiency,
                })
            })
            .collect();
        skills.sort_by(|a, b| a.skill.name.cmp(&b.skill.name));
        Ok(skills)
    }

    async fn mentor_skill_links(&self) -> Result<Vec<(Uuid, UserId)>, SkillRepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .mentor_skills
            .iter()
            .flat_map(|(mentor_id, entries)| {
                entries.iter().map(move |(skill_id, _)| (*skill_id, *mentor_id))
            })
            .collect())
    }
}
