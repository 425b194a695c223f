//! PostgreSQL-backed `SkillRepository`.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use diesel_async::{AsyncConnection as _, RunQueryDsl};
use uuid::Uuid;

use crate::domain::ports::{SkillRepository, SkillRepositoryError};
use crate::domain::{MentorSkill, Skill, UserId};

use super::diesel_basic_error_mapping::{
    ConstraintViolation, map_basic_diesel_error, map_basic_pool_error, violated_constraint,
};
use super::models::{MentorSkillRow, NewSkillRow, SkillRow};
use super::pool::{DbPool, PoolError};
use super::schema::{mentor_skills, skills};

#[derive(Clone)]
pub struct DieselSkillRepository {
    pool: DbPool,
}

impl DieselSkillRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> SkillRepositoryError {
    map_basic_pool_error(error, |message| SkillRepositoryError::connection(message))
}

fn map_diesel_error(error: diesel::result::Error) -> SkillRepositoryError {
    map_basic_diesel_error(
        error,
        SkillRepositoryError::query,
        SkillRepositoryError::connection,
    )
}

fn row_to_skill(row: SkillRow) -> Skill {
    Skill {
        id: row.id,
        name: row.name,
        slug: row.slug,
    }
}

#[async_trait]
impl SkillRepository for DieselSkillRepository {
    async fn create(&self, skill: &Skill) -> Result<(), SkillRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = NewSkillRow {
            id: skill.id,
            name: &skill.name,
            slug: &skill.slug,
        };
        diesel::insert_into(skills::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|err| match violated_constraint(&err) {
                Some(ConstraintViolation::Unique(_)) => {
                    SkillRepositoryError::duplicate_name(skill.name.clone())
                }
                _ => map_diesel_error(err),
            })
    }

    async fn list(&self) -> Result<Vec<Skill>, SkillRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<SkillRow> = skills::table
            .select(SkillRow::as_select())
            .order_by(skills::name)
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(rows.into_iter().map(row_to_skill).collect())
    }

    async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<Skill>, SkillRepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<SkillRow> = skills::table
            .filter(skills::id.eq_any(ids))
            .select(SkillRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(rows.into_iter().map(row_to_skill).collect())
    }

    async fn replace_mentor_skills(
        &self,
        mentor_id: &UserId,
        entries: &[(Uuid, i16)],
    ) -> Result<(), SkillRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let mentor = *mentor_id.as_uuid();
        let rows: Vec<MentorSkillRow> = entries
            .iter()
            .map(|(skill_id, proficiency)| MentorSkillRow {
                mentor_id: mentor,
                skill_id: *skill_id,
                proficiency: *proficiency,
            })
            .collect();
        conn.transaction(|conn| {
            async move {
                diesel::delete(mentor_skills::table.filter(mentor_skills::mentor_id.eq(mentor)))
                    .execute(conn)
                    .await?;
                if !rows.is_empty() {
                    diesel::insert_into(mentor_skills::table)
                        .values(&rows)
                        .execute(conn)
                        .await?;
                }
                Ok(())
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel_error)
    }

    async fn mentor_skills(
        &self,
        mentor_id: &UserId,
    ) -> Result<Vec<MentorSkill>, SkillRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<(SkillRow, i16)> = mentor_skills::table
            .inner_join(skills::table)
            .filter(mentor_skills::mentor_id.eq(mentor_id.as_uuid()))
            .select((SkillRow::as_select(), mentor_skills::proficiency))
            .order_by(skills::name)
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(rows
            .into_iter()
            .map(|(skill, proficiency)| MentorSkill {
                mentor_id: *mentor_id,
                skill: row_to_skill(skill),
                proficiency,
            })
            .collect())
    }

    async fn mentor_skill_links(&self) -> Result<Vec<(Uuid, UserId)>, SkillRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<(Uuid, Uuid)> = mentor_skills::table
            .select((mentor_skills::skill_id, mentor_skills::mentor_id))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(rows
            .into_iter()
            .map(|(skill_id, mentor_id)| (skill_id, UserId::from_uuid(mentor_id)))
            .collect())
    }
}
