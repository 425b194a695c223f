//! PostgreSQL-backed `BadgeRepository`.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{BadgeRepository, BadgeRepositoryError};
use crate::domain::{EarnedBadge, UserId};

use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::models::{EarnedBadgeRow, NewEarnedBadgeRow};
use super::pool::{DbPool, PoolError};
use super::schema::earned_badges;

#[derive(Clone)]
pub struct DieselBadgeRepository {
    pool: DbPool,
}

impl DieselBadgeRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> BadgeRepositoryError {
    map_basic_pool_error(error, |message| BadgeRepositoryError::connection(message))
}

fn map_diesel_error(error: diesel::result::Error) -> BadgeRepositoryError {
    map_basic_diesel_error(
        error,
        BadgeRepositoryError::query,
        BadgeRepositoryError::connection,
    )
}

#[async_trait]
impl BadgeRepository for DieselBadgeRepository {
    async fn award(&self, badge: &EarnedBadge) -> Result<bool, BadgeRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = NewEarnedBadgeRow {
            user_id: *badge.user_id.as_uuid(),
            slug: &badge.slug,
            earned_at: badge.earned_at,
        };
        let inserted = diesel::insert_into(earned_badges::table)
            .values(&row)
            .on_conflict((earned_badges::user_id, earned_badges::slug))
            .do_nothing()
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(inserted == 1)
    }

    async fn for_user(&self, user_id: &UserId) -> Result<Vec<EarnedBadge>, BadgeRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<EarnedBadgeRow> = earned_badges::table
            .filter(earned_badges::user_id.eq(user_id.as_uuid()))
            .select(EarnedBadgeRow::as_select())
            .order_by((earned_badges::earned_at.desc(), earned_badges::slug))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(rows
            .into_iter()
            .map(|row| EarnedBadge {
                user_id: UserId::from_uuid(row.user_id),
                slug: row.slug,
                earned_at: row.earned_at,
            })
            .collect())
    }
}
