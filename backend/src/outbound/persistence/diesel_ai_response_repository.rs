//! PostgreSQL-backed `AiResponseRepository`.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{AiResponseRepository, AiResponseRepositoryError};
use crate::domain::{AiKind, AiResponse, UserId};

use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::diesel_helpers::{collect_rows, parse_label};
use super::models::{AiResponseRow, NewAiResponseRow};
use super::pool::{DbPool, PoolError};
use super::schema::ai_responses;

#[derive(Clone)]
pub struct DieselAiResponseRepository {
    pool: DbPool,
}

impl DieselAiResponseRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> AiResponseRepositoryError {
    map_basic_pool_error(error, |message| {
        AiResponseRepositoryError::connection(message)
    })
}

fn map_diesel_error(error: diesel::result::Error) -> AiResponseRepositoryError {
    map_basic_diesel_error(
        error,
        AiResponseRepositoryError::query,
        AiResponseRepositoryError::connection,
    )
}

fn row_to_response(row: AiResponseRow) -> Result<AiResponse, String> {
    Ok(AiResponse {
        id: row.id,
        user_id: UserId::from_uuid(row.user_id),
        kind: parse_label::<AiKind>("kind", &row.kind)?,
        model: row.model,
        prompt: row.prompt,
        response: row.response,
        error: row.error,
        created_at: row.created_at,
    })
}

#[async_trait]
impl AiResponseRepository for DieselAiResponseRepository {
    async fn insert(&self, response: &AiResponse) -> Result<(), AiResponseRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = NewAiResponseRow {
            id: response.id,
            user_id: *response.user_id.as_uuid(),
            kind: response.kind.as_str(),
            model: &response.model,
            prompt: &response.prompt,
            response: response.response.as_deref(),
            error: response.error.as_deref(),
            created_at: response.created_at,
        };
        diesel::insert_into(ai_responses::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn for_user(&self, user_id: &UserId) -> Result<Vec<AiResponse>, AiResponseRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<AiResponseRow> = ai_responses::table
            .filter(ai_responses::user_id.eq(user_id.as_uuid()))
            .select(AiResponseRow::as_select())
            .order_by((ai_responses::created_at.desc(), ai_responses::id.desc()))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        collect_rows(
            rows.into_iter().map(row_to_response),
            AiResponseRepositoryError::query,
        )
    }
}
