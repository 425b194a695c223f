//! PostgreSQL-backed `WebhookEventRepository`.
//!
//! Redeliveries are absorbed by the `(provider, event_id)` unique
//! constraint; events without an id are always recorded.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::ports::{WebhookEventRepository, WebhookEventRepositoryError};
use crate::domain::{WebhookEvent, WebhookRecordOutcome};

use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::models::NewWebhookEventRow;
use super::pool::{DbPool, PoolError};
use super::schema::webhook_events;

#[derive(Clone)]
pub struct DieselWebhookEventRepository {
    pool: DbPool,
}

impl DieselWebhookEventRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> WebhookEventRepositoryError {
    map_basic_pool_error(error, |message| {
        WebhookEventRepositoryError::connection(message)
    })
}

fn map_diesel_error(error: diesel::result::Error) -> WebhookEventRepositoryError {
    map_basic_diesel_error(
        error,
        WebhookEventRepositoryError::query,
        WebhookEventRepositoryError::connection,
    )
}

#[async_trait]
impl WebhookEventRepository for DieselWebhookEventRepository {
    async fn record(
        &self,
        event: &WebhookEvent,
    ) -> Result<WebhookRecordOutcome, WebhookEventRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = NewWebhookEventRow {
            id: event.id,
            provider: &event.provider,
            event_type: &event.event_type,
            event_id: event.event_id.as_deref(),
            payload: &event.payload,
            received_at: event.received_at,
        };
        let inserted = diesel::insert_into(webhook_events::table)
            .values(&row)
            .on_conflict((webhook_events::provider, webhook_events::event_id))
            .do_nothing()
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        if inserted == 1 {
            return Ok(WebhookRecordOutcome::Recorded);
        }
        let Some(event_id) = event.event_id.as_deref() else {
            return Err(WebhookEventRepositoryError::query(
                "webhook event without id was not recorded",
            ));
        };
        let existing: Uuid = webhook_events::table
            .filter(webhook_events::provider.eq(&event.provider))
            .filter(webhook_events::event_id.eq(event_id))
            .select(webhook_events::id)
            .first(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(WebhookRecordOutcome::Duplicate { id: existing })
    }
}
