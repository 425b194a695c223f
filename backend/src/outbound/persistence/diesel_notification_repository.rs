//! PostgreSQL-backed `NotificationRepository`.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use serde_json::Value;
use uuid::Uuid;

use crate::domain::ports::{NotificationRepository, NotificationRepositoryError};
use crate::domain::{Notification, NotificationKind, NotificationStats, PageKey, UserId};

use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::diesel_helpers::{collect_rows, count, limit, parse_label};
use super::models::{NewNotificationRow, NotificationRow};
use super::pool::{DbPool, PoolError};
use super::schema::notifications;

#[derive(Clone)]
pub struct DieselNotificationRepository {
    pool: DbPool,
}

impl DieselNotificationRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> NotificationRepositoryError {
    map_basic_pool_error(error, |message| {
        NotificationRepositoryError::connection(message)
    })
}

fn map_diesel_error(error: diesel::result::Error) -> NotificationRepositoryError {
    map_basic_diesel_error(
        error,
        NotificationRepositoryError::query,
        NotificationRepositoryError::connection,
    )
}

/// Booking referenced by a payload's `bookingId`, if any.
fn referenced_booking(payload: &Value) -> Option<Uuid> {
    payload
        .get("bookingId")
        .and_then(Value::as_str)
        .and_then(|raw| Uuid::parse_str(raw).ok())
}

fn new_row(notification: &Notification) -> NewNotificationRow<'_> {
    NewNotificationRow {
        id: notification.id,
        user_id: *notification.user_id.as_uuid(),
        kind: notification.kind.as_str(),
        title: &notification.title,
        message: &notification.message,
        payload: &notification.payload,
        booking_id: referenced_booking(&notification.payload),
        is_read: notification.is_read,
        created_at: notification.created_at,
    }
}

fn row_to_notification(row: NotificationRow) -> Result<Notification, String> {
    Ok(Notification {
        id: row.id,
        user_id: UserId::from_uuid(row.user_id),
        kind: parse_label::<NotificationKind>("kind", &row.kind)?,
        title: row.title,
        message: row.message,
        payload: row.payload,
        is_read: row.is_read,
        created_at: row.created_at,
    })
}

#[async_trait]
impl NotificationRepository for DieselNotificationRepository {
    async fn insert(&self, notification: &Notification) -> Result<(), NotificationRepositoryError> {
        self.insert_all(std::slice::from_ref(notification)).await
    }

    async fn insert_all(
        &self,
        batch: &[Notification],
    ) -> Result<(), NotificationRepositoryError> {
        if batch.is_empty() {
            return Ok(());
        }
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        // A multi-row INSERT is a single statement, so it commits atomically.
        let rows: Vec<NewNotificationRow<'_>> = batch.iter().map(new_row).collect();
        diesel::insert_into(notifications::table)
            .values(&rows)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn page(
        &self,
        user_id: &UserId,
        unread_only: bool,
        before: Option<PageKey>,
        page_size: usize,
    ) -> Result<Vec<Notification>, NotificationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let mut query = notifications::table
            .filter(notifications::user_id.eq(user_id.as_uuid()))
            .select(NotificationRow::as_select())
            .order_by((notifications::created_at.desc(), notifications::id.desc()))
            .limit(limit(page_size))
            .into_boxed();
        if unread_only {
            query = query.filter(notifications::is_read.eq(false));
        }
        if let Some(key) = before {
            query = query.filter(
                notifications::created_at.lt(key.created_at).or(notifications::created_at
                    .eq(key.created_at)
                    .and(notifications::id.lt(key.id))),
            );
        }
        let rows: Vec<NotificationRow> = query.load(&mut conn).await.map_err(map_diesel_error)?;
        collect_rows(
            rows.into_iter().map(row_to_notification),
            NotificationRepositoryError::query,
        )
    }

    async fn mark_read(
        &self,
        user_id: &UserId,
        notification_id: &Uuid,
    ) -> Result<bool, NotificationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let updated = diesel::update(
            notifications::table
                .filter(notifications::id.eq(notification_id))
                .filter(notifications::user_id.eq(user_id.as_uuid())),
        )
        .set(notifications::is_read.eq(true))
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;
        Ok(updated > 0)
    }

    async fn mark_all_read(&self, user_id: &UserId) -> Result<u64, NotificationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let updated = diesel::update(
            notifications::table
                .filter(notifications::user_id.eq(user_id.as_uuid()))
                .filter(notifications::is_read.eq(false)),
        )
        .set(notifications::is_read.eq(true))
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;
        Ok(u64::try_from(updated).unwrap_or(u64::MAX))
    }

    async fn stats(&self, user_id: &UserId) -> Result<NotificationStats, NotificationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<(String, bool, i64)> = notifications::table
            .filter(notifications::user_id.eq(user_id.as_uuid()))
            .group_by((notifications::kind, notifications::is_read))
            .select((
                notifications::kind,
                notifications::is_read,
                diesel::dsl::count_star(),
            ))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let mut stats = NotificationStats::default();
        for (kind, is_read, total) in rows {
            let kind = parse_label::<NotificationKind>("kind", &kind)
                .map_err(NotificationRepositoryError::query)?;
            let total = count(total);
            stats.total += total;
            if !is_read {
                stats.unread += total;
            }
            *stats.by_kind.entry(kind).or_default() += total;
        }
        Ok(stats)
    }

    async fn has_reminder_for(&self, booking_id: &Uuid) -> Result<bool, NotificationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let hit: Option<Uuid> = notifications::table
            .filter(notifications::booking_id.eq(booking_id))
            .filter(notifications::kind.eq(NotificationKind::SessionReminder.as_str()))
            .select(notifications::id)
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        Ok(hit.is_some())
    }
}
