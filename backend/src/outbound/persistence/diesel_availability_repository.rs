//! PostgreSQL-backed `AvailabilityRepository`.
//!
//! Slot overlap is enforced by the `availability_slots_no_overlap` exclusion
//! constraint; a violation maps to [`AvailabilityRepositoryError::Overlap`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use diesel_async::{AsyncConnection as _, RunQueryDsl};
use uuid::Uuid;

use crate::domain::ports::{AvailabilityRepository, AvailabilityRepositoryError};
use crate::domain::{
    AvailabilityException, AvailabilitySettings, AvailabilitySlot, UserId, WeeklyRule,
    WeeklyWindow, weekday_from_index, weekday_index,
};

use super::diesel_basic_error_mapping::{
    ConstraintViolation, map_basic_diesel_error, map_basic_pool_error, violated_constraint,
};
use super::diesel_helpers::collect_rows;
use super::models::{ExceptionRow, NewExceptionRow, SettingsRow, SlotRow, WeeklyRuleRow};
use super::pool::{DbPool, PoolError};
use super::schema::{
    availability_exceptions, availability_settings, availability_slots, weekly_rules,
};

#[derive(Clone)]
pub struct DieselAvailabilityRepository {
    pool: DbPool,
}

impl DieselAvailabilityRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> AvailabilityRepositoryError {
    map_basic_pool_error(error, |message| {
        AvailabilityRepositoryError::connection(message)
    })
}

fn map_diesel_error(error: diesel::result::Error) -> AvailabilityRepositoryError {
    if let Some(ConstraintViolation::Exclusion(_)) = violated_constraint(&error) {
        return AvailabilityRepositoryError::overlap();
    }
    map_basic_diesel_error(
        error,
        AvailabilityRepositoryError::query,
        AvailabilityRepositoryError::connection,
    )
}

fn row_to_rule(row: WeeklyRuleRow) -> Result<WeeklyRule, String> {
    let weekday = weekday_from_index(row.weekday).map_err(|err| err.to_string())?;
    let window = WeeklyWindow::new(weekday, row.start_time, row.end_time)
        .map_err(|err| format!("stored weekly rule {}: {err}", row.id))?;
    Ok(WeeklyRule {
        id: row.id,
        mentor_id: UserId::from_uuid(row.mentor_id),
        window,
    })
}

fn row_to_slot(row: SlotRow) -> AvailabilitySlot {
    AvailabilitySlot {
        id: row.id,
        mentor_id: UserId::from_uuid(row.mentor_id),
        start_utc: row.start_utc,
        end_utc: row.end_utc,
        is_booked: row.is_booked,
        created_at: row.created_at,
    }
}

fn row_to_exception(row: ExceptionRow) -> AvailabilityException {
    AvailabilityException {
        id: row.id,
        mentor_id: UserId::from_uuid(row.mentor_id),
        start_utc: row.start_utc,
        end_utc: row.end_utc,
        reason: row.reason,
    }
}

#[async_trait]
impl AvailabilityRepository for DieselAvailabilityRepository {
    async fn weekly_rules(
        &self,
        mentor_id: &UserId,
    ) -> Result<Vec<WeeklyRule>, AvailabilityRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<WeeklyRuleRow> = weekly_rules::table
            .filter(weekly_rules::mentor_id.eq(mentor_id.as_uuid()))
            .select(WeeklyRuleRow::as_select())
            .order_by((weekly_rules::weekday, weekly_rules::start_time))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        collect_rows(
            rows.into_iter().map(row_to_rule),
            AvailabilityRepositoryError::query,
        )
    }

    async fn replace_weekly_rules(
        &self,
        mentor_id: &UserId,
        rules: &[WeeklyRule],
    ) -> Result<(), AvailabilityRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let mentor = *mentor_id.as_uuid();
        let rows: Vec<WeeklyRuleRow> = rules
            .iter()
            .map(|rule| WeeklyRuleRow {
                id: rule.id,
                mentor_id: mentor,
                weekday: weekday_index(rule.window.weekday),
                start_time: rule.window.start_time,
                end_time: rule.window.end_time,
            })
            .collect();
        conn.transaction(|conn| {
            async move {
                diesel::delete(weekly_rules::table.filter(weekly_rules::mentor_id.eq(mentor)))
                    .execute(conn)
                    .await?;
                if !rows.is_empty() {
                    diesel::insert_into(weekly_rules::table)
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

    async fn insert_slot(&self, slot: &AvailabilitySlot) -> Result<(), AvailabilityRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = SlotRow {
            id: slot.id,
            mentor_id: *slot.mentor_id.as_uuid(),
            start_utc: slot.start_utc,
            end_utc: slot.end_utc,
            is_booked: slot.is_booked,
            created_at: slot.created_at,
        };
        diesel::insert_into(availability_slots::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn slots_between(
        &self,
        mentor_id: &UserId,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<AvailabilitySlot>, AvailabilityRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let mut query = availability_slots::table
            .filter(availability_slots::mentor_id.eq(mentor_id.as_uuid()))
            .select(SlotRow::as_select())
            .order_by((availability_slots::start_utc, availability_slots::id))
            .into_boxed();
        if let Some(from) = from {
            query = query.filter(availability_slots::start_utc.ge(from));
        }
        if let Some(to) = to {
            query = query.filter(availability_slots::start_utc.lt(to));
        }
        let rows: Vec<SlotRow> = query.load(&mut conn).await.map_err(map_diesel_error)?;
        Ok(rows.into_iter().map(row_to_slot).collect())
    }

    async fn find_slot(
        &self,
        slot_id: &Uuid,
    ) -> Result<Option<AvailabilitySlot>, AvailabilityRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<SlotRow> = availability_slots::table
            .filter(availability_slots::id.eq(slot_id))
            .select(SlotRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        Ok(row.map(row_to_slot))
    }

    async fn delete_slot(&self, slot_id: &Uuid) -> Result<bool, AvailabilityRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let deleted = diesel::delete(availability_slots::table.filter(availability_slots::id.eq(slot_id)))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(deleted > 0)
    }

    async fn claim_slot(&self, slot_id: &Uuid) -> Result<bool, AvailabilityRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let claimed = diesel::update(
            availability_slots::table
                .filter(availability_slots::id.eq(slot_id))
                .filter(availability_slots::is_booked.eq(false)),
        )
        .set(availability_slots::is_booked.eq(true))
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;
        Ok(claimed == 1)
    }

    async fn release_slot(&self, slot_id: &Uuid) -> Result<(), AvailabilityRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::update(availability_slots::table.filter(availability_slots::id.eq(slot_id)))
            .set(availability_slots::is_booked.eq(false))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn insert_exception(
        &self,
        exception: &AvailabilityException,
    ) -> Result<(), AvailabilityRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = NewExceptionRow {
            id: exception.id,
            mentor_id: *exception.mentor_id.as_uuid(),
            start_utc: exception.start_utc,
            end_utc: exception.end_utc,
            reason: &exception.reason,
        };
        diesel::insert_into(availability_exceptions::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn exceptions(
        &self,
        mentor_id: &UserId,
    ) -> Result<Vec<AvailabilityException>, AvailabilityRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<ExceptionRow> = availability_exceptions::table
            .filter(availability_exceptions::mentor_id.eq(mentor_id.as_uuid()))
            .select(ExceptionRow::as_select())
            .order_by((availability_exceptions::start_utc, availability_exceptions::id))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(rows.into_iter().map(row_to_exception).collect())
    }

    async fn delete_exception(
        &self,
        mentor_id: &UserId,
        exception_id: &Uuid,
    ) -> Result<bool, AvailabilityRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let deleted = diesel::delete(
            availability_exceptions::table
                .filter(availability_exceptions::id.eq(exception_id))
                .filter(availability_exceptions::mentor_id.eq(mentor_id.as_uuid())),
        )
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;
        Ok(deleted > 0)
    }

    async fn settings(
        &self,
        mentor_id: &UserId,
    ) -> Result<Option<AvailabilitySettings>, AvailabilityRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<SettingsRow> = availability_settings::table
            .filter(availability_settings::mentor_id.eq(mentor_id.as_uuid()))
            .select(SettingsRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        Ok(row.map(|row| AvailabilitySettings {
            min_booking_notice_hours: row.min_booking_notice_hours,
            max_booking_advance_days: row.max_booking_advance_days,
            default_session_minutes: row.default_session_minutes,
        }))
    }

    async fn save_settings(
        &self,
        mentor_id: &UserId,
        settings: &AvailabilitySettings,
    ) -> Result<(), AvailabilityRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = SettingsRow {
            mentor_id: *mentor_id.as_uuid(),
            min_booking_notice_hours: settings.min_booking_notice_hours,
            max_booking_advance_days: settings.max_booking_advance_days,
            default_session_minutes: settings.default_session_minutes,
        };
        diesel::insert_into(availability_settings::table)
            .values(&row)
            .on_conflict(availability_settings::mentor_id)
            .do_update()
            .set(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }
}
