//! PostgreSQL-backed `BookingRepository`.
//!
//! The `bookings_no_overlap` exclusion constraint covers pending and
//! confirmed rows, so two concurrent requests for the same mentor interval
//! cannot both commit.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::ports::{BookingRepository, BookingRepositoryError};
use crate::domain::{
    Booking, BookingFilter, BookingScope, BookingStatus, Interval, UserId,
};

use super::diesel_basic_error_mapping::{
    ConstraintViolation, map_basic_diesel_error, map_basic_pool_error, violated_constraint,
};
use super::diesel_helpers::{collect_rows, parse_label};
use super::models::{BookingRecord, BookingRow};
use super::pool::{DbPool, PoolError};
use super::schema::bookings;

#[derive(Clone)]
pub struct DieselBookingRepository {
    pool: DbPool,
}

impl DieselBookingRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> BookingRepositoryError {
    map_basic_pool_error(error, |message| BookingRepositoryError::connection(message))
}

fn map_diesel_error(error: diesel::result::Error) -> BookingRepositoryError {
    if let Some(ConstraintViolation::Exclusion(_)) = violated_constraint(&error) {
        return BookingRepositoryError::overlap();
    }
    map_basic_diesel_error(
        error,
        BookingRepositoryError::query,
        BookingRepositoryError::connection,
    )
}

fn record_of(booking: &Booking) -> BookingRecord<'_> {
    BookingRecord {
        id: booking.id,
        learner_id: *booking.learner_id.as_uuid(),
        mentor_id: *booking.mentor_id.as_uuid(),
        slot_id: booking.slot_id,
        start_utc: booking.start_utc,
        end_utc: booking.end_utc,
        status: booking.status.as_str(),
        price_cents: booking.price_cents,
        notes: &booking.notes,
        decline_reason: booking.decline_reason.as_deref(),
        cancellation_reason: booking.cancellation_reason.as_deref(),
        cancelled_by: booking.cancelled_by.map(|id| *id.as_uuid()),
        session_notes: booking.session_notes.as_deref(),
        learner_rating: booking.learner_rating,
        learner_feedback: booking.learner_feedback.as_deref(),
        created_at: booking.created_at,
        updated_at: booking.updated_at,
    }
}

fn row_to_booking(row: BookingRow) -> Result<Booking, String> {
    Ok(Booking {
        id: row.id,
        learner_id: UserId::from_uuid(row.learner_id),
        mentor_id: UserId::from_uuid(row.mentor_id),
        slot_id: row.slot_id,
        start_utc: row.start_utc,
        end_utc: row.end_utc,
        status: parse_label::<BookingStatus>("status", &row.status)?,
        price_cents: row.price_cents,
        notes: row.notes,
        decline_reason: row.decline_reason,
        cancellation_reason: row.cancellation_reason,
        cancelled_by: row.cancelled_by.map(UserId::from_uuid),
        session_notes: row.session_notes,
        learner_rating: row.learner_rating,
        learner_feedback: row.learner_feedback,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

fn rows_to_bookings(rows: Vec<BookingRow>) -> Result<Vec<Booking>, BookingRepositoryError> {
    collect_rows(
        rows.into_iter().map(row_to_booking),
        BookingRepositoryError::query,
    )
}

#[async_trait]
impl BookingRepository for DieselBookingRepository {
    async fn insert(&self, booking: &Booking) -> Result<(), BookingRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(bookings::table)
            .values(&record_of(booking))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn find(&self, booking_id: &Uuid) -> Result<Option<Booking>, BookingRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<BookingRow> = bookings::table
            .filter(bookings::id.eq(booking_id))
            .select(BookingRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(row_to_booking)
            .transpose()
            .map_err(BookingRepositoryError::query)
    }

    async fn update(&self, booking: &Booking) -> Result<(), BookingRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let updated = diesel::update(bookings::table.filter(bookings::id.eq(booking.id)))
            .set(&record_of(booking))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        if updated == 0 {
            return Err(BookingRepositoryError::query(format!(
                "booking {} not found",
                booking.id
            )));
        }
        Ok(())
    }

    async fn list(&self, filter: &BookingFilter) -> Result<Vec<Booking>, BookingRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let mut query = bookings::table
            .select(BookingRow::as_select())
            .order_by((bookings::start_utc, bookings::id))
            .into_boxed();
        query = match &filter.scope {
            BookingScope::Learner(learner) => {
                query.filter(bookings::learner_id.eq(*learner.as_uuid()))
            }
            BookingScope::Mentor(mentor) => query.filter(bookings::mentor_id.eq(*mentor.as_uuid())),
            BookingScope::All => query,
        };
        if let Some(status) = filter.status {
            query = query.filter(bookings::status.eq(status.as_str()));
        }
        if let Some(from) = filter.from {
            query = query.filter(bookings::start_utc.ge(from));
        }
        if let Some(to) = filter.to {
            query = query.filter(bookings::start_utc.lt(to));
        }
        let rows: Vec<BookingRow> = query.load(&mut conn).await.map_err(map_diesel_error)?;
        rows_to_bookings(rows)
    }

    async fn has_overlap(
        &self,
        mentor_id: &UserId,
        interval: &Interval,
        statuses: &[BookingStatus],
        exclude: Option<Uuid>,
    ) -> Result<bool, BookingRepositoryError> {
        if statuses.is_empty() {
            return Ok(false);
        }
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let labels: Vec<&str> = statuses.iter().map(|status| status.as_str()).collect();
        let mut query = bookings::table
            .filter(bookings::mentor_id.eq(*mentor_id.as_uuid()))
            .filter(bookings::status.eq_any(labels))
            .filter(bookings::start_utc.lt(interval.end()))
            .filter(bookings::end_utc.gt(interval.start()))
            .select(bookings::id)
            .into_boxed();
        if let Some(exclude) = exclude {
            query = query.filter(bookings::id.ne(exclude));
        }
        let hit: Option<Uuid> = query
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        Ok(hit.is_some())
    }

    async fn confirmed_starting_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Booking>, BookingRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<BookingRow> = bookings::table
            .filter(bookings::status.eq(BookingStatus::Confirmed.as_str()))
            .filter(bookings::start_utc.ge(from))
            .filter(bookings::start_utc.le(to))
            .select(BookingRow::as_select())
            .order_by((bookings::start_utc, bookings::id))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows_to_bookings(rows)
    }
}
