//! Port for booking persistence.
//!
//! Adapters guarantee that no two pending or confirmed bookings of the same
//! mentor overlap, reporting a violation as
//! [`BookingRepositoryError::Overlap`].
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{Booking, BookingFilter, BookingStatus, Interval, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by booking repository adapters.
    pub enum BookingRepositoryError {
        Connection { message: String } => "booking repository connection failed: {message}",
        Query { message: String } => "booking repository query failed: {message}",
        /// The mentor already has an active booking in the interval.
        Overlap => "mentor already has a booking in this interval",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn insert(&self, booking: &Booking) -> Result<(), BookingRepositoryError>;

    async fn find(&self, booking_id: &Uuid) -> Result<Option<Booking>, BookingRepositoryError>;

    /// Persist the mutable fields of an existing booking.
    async fn update(&self, booking: &Booking) -> Result<(), BookingRepositoryError>;

    /// Bookings admitted by `filter`, ordered by start time.
    async fn list(&self, filter: &BookingFilter) -> Result<Vec<Booking>, BookingRepositoryError>;

    /// Whether the mentor holds a booking in one of `statuses` overlapping
    /// `interval`, ignoring `exclude`.
    async fn has_overlap(
        &self,
        mentor_id: &UserId,
        interval: &Interval,
        statuses: &[BookingStatus],
        exclude: Option<Uuid>,
    ) -> Result<bool, BookingRepositoryError>;

    /// Confirmed bookings starting in `[from, to]`.
    async fn confirmed_starting_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Booking>, BookingRepositoryError>;
}
