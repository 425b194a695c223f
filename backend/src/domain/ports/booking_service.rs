//! Driving port for the booking workflow.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{Actor, Booking, BookingStatus, Error, UserId};

/// Learner's booking request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingRequest {
    pub mentor_id: UserId,
    pub start_utc: DateTime<Utc>,
    pub end_utc: DateTime<Utc>,
    pub notes: Option<String>,
    pub slot_id: Option<Uuid>,
}

/// Listing filters supplied by the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BookingQuery {
    pub status: Option<BookingStatus>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookingService: Send + Sync {
    async fn create(&self, actor: &Actor, request: BookingRequest) -> Result<Booking, Error>;

    async fn list(&self, actor: &Actor, query: BookingQuery) -> Result<Vec<Booking>, Error>;

    async fn get(&self, actor: &Actor, booking_id: &Uuid) -> Result<Booking, Error>;

    async fn confirm(&self, actor: &Actor, booking_id: &Uuid) -> Result<Booking, Error>;

    async fn decline(
        &self,
        actor: &Actor,
        booking_id: &Uuid,
        reason: Option<String>,
    ) -> Result<Booking, Error>;

    async fn cancel(
        &self,
        actor: &Actor,
        booking_id: &Uuid,
        reason: Option<String>,
    ) -> Result<Booking, Error>;

    async fn complete(
        &self,
        actor: &Actor,
        booking_id: &Uuid,
        session_notes: Option<String>,
    ) -> Result<Booking, Error>;

    async fn feedback(
        &self,
        actor: &Actor,
        booking_id: &Uuid,
        rating: i16,
        comment: Option<String>,
    ) -> Result<Booking, Error>;

    /// iCalendar document of the caller's confirmed and completed sessions.
    async fn calendar(&self, actor: &Actor) -> Result<String, Error>;

    /// iCalendar document for one visible booking.
    async fn booking_calendar(&self, actor: &Actor, booking_id: &Uuid) -> Result<String, Error>;

    /// Counts per status within the caller's scope.
    async fn stats(&self, actor: &Actor) -> Result<BTreeMap<String, u64>, Error>;
}
