//! Port for weekly rules, concrete slots, exceptions and booking settings.
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{
    AvailabilityException, AvailabilitySettings, AvailabilitySlot, UserId, WeeklyRule,
};

use super::define_port_error;

define_port_error! {
    /// Errors raised by availability repository adapters.
    pub enum AvailabilityRepositoryError {
        Connection { message: String } =>
            "availability repository connection failed: {message}",
        Query { message: String } => "availability repository query failed: {message}",
        /// The slot overlaps another slot of the same mentor.
        Overlap => "slot overlaps an existing slot",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AvailabilityRepository: Send + Sync {
    /// Weekly rules ordered by weekday then start time.
    async fn weekly_rules(
        &self,
        mentor_id: &UserId,
    ) -> Result<Vec<WeeklyRule>, AvailabilityRepositoryError>;

    /// Replace the mentor's weekly rules in one step.
    async fn replace_weekly_rules(
        &self,
        mentor_id: &UserId,
        rules: &[WeeklyRule],
    ) -> Result<(), AvailabilityRepositoryError>;

    /// Insert a slot, rejecting overlaps with [`AvailabilityRepositoryError::Overlap`].
    async fn insert_slot(&self, slot: &AvailabilitySlot) -> Result<(), AvailabilityRepositoryError>;

    /// Slots starting in `[from, to)`, ordered by start. Open bounds are
    /// unbounded.
    async fn slots_between(
        &self,
        mentor_id: &UserId,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<AvailabilitySlot>, AvailabilityRepositoryError>;

    async fn find_slot(
        &self,
        slot_id: &Uuid,
    ) -> Result<Option<AvailabilitySlot>, AvailabilityRepositoryError>;

    /// Delete a slot; returns whether a row was removed.
    async fn delete_slot(&self, slot_id: &Uuid) -> Result<bool, AvailabilityRepositoryError>;

    /// Mark an unbooked slot booked; `false` when it was already booked or
    /// missing.
    async fn claim_slot(&self, slot_id: &Uuid) -> Result<bool, AvailabilityRepositoryError>;

    /// Mark a slot unbooked.
    async fn release_slot(&self, slot_id: &Uuid) -> Result<(), AvailabilityRepositoryError>;

    async fn insert_exception(
        &self,
        exception: &AvailabilityException,
    ) -> Result<(), AvailabilityRepositoryError>;

    /// Exceptions ordered by start.
    async fn exceptions(
        &self,
        mentor_id: &UserId,
    ) -> Result<Vec<AvailabilityException>, AvailabilityRepositoryError>;

    /// Delete one of the mentor's exceptions; returns whether it existed.
    async fn delete_exception(
        &self,
        mentor_id: &UserId,
        exception_id: &Uuid,
    ) -> Result<bool, AvailabilityRepositoryError>;

    async fn settings(
        &self,
        mentor_id: &UserId,
    ) -> Result<Option<AvailabilitySettings>, AvailabilityRepositoryError>;

    async fn save_settings(
        &self,
        mentor_id: &UserId,
        settings: &AvailabilitySettings,
    ) -> Result<(), AvailabilityRepositoryError>;
}
