//! Driving port for mentor availability.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use uuid::Uuid;

use crate::domain::{
    Actor, AvailabilityException, AvailabilitySettings, AvailabilitySlot, Error, Interval,
    UserId, WeeklyRule, WeeklyWindow,
};

/// Inline weekly pattern used instead of the stored rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotPattern {
    pub weekdays: Vec<i16>,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

/// Request to expand weekly availability into concrete slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateSlotsRequest {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub pattern: Option<SlotPattern>,
    pub session_minutes: Option<i64>,
    pub break_minutes: Option<i64>,
}

/// Result of slot generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedSlots {
    pub slots: Vec<AvailabilitySlot>,
    pub skipped_count: usize,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AvailabilityService: Send + Sync {
    async fn weekly_rules(&self, actor: &Actor) -> Result<Vec<WeeklyRule>, Error>;

    async fn replace_weekly_rules(
        &self,
        actor: &Actor,
        windows: Vec<WeeklyWindow>,
    ) -> Result<Vec<WeeklyRule>, Error>;

    async fn create_slot(&self, actor: &Actor, interval: Interval)
    -> Result<AvailabilitySlot, Error>;

    async fn list_slots(
        &self,
        actor: &Actor,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<AvailabilitySlot>, Error>;

    async fn delete_slot(&self, actor: &Actor, slot_id: &Uuid) -> Result<(), Error>;

    async fn generate_slots(
        &self,
        actor: &Actor,
        request: GenerateSlotsRequest,
    ) -> Result<GeneratedSlots, Error>;

    async fn create_exception(
        &self,
        actor: &Actor,
        interval: Interval,
        reason: Option<String>,
    ) -> Result<AvailabilityException, Error>;

    async fn exceptions(&self, actor: &Actor) -> Result<Vec<AvailabilityException>, Error>;

    async fn delete_exception(&self, actor: &Actor, exception_id: &Uuid) -> Result<(), Error>;

    async fn settings(&self, actor: &Actor) -> Result<AvailabilitySettings, Error>;

    async fn update_settings(
        &self,
        actor: &Actor,
        settings: AvailabilitySettings,
    ) -> Result<AvailabilitySettings, Error>;

    /// Public view of bookable slots.
    async fn open_slots(
        &self,
        mentor_id: &UserId,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<AvailabilitySlot>, Error>;
}
