//! Availability and bookings.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::ports::{
    AvailabilityRepository, AvailabilityRepositoryError, BookingRepository,
    BookingRepositoryError,
};
use crate::domain::{
    AvailabilityException, AvailabilitySettings, AvailabilitySlot, Booking, BookingFilter,
    BookingStatus, Interval, UserId, WeeklyRule, weekday_index,
};

use super::{MemoryStore, Tables};

fn in_range(
    start: DateTime<Utc>,
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
) -> bool {
    from.is_none_or(|from| start >= from) && to.is_none_or(|to| start < to)
}

impl Tables {
    /// Whether an active booking for `mentor_id` other than `exclude` overlaps.
    fn booking_clash(
        &self,
        mentor_id: UserId,
        interval: &Interval,
        statuses: &[BookingStatus],
        exclude: Option<Uuid>,
    ) -> bool {
        self.bookings.values().any(|booking| {
            booking.mentor_id == mentor_id
                && Some(booking.id) != exclude
                && statuses.contains(&booking.status)
                && booking.interval().overlaps(interval)
        })
    }
}

#[async_trait]
impl AvailabilityRepository for MemoryStore {
    async fn weekly_rules(
        &self,
        mentor_id: &UserId,
    ) -> Result<Vec<WeeklyRule>, AvailabilityRepositoryError> {
        let tables = self.tables.read().await;
        let mut rules = tables
            .weekly_rules
            .get(mentor_id)
            .cloned()
            .unwrap_or_default();
        rules.sort_by_key(|rule| (weekday_index(rule.window.weekday), rule.window.start_time));
        Ok(rules)
    }

    async fn replace_weekly_rules(
        &self,
        mentor_id: &UserId,
        rules: &[WeeklyRule],
    ) -> Result<(), AvailabilityRepositoryError> {
        let mut tables = self.tables.write().await;
        tables.weekly_rules.insert(*mentor_id, rules.to_vec());
        Ok(())
    }

    async fn insert_slot(&self, slot: &AvailabilitySlot) -> Result<(), AvailabilityRepositoryError> {
        let mut tables = self.tables.write().await;
        let interval = slot.interval();
        let overlaps = tables.slots.values().any(|existing| {
            existing.mentor_id == slot.mentor_id && existing.interval().overlaps(&interval)
        });
        if overlaps {
            return Err(AvailabilityRepositoryError::overlap());
        }
        tables.slots.insert(slot.id, slot.clone());
        Ok(())
    }

    async fn slots_between(
        &self,
        mentor_id: &UserId,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<AvailabilitySlot>, AvailabilityRepositoryError> {
        let tables = self.tables.read().await;
        let mut slots: Vec<AvailabilitySlot> = tables
            .slots
            .values()
            .filter(|slot| slot.mentor_id == *mentor_id && in_range(slot.start_utc, from, to))
            .cloned()
            .collect();
        slots.sort_by_key(|slot| (slot.start_utc, slot.id));
        Ok(slots)
    }

    async fn find_slot(
        &self,
        slot_id: &Uuid,
    ) -> Result<Option<AvailabilitySlot>, AvailabilityRepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.slots.get(slot_id).cloned())
    }

    async fn delete_slot(&self, slot_id: &Uuid) -> Result<bool, AvailabilityRepositoryError> {
        let mut tables = self.tables.write().await;
        Ok(tables.slots.remove(slot_id).is_some())
    }

    async fn claim_slot(&self, slot_id: &Uuid) -> Result<bool, AvailabilityRepositoryError> {
        let mut tables = self.tables.write().await;
        Ok(match tables.slots.get_mut(slot_id) {
            Some(slot) if !slot.is_booked => {
                slot.is_booked = true;
                true
            }
            _ => false,
        })
    }

    async fn release_slot(&self, slot_id: &Uuid) -> Result<(), AvailabilityRepositoryError> {
        let mut tables = self.tables.write().await;
        if let Some(slot) = tables.slots.get_mut(slot_id) {
            slot.is_booked = false;
        }
        Ok(())
    }

    async fn insert_exception(
        &self,
        exception: &AvailabilityException,
    ) -> Result<(), AvailabilityRepositoryError> {
        let mut tables = self.tables.write().await;
        tables.exceptions.insert(exception.id, exception.clone());
        Ok(())
    }

    async fn exceptions(
        &self,
        mentor_id: &UserId,
    ) -> Result<Vec<AvailabilityException>, AvailabilityRepositoryError> {
        let tables = self.tables.read().await;
        let mut exceptions: Vec<AvailabilityException> = tables
            .exceptions
            .values()
            .filter(|exception| exception.mentor_id == *mentor_id)
            .cloned()
            .collect();
        exceptions.sort_by_key(|exception| (exception.start_utc, exception.id));
        Ok(exceptions)
    }

    async fn delete_exception(
        &self,
        mentor_id: &UserId,
        exception_id: &Uuid,
    ) -> Result<bool, AvailabilityRepositoryError> {
        let mut tables = self.tables.write().await;
        let owned = tables
            .exceptions
            .get(exception_id)
            .is_some_and(|exception| exception.mentor_id == *mentor_id);
        if owned {
            tables.exceptions.remove(exception_id);
        }
        Ok(owned)
    }

    async fn settings(
        &self,
        mentor_id: &UserId,
    ) -> Result<Option<AvailabilitySettings>, AvailabilityRepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.settings.get(mentor_id).copied())
    }

    async fn save_settings(
        &self,
        mentor_id: &UserId,
        settings: &AvailabilitySettings,
    ) -> Result<(), AvailabilityRepositoryError> {
        let mut tables = self.tables.write().await;
        tables.settings.insert(*mentor_id, *settings);
        Ok(())
    }
}

const BLOCKING: [BookingStatus; 2] = [BookingStatus::Pending, BookingStatus::Confirmed];

#[async_trait]
impl BookingRepository for MemoryStore {
    async fn insert(&self, booking: &Booking) -> Result<(), BookingRepositoryError> {
        let mut tables = self.tables.write().await;
        if booking.status.is_active()
            && tables.booking_clash(booking.mentor_id, &booking.interval(), &BLOCKING, None)
        {
            return Err(BookingRepositoryError::overlap());
        }
        tables.bookings.insert(booking.id, booking.clone());
        Ok(())
    }

    async fn find(&self, booking_id: &Uuid) -> Result<Option<Booking>, BookingRepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.bookings.get(booking_id).cloned())
    }

    async fn update(&self, booking: &Booking) -> Result<(), BookingRepositoryError> {
        let mut tables = self.tables.write().await;
        if !tables.bookings.contains_key(&booking.id) {
            return Err(BookingRepositoryError::query(format!(
                "booking {} not found",
                booking.id
            )));
        }
        if booking.status.is_active()
            && tables.booking_clash(
                booking.mentor_id,
                &booking.interval(),
                &BLOCKING,
                Some(booking.id),
            )
        {
            return Err(BookingRepositoryError::overlap());
        }
        tables.bookings.insert(booking.id, booking.clone());
        Ok(())
    }

    async fn list(&self, filter: &BookingFilter) -> Result<Vec<Booking>, BookingRepositoryError> {
        let tables = self.tables.read().await;
        let mut bookings: Vec<Booking> = tables
            .bookings
            .values()
            .filter(|booking| filter.admits(booking))
            .cloned()
            .collect();
        bookings.sort_by_key(|booking| (booking.start_utc, booking.id));
        Ok(bookings)
    }

    async fn has_overlap(
        &self,
        mentor_id: &UserId,
        interval: &Interval,
        statuses: &[BookingStatus],
        exclude: Option<Uuid>,
    ) -> Result<bool, BookingRepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.booking_clash(*mentor_id, interval, statuses, exclude))
    }

    async fn confirmed_starting_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Booking>, BookingRepositoryError> {
        let tables = self.tables.read().await;
        let mut bookings: Vec<Booking> = tables
            .bookings
            .values()
            .filter(|booking| {
                booking.status == BookingStatus::Confirmed
                    && in_range(booking.start_utc, Some(from), Some(to))
            })
            .cloned()
            .collect();
        bookings.sort_by_key(|booking| (booking.start_utc, booking.id));
        Ok(bookings)
    }
}
