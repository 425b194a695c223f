//! Availability service: weekly rules, slots, exceptions and settings.
//!
//! Slot generation resolves weekly windows through the mentor's timezone,
//! then drops candidates that start in the past or collide with an
//! exception, an existing slot or another candidate.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use mockable::Clock;
use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::access::require_role;
use crate::domain::ports::{
    AvailabilityRepository, AvailabilityRepositoryError, AvailabilityService,
    GenerateSlotsRequest, GeneratedSlots, SlotPattern, UserRepository,
};
use crate::domain::{
    Actor, AvailabilityException, AvailabilitySettings, AvailabilitySlot,
    AvailabilityValidationError, Error, Interval, Role, SessionLayout, SlotGenerationPlan,
    UserId, WeeklyRule, WeeklyWindow, filter_candidates, weekday_from_index,
};

/// Default span of the public open-slot view.
const OPEN_SLOT_WINDOW_DAYS: i64 = 30;

fn invalid(err: AvailabilityValidationError) -> Error {
    Error::invalid_request(err.to_string())
}

fn pattern_windows(pattern: &SlotPattern) -> Result<Vec<WeeklyWindow>, AvailabilityValidationError> {
    if pattern.weekdays.is_empty() {
        return Err(AvailabilityValidationError::EmptyPattern);
    }
    pattern
        .weekdays
        .iter()
        .map(|day| {
            WeeklyWindow::new(
                weekday_from_index(*day)?,
                pattern.start_time,
                pattern.end_time,
            )
        })
        .collect()
}

#[derive(Clone)]
pub struct AvailabilityPlanner {
    availability: Arc<dyn AvailabilityRepository>,
    users: Arc<dyn UserRepository>,
    clock: Arc<dyn Clock>,
}

impl AvailabilityPlanner {
    pub fn new(
        availability: Arc<dyn AvailabilityRepository>,
        users: Arc<dyn UserRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            availability,
            users,
            clock,
        }
    }

    async fn owned_slot(&self, actor: &Actor, slot_id: &Uuid) -> Result<AvailabilitySlot, Error> {
        self.availability
            .find_slot(slot_id)
            .await?
            .filter(|slot| slot.mentor_id == actor.user_id)
            .ok_or_else(|| Error::not_found(format!("slot {slot_id} not found")))
    }

    async fn windows_for(
        &self,
        mentor_id: &UserId,
        pattern: Option<&SlotPattern>,
    ) -> Result<Vec<WeeklyWindow>, Error> {
        match pattern {
            Some(pattern) => pattern_windows(pattern).map_err(invalid),
            None => Ok(self
                .availability
                .weekly_rules(mentor_id)
                .await?
                .into_iter()
                .map(|rule| rule.window)
                .collect()),
        }
    }
}

#[async_trait]
impl AvailabilityService for AvailabilityPlanner {
    async fn weekly_rules(&self, actor: &Actor) -> Result<Vec<WeeklyRule>, Error> {
        require_role(actor, Role::Mentor)?;
        Ok(self.availability.weekly_rules(&actor.user_id).await?)
    }

    async fn replace_weekly_rules(
        &self,
        actor: &Actor,
        windows: Vec<WeeklyWindow>,
    ) -> Result<Vec<WeeklyRule>, Error> {
        require_role(actor, Role::Mentor)?;
        let rules: Vec<WeeklyRule> = windows
            .into_iter()
            .map(|window| WeeklyRule {
                id: Uuid::new_v4(),
                mentor_id: actor.user_id,
                window,
            })
            .collect();
        self.availability
            .replace_weekly_rules(&actor.user_id, &rules)
            .await?;
        Ok(self.availability.weekly_rules(&actor.user_id).await?)
    }

    async fn create_slot(
        &self,
        actor: &Actor,
        interval: Interval,
    ) -> Result<AvailabilitySlot, Error> {
        require_role(actor, Role::Mentor)?;
        let slot = AvailabilitySlot {
            id: Uuid::new_v4(),
            mentor_id: actor.user_id,
            start_utc: interval.start(),
            end_utc: interval.end(),
            is_booked: false,
            created_at: self.clock.utc(),
        };
        self.availability.insert_slot(&slot).await?;
        Ok(slot)
    }

    async fn list_slots(
        &self,
        actor: &Actor,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<AvailabilitySlot>, Error> {
        require_role(actor, Role::Mentor)?;
        Ok(self
            .availability
            .slots_between(&actor.user_id, from, to)
            .await?)
    }

    async fn delete_slot(&self, actor: &Actor, slot_id: &Uuid) -> Result<(), Error> {
        require_role(actor, Role::Mentor)?;
        let slot = self.owned_slot(actor, slot_id).await?;
        if slot.is_booked {
            return Err(Error::conflict("cannot delete a booked slot"));
        }
        if !self.availability.delete_slot(slot_id).await? {
            return Err(Error::not_found(format!("slot {slot_id} not found")));
        }
        Ok(())
    }

    async fn generate_slots(
        &self,
        actor: &Actor,
        request: GenerateSlotsRequest,
    ) -> Result<GeneratedSlots, Error> {
        require_role(actor, Role::Mentor)?;
        let layout = SessionLayout::new(request.session_minutes, request.break_minutes)
            .map_err(invalid)?;
        let windows = self
            .windows_for(&actor.user_id, request.pattern.as_ref())
            .await?;
        let plan = SlotGenerationPlan::new(request.start_date, request.end_date, windows, layout)
            .map_err(invalid)?;
        let mentor = self
            .users
            .find_by_id(&actor.user_id)
            .await?
            .ok_or_else(|| Error::not_found(format!("user {} not found", actor.user_id)))?;

        let (candidates, unresolved) = plan.candidates(mentor.timezone.tz());
        let (Some(first), Some(last)) = (
            candidates.iter().map(Interval::start).min(),
            candidates.iter().map(Interval::end).max(),
        ) else {
            return Ok(GeneratedSlots {
                slots: Vec::new(),
                skipped_count: unresolved,
            });
        };

        let existing: Vec<Interval> = self
            .availability
            .slots_between(&actor.user_id, Some(first - Duration::days(1)), Some(last))
            .await?
            .iter()
            .map(AvailabilitySlot::interval)
            .collect();
        let exceptions: Vec<Interval> = self
            .availability
            .exceptions(&actor.user_id)
            .await?
            .iter()
            .map(AvailabilityException::interval)
            .collect();

        let now = self.clock.utc();
        let filtered = filter_candidates(candidates, now, &exceptions, &existing);
        let mut skipped_count = unresolved + filtered.skipped;
        let mut slots = Vec::with_capacity(filtered.accepted.len());
        for interval in filtered.accepted {
            let slot = AvailabilitySlot {
                id: Uuid::new_v4(),
                mentor_id: actor.user_id,
                start_utc: interval.start(),
                end_utc: interval.end(),
                is_booked: false,
                created_at: now,
            };
            match self.availability.insert_slot(&slot).await {
                Ok(()) => slots.push(slot),
                // Another writer claimed the range after the snapshot.
                Err(AvailabilityRepositoryError::Overlap) => {
                    debug!(start = %slot.start_utc, "generated slot raced an insert");
                    skipped_count += 1;
                }
                Err(err) => return Err(err.into()),
            }
        }
        info!(
            mentor_id = %actor.user_id,
            created = slots.len(),
            skipped = skipped_count,
            "slots generated"
        );
        Ok(GeneratedSlots {
            slots,
            skipped_count,
        })
    }

    async fn create_exception(
        &self,
        actor: &Actor,
        interval: Interval,
        reason: Option<String>,
    ) -> Result<AvailabilityException, Error> {
        require_role(actor, Role::Mentor)?;
        let exception = AvailabilityException {
            id: Uuid::new_v4(),
            mentor_id: actor.user_id,
            start_utc: interval.start(),
            end_utc: interval.end(),
            reason: reason.unwrap_or_default(),
        };
        self.availability.insert_exception(&exception).await?;
        Ok(exception)
    }

    async fn exceptions(&self, actor: &Actor) -> Result<Vec<AvailabilityException>, Error> {
        require_role(actor, Role::Mentor)?;
        Ok(self.availability.exceptions(&actor.user_id).await?)
    }

    async fn delete_exception(&self, actor: &Actor, exception_id: &Uuid) -> Result<(), Error> {
        require_role(actor, Role::Mentor)?;
        if self
            .availability
            .delete_exception(&actor.user_id, exception_id)
            .await?
        {
            Ok(())
        } else {
            Err(Error::not_found(format!(
                "exception {exception_id} not found"
            )))
        }
    }

    async fn settings(&self, actor: &Actor) -> Result<AvailabilitySettings, Error> {
        require_role(actor, Role::Mentor)?;
        Ok(self
            .availability
            .settings(&actor.user_id)
            .await?
            .unwrap_or_default())
    }

    async fn update_settings(
        &self,
        actor: &Actor,
        settings: AvailabilitySettings,
    ) -> Result<AvailabilitySettings, Error> {
        require_role(actor, Role::Mentor)?;
        let settings = settings.validate().map_err(invalid)?;
        self.availability
            .save_settings(&actor.user_id, &settings)
            .await?;
        Ok(settings)
    }

    async fn open_slots(
        &self,
        mentor_id: &UserId,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<AvailabilitySlot>, Error> {
        let now = self.clock.utc();
        let from = from.unwrap_or(now);
        let to = to.unwrap_or(from + Duration::days(OPEN_SLOT_WINDOW_DAYS));
        let blocked: Vec<Interval> = self
            .availability
            .exceptions(mentor_id)
            .await?
            .iter()
            .map(AvailabilityException::interval)
            .collect();
        let slots = self
            .availability
            .slots_between(mentor_id, Some(from), Some(to))
            .await?;
        Ok(slots
            .into_iter()
            .filter(|slot| !slot.is_booked && slot.start_utc > now)
            .filter(|slot| !blocked.iter().any(|b| b.overlaps(&slot.interval())))
            .collect())
    }
}

#[cfg(test)]
#[path = "availability_service_tests.rs"]
mod tests;
