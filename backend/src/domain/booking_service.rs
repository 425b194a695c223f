//! Booking workflow: requests, lifecycle transitions, calendars and stats.
//!
//! Every transition loads the booking, checks that the caller may see it and
//! holds the right side of it, applies the state change on the aggregate and
//! persists the result. Slot releases, notifications and badge awards run
//! afterwards and never fail the transition.

use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::access::{booking_scope, require_role};
use crate::domain::ports::{
    AvailabilityRepository, BookingQuery, BookingRepository, BookingRepositoryError,
    BookingRequest, BookingService, UserRepository,
};
use crate::domain::{
    Actor, BOOKING_TEXT_MAX, BadgeAwards, Booking, BookingFilter, BookingStatus,
    BookingTransitionError, CalendarEntry, Error, Interval, NotificationDraft, NotificationKind,
    Notifier, Role, User, UserId, is_exportable, render_calendar, session_price_cents,
    status_counts,
};

const ACTIVE: [BookingStatus; 2] = [BookingStatus::Pending, BookingStatus::Confirmed];

fn transition_error(err: BookingTransitionError) -> Error {
    match err {
        BookingTransitionError::InvalidState { .. } | BookingTransitionError::AlreadyRated => {
            Error::conflict(err.to_string())
        }
        BookingTransitionError::TooLateToCancel
        | BookingTransitionError::NotFinished
        | BookingTransitionError::RatingOutOfRange => Error::invalid_request(err.to_string()),
    }
}

fn bounded_text(field: &str, value: Option<String>) -> Result<Option<String>, Error> {
    match value {
        Some(text) if text.chars().count() > BOOKING_TEXT_MAX => Err(Error::invalid_request(
            format!("{field} must be at most {BOOKING_TEXT_MAX} characters"),
        )),
        other => Ok(other),
    }
}

/// Collaborators of [`BookingWorkflow`].
#[derive(Clone)]
pub struct BookingWorkflowPorts {
    pub users: Arc<dyn UserRepository>,
    pub bookings: Arc<dyn BookingRepository>,
    pub availability: Arc<dyn AvailabilityRepository>,
    pub notifier: Notifier,
    pub badges: BadgeAwards,
    pub clock: Arc<dyn Clock>,
    /// Domain used in calendar event UIDs.
    pub calendar_domain: String,
}

/// Booking use-cases.
#[derive(Clone)]
pub struct BookingWorkflow {
    ports: BookingWorkflowPorts,
}

impl BookingWorkflow {
    pub fn new(ports: BookingWorkflowPorts) -> Self {
        Self { ports }
    }

    /// Load a booking the actor may see; anything else is reported missing.
    async fn visible(&self, actor: &Actor, booking_id: &Uuid) -> Result<Booking, Error> {
        self.ports
            .bookings
            .find(booking_id)
            .await?
            .filter(|booking| actor.is_admin() || booking.involves(actor.user_id))
            .ok_or_else(|| Error::not_found(format!("booking {booking_id} not found")))
    }

    async fn as_mentor(&self, actor: &Actor, booking_id: &Uuid) -> Result<Booking, Error> {
        let booking = self.visible(actor, booking_id).await?;
        if booking.mentor_id != actor.user_id {
            return Err(Error::forbidden("only the booking's mentor may do this"));
        }
        Ok(booking)
    }

    async fn as_learner(&self, actor: &Actor, booking_id: &Uuid) -> Result<Booking, Error> {
        let booking = self.visible(actor, booking_id).await?;
        if booking.learner_id != actor.user_id {
            return Err(Error::forbidden("only the booking's learner may do this"));
        }
        Ok(booking)
    }

    async fn bookable_mentor(&self, mentor_id: &UserId) -> Result<User, Error> {
        self.ports
            .users
            .find_by_id(mentor_id)
            .await?
            .filter(User::is_bookable_mentor)
            .ok_or_else(|| Error::not_found(format!("mentor {mentor_id} not found")))
    }

    /// Enforce the mentor's notice and advance-booking limits.
    async fn check_window(&self, mentor_id: &UserId, interval: &Interval) -> Result<(), Error> {
        let now = self.ports.clock.utc();
        let settings = self
            .ports
            .availability
            .settings(mentor_id)
            .await?
            .unwrap_or_default();
        let lead = interval.start() - now;
        if lead < settings.min_notice() {
            return Err(Error::invalid_request(format!(
                "bookings need at least {} hours notice",
                settings.min_booking_notice_hours
            )));
        }
        if lead > settings.max_advance() {
            return Err(Error::invalid_request(format!(
                "bookings can be made at most {} days in advance",
                settings.max_booking_advance_days
            )));
        }
        Ok(())
    }

    /// Claim the requested slot for `interval`, failing when it is unusable.
    async fn claim(&self, mentor_id: &UserId, slot_id: &Uuid, interval: &Interval) -> Result<(), Error> {
        let availability = &self.ports.availability;
        let slot = availability
            .find_slot(slot_id)
            .await?
            .filter(|slot| slot.mentor_id == *mentor_id && slot.interval().contains(interval))
            .ok_or_else(|| {
                Error::invalid_request("slot does not belong to the mentor or cover the booking")
            })?;
        if slot.is_booked || !availability.claim_slot(slot_id).await? {
            return Err(Error::conflict("slot is already booked"));
        }
        Ok(())
    }

    async fn release(&self, booking: &Booking) -> Result<(), Error> {
        if let Some(slot_id) = booking.slot_id {
            self.ports.availability.release_slot(&slot_id).await?;
        }
        Ok(())
    }

    /// Free the booking's slot after a decline or cancellation has been
    /// stored. The transition stands when the slot cannot be freed.
    async fn release_after_transition(&self, booking: &Booking) {
        if let Err(err) = self.release(booking).await {
            warn!(
                booking_id = %booking.id,
                slot_id = ?booking.slot_id,
                error = %err,
                "slot left claimed after booking ended"
            );
        }
    }

    async fn save(&self, booking: &Booking) -> Result<(), Error> {
        Ok(self.ports.bookings.update(booking).await?)
    }

    async fn notify(
        &self,
        user_id: UserId,
        kind: NotificationKind,
        title: &str,
        message: String,
        booking: &Booking,
    ) {
        self.ports
            .notifier
            .notify(NotificationDraft::new(
                user_id,
                kind,
                title,
                message,
                json!({ "bookingId": booking.id, "startUtc": booking.start_utc }),
            ))
            .await;
    }

    async fn name_of(&self, user_id: &UserId) -> String {
        match self.ports.users.find_by_id(user_id).await {
            Ok(Some(user)) => user.display_name.to_string(),
            _ => "Someone".to_owned(),
        }
    }

    async fn render(&self, actor: &Actor, bookings: &[Booking]) -> Result<String, Error> {
        let mut people: HashMap<UserId, User> = HashMap::new();
        for id in bookings
            .iter()
            .flat_map(|b| [b.mentor_id, b.learner_id])
            .chain([actor.user_id])
        {
            if let Entry::Vacant(vacant) = people.entry(id)
                && let Some(user) = self.ports.users.find_by_id(&id).await?
            {
                vacant.insert(user);
            }
        }
        let entries: Vec<CalendarEntry<'_>> = bookings
            .iter()
            .filter_map(|booking| {
                Some(CalendarEntry {
                    booking,
                    mentor: people.get(&booking.mentor_id)?,
                    learner: people.get(&booking.learner_id)?,
                    viewer_is_mentor: booking.mentor_id == actor.user_id,
                })
            })
            .collect();
        let owner = people
            .get(&actor.user_id)
            .map_or_else(|| actor.user_id.to_string(), |u| u.display_name.to_string());
        Ok(render_calendar(
            &owner,
            &entries,
            &self.ports.calendar_domain,
            self.ports.clock.utc(),
        ))
    }
}

#[async_trait]
impl BookingService for BookingWorkflow {
    async fn create(&self, actor: &Actor, request: BookingRequest) -> Result<Booking, Error> {
        require_role(actor, Role::Learner)?;
        let interval = Interval::new(request.start_utc, request.end_utc)
            .map_err(|err| Error::invalid_request(err.to_string()))?;
        if interval.start() <= self.ports.clock.utc() {
            return Err(Error::invalid_request("booking must start in the future"));
        }
        let notes = bounded_text("notes", request.notes)?.unwrap_or_default();
        let mentor = self.bookable_mentor(&request.mentor_id).await?;
        self.check_window(&mentor.id, &interval).await?;

        if self
            .ports
            .bookings
            .has_overlap(&mentor.id, &interval, &ACTIVE, None)
            .await?
        {
            return Err(BookingRepositoryError::overlap().into());
        }
        if let Some(slot_id) = &request.slot_id {
            self.claim(&mentor.id, slot_id, &interval).await?;
        }

        let now = self.ports.clock.utc();
        let mut booking = Booking::request(
            Uuid::new_v4(),
            actor.user_id,
            mentor.id,
            interval,
            session_price_cents(mentor.hourly_rate_cents, interval.minutes()),
            notes,
            now,
        );
        booking.slot_id = request.slot_id;
        if let Err(err) = self.ports.bookings.insert(&booking).await {
            self.release(&booking).await?;
            return Err(err.into());
        }
        info!(booking_id = %booking.id, mentor_id = %mentor.id, "booking requested");

        let learner = self.name_of(&actor.user_id).await;
        self.notify(
            mentor.id,
            NotificationKind::BookingRequest,
            "New booking request",
            format!("{learner} requested a session"),
            &booking,
        )
        .await;
        Ok(booking)
    }

    async fn list(&self, actor: &Actor, query: BookingQuery) -> Result<Vec<Booking>, Error> {
        let filter = BookingFilter {
            status: query.status,
            from: query.from,
            to: query.to,
            ..BookingFilter::scoped(booking_scope(actor))
        };
        let mut bookings = self.ports.bookings.list(&filter).await?;
        bookings.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(bookings)
    }

    async fn get(&self, actor: &Actor, booking_id: &Uuid) -> Result<Booking, Error> {
        self.visible(actor, booking_id).await
    }

    async fn confirm(&self, actor: &Actor, booking_id: &Uuid) -> Result<Booking, Error> {
        let mut booking = self.as_mentor(actor, booking_id).await?;
        booking
            .confirm(self.ports.clock.utc())
            .map_err(transition_error)?;
        if self
            .ports
            .bookings
            .has_overlap(
                &booking.mentor_id,
                &booking.interval(),
                &[BookingStatus::Confirmed],
                Some(booking.id),
            )
            .await?
        {
            return Err(BookingRepositoryError::overlap().into());
        }
        self.save(&booking).await?;
        info!(booking_id = %booking.id, "booking confirmed");
        let mentor = self.name_of(&booking.mentor_id).await;
        self.notify(
            booking.learner_id,
            NotificationKind::BookingConfirmed,
            "Booking confirmed",
            format!("{mentor} confirmed your session"),
            &booking,
        )
        .await;
        Ok(booking)
    }

    async fn decline(
        &self,
        actor: &Actor,
        booking_id: &Uuid,
        reason: Option<String>,
    ) -> Result<Booking, Error> {
        let reason = bounded_text("reason", reason)?;
        let mut booking = self.as_mentor(actor, booking_id).await?;
        booking
            .decline(reason, self.ports.clock.utc())
            .map_err(transition_error)?;
        self.save(&booking).await?;
        self.release_after_transition(&booking).await;
        info!(booking_id = %booking.id, "booking declined");
        let mentor = self.name_of(&booking.mentor_id).await;
        self.notify(
            booking.learner_id,
            NotificationKind::BookingDeclined,
            "Booking declined",
            format!("{mentor} declined your session request"),
            &booking,
        )
        .await;
        Ok(booking)
    }

    async fn cancel(
        &self,
        actor: &Actor,
        booking_id: &Uuid,
        reason: Option<String>,
    ) -> Result<Booking, Error> {
        let reason = bounded_text("reason", reason)?;
        let mut booking = self.visible(actor, booking_id).await?;
        if !booking.involves(actor.user_id) {
            return Err(Error::forbidden("only participants may cancel a booking"));
        }
        booking
            .cancel(actor.user_id, reason, self.ports.clock.utc())
            .map_err(transition_error)?;
        self.save(&booking).await?;
        self.release_after_transition(&booking).await;
        info!(booking_id = %booking.id, cancelled_by = %actor.user_id, "booking cancelled");
        let canceller = self.name_of(&actor.user_id).await;
        self.notify(
            booking.counterpart_of(actor.user_id),
            NotificationKind::BookingCancelled,
            "Booking cancelled",
            format!("{canceller} cancelled the session"),
            &booking,
        )
        .await;
        Ok(booking)
    }

    async fn complete(
        &self,
        actor: &Actor,
        booking_id: &Uuid,
        session_notes: Option<String>,
    ) -> Result<Booking, Error> {
        let session_notes = bounded_text("sessionNotes", session_notes)?;
        let mut booking = self.as_mentor(actor, booking_id).await?;
        booking
            .complete(session_notes, self.ports.clock.utc())
            .map_err(transition_error)?;
        self.save(&booking).await?;
        info!(booking_id = %booking.id, "booking completed");
        self.notify(
            booking.learner_id,
            NotificationKind::BookingCompleted,
            "Session completed",
            "Your session is complete. Leave feedback for your mentor.".to_owned(),
            &booking,
        )
        .await;
        self.ports.badges.award_quietly(&booking.learner_id).await;
        self.ports.badges.award_quietly(&booking.mentor_id).await;
        Ok(booking)
    }

    async fn feedback(
        &self,
        actor: &Actor,
        booking_id: &Uuid,
        rating: i16,
        comment: Option<String>,
    ) -> Result<Booking, Error> {
        let comment = bounded_text("comment", comment)?;
        let mut booking = self.as_learner(actor, booking_id).await?;
        booking
            .record_feedback(rating, comment, self.ports.clock.utc())
            .map_err(transition_error)?;
        self.save(&booking).await?;
        let learner = self.name_of(&booking.learner_id).await;
        self.notify(
            booking.mentor_id,
            NotificationKind::FeedbackReceived,
            "New session feedback",
            format!("{learner} rated your session {rating}/5"),
            &booking,
        )
        .await;
        Ok(booking)
    }

    async fn calendar(&self, actor: &Actor) -> Result<String, Error> {
        let bookings: Vec<Booking> = self
            .ports
            .bookings
            .list(&BookingFilter::scoped(booking_scope(actor)))
            .await?
            .into_iter()
            .filter(|booking| is_exportable(booking.status))
            .collect();
        self.render(actor, &bookings).await
    }

    async fn booking_calendar(&self, actor: &Actor, booking_id: &Uuid) -> Result<String, Error> {
        let booking = self.visible(actor, booking_id).await?;
        if !is_exportable(booking.status) {
            return Err(Error::conflict(format!(
                "a {} booking has no calendar event",
                booking.status
            )));
        }
        self.render(actor, std::slice::from_ref(&booking)).await
    }

    async fn stats(&self, actor: &Actor) -> Result<BTreeMap<String, u64>, Error> {
        let bookings = self
            .ports
            .bookings
            .list(&BookingFilter::scoped(booking_scope(actor)))
            .await?;
        Ok(status_counts(&bookings))
    }
}

#[cfg(test)]
#[path = "booking_service_tests.rs"]
mod tests;
