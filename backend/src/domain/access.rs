//! Role gates shared by the services.

use super::{Actor, BookingScope, Error, Role};

/// Fail with `forbidden` unless the actor holds `role`.
pub(crate) fn require_role(actor: &Actor, role: Role) -> Result<(), Error> {
    if actor.role == role {
        Ok(())
    } else {
        Err(Error::forbidden(format!("{role} role required")))
    }
}

/// Bookings the actor may see: their own side, or everything for admins.
pub(crate) const fn booking_scope(actor: &Actor) -> BookingScope {
    match actor.role {
        Role::Learner => BookingScope::Learner(actor.user_id),
        Role::Mentor => BookingScope::Mentor(actor.user_id),
        Role::Admin => BookingScope::All,
    }
}
