//! Conversion of driven-port failures into domain errors.
//!
//! Connection failures become `service_unavailable`, query failures
//! `internal`; port-specific conflicts become `conflict`. Services that need a
//! more specific message match on the port error before converting.

use tracing::debug;

use super::Error;
use super::ports::{
    AiResponseRepositoryError, AuthSessionRepositoryError, AvailabilityRepositoryError,
    BadgeRepositoryError, BookingRepositoryError, ChatRepositoryError,
    NotificationRepositoryError, ReviewRepositoryError, SkillRepositoryError,
    TwoFactorRepositoryError, UserRepositoryError, WebhookEventRepositoryError,
};

fn unavailable(port: &'static str, message: &str) -> Error {
    debug!(port, %message, "repository connection failed");
    Error::service_unavailable(format!("{port} unavailable"))
}

fn failed(port: &'static str, message: &str) -> Error {
    debug!(port, %message, "repository query failed");
    Error::internal(format!("{port} error: {message}"))
}

macro_rules! connection_and_query {
    ($ty:ident, $port:literal $(, $variant:ident $({ $($field:ident),* })? => $map:expr)* $(,)?) => {
        impl From<$ty> for Error {
            fn from(err: $ty) -> Self {
                match err {
                    $ty::Connection { message } => unavailable($port, &message),
                    $ty::Query { message } => failed($port, &message),
                    $($ty::$variant $({ $($field),* })? => $map,)*
                }
            }
        }
    };
}

connection_and_query!(
    UserRepositoryError,
    "user repository",
    DuplicateEmail => Error::conflict("email address is already registered"),
);
connection_and_query!(AuthSessionRepositoryError, "token store");
connection_and_query!(TwoFactorRepositoryError, "two-factor store");
connection_and_query!(
    SkillRepositoryError,
    "skill repository",
    DuplicateName { name } => Error::conflict(format!("skill `{name}` already exists")),
);
connection_and_query!(
    AvailabilityRepositoryError,
    "availability repository",
    Overlap => Error::conflict("slot overlaps an existing slot"),
);
connection_and_query!(
    BookingRepositoryError,
    "booking repository",
    Overlap => Error::conflict("mentor already has a booking in this time range"),
);
connection_and_query!(
    ReviewRepositoryError,
    "review repository",
    DuplicateReview => Error::conflict("booking has already been reviewed"),
    DuplicateVote => Error::conflict("review already marked helpful"),
);
connection_and_query!(ChatRepositoryError, "chat repository");
connection_and_query!(NotificationRepositoryError, "notification repository");
connection_and_query!(BadgeRepositoryError, "badge repository");
connection_and_query!(AiResponseRepositoryError, "AI response log");
connection_and_query!(WebhookEventRepositoryError, "webhook log");
