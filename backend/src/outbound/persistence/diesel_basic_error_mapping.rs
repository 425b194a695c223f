//! Shared Diesel error mapping for repositories.
//!
//! Every port error has `Connection` and `Query` variants; the helpers here
//! map pool and Diesel failures onto them through constructor callbacks.
//! Constraint-specific outcomes (overlaps, duplicates) are detected with
//! [`violated_constraint`] before falling back to the basic mapping.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::debug;

use super::pool::PoolError;

/// Map pool errors into a repository-specific connection error constructor.
pub fn map_basic_pool_error<E, C>(error: PoolError, connection: C) -> E
where
    C: FnOnce(String) -> E,
{
    let message = match error {
        PoolError::Checkout { message } | PoolError::Build { message } => message,
    };
    connection(message)
}

/// Map common Diesel error variants into query/connection constructors.
pub fn map_basic_diesel_error<E, Q, C>(error: DieselError, query: Q, connection: C) -> E
where
    Q: Fn(&'static str) -> E,
    C: Fn(&'static str) -> E,
{
    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(&error),
            "diesel operation failed"
        ),
    }

    match error {
        DieselError::NotFound => query("record not found"),
        DieselError::QueryBuilderError(_) => query("database query error"),
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            connection("database connection error")
        }
        DieselError::DatabaseError(_, _) => query("database error"),
        _ => query("database error"),
    }
}

/// Which integrity rule a database error reports, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintViolation<'a> {
    /// Unique or primary key clash on the named constraint.
    Unique(Option<&'a str>),
    /// Exclusion constraint (SQLSTATE 23P01) on the named constraint.
    Exclusion(Option<&'a str>),
}

/// Classify `error` as a constraint violation.
///
/// PostgreSQL reports exclusion violations without a dedicated Diesel kind,
/// so they are recognised from the server message.
pub fn violated_constraint(error: &DieselError) -> Option<ConstraintViolation<'_>> {
    let DieselError::DatabaseError(kind, info) = error else {
        return None;
    };
    match kind {
        DatabaseErrorKind::UniqueViolation => {
            Some(ConstraintViolation::Unique(info.constraint_name()))
        }
        _ if info.message().contains("exclusion constraint") => {
            Some(ConstraintViolation::Exclusion(info.constraint_name()))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use diesel::result::DatabaseErrorInformation;
    use rstest::rstest;

    struct Info {
        message: &'static str,
        constraint: Option<&'static str>,
    }

    impl DatabaseErrorInformation for Info {
        fn message(&self) -> &str {
            self.message
        }
        fn details(&self) -> Option<&str> {
            None
        }
        fn hint(&self) -> Option<&str> {
            None
        }
        fn table_name(&self) -> Option<&str> {
            None
        }
        fn column_name(&self) -> Option<&str> {
            None
        }
        fn constraint_name(&self) -> Option<&str> {
            self.constraint
        }
        fn statement_position(&self) -> Option<i32> {
            None
        }
    }

    fn database_error(
        kind: DatabaseErrorKind,
        message: &'static str,
        constraint: Option<&'static str>,
    ) -> DieselError {
        DieselError::DatabaseError(kind, Box::new(Info { message, constraint }))
    }

    #[rstest]
    fn exclusion_violations_are_recognised_from_the_message() {
        let error = database_error(
            DatabaseErrorKind::Unknown,
            "conflicting key value violates exclusion constraint \"bookings_no_overlap\"",
            Some("bookings_no_overlap"),
        );
        assert_eq!(
            violated_constraint(&error),
            Some(ConstraintViolation::Exclusion(Some("bookings_no_overlap")))
        );
    }

    #[rstest]
    fn unique_violations_carry_the_constraint_name() {
        let error = database_error(
            DatabaseErrorKind::UniqueViolation,
            "duplicate key value violates unique constraint \"users_email_key\"",
            Some("users_email_key"),
        );
        assert_eq!(
            violated_constraint(&error),
            Some(ConstraintViolation::Unique(Some("users_email_key")))
        );
    }

    #[rstest]
    #[case(DieselError::NotFound)]
    #[case(database_error(DatabaseErrorKind::CheckViolation, "check failed", None))]
    fn other_errors_are_not_constraint_violations(#[case] error: DieselError) {
        assert_eq!(violated_constraint(&error), None);
    }

    #[rstest]
    fn closed_connections_map_to_the_connection_constructor() {
        let error = database_error(DatabaseErrorKind::ClosedConnection, "gone", None);
        let mapped: String = map_basic_diesel_error(
            error,
            |m| format!("query: {m}"),
            |m| format!("connection: {m}"),
        );
        assert_eq!(mapped, "connection: database connection error");
    }

    #[rstest]
    fn pool_failures_keep_their_message() {
        let mapped: String =
            map_basic_pool_error(PoolError::checkout("timed out"), |m| format!("conn: {m}"));
        assert_eq!(mapped, "conn: timed out");
    }
}
