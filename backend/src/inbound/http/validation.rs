//! Shared validation helpers for inbound HTTP adapters.
//!
//! Every helper produces an `invalid_request` error whose `details` name the
//! offending field, the raw value where one exists, and a stable code.

use std::fmt::Display;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde_json::json;
use uuid::Uuid;

use crate::domain::{Error, UserId};

/// Validation error codes for HTTP request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorCode {
    MissingField,
    InvalidUuid,
    InvalidTimestamp,
    InvalidDate,
    InvalidTime,
    InvalidValue,
}

impl ErrorCode {
    const fn as_str(self) -> &'static str {
        match self {
            Self::MissingField => "missing_field",
            Self::InvalidUuid => "invalid_uuid",
            Self::InvalidTimestamp => "invalid_timestamp",
            Self::InvalidDate => "invalid_date",
            Self::InvalidTime => "invalid_time",
            Self::InvalidValue => "invalid_value",
        }
    }
}

/// Newtype wrapper for HTTP field names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    const fn as_str(self) -> &'static str {
        self.0
    }
}

struct ValidationError {
    field: &'static str,
    message: String,
}

impl ValidationError {
    fn new(field: FieldName, message: impl Into<String>) -> Self {
        Self {
            field: field.as_str(),
            message: message.into(),
        }
    }

    fn with_code(self, code: ErrorCode) -> Error {
        Error::invalid_request(self.message).with_details(json!({
            "field": self.field,
            "code": code.as_str(),
        }))
    }

    fn with_value(self, code: ErrorCode, value: impl Into<String>) -> Error {
        Error::invalid_request(self.message).with_details(json!({
            "field": self.field,
            "value": value.into(),
            "code": code.as_str(),
        }))
    }
}

pub(crate) fn missing_field_error(field: FieldName) -> Error {
    let name = field.as_str();
    ValidationError::new(field, format!("missing required field: {name}"))
        .with_code(ErrorCode::MissingField)
}

/// Map a domain validation failure on `field` to a 400 carrying its message.
pub(crate) fn invalid_field<E: Display>(field: FieldName) -> impl Fn(E) -> Error {
    move |err| ValidationError::new(field, err.to_string()).with_code(ErrorCode::InvalidValue)
}

pub(crate) fn invalid_value_error(field: FieldName, value: &str, message: &str) -> Error {
    ValidationError::new(field, message).with_value(ErrorCode::InvalidValue, value)
}

pub(crate) fn parse_uuid(value: String, field: FieldName) -> Result<Uuid, Error> {
    Uuid::parse_str(&value).map_err(|_| {
        let name = field.as_str();
        ValidationError::new(field, format!("{name} must be a valid UUID"))
            .with_value(ErrorCode::InvalidUuid, value.clone())
    })
}

pub(crate) fn parse_user_id(value: String, field: FieldName) -> Result<UserId, Error> {
    parse_uuid(value, field).map(UserId::from_uuid)
}

pub(crate) fn parse_rfc3339_timestamp(
    value: String,
    field: FieldName,
) -> Result<DateTime<Utc>, Error> {
    DateTime::parse_from_rfc3339(&value)
        .map(|timestamp| timestamp.with_timezone(&Utc))
        .map_err(|_| {
            let name = field.as_str();
            ValidationError::new(field, format!("{name} must be an RFC 3339 timestamp"))
                .with_value(ErrorCode::InvalidTimestamp, value.clone())
        })
}

pub(crate) fn parse_optional_rfc3339_timestamp(
    value: Option<String>,
    field: FieldName,
) -> Result<Option<DateTime<Utc>>, Error> {
    value
        .map(|raw| parse_rfc3339_timestamp(raw, field))
        .transpose()
}

/// Parse a `YYYY-MM-DD` calendar date.
pub(crate) fn parse_date(value: String, field: FieldName) -> Result<NaiveDate, Error> {
    NaiveDate::parse_from_str(&value, "%Y-%m-%d").map_err(|_| {
        let name = field.as_str();
        ValidationError::new(field, format!("{name} must be a YYYY-MM-DD date"))
            .with_value(ErrorCode::InvalidDate, value.clone())
    })
}

/// Parse a wall-clock time as `HH:MM` or `HH:MM:SS`.
pub(crate) fn parse_time(value: String, field: FieldName) -> Result<NaiveTime, Error> {
    NaiveTime::parse_from_str(&value, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(&value, "%H:%M"))
        .map_err(|_| {
            let name = field.as_str();
            ValidationError::new(field, format!("{name} must be an HH:MM time"))
                .with_value(ErrorCode::InvalidTime, value.clone())
        })
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;
    use serde_json::Value;

    fn detail<'a>(error: &'a Error, key: &str) -> Option<&'a Value> {
        error.details().and_then(|d| d.get(key))
    }

    #[rstest]
    fn uuid_errors_echo_the_value() {
        let err = parse_uuid("nope".to_owned(), FieldName::new("mentorId")).expect_err("bad id");
        assert_eq!(err.message(), "mentorId must be a valid UUID");
        assert_eq!(detail(&err, "value"), Some(&Value::from("nope")));
        assert_eq!(detail(&err, "code"), Some(&Value::from("invalid_uuid")));
    }

    #[rstest]
    #[case("2030-01-07T10:00:00Z")]
    #[case("2030-01-07T11:00:00+01:00")]
    fn timestamps_normalise_to_utc(#[case] raw: &str) {
        let parsed =
            parse_rfc3339_timestamp(raw.to_owned(), FieldName::new("startUtc")).expect("valid");
        assert_eq!(parsed.to_rfc3339(), "2030-01-07T10:00:00+00:00");
    }

    #[rstest]
    fn bad_timestamps_are_reported() {
        let err = parse_optional_rfc3339_timestamp(Some("tomorrow".to_owned()), FieldName::new("from"))
            .expect_err("bad timestamp");
        assert_eq!(detail(&err, "code"), Some(&Value::from("invalid_timestamp")));
    }

    #[rstest]
    #[case("09:30", 9, 30)]
    #[case("17:00:00", 17, 0)]
    fn times_accept_minutes_and_seconds(#[case] raw: &str, #[case] hour: u32, #[case] minute: u32) {
        let parsed = parse_time(raw.to_owned(), FieldName::new("startTime")).expect("valid");
        assert_eq!(parsed, NaiveTime::from_hms_opt(hour, minute, 0).expect("time"));
    }

    #[rstest]
    fn dates_reject_other_layouts() {
        let err = parse_date("07/01/2030".to_owned(), FieldName::new("startDate"))
            .expect_err("bad date");
        assert_eq!(detail(&err, "code"), Some(&Value::from("invalid_date")));
    }

    #[rstest]
    fn domain_failures_keep_their_message() {
        let map = invalid_field::<&str>(FieldName::new("bio"));
        let err = map("bio must be at most 2000 characters");
        assert_eq!(err.message(), "bio must be at most 2000 characters");
        assert_eq!(detail(&err, "field"), Some(&Value::from("bio")));
    }

    #[rstest]
    fn missing_fields_name_the_field() {
        let err = missing_field_error(FieldName::new("content"));
        assert_eq!(err.message(), "missing required field: content");
        assert_eq!(detail(&err, "code"), Some(&Value::from("missing_field")));
    }
}
