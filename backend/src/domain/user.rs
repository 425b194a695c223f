//! User identity, roles and profile value types.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Maximum email length in characters.
pub const EMAIL_MAX: usize = 254;
/// Maximum display name length in characters.
pub const DISPLAY_NAME_MAX: usize = 64;
/// Maximum biography length in characters.
pub const BIO_MAX: usize = 2000;

/// Validation errors raised by user value constructors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserValidationError {
    #[error("user id must be a valid UUID")]
    InvalidId,
    #[error("email must not be empty")]
    EmptyEmail,
    #[error("email must look like name@domain")]
    InvalidEmail,
    #[error("email must be at most {max} characters")]
    EmailTooLong { max: usize },
    #[error("display name must not be empty")]
    EmptyDisplayName,
    #[error("display name must be at most {max} characters")]
    DisplayNameTooLong { max: usize },
    #[error("bio must be at most {max} characters")]
    BioTooLong { max: usize },
    #[error("unknown timezone: {value}")]
    UnknownTimezone { value: String },
    #[error("unknown role: {value}")]
    UnknownRole { value: String },
    #[error("hourly rate must not be negative")]
    NegativeRate,
}

/// Stable user identifier.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(transparent)]
#[schema(value_type = String, format = Uuid)]
pub struct UserId(Uuid);

impl UserId {
    /// Parse a [`UserId`] from its string form.
    pub fn new(id: impl AsRef<str>) -> Result<Self, UserValidationError> {
        Uuid::parse_str(id.as_ref().trim())
            .map(Self)
            .map_err(|_| UserValidationError::InvalidId)
    }

    /// Wrap an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Generate a new random identifier.
    #[must_use]
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Marketplace role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Learner,
    Mentor,
    Admin,
}

impl Role {
    /// Stable storage and wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Learner => "learner",
            Self::Mentor => "mentor",
            Self::Admin => "admin",
        }
    }
}

impl FromStr for Role {
    type Err = UserValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "learner" => Ok(Self::Learner),
            "mentor" => Ok(Self::Mentor),
            "admin" => Ok(Self::Admin),
            other => Err(UserValidationError::UnknownRole {
                value: other.to_owned(),
            }),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalised email address used as the login identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Email(String);

impl Email {
    /// Trim, lower-case and validate an email address.
    ///
    /// # Examples
    /// ```
    /// use mentorship::domain::Email;
    ///
    /// let email = Email::new("  Ada@Example.COM ").expect("valid email");
    /// assert_eq!(email.as_ref(), "ada@example.com");
    /// assert!(Email::new("no-at-sign").is_err());
    /// ```
    pub fn new(raw: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let normalised = raw.as_ref().trim().to_lowercase();
        if normalised.is_empty() {
            return Err(UserValidationError::EmptyEmail);
        }
        if normalised.chars().count() > EMAIL_MAX {
            return Err(UserValidationError::EmailTooLong { max: EMAIL_MAX });
        }
        let mut parts = normalised.split('@');
        let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(UserValidationError::InvalidEmail);
        };
        if local.is_empty() || domain.is_empty() || normalised.chars().any(char::is_whitespace) {
            return Err(UserValidationError::InvalidEmail);
        }
        Ok(Self(normalised))
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Human readable display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayName(String);

impl DisplayName {
    /// Trim and validate a display name.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(UserValidationError::EmptyDisplayName);
        }
        if trimmed.chars().count() > DISPLAY_NAME_MAX {
            return Err(UserValidationError::DisplayNameTooLong {
                max: DISPLAY_NAME_MAX,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for DisplayName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DisplayName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// IANA timezone a user schedules in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timezone(Tz);

impl Timezone {
    /// Parse an IANA zone name such as `Europe/London`.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let value = raw.as_ref().trim();
        value
            .parse::<Tz>()
            .map(Self)
            .map_err(|_| UserValidationError::UnknownTimezone {
                value: value.to_owned(),
            })
    }

    /// Coordinated Universal Time.
    #[must_use]
    pub const fn utc() -> Self {
        Self(Tz::UTC)
    }

    /// Access the zone for conversions.
    #[must_use]
    pub const fn tz(&self) -> Tz {
        self.0
    }

    /// Canonical zone name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.0.name()
    }
}

impl Default for Timezone {
    fn default() -> Self {
        Self::utc()
    }
}

impl fmt::Display for Timezone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Validate a free-text biography.
pub fn validate_bio(raw: &str) -> Result<String, UserValidationError> {
    let trimmed = raw.trim();
    if trimmed.chars().count() > BIO_MAX {
        return Err(UserValidationError::BioTooLong { max: BIO_MAX });
    }
    Ok(trimmed.to_owned())
}

/// Validate an hourly rate expressed in cents.
pub const fn validate_hourly_rate(cents: i64) -> Result<i64, UserValidationError> {
    if cents < 0 {
        Err(UserValidationError::NegativeRate)
    } else {
        Ok(cents)
    }
}

/// Registered marketplace account.
///
/// Fields hold validated value types so the record itself carries no further
/// invariants.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: UserId,
    pub email: Email,
    pub display_name: DisplayName,
    pub role: Role,
    pub bio: String,
    pub timezone: Timezone,
    pub hourly_rate_cents: Option<i64>,
    pub is_mentor_approved: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// True when the user is a mentor learners may book.
    #[must_use]
    pub fn is_bookable_mentor(&self) -> bool {
        self.role == Role::Mentor && self.is_mentor_approved
    }
}

/// Partial profile update; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileUpdate {
    pub display_name: Option<DisplayName>,
    pub bio: Option<String>,
    pub timezone: Option<Timezone>,
    pub hourly_rate_cents: Option<i64>,
}

impl ProfileUpdate {
    /// Apply the update to `user` in place.
    pub fn apply(self, user: &mut User) {
        if let Some(display_name) = self.display_name {
            user.display_name = display_name;
        }
        if let Some(bio) = self.bio {
            user.bio = bio;
        }
        if let Some(timezone) = self.timezone {
            user.timezone = timezone;
        }
        if let Some(rate) = self.hourly_rate_cents {
            user.hourly_rate_cents = Some(rate);
        }
    }
}

/// Authenticated principal performing an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: UserId,
    pub role: Role,
}

impl Actor {
    /// Build an actor from a user record.
    #[must_use]
    pub const fn of(user: &User) -> Self {
        Self {
            user_id: user.id,
            role: user.role,
        }
    }

    /// True for administrators.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[cfg(test)]
#[path = "user_tests.rs"]
mod tests;
