//! Driving port for registration, login and profile use-cases.
//!
//! Inbound adapters call it with already-parsed value types; nothing here
//! knows about HTTP.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{
    Actor, BearerToken, DisplayName, Email, Error, LoginCredentials, MentorCard, Password,
    ProfileUpdate, Role, Timezone, User, UserId,
};

/// Parsed registration form.
#[derive(Debug)]
pub struct Registration {
    pub email: Email,
    pub password: Password,
    pub display_name: DisplayName,
    pub role: Role,
    pub timezone: Timezone,
    pub hourly_rate_cents: Option<i64>,
}

/// Token returned once at login.
#[derive(Debug)]
pub struct IssuedToken {
    pub token: BearerToken,
    pub expires_at: DateTime<Utc>,
    pub user: User,
}

/// What a correct password earns.
#[derive(Debug)]
pub enum LoginOutcome {
    Issued(IssuedToken),
    /// Two-factor sign-in is on; the challenge token must be presented with
    /// a code before a session token is issued.
    ChallengeRequired {
        challenge: BearerToken,
        expires_at: DateTime<Utc>,
    },
}

/// Password change requested by the signed-in user.
#[derive(Debug)]
pub struct PasswordChange {
    pub current: Password,
    pub replacement: Password,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountService: Send + Sync {
    /// Create a learner or mentor account.
    async fn register(&self, registration: Registration) -> Result<User, Error>;

    /// Exchange credentials for a bearer token or a two-factor challenge.
    async fn login(&self, credentials: &LoginCredentials) -> Result<LoginOutcome, Error>;

    /// Revoke the presented token.
    async fn logout(&self, token: &BearerToken) -> Result<(), Error>;

    /// Resolve a bearer token to its user.
    async fn authenticate(&self, token: &BearerToken) -> Result<User, Error>;

    async fn profile(&self, user_id: &UserId) -> Result<User, Error>;

    async fn update_profile(&self, user_id: &UserId, update: ProfileUpdate) -> Result<User, Error>;

    /// Approved mentors.
    async fn list_mentors(&self) -> Result<Vec<User>, Error>;

    /// Approved mentor with rating and skills.
    async fn mentor_profile(&self, mentor_id: &UserId) -> Result<MentorCard, Error>;

    /// Admin approval of a mentor account.
    async fn approve_mentor(&self, actor: &Actor, mentor_id: &UserId) -> Result<User, Error>;

    /// Mentors awaiting approval, oldest registration first. Admin only.
    async fn pending_mentors(&self, actor: &Actor) -> Result<Vec<User>, Error>;

    /// Re-check the current password, store the replacement and revoke every
    /// other session of the user. `keep` is the token making the request.
    async fn change_password(
        &self,
        user_id: &UserId,
        keep: &BearerToken,
        change: PasswordChange,
    ) -> Result<(), Error>;
}
