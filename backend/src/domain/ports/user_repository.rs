//! Port abstraction for account persistence adapters and their errors.
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{Email, PasswordHash, Role, User, UserId};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by user repository adapters.
    pub enum UserRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "user repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "user repository query failed: {message}",
        /// Another account already uses the email address.
        DuplicateEmail => "email address is already registered",
    }
}

/// Accounts and their credentials.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new account together with its password hash.
    async fn create(&self, user: &User, password: &PasswordHash) -> Result<(), UserRepositoryError>;

    /// Fetch a user by identifier.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserRepositoryError>;

    /// Fetch a user and stored hash by email for login.
    async fn find_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<(User, PasswordHash)>, UserRepositoryError>;

    /// Overwrite the profile fields of an existing user.
    async fn update(&self, user: &User) -> Result<(), UserRepositoryError>;

    /// Approved mentors ordered by display name.
    async fn list_approved_mentors(&self) -> Result<Vec<User>, UserRepositoryError>;

    /// Mentors awaiting approval, oldest registration first.
    async fn list_pending_mentors(&self) -> Result<Vec<User>, UserRepositoryError>;

    /// Stored password hash of a user.
    async fn find_password_hash(
        &self,
        id: &UserId,
    ) -> Result<Option<PasswordHash>, UserRepositoryError>;

    /// Replace a user's password hash; `false` when the user is unknown.
    async fn update_password(
        &self,
        id: &UserId,
        password: &PasswordHash,
    ) -> Result<bool, UserRepositoryError>;

    /// Role and registration time of accounts created at or after `since`.
    async fn signups_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<(Role, DateTime<Utc>)>, UserRepositoryError>;

    /// Number of accounts per role.
    async fn count_by_role(&self) -> Result<Vec<(Role, u64)>, UserRepositoryError>;
}
