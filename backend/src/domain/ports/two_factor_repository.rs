//! Port for two-factor enrolments and pending login challenges.
use async_trait::async_trait;

use crate::domain::{LoginChallenge, TokenDigest, TwoFactorSettings, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by two-factor stores.
    pub enum TwoFactorRepositoryError {
        Connection { message: String } => "two-factor store connection failed: {message}",
        Query { message: String } => "two-factor store query failed: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TwoFactorRepository: Send + Sync {
    async fn find(
        &self,
        user_id: &UserId,
    ) -> Result<Option<TwoFactorSettings>, TwoFactorRepositoryError>;

    /// Insert or replace the user's settings.
    async fn save(&self, settings: &TwoFactorSettings) -> Result<(), TwoFactorRepositoryError>;

    /// Remove the user's settings. Missing rows are ignored.
    async fn delete(&self, user_id: &UserId) -> Result<(), TwoFactorRepositoryError>;

    async fn insert_challenge(
        &self,
        challenge: &LoginChallenge,
    ) -> Result<(), TwoFactorRepositoryError>;

    async fn find_challenge(
        &self,
        digest: &TokenDigest,
    ) -> Result<Option<LoginChallenge>, TwoFactorRepositoryError>;

    /// Increment the attempt counter and return the updated challenge.
    async fn record_attempt(
        &self,
        digest: &TokenDigest,
    ) -> Result<Option<LoginChallenge>, TwoFactorRepositoryError>;

    /// Remove a challenge. Missing rows are ignored.
    async fn delete_challenge(&self, digest: &TokenDigest) -> Result<(), TwoFactorRepositoryError>;
}
