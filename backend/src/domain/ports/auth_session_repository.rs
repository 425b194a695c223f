//! Port for bearer token records.
use async_trait::async_trait;

use crate::domain::{AuthSession, TokenDigest, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by token stores.
    pub enum AuthSessionRepositoryError {
        Connection { message: String } => "token store connection failed: {message}",
        Query { message: String } => "token store query failed: {message}",
    }
}

/// Stores token digests; raw tokens never reach this port.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthSessionRepository: Send + Sync {
    async fn insert(&self, session: &AuthSession) -> Result<(), AuthSessionRepositoryError>;

    async fn find(
        &self,
        digest: &TokenDigest,
    ) -> Result<Option<AuthSession>, AuthSessionRepositoryError>;

    /// Mark a token revoked. Unknown digests are ignored.
    async fn revoke(&self, digest: &TokenDigest) -> Result<(), AuthSessionRepositoryError>;

    /// Revoke every live token of the user except `keep`; returns how many
    /// were revoked.
    async fn revoke_others(
        &self,
        user_id: &UserId,
        keep: &TokenDigest,
    ) -> Result<u64, AuthSessionRepositoryError>;
}
