//! Driving port for authenticator-app enrolment and the second login step.

use async_trait::async_trait;

use crate::domain::{
    BearerToken, Error, Password, SecondFactor, TwoFactorEnrolment, TwoFactorStatus, User, UserId,
};

use super::IssuedToken;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TwoFactorService: Send + Sync {
    async fn status(&self, user_id: &UserId) -> Result<TwoFactorStatus, Error>;

    /// Start enrolment after re-checking the password. Replaces any
    /// unconfirmed secret; fails while two-factor sign-in is already on.
    async fn begin_enrolment(&self, user: &User, password: Password)
    -> Result<TwoFactorEnrolment, Error>;

    /// Confirm enrolment with an authenticator code and return the recovery
    /// codes. They are shown only once.
    async fn enable(&self, user_id: &UserId, code: SecondFactor) -> Result<Vec<String>, Error>;

    /// Turn two-factor sign-in off with an authenticator or recovery code.
    async fn disable(&self, user_id: &UserId, code: SecondFactor) -> Result<(), Error>;

    /// Replace the recovery codes after an authenticator code check.
    async fn regenerate_recovery_codes(
        &self,
        user_id: &UserId,
        code: SecondFactor,
    ) -> Result<Vec<String>, Error>;

    /// Exchange a login challenge and a code for a session token.
    async fn complete_login(
        &self,
        challenge: &BearerToken,
        code: SecondFactor,
    ) -> Result<IssuedToken, Error>;
}
