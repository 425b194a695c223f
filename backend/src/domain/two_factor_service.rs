//! Two-factor service: authenticator enrolment, recovery codes and the
//! second step of a password login.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use mockable::Clock;
use serde_json::json;
use tracing::{info, warn};

use crate::domain::account_service::{issue_token, verify_password};
use crate::domain::ports::{
    AuthSessionRepository, IssuedToken, TwoFactorRepository, TwoFactorService, UserRepository,
};
use crate::domain::{
    BearerToken, Error, Password, SecondFactor, TotpSecret, TwoFactorEnrolment,
    TwoFactorSettings, TwoFactorStatus, User, UserId,
};

const INVALID_CHALLENGE: &str = "login challenge is invalid or expired";
const INVALID_CODE: &str = "invalid two-factor code";

fn invalid_code() -> Error {
    Error::invalid_request(INVALID_CODE).with_details(json!({ "field": "code", "code": "incorrect" }))
}

fn not_enabled() -> Error {
    Error::invalid_request("two-factor sign-in is not enabled")
}

#[derive(Clone)]
pub struct TwoFactor {
    users: Arc<dyn UserRepository>,
    sessions: Arc<dyn AuthSessionRepository>,
    store: Arc<dyn TwoFactorRepository>,
    clock: Arc<dyn Clock>,
    token_ttl: Duration,
}

impl TwoFactor {
    pub fn new(
        users: Arc<dyn UserRepository>,
        sessions: Arc<dyn AuthSessionRepository>,
        store: Arc<dyn TwoFactorRepository>,
        clock: Arc<dyn Clock>,
        token_ttl: Duration,
    ) -> Self {
        Self {
            users,
            sessions,
            store,
            clock,
            token_ttl,
        }
    }

    async fn enabled_settings(&self, user_id: &UserId) -> Result<TwoFactorSettings, Error> {
        self.store
            .find(user_id)
            .await?
            .filter(|settings| settings.enabled)
            .ok_or_else(not_enabled)
    }

    async fn reject_attempt(&self, challenge: &BearerToken) -> Result<Error, Error> {
        let digest = challenge.digest();
        let remaining = self
            .store
            .record_attempt(&digest)
            .await?
            .map_or(0, |updated| updated.attempts_remaining());
        if remaining == 0 {
            self.store.delete_challenge(&digest).await?;
        }
        Ok(Error::unauthorized(INVALID_CODE)
            .with_details(json!({ "attemptsRemaining": remaining })))
    }
}

#[async_trait]
impl TwoFactorService for TwoFactor {
    async fn status(&self, user_id: &UserId) -> Result<TwoFactorStatus, Error> {
        Ok(self
            .store
            .find(user_id)
            .await?
            .map(|settings| settings.status())
            .unwrap_or_default())
    }

    async fn begin_enrolment(
        &self,
        user: &User,
        password: Password,
    ) -> Result<TwoFactorEnrolment, Error> {
        let stored = self
            .users
            .find_password_hash(&user.id)
            .await?
            .ok_or_else(|| Error::not_found(format!("user {} not found", user.id)))?;
        if !verify_password(stored, password.expose().to_owned()).await? {
            return Err(Error::invalid_request("password is incorrect")
                .with_details(json!({ "field": "password", "code": "incorrect" })));
        }
        if self
            .store
            .find(&user.id)
            .await?
            .is_some_and(|settings| settings.enabled)
        {
            return Err(Error::invalid_request("two-factor sign-in is already enabled"));
        }

        let secret = TotpSecret::generate();
        let enrolment = TwoFactorEnrolment {
            secret: secret.to_base32(),
            otpauth_uri: secret.provisioning_uri(&user.email),
        };
        self.store
            .save(&TwoFactorSettings::pending(user.id, secret))
            .await?;
        info!(user_id = %user.id, "two-factor enrolment started");
        Ok(enrolment)
    }

    async fn enable(&self, user_id: &UserId, code: SecondFactor) -> Result<Vec<String>, Error> {
        let mut settings = self
            .store
            .find(user_id)
            .await?
            .filter(|settings| settings.secret.is_some())
            .ok_or_else(|| Error::invalid_request("start two-factor setup first"))?;
        if settings.enabled {
            return Err(Error::invalid_request("two-factor sign-in is already enabled"));
        }
        let now = self.clock.utc();
        if settings.verify(&code, now).is_none() {
            warn!(%user_id, "two-factor confirmation code rejected");
            return Err(invalid_code());
        }
        let codes = settings.enable(now);
        self.store.save(&settings).await?;
        info!(%user_id, "two-factor sign-in enabled");
        Ok(codes)
    }

    async fn disable(&self, user_id: &UserId, code: SecondFactor) -> Result<(), Error> {
        let mut settings = self.enabled_settings(user_id).await?;
        let Some(kind) = settings.verify(&code, self.clock.utc()) else {
            warn!(%user_id, "two-factor disable code rejected");
            return Err(invalid_code());
        };
        self.store.delete(user_id).await?;
        info!(%user_id, factor = ?kind, "two-factor sign-in disabled");
        Ok(())
    }

    async fn regenerate_recovery_codes(
        &self,
        user_id: &UserId,
        code: SecondFactor,
    ) -> Result<Vec<String>, Error> {
        let mut settings = self.enabled_settings(user_id).await?;
        let SecondFactor::Totp(totp) = &code else {
            return Err(invalid_code());
        };
        if !settings.verify_totp(totp, self.clock.utc()) {
            warn!(%user_id, "recovery code regeneration rejected");
            return Err(invalid_code());
        }
        let codes = settings.regenerate_recovery_codes();
        self.store.save(&settings).await?;
        info!(%user_id, "recovery codes regenerated");
        Ok(codes)
    }

    async fn complete_login(
        &self,
        challenge: &BearerToken,
        code: SecondFactor,
    ) -> Result<IssuedToken, Error> {
        let digest = challenge.digest();
        let now = self.clock.utc();
        let Some(pending) = self.store.find_challenge(&digest).await? else {
            return Err(Error::unauthorized(INVALID_CHALLENGE));
        };
        if !pending.is_open_at(now) {
            self.store.delete_challenge(&digest).await?;
            return Err(Error::unauthorized(INVALID_CHALLENGE));
        }
        let Some(mut settings) = self
            .store
            .find(&pending.user_id)
            .await?
            .filter(|settings| settings.enabled)
        else {
            self.store.delete_challenge(&digest).await?;
            return Err(Error::unauthorized(INVALID_CHALLENGE));
        };

        let Some(kind) = settings.verify(&code, now) else {
            warn!(user_id = %pending.user_id, "second factor rejected at login");
            return Err(self.reject_attempt(challenge).await?);
        };
        self.store.save(&settings).await?;
        self.store.delete_challenge(&digest).await?;
        let user = self
            .users
            .find_by_id(&pending.user_id)
            .await?
            .ok_or_else(|| Error::unauthorized(INVALID_CHALLENGE))?;
        let issued = issue_token(&*self.sessions, user, now, self.token_ttl).await?;
        info!(user_id = %issued.user.id, factor = ?kind, "login succeeded");
        Ok(issued)
    }
}

#[cfg(test)]
#[path = "two_factor_service_tests.rs"]
mod tests;
