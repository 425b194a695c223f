//! PostgreSQL-backed `TwoFactorRepository`.
//!
//! Secrets are stored as base32 text and recovery codes only as digests.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{TwoFactorRepository, TwoFactorRepositoryError};
use crate::domain::{LoginChallenge, TokenDigest, TotpSecret, TwoFactorSettings, UserId};

use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::models::{LoginChallengeRow, TwoFactorRow};
use super::pool::{DbPool, PoolError};
use super::schema::{login_challenges, two_factor_settings};

#[derive(Clone)]
pub struct DieselTwoFactorRepository {
    pool: DbPool,
}

impl DieselTwoFactorRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> TwoFactorRepositoryError {
    map_basic_pool_error(error, |message| TwoFactorRepositoryError::connection(message))
}

fn map_diesel_error(error: diesel::result::Error) -> TwoFactorRepositoryError {
    map_basic_diesel_error(
        error,
        TwoFactorRepositoryError::query,
        TwoFactorRepositoryError::connection,
    )
}

fn row_to_settings(row: TwoFactorRow) -> Result<TwoFactorSettings, TwoFactorRepositoryError> {
    let secret = row
        .secret_base32
        .as_deref()
        .map(TotpSecret::from_base32)
        .transpose()
        .map_err(|err| TwoFactorRepositoryError::query(format!("stored secret: {err}")))?;
    Ok(TwoFactorSettings {
        user_id: UserId::from_uuid(row.user_id),
        secret,
        enabled: row.enabled,
        recovery_digests: row.recovery_digests,
        last_used_step: row.last_used_step,
        confirmed_at: row.confirmed_at,
        last_used_at: row.last_used_at,
    })
}

fn row_to_challenge(row: LoginChallengeRow) -> LoginChallenge {
    LoginChallenge {
        digest: TokenDigest::from_stored(row.token_digest),
        user_id: UserId::from_uuid(row.user_id),
        attempts: row.attempts,
        expires_at: row.expires_at,
    }
}

#[async_trait]
impl TwoFactorRepository for DieselTwoFactorRepository {
    async fn find(
        &self,
        user_id: &UserId,
    ) -> Result<Option<TwoFactorSettings>, TwoFactorRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<TwoFactorRow> = two_factor_settings::table
            .filter(two_factor_settings::user_id.eq(user_id.as_uuid()))
            .select(TwoFactorRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(row_to_settings).transpose()
    }

    async fn save(&self, settings: &TwoFactorSettings) -> Result<(), TwoFactorRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = TwoFactorRow {
            user_id: *settings.user_id.as_uuid(),
            secret_base32: settings.secret.as_ref().map(TotpSecret::to_base32),
            enabled: settings.enabled,
            recovery_digests: settings.recovery_digests.clone(),
            last_used_step: settings.last_used_step,
            confirmed_at: settings.confirmed_at,
            last_used_at: settings.last_used_at,
        };
        diesel::insert_into(two_factor_settings::table)
            .values(&row)
            .on_conflict(two_factor_settings::user_id)
            .do_update()
            .set(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn delete(&self, user_id: &UserId) -> Result<(), TwoFactorRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::delete(
            two_factor_settings::table.filter(two_factor_settings::user_id.eq(user_id.as_uuid())),
        )
        .execute(&mut conn)
        .await
        .map(|_| ())
        .map_err(map_diesel_error)
    }

    async fn insert_challenge(
        &self,
        challenge: &LoginChallenge,
    ) -> Result<(), TwoFactorRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = LoginChallengeRow {
            token_digest: challenge.digest.as_ref().to_owned(),
            user_id: *challenge.user_id.as_uuid(),
            attempts: challenge.attempts,
            expires_at: challenge.expires_at,
        };
        diesel::insert_into(login_challenges::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn find_challenge(
        &self,
        digest: &TokenDigest,
    ) -> Result<Option<LoginChallenge>, TwoFactorRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<LoginChallengeRow> = login_challenges::table
            .filter(login_challenges::token_digest.eq(digest.as_ref()))
            .select(LoginChallengeRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        Ok(row.map(row_to_challenge))
    }

    async fn record_attempt(
        &self,
        digest: &TokenDigest,
    ) -> Result<Option<LoginChallenge>, TwoFactorRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<LoginChallengeRow> = diesel::update(
            login_challenges::table.filter(login_challenges::token_digest.eq(digest.as_ref())),
        )
        .set(login_challenges::attempts.eq(login_challenges::attempts + 1))
        .returning(LoginChallengeRow::as_returning())
        .get_result(&mut conn)
        .await
        .optional()
        .map_err(map_diesel_error)?;
        Ok(row.map(row_to_challenge))
    }

    async fn delete_challenge(&self, digest: &TokenDigest) -> Result<(), TwoFactorRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::delete(
            login_challenges::table.filter(login_challenges::token_digest.eq(digest.as_ref())),
        )
        .execute(&mut conn)
        .await
        .map(|_| ())
        .map_err(map_diesel_error)
    }
}
