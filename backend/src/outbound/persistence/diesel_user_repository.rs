//! PostgreSQL-backed `UserRepository` and `AuthSessionRepository`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{
    AuthSessionRepository, AuthSessionRepositoryError, UserRepository, UserRepositoryError,
};
use crate::domain::{
    AuthSession, DisplayName, Email, PasswordHash, Role, Timezone, TokenDigest, User, UserId,
};

use super::diesel_basic_error_mapping::{
    ConstraintViolation, map_basic_diesel_error, map_basic_pool_error, violated_constraint,
};
use super::diesel_helpers::{collect_rows, count, parse_label};
use super::models::{AuthSessionRow, NewUserRow, UserRow, UserUpdate};
use super::pool::{DbPool, PoolError};
use super::schema::{auth_sessions, users};

/// Diesel-backed account storage.
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> UserRepositoryError {
    map_basic_pool_error(error, |message| UserRepositoryError::connection(message))
}

fn map_diesel_error(error: diesel::result::Error) -> UserRepositoryError {
    if let Some(ConstraintViolation::Unique(name)) = violated_constraint(&error)
        && name.is_none_or(|name| name.contains("email"))
    {
        return UserRepositoryError::duplicate_email();
    }
    map_basic_diesel_error(
        error,
        UserRepositoryError::query,
        UserRepositoryError::connection,
    )
}

fn row_to_user(row: UserRow) -> Result<(User, PasswordHash), String> {
    let user = User {
        id: UserId::from_uuid(row.id),
        email: Email::new(&row.email).map_err(|err| format!("stored email: {err}"))?,
        display_name: DisplayName::new(&row.display_name)
            .map_err(|err| format!("stored display name: {err}"))?,
        role: parse_label::<Role>("role", &row.role)?,
        bio: row.bio,
        timezone: Timezone::new(&row.timezone).map_err(|err| format!("stored timezone: {err}"))?,
        hourly_rate_cents: row.hourly_rate_cents,
        is_mentor_approved: row.is_mentor_approved,
        created_at: row.created_at,
    };
    Ok((user, PasswordHash::from_stored(row.password_hash)))
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn create(&self, user: &User, password: &PasswordHash) -> Result<(), UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = NewUserRow {
            id: *user.id.as_uuid(),
            email: user.email.as_ref(),
            password_hash: password.as_ref(),
            display_name: user.display_name.as_ref(),
            role: user.role.as_str(),
            bio: &user.bio,
            timezone: user.timezone.name(),
            hourly_rate_cents: user.hourly_rate_cents,
            is_mentor_approved: user.is_mentor_approved,
            created_at: user.created_at,
        };
        diesel::insert_into(users::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<UserRow> = users::table
            .filter(users::id.eq(id.as_uuid()))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(|row| row_to_user(row).map(|(user, _)| user))
            .transpose()
            .map_err(UserRepositoryError::query)
    }

    async fn find_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<(User, PasswordHash)>, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<UserRow> = users::table
            .filter(users::email.eq(email.as_ref()))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(row_to_user)
            .transpose()
            .map_err(UserRepositoryError::query)
    }

    async fn update(&self, user: &User) -> Result<(), UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let changes = UserUpdate {
            display_name: user.display_name.as_ref(),
            role: user.role.as_str(),
            bio: &user.bio,
            timezone: user.timezone.name(),
            hourly_rate_cents: user.hourly_rate_cents,
            is_mentor_approved: user.is_mentor_approved,
            updated_at: Utc::now(),
        };
        let updated = diesel::update(users::table.filter(users::id.eq(user.id.as_uuid())))
            .set(&changes)
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        if updated == 0 {
            return Err(UserRepositoryError::query(format!(
                "user {} not found",
                user.id
            )));
        }
        Ok(())
    }

    async fn list_approved_mentors(&self) -> Result<Vec<User>, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<UserRow> = users::table
            .filter(users::role.eq(Role::Mentor.as_str()))
            .filter(users::is_mentor_approved.eq(true))
            .select(UserRow::as_select())
            .order_by((users::display_name, users::id))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        collect_rows(
            rows.into_iter()
                .map(|row| row_to_user(row).map(|(user, _)| user)),
            UserRepositoryError::query,
        )
    }

    async fn list_pending_mentors(&self) -> Result<Vec<User>, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<UserRow> = users::table
            .filter(users::role.eq(Role::Mentor.as_str()))
            .filter(users::is_mentor_approved.eq(false))
            .select(UserRow::as_select())
            .order_by((users::created_at, users::id))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        collect_rows(
            rows.into_iter()
                .map(|row| row_to_user(row).map(|(user, _)| user)),
            UserRepositoryError::query,
        )
    }

    async fn find_password_hash(
        &self,
        id: &UserId,
    ) -> Result<Option<PasswordHash>, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let stored: Option<String> = users::table
            .filter(users::id.eq(id.as_uuid()))
            .select(users::password_hash)
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        Ok(stored.map(PasswordHash::from_stored))
    }

    async fn update_password(
        &self,
        id: &UserId,
        password: &PasswordHash,
    ) -> Result<bool, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let updated = diesel::update(users::table.filter(users::id.eq(id.as_uuid())))
            .set((
                users::password_hash.eq(password.as_ref()),
                users::updated_at.eq(Utc::now()),
            ))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(updated > 0)
    }

    async fn signups_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<(Role, DateTime<Utc>)>, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<(String, DateTime<Utc>)> = users::table
            .filter(users::created_at.ge(since))
            .select((users::role, users::created_at))
            .order_by(users::created_at)
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        collect_rows(
            rows.into_iter()
                .map(|(role, at)| parse_label::<Role>("role", &role).map(|role| (role, at))),
            UserRepositoryError::query,
        )
    }

    async fn count_by_role(&self) -> Result<Vec<(Role, u64)>, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<(String, i64)> = users::table
            .group_by(users::role)
            .select((users::role, diesel::dsl::count_star()))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        collect_rows(
            rows.into_iter().map(|(role, total)| {
                parse_label::<Role>("role", &role).map(|role| (role, count(total)))
            }),
            UserRepositoryError::query,
        )
    }
}

/// Diesel-backed bearer-session storage.
#[derive(Clone)]
pub struct DieselAuthSessionRepository {
    pool: DbPool,
}

impl DieselAuthSessionRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_session_pool_error(error: PoolError) -> AuthSessionRepositoryError {
    map_basic_pool_error(error, |message| {
        AuthSessionRepositoryError::connection(message)
    })
}

fn map_session_diesel_error(error: diesel::result::Error) -> AuthSessionRepositoryError {
    map_basic_diesel_error(
        error,
        AuthSessionRepositoryError::query,
        AuthSessionRepositoryError::connection,
    )
}

#[async_trait]
impl AuthSessionRepository for DieselAuthSessionRepository {
    async fn insert(&self, session: &AuthSession) -> Result<(), AuthSessionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_session_pool_error)?;
        let row = AuthSessionRow {
            token_digest: session.digest.as_ref().to_owned(),
            user_id: *session.user_id.as_uuid(),
            expires_at: session.expires_at,
            revoked: session.revoked,
        };
        diesel::insert_into(auth_sessions::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_session_diesel_error)
    }

    async fn find(
        &self,
        digest: &TokenDigest,
    ) -> Result<Option<AuthSession>, AuthSessionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_session_pool_error)?;
        let row: Option<AuthSessionRow> = auth_sessions::table
            .filter(auth_sessions::token_digest.eq(digest.as_ref()))
            .select(AuthSessionRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_session_diesel_error)?;
        Ok(row.map(|row| AuthSession {
            digest: TokenDigest::from_stored(row.token_digest),
            user_id: UserId::from_uuid(row.user_id),
            expires_at: row.expires_at,
            revoked: row.revoked,
        }))
    }

    async fn revoke(&self, digest: &TokenDigest) -> Result<(), AuthSessionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_session_pool_error)?;
        diesel::update(auth_sessions::table.filter(auth_sessions::token_digest.eq(digest.as_ref())))
            .set(auth_sessions::revoked.eq(true))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_session_diesel_error)
    }

    async fn revoke_others(
        &self,
        user_id: &UserId,
        keep: &TokenDigest,
    ) -> Result<u64, AuthSessionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_session_pool_error)?;
        let revoked = diesel::update(
            auth_sessions::table
                .filter(auth_sessions::user_id.eq(user_id.as_uuid()))
                .filter(auth_sessions::token_digest.ne(keep.as_ref()))
                .filter(auth_sessions::revoked.eq(false)),
        )
        .set(auth_sessions::revoked.eq(true))
        .execute(&mut conn)
        .await
        .map_err(map_session_diesel_error)?;
        Ok(revoked as u64)
    }
}
