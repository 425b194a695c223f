//! Account service: registration, token authentication and profiles.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use mockable::Clock;
use serde_json::json;
use tracing::info;

use crate::domain::access::require_role;
use crate::domain::ports::{
    AccountService, AuthSessionRepository, IssuedToken, LoginOutcome, PasswordChange,
    Registration, ReviewRepository, SkillRepository, TwoFactorRepository, UserRepository,
};
use crate::domain::{
    Actor, AuthSession, BearerToken, CHALLENGE_TTL_MINUTES, Error, LoginChallenge,
    LoginCredentials, MentorCard, MentorRating, Password, PasswordHash, PasswordHashError,
    ProfileUpdate, Role, User, UserId, validate_hourly_rate,
};

const INVALID_CREDENTIALS: &str = "invalid email or password";
const INVALID_TOKEN: &str = "invalid or expired token";
const WRONG_CURRENT_PASSWORD: &str = "current password is incorrect";

/// Account use-cases over the user, token, two-factor, review and skill
/// ports.
#[derive(Clone)]
pub struct Accounts {
    users: Arc<dyn UserRepository>,
    sessions: Arc<dyn AuthSessionRepository>,
    two_factor: Arc<dyn TwoFactorRepository>,
    reviews: Arc<dyn ReviewRepository>,
    skills: Arc<dyn SkillRepository>,
    clock: Arc<dyn Clock>,
    token_ttl: Duration,
}

impl Accounts {
    pub fn new(
        users: Arc<dyn UserRepository>,
        sessions: Arc<dyn AuthSessionRepository>,
        two_factor: Arc<dyn TwoFactorRepository>,
        reviews: Arc<dyn ReviewRepository>,
        skills: Arc<dyn SkillRepository>,
        clock: Arc<dyn Clock>,
        token_ttl: Duration,
    ) -> Self {
        Self {
            users,
            sessions,
            two_factor,
            reviews,
            skills,
            clock,
            token_ttl,
        }
    }

    async fn open_challenge(&self, user: &User) -> Result<LoginOutcome, Error> {
        let challenge = BearerToken::generate();
        let expires_at = self.clock.utc() + Duration::minutes(CHALLENGE_TTL_MINUTES);
        self.two_factor
            .insert_challenge(&LoginChallenge {
                digest: challenge.digest(),
                user_id: user.id,
                attempts: 0,
                expires_at,
            })
            .await?;
        info!(user_id = %user.id, "password accepted, second factor required");
        Ok(LoginOutcome::ChallengeRequired {
            challenge,
            expires_at,
        })
    }

    async fn load(&self, user_id: &UserId) -> Result<User, Error> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| Error::not_found(format!("user {user_id} not found")))
    }
}

fn hash_error(err: PasswordHashError) -> Error {
    Error::internal(err.to_string())
}

/// Open a bearer session for `user` lasting `ttl` from `now`.
pub(super) async fn issue_token(
    sessions: &dyn AuthSessionRepository,
    user: User,
    now: DateTime<Utc>,
    ttl: Duration,
) -> Result<IssuedToken, Error> {
    let token = BearerToken::generate();
    let session = AuthSession {
        digest: token.digest(),
        user_id: user.id,
        expires_at: now + ttl,
        revoked: false,
    };
    sessions.insert(&session).await?;
    Ok(IssuedToken {
        token,
        expires_at: session.expires_at,
        user,
    })
}

async fn hash_password(password: Password) -> Result<PasswordHash, Error> {
    tokio::task::spawn_blocking(move || PasswordHash::hash(&password))
        .await
        .map_err(|err| Error::internal(format!("password hashing task failed: {err}")))?
        .map_err(hash_error)
}

pub(super) async fn verify_password(hash: PasswordHash, candidate: String) -> Result<bool, Error> {
    tokio::task::spawn_blocking(move || hash.verify(&candidate))
        .await
        .map_err(|err| Error::internal(format!("password check task failed: {err}")))?
        .map_err(hash_error)
}

#[async_trait]
impl AccountService for Accounts {
    async fn register(&self, registration: Registration) -> Result<User, Error> {
        if registration.role == Role::Admin {
            return Err(Error::invalid_request("role must be learner or mentor"));
        }
        let hourly_rate_cents = registration
            .hourly_rate_cents
            .map(validate_hourly_rate)
            .transpose()
            .map_err(|err| Error::invalid_request(err.to_string()))?;

        let user = User {
            id: UserId::random(),
            email: registration.email,
            display_name: registration.display_name,
            role: registration.role,
            bio: String::new(),
            timezone: registration.timezone,
            hourly_rate_cents,
            is_mentor_approved: false,
            created_at: self.clock.utc(),
        };
        let hash = hash_password(registration.password).await?;
        self.users.create(&user, &hash).await?;
        info!(user_id = %user.id, role = %user.role, "account registered");
        Ok(user)
    }

    async fn login(&self, credentials: &LoginCredentials) -> Result<LoginOutcome, Error> {
        let Some((user, hash)) = self.users.find_credentials(credentials.email()).await? else {
            return Err(Error::unauthorized(INVALID_CREDENTIALS));
        };
        if !verify_password(hash, credentials.password().to_owned()).await? {
            return Err(Error::unauthorized(INVALID_CREDENTIALS));
        }
        if self
            .two_factor
            .find(&user.id)
            .await?
            .is_some_and(|settings| settings.enabled)
        {
            return self.open_challenge(&user).await;
        }

        let issued = issue_token(&*self.sessions, user, self.clock.utc(), self.token_ttl).await?;
        info!(user_id = %issued.user.id, "login succeeded");
        Ok(LoginOutcome::Issued(issued))
    }

    async fn logout(&self, token: &BearerToken) -> Result<(), Error> {
        Ok(self.sessions.revoke(&token.digest()).await?)
    }

    async fn authenticate(&self, token: &BearerToken) -> Result<User, Error> {
        let session = self
            .sessions
            .find(&token.digest())
            .await?
            .filter(|session| session.is_active_at(self.clock.utc()))
            .ok_or_else(|| Error::unauthorized(INVALID_TOKEN))?;
        self.users
            .find_by_id(&session.user_id)
            .await?
            .ok_or_else(|| Error::unauthorized(INVALID_TOKEN))
    }

    async fn profile(&self, user_id: &UserId) -> Result<User, Error> {
        self.load(user_id).await
    }

    async fn update_profile(&self, user_id: &UserId, update: ProfileUpdate) -> Result<User, Error> {
        if let Some(rate) = update.hourly_rate_cents {
            validate_hourly_rate(rate).map_err(|err| Error::invalid_request(err.to_string()))?;
        }
        let mut user = self.load(user_id).await?;
        update.apply(&mut user);
        self.users.update(&user).await?;
        Ok(user)
    }

    async fn list_mentors(&self) -> Result<Vec<User>, Error> {
        Ok(self.users.list_approved_mentors().await?)
    }

    async fn mentor_profile(&self, mentor_id: &UserId) -> Result<MentorCard, Error> {
        let mentor = self
            .users
            .find_by_id(mentor_id)
            .await?
            .filter(User::is_bookable_mentor)
            .ok_or_else(|| Error::not_found(format!("mentor {mentor_id} not found")))?;
        let reviews = self.reviews.for_mentor(mentor_id).await?;
        let skills = self.skills.mentor_skills(mentor_id).await?;
        Ok(MentorCard {
            rating: MentorRating::from_reviews(mentor.id, &reviews),
            skills,
            mentor,
        })
    }

    async fn approve_mentor(&self, actor: &Actor, mentor_id: &UserId) -> Result<User, Error> {
        require_role(actor, Role::Admin)?;
        let mut user = self.load(mentor_id).await?;
        if user.role != Role::Mentor {
            return Err(Error::invalid_request("user is not a mentor"));
        }
        user.is_mentor_approved = true;
        self.users.update(&user).await?;
        info!(mentor_id = %user.id, approved_by = %actor.user_id, "mentor approved");
        Ok(user)
    }

    async fn pending_mentors(&self, actor: &Actor) -> Result<Vec<User>, Error> {
        require_role(actor, Role::Admin)?;
        Ok(self.users.list_pending_mentors().await?)
    }

    async fn change_password(
        &self,
        user_id: &UserId,
        keep: &BearerToken,
        change: PasswordChange,
    ) -> Result<(), Error> {
        let stored = self
            .users
            .find_password_hash(user_id)
            .await?
            .ok_or_else(|| Error::not_found(format!("user {user_id} not found")))?;
        if !verify_password(stored, change.current.expose().to_owned()).await? {
            return Err(Error::invalid_request(WRONG_CURRENT_PASSWORD)
                .with_details(json!({ "field": "currentPassword", "code": "incorrect" })));
        }
        let hash = hash_password(change.replacement).await?;
        if !self.users.update_password(user_id, &hash).await? {
            return Err(Error::not_found(format!("user {user_id} not found")));
        }
        let revoked = self.sessions.revoke_others(user_id, &keep.digest()).await?;
        info!(%user_id, revoked, "password changed");
        Ok(())
    }
}

#[cfg(test)]
#[path = "account_service_tests.rs"]
mod tests;
