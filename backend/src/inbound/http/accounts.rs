//! Account, profile and mentor directory handlers.
//!
//! ```text
//! POST /api/v1/auth/register {"email":"ada@example.com","password":"...","displayName":"Ada","role":"learner"}
//! POST /api/v1/auth/login {"email":"ada@example.com","password":"..."}
//! POST /api/v1/auth/logout
//! POST /api/v1/auth/change-password {"currentPassword":"...","newPassword":"...","newPasswordConfirm":"..."}
//! GET|PATCH /api/v1/users/me
//! GET /api/v1/mentors, /api/v1/mentors/{id}
//! GET /api/v1/admin/mentors/pending
//! POST /api/v1/admin/mentors/{id}/approve
//! ```

use actix_web::{HttpResponse, get, patch, post, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ports::{IssuedToken, LoginOutcome, PasswordChange, Registration};
use crate::domain::{
    CredentialsValidationError, DisplayName, Email, Error, LoginCredentials, Password,
    ProfileUpdate, Role, Timezone, validate_bio,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::Authenticated;
use crate::inbound::http::cache_control::private_no_cache_header;
use crate::inbound::http::schemas::{MentorBody, MentorCardBody, UserBody};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, invalid_field, invalid_value_error, parse_user_id,
};

/// Registration form for `POST /api/v1/auth/register`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[schema(example = "ada@example.com")]
    pub email: String,
    pub password: String,
    #[schema(example = "Ada Lovelace")]
    pub display_name: String,
    /// `learner` or `mentor`.
    #[schema(example = "learner")]
    pub role: String,
    #[schema(example = "Europe/London")]
    pub timezone: Option<String>,
    pub hourly_rate_cents: Option<i64>,
}

impl TryFrom<RegisterRequest> for Registration {
    type Error = Error;

    fn try_from(value: RegisterRequest) -> Result<Self, Self::Error> {
        let role = value.role.parse::<Role>().map_err(|_| {
            invalid_value_error(
                FieldName::new("role"),
                &value.role,
                "role must be learner or mentor",
            )
        })?;
        let timezone = value
            .timezone
            .as_deref()
            .map(Timezone::new)
            .transpose()
            .map_err(invalid_field(FieldName::new("timezone")))?
            .unwrap_or_default();
        Ok(Self {
            email: Email::new(&value.email).map_err(invalid_field(FieldName::new("email")))?,
            password: Password::new(&value.password)
                .map_err(invalid_field(FieldName::new("password")))?,
            display_name: DisplayName::new(&value.display_name)
                .map_err(invalid_field(FieldName::new("displayName")))?,
            role,
            timezone,
            hourly_rate_cents: value.hourly_rate_cents,
        })
    }
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Bearer token issued at login; the raw token is shown only once.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: UserBody,
}

impl From<IssuedToken> for LoginResponse {
    fn from(value: IssuedToken) -> Self {
        Self {
            token: value.token.expose().to_owned(),
            expires_at: value.expires_at,
            user: UserBody::from(&value.user),
        }
    }
}

/// Returned instead of a token when the account has two-factor sign-in on.
/// Send `challengeToken` with a code to `POST /api/v1/auth/2fa/verify`.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TwoFactorChallengeResponse {
    pub requires_two_factor: bool,
    pub challenge_token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
    pub new_password_confirm: String,
}

impl TryFrom<ChangePasswordRequest> for PasswordChange {
    type Error = Error;

    fn try_from(value: ChangePasswordRequest) -> Result<Self, Self::Error> {
        let current = Password::new(&value.current_password)
            .map_err(invalid_field(FieldName::new("currentPassword")))?;
        let replacement = Password::new(&value.new_password)
            .map_err(invalid_field(FieldName::new("newPassword")))?;
        if value.new_password != value.new_password_confirm {
            return Err(invalid_field(FieldName::new("newPasswordConfirm"))(
                "password fields do not match",
            ));
        }
        Ok(Self {
            current,
            replacement,
        })
    }
}

/// Partial profile update; omitted fields are left unchanged.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdateRequest {
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub timezone: Option<String>,
    pub hourly_rate_cents: Option<i64>,
}

impl TryFrom<ProfileUpdateRequest> for ProfileUpdate {
    type Error = Error;

    fn try_from(value: ProfileUpdateRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            display_name: value
                .display_name
                .map(DisplayName::new)
                .transpose()
                .map_err(invalid_field(FieldName::new("displayName")))?,
            bio: value
                .bio
                .as_deref()
                .map(validate_bio)
                .transpose()
                .map_err(invalid_field(FieldName::new("bio")))?,
            timezone: value
                .timezone
                .map(Timezone::new)
                .transpose()
                .map_err(invalid_field(FieldName::new("timezone")))?,
            hourly_rate_cents: value.hourly_rate_cents,
        })
    }
}

fn map_login_validation_error(err: CredentialsValidationError) -> Error {
    match err {
        CredentialsValidationError::Email(inner) => invalid_field(FieldName::new("email"))(inner),
        other => invalid_field(FieldName::new("password"))(other),
    }
}

/// Create a learner or mentor account.
#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = UserBody),
        (status = 400, description = "Invalid request", body = Error),
        (status = 409, description = "Email already registered", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["accounts"],
    operation_id = "register",
    security([])
)]
#[post("/auth/register")]
pub async fn register(
    state: web::Data<HttpState>,
    payload: web::Json<RegisterRequest>,
) -> ApiResult<HttpResponse> {
    let registration = Registration::try_from(payload.into_inner())?;
    let user = state.accounts.register(registration).await?;
    Ok(HttpResponse::Created().json(UserBody::from(&user)))
}

/// Exchange credentials for a bearer token.
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login success", body = LoginResponse),
        (status = 202, description = "Second factor required", body = TwoFactorChallengeResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Invalid credentials", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["accounts"],
    operation_id = "login",
    security([])
)]
#[post("/auth/login")]
pub async fn login(
    state: web::Data<HttpState>,
    payload: web::Json<LoginRequest>,
) -> ApiResult<HttpResponse> {
    let LoginRequest { email, password } = payload.into_inner();
    let credentials =
        LoginCredentials::try_from_parts(&email, &password).map_err(map_login_validation_error)?;
    Ok(match state.accounts.login(&credentials).await? {
        LoginOutcome::Issued(issued) => HttpResponse::Ok()
            .insert_header(private_no_cache_header())
            .json(LoginResponse::from(issued)),
        LoginOutcome::ChallengeRequired {
            challenge,
            expires_at,
        } => HttpResponse::Accepted()
            .insert_header(private_no_cache_header())
            .json(TwoFactorChallengeResponse {
                requires_two_factor: true,
                challenge_token: challenge.expose().to_owned(),
                expires_at,
            }),
    })
}

/// Revoke the presented bearer token.
#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    responses(
        (status = 204, description = "Token revoked"),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["accounts"],
    operation_id = "logout"
)]
#[post("/auth/logout")]
pub async fn logout(
    state: web::Data<HttpState>,
    caller: Authenticated,
) -> ApiResult<HttpResponse> {
    state.accounts.logout(&caller.token).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Change the caller's password and sign out their other sessions.
#[utoipa::path(
    post,
    path = "/api/v1/auth/change-password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 204, description = "Password changed"),
        (status = 400, description = "Invalid request or wrong current password", body = Error),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["accounts"],
    operation_id = "changePassword"
)]
#[post("/auth/change-password")]
pub async fn change_password(
    state: web::Data<HttpState>,
    caller: Authenticated,
    payload: web::Json<ChangePasswordRequest>,
) -> ApiResult<HttpResponse> {
    let change = PasswordChange::try_from(payload.into_inner())?;
    state
        .accounts
        .change_password(&caller.actor.user_id, &caller.token, change)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Fetch the caller's profile.
#[utoipa::path(
    get,
    path = "/api/v1/users/me",
    responses(
        (status = 200, description = "Current profile", body = UserBody),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["accounts"],
    operation_id = "currentUser"
)]
#[get("/users/me")]
pub async fn current_user(caller: Authenticated) -> HttpResponse {
    HttpResponse::Ok()
        .insert_header(private_no_cache_header())
        .json(UserBody::from(&caller.user))
}

/// Update display name, bio, timezone or hourly rate.
#[utoipa::path(
    patch,
    path = "/api/v1/users/me",
    request_body = ProfileUpdateRequest,
    responses(
        (status = 200, description = "Updated profile", body = UserBody),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["accounts"],
    operation_id = "updateCurrentUser"
)]
#[patch("/users/me")]
pub async fn update_current_user(
    state: web::Data<HttpState>,
    caller: Authenticated,
    payload: web::Json<ProfileUpdateRequest>,
) -> ApiResult<HttpResponse> {
    let update = ProfileUpdate::try_from(payload.into_inner())?;
    let user = state
        .accounts
        .update_profile(&caller.actor.user_id, update)
        .await?;
    Ok(HttpResponse::Ok()
        .insert_header(private_no_cache_header())
        .json(UserBody::from(&user)))
}

/// List approved mentors.
#[utoipa::path(
    get,
    path = "/api/v1/mentors",
    responses(
        (status = 200, description = "Approved mentors", body = [MentorBody]),
        (status = 503, description = "Service unavailable", body = Error)
    ),
    tags = ["mentors"],
    operation_id = "listMentors",
    security([])
)]
#[get("/mentors")]
pub async fn list_mentors(state: web::Data<HttpState>) -> ApiResult<web::Json<Vec<MentorBody>>> {
    let mentors = state.accounts.list_mentors().await?;
    Ok(web::Json(mentors.iter().map(MentorBody::from).collect()))
}

/// Approved mentor with rating aggregate and skills.
#[utoipa::path(
    get,
    path = "/api/v1/mentors/{id}",
    params(("id" = String, Path, description = "Mentor identifier")),
    responses(
        (status = 200, description = "Mentor profile", body = MentorCardBody),
        (status = 400, description = "Invalid identifier", body = Error),
        (status = 404, description = "Not an approved mentor", body = Error)
    ),
    tags = ["mentors"],
    operation_id = "mentorProfile",
    security([])
)]
#[get("/mentors/{id}")]
pub async fn mentor_profile(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<MentorCardBody>> {
    let mentor_id = parse_user_id(path.into_inner(), FieldName::new("id"))?;
    let card = state.accounts.mentor_profile(&mentor_id).await?;
    Ok(web::Json(MentorCardBody::from(&card)))
}

/// Mentors awaiting approval, oldest first (admin only).
#[utoipa::path(
    get,
    path = "/api/v1/admin/mentors/pending",
    responses(
        (status = 200, description = "Unapproved mentors", body = [UserBody]),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Admins only", body = Error)
    ),
    tags = ["mentors"],
    operation_id = "pendingMentors"
)]
#[get("/admin/mentors/pending")]
pub async fn pending_mentors(
    state: web::Data<HttpState>,
    caller: Authenticated,
) -> ApiResult<HttpResponse> {
    let pending = state.accounts.pending_mentors(&caller.actor).await?;
    Ok(HttpResponse::Ok()
        .insert_header(private_no_cache_header())
        .json(pending.iter().map(UserBody::from).collect::<Vec<_>>()))
}

/// Approve a mentor account (admin only).
#[utoipa::path(
    post,
    path = "/api/v1/admin/mentors/{id}/approve",
    params(("id" = String, Path, description = "Mentor identifier")),
    responses(
        (status = 200, description = "Mentor approved", body = UserBody),
        (status = 400, description = "Target is not a mentor", body = Error),
        (status = 403, description = "Admins only", body = Error),
        (status = 404, description = "Unknown user", body = Error)
    ),
    tags = ["mentors"],
    operation_id = "approveMentor"
)]
#[post("/admin/mentors/{id}/approve")]
pub async fn approve_mentor(
    state: web::Data<HttpState>,
    caller: Authenticated,
    path: web::Path<String>,
) -> ApiResult<web::Json<UserBody>> {
    let mentor_id = parse_user_id(path.into_inner(), FieldName::new("id"))?;
    let user = state
        .accounts
        .approve_mentor(&caller.actor, &mentor_id)
        .await?;
    Ok(web::Json(UserBody::from(&user)))
}

#[cfg(test)]
#[path = "accounts_tests.rs"]
mod tests;
