//! Two-factor sign-in handlers.
//!
//! ```text
//! GET  /api/v1/auth/2fa/status
//! POST /api/v1/auth/2fa/setup {"password":"..."}
//! POST /api/v1/auth/2fa/enable {"code":"123456"}
//! POST /api/v1/auth/2fa/disable {"code":"123456"}
//! POST /api/v1/auth/2fa/recovery-codes {"code":"123456"}
//! POST /api/v1/auth/2fa/verify {"challengeToken":"...","code":"123456"}
//! ```

use actix_web::{HttpResponse, get, post, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{BearerToken, Error, Password, SecondFactor, TwoFactorStatus};
use crate::inbound::http::ApiResult;
use crate::inbound::http::accounts::LoginResponse;
use crate::inbound::http::auth::Authenticated;
use crate::inbound::http::cache_control::private_no_cache_header;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, invalid_field, missing_field_error};

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TwoFactorStatusBody {
    pub enabled: bool,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub last_used_at: Option<DateTime<Utc>>,
    pub recovery_codes_remaining: usize,
}

impl From<TwoFactorStatus> for TwoFactorStatusBody {
    fn from(value: TwoFactorStatus) -> Self {
        Self {
            enabled: value.enabled,
            confirmed_at: value.confirmed_at,
            last_used_at: value.last_used_at,
            recovery_codes_remaining: value.recovery_codes_remaining,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct SetupRequest {
    pub password: String,
}

/// Secret to add to an authenticator app. Shown once.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SetupResponse {
    #[schema(example = "JBSWY3DPEHPK3PXPJBSWY3DPEHPK3PXP")]
    pub secret: String,
    pub otpauth_uri: String,
}

/// A six-digit authenticator code or an eight-character recovery code.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CodeRequest {
    #[schema(example = "123456")]
    pub code: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecoveryCodesResponse {
    pub recovery_codes: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest {
    pub challenge_token: String,
    pub code: String,
}

fn parse_code(raw: &str) -> Result<SecondFactor, Error> {
    SecondFactor::parse(raw).map_err(invalid_field(FieldName::new("code")))
}

/// Whether two-factor sign-in is on for the caller.
#[utoipa::path(
    get,
    path = "/api/v1/auth/2fa/status",
    responses(
        (status = 200, description = "Two-factor status", body = TwoFactorStatusBody),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["two-factor"],
    operation_id = "twoFactorStatus"
)]
#[get("/auth/2fa/status")]
pub async fn status(state: web::Data<HttpState>, caller: Authenticated) -> ApiResult<HttpResponse> {
    let current = state.two_factor.status(&caller.actor.user_id).await?;
    Ok(HttpResponse::Ok()
        .insert_header(private_no_cache_header())
        .json(TwoFactorStatusBody::from(current)))
}

/// Start enrolment; the password is checked again.
#[utoipa::path(
    post,
    path = "/api/v1/auth/2fa/setup",
    request_body = SetupRequest,
    responses(
        (status = 200, description = "New secret", body = SetupResponse),
        (status = 400, description = "Wrong password or already enabled", body = Error),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["two-factor"],
    operation_id = "twoFactorSetup"
)]
#[post("/auth/2fa/setup")]
pub async fn setup(
    state: web::Data<HttpState>,
    caller: Authenticated,
    payload: web::Json<SetupRequest>,
) -> ApiResult<HttpResponse> {
    let password =
        Password::new(&payload.password).map_err(invalid_field(FieldName::new("password")))?;
    let enrolment = state
        .two_factor
        .begin_enrolment(&caller.user, password)
        .await?;
    Ok(HttpResponse::Ok()
        .insert_header(private_no_cache_header())
        .json(SetupResponse {
            secret: enrolment.secret,
            otpauth_uri: enrolment.otpauth_uri,
        }))
}

/// Confirm enrolment with an authenticator code.
#[utoipa::path(
    post,
    path = "/api/v1/auth/2fa/enable",
    request_body = CodeRequest,
    responses(
        (status = 200, description = "Enabled; recovery codes shown once", body = RecoveryCodesResponse),
        (status = 400, description = "Wrong code or no pending setup", body = Error),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["two-factor"],
    operation_id = "twoFactorEnable"
)]
#[post("/auth/2fa/enable")]
pub async fn enable(
    state: web::Data<HttpState>,
    caller: Authenticated,
    payload: web::Json<CodeRequest>,
) -> ApiResult<HttpResponse> {
    let code = parse_code(&payload.code)?;
    let issued = state.two_factor.enable(&caller.actor.user_id, code).await?;
    Ok(HttpResponse::Ok()
        .insert_header(private_no_cache_header())
        .json(RecoveryCodesResponse {
            recovery_codes: issued,
        }))
}

/// Turn two-factor sign-in off.
#[utoipa::path(
    post,
    path = "/api/v1/auth/2fa/disable",
    request_body = CodeRequest,
    responses(
        (status = 204, description = "Disabled"),
        (status = 400, description = "Wrong code or not enabled", body = Error),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["two-factor"],
    operation_id = "twoFactorDisable"
)]
#[post("/auth/2fa/disable")]
pub async fn disable(
    state: web::Data<HttpState>,
    caller: Authenticated,
    payload: web::Json<CodeRequest>,
) -> ApiResult<HttpResponse> {
    let code = parse_code(&payload.code)?;
    state.two_factor.disable(&caller.actor.user_id, code).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Replace the recovery codes.
#[utoipa::path(
    post,
    path = "/api/v1/auth/2fa/recovery-codes",
    request_body = CodeRequest,
    responses(
        (status = 200, description = "New recovery codes", body = RecoveryCodesResponse),
        (status = 400, description = "Wrong code or not enabled", body = Error),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["two-factor"],
    operation_id = "twoFactorRecoveryCodes"
)]
#[post("/auth/2fa/recovery-codes")]
pub async fn recovery_codes(
    state: web::Data<HttpState>,
    caller: Authenticated,
    payload: web::Json<CodeRequest>,
) -> ApiResult<HttpResponse> {
    let code = parse_code(&payload.code)?;
    let fresh = state
        .two_factor
        .regenerate_recovery_codes(&caller.actor.user_id, code)
        .await?;
    Ok(HttpResponse::Ok()
        .insert_header(private_no_cache_header())
        .json(RecoveryCodesResponse {
            recovery_codes: fresh,
        }))
}

/// Finish a login that returned a challenge.
#[utoipa::path(
    post,
    path = "/api/v1/auth/2fa/verify",
    request_body = VerifyRequest,
    responses(
        (status = 200, description = "Login success", body = LoginResponse),
        (status = 400, description = "Malformed code", body = Error),
        (status = 401, description = "Wrong code or expired challenge", body = Error)
    ),
    tags = ["two-factor"],
    operation_id = "twoFactorVerify",
    security([])
)]
#[post("/auth/2fa/verify")]
pub async fn verify(
    state: web::Data<HttpState>,
    payload: web::Json<VerifyRequest>,
) -> ApiResult<HttpResponse> {
    let VerifyRequest {
        challenge_token,
        code,
    } = payload.into_inner();
    if challenge_token.trim().is_empty() {
        return Err(missing_field_error(FieldName::new("challengeToken")));
    }
    let code = parse_code(&code)?;
    let issued = state
        .two_factor
        .complete_login(&BearerToken::from_presented(&challenge_token), code)
        .await?;
    Ok(HttpResponse::Ok()
        .insert_header(private_no_cache_header())
        .json(LoginResponse::from(issued)))
}

#[cfg(test)]
#[path = "two_factor_tests.rs"]
mod tests;
