//! Bearer-token authentication for HTTP handlers.
//!
//! [`Authenticated`] is an extractor: handlers that take it run only for
//! callers presenting `Authorization: Bearer <token>` that resolves to a
//! live account. Everything else is rejected with 401 before the handler
//! body runs.

use actix_web::http::header::{AUTHORIZATION, HeaderMap};
use actix_web::{FromRequest, HttpRequest, dev::Payload, web};
use futures_util::future::LocalBoxFuture;

use crate::domain::{Actor, BearerToken, Error, User};
use crate::inbound::http::state::HttpState;

const BEARER_PREFIX: &str = "Bearer ";

/// Caller identity resolved from the bearer token.
#[derive(Debug, Clone)]
pub struct Authenticated {
    pub actor: Actor,
    pub user: User,
    pub token: BearerToken,
}

/// Read the bearer token from the `Authorization` header.
pub(crate) fn bearer_token(headers: &HeaderMap) -> Result<BearerToken, Error> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| Error::unauthorized("authentication required"))?;
    let raw = value
        .to_str()
        .map_err(|_| Error::unauthorized("malformed authorization header"))?;
    let token = raw
        .strip_prefix(BEARER_PREFIX)
        .or_else(|| raw.strip_prefix("bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| Error::unauthorized("authorization must use the Bearer scheme"))?;
    Ok(BearerToken::from_presented(token))
}

/// Resolve `token` into an [`Authenticated`] caller using the account port.
pub(crate) async fn resolve(state: &HttpState, token: BearerToken) -> Result<Authenticated, Error> {
    let user = state.accounts.authenticate(&token).await?;
    Ok(Authenticated {
        actor: Actor::of(&user),
        user,
        token,
    })
}

impl FromRequest for Authenticated {
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let state = req.app_data::<web::Data<HttpState>>().cloned();
        let token = bearer_token(req.headers());
        Box::pin(async move {
            let state = state.ok_or_else(|| Error::internal("HTTP state is not configured"))?;
            resolve(&state, token?).await
        })
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::{ErrorCode, Role};
    use crate::inbound::http::test_utils::{TOKEN, TestPorts, bearer, user};
    use actix_web::http::StatusCode;
    use actix_web::{App, HttpResponse, test as actix_test};
    use rstest::rstest;

    async fn whoami(caller: Authenticated) -> HttpResponse {
        HttpResponse::Ok().body(caller.user.email.to_string())
    }

    #[rstest]
    #[case::missing(None)]
    #[case::basic(Some("Basic YWRtaW46cGFzcw=="))]
    #[case::empty(Some("Bearer   "))]
    fn rejects_absent_or_foreign_schemes(#[case] header: Option<&str>) {
        let mut req = actix_test::TestRequest::default();
        if let Some(value) = header {
            req = req.insert_header((AUTHORIZATION, value));
        }
        let err = bearer_token(req.to_http_request().headers()).expect_err("rejected");
        assert_eq!(err.code(), ErrorCode::Unauthorized);
    }

    #[rstest]
    fn accepts_bearer_tokens() {
        let req = actix_test::TestRequest::default()
            .insert_header((AUTHORIZATION, "Bearer abc123"))
            .to_http_request();
        let token = bearer_token(req.headers()).expect("token");
        assert_eq!(token.expose(), "abc123");
    }

    #[rstest]
    #[actix_web::test]
    async fn resolves_the_caller() {
        let caller = user(Role::Learner);
        let email = caller.email.to_string();
        let state = TestPorts::authenticating(&caller).into_state();
        let app = actix_test::init_service(
            App::new()
                .app_data(state)
                .route("/me", web::get().to(whoami)),
        )
        .await;
        let req = actix_test::TestRequest::get()
            .uri("/me")
            .insert_header(bearer())
            .to_request();
        let res = actix_test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(actix_test::read_body(res).await, email.as_bytes());
    }

    #[rstest]
    #[actix_web::test]
    async fn unknown_tokens_are_unauthorised() {
        let mut ports = TestPorts::default();
        ports
            .accounts
            .expect_authenticate()
            .withf(|token| token.expose() == TOKEN)
            .returning(|_| Err(Error::unauthorized("invalid or expired token")));
        let app = actix_test::init_service(
            App::new()
                .app_data(ports.into_state())
                .route("/me", web::get().to(whoami)),
        )
        .await;
        let req = actix_test::TestRequest::get()
            .uri("/me")
            .insert_header(bearer())
            .to_request();
        let res = actix_test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }
}
