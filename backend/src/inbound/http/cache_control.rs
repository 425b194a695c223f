//! `Cache-Control` values shared by handlers.

use actix_web::http::header::CACHE_CONTROL;

/// Per-user responses: never stored by shared caches, always revalidated.
pub const PRIVATE_NO_CACHE: &str = "private, no-cache, must-revalidate";

/// Health and one-off responses that must never be cached.
pub const NO_STORE: &str = "no-store";

/// Header tuple for responses carrying the caller's own data.
#[must_use]
pub const fn private_no_cache_header() -> (actix_web::http::header::HeaderName, &'static str) {
    (CACHE_CONTROL, PRIVATE_NO_CACHE)
}

/// Header tuple for responses that must not be cached at all.
#[must_use]
pub const fn no_store_header() -> (actix_web::http::header::HeaderName, &'static str) {
    (CACHE_CONTROL, NO_STORE)
}
