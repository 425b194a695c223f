//! Origin allow-list for socket upgrades.

use actix_web::http::header::HeaderValue;
use tracing::{error, warn};
use url::Url;

const LOCALHOST: &str = "localhost";

/// Accepts HTTPS origins on the primary domain or any of its subdomains,
/// and plain HTTP from localhost with an explicit non-zero port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginPolicy {
    primary_host: String,
    subdomain_suffix: String,
}

impl OriginPolicy {
    pub fn new(primary_host: impl Into<String>) -> Self {
        let primary_host = primary_host.into().trim().to_ascii_lowercase();
        let subdomain_suffix = format!(".{primary_host}");
        Self {
            primary_host,
            subdomain_suffix,
        }
    }

    pub fn primary_host(&self) -> &str {
        &self.primary_host
    }

    /// Returns true when a parsed Origin belongs to the allow-list.
    pub fn is_allowed(&self, origin: &Url) -> bool {
        let Some(host) = origin.host_str() else {
            return false;
        };

        match origin.scheme() {
            "http" if host == LOCALHOST => matches!(origin.port(), Some(port) if port != 0),
            "https" if host == self.primary_host => true,
            "https" => host
                .strip_suffix(&self.subdomain_suffix)
                .is_some_and(|label| !label.is_empty()),
            _ => false,
        }
    }

    /// Check a raw `Origin` header; 400 when unreadable, 403 when foreign.
    pub fn validate(&self, origin_header: &HeaderValue) -> actix_web::Result<()> {
        let origin_value = origin_header.to_str().map_err(|error| {
            error!(error = %error, "Failed to parse Origin header as string");
            actix_web::error::ErrorBadRequest("Invalid Origin header")
        })?;

        let origin = Url::parse(origin_value).map_err(|error| {
            error!(error = %error, "Failed to parse Origin header as URL");
            actix_web::error::ErrorBadRequest("Invalid Origin header")
        })?;

        if self.is_allowed(&origin) {
            Ok(())
        } else {
            warn!(
                origin = origin_value,
                "Rejected WS upgrade due to disallowed Origin"
            );
            Err(actix_web::error::ErrorForbidden("Origin not allowed"))
        }
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use actix_web::http::StatusCode;
    use rstest::{fixture, rstest};

    #[fixture]
    fn policy() -> OriginPolicy {
        OriginPolicy::new("mentors.example")
    }

    fn header(value: &str) -> HeaderValue {
        HeaderValue::from_str(value).expect("valid header value")
    }

    #[rstest]
    #[case("http://localhost:3000")]
    #[case("https://mentors.example")]
    #[case("https://app.mentors.example")]
    fn accepts_configured_origins(policy: OriginPolicy, #[case] origin: &str) {
        assert!(policy.validate(&header(origin)).is_ok());
    }

    #[rstest]
    #[case("http://localhost")]
    #[case("https://example.com")]
    #[case("wss://mentors.example")]
    fn rejects_disallowed_origins(policy: OriginPolicy, #[case] origin: &str) {
        let error = policy
            .validate(&header(origin))
            .expect_err("origin should be rejected");
        assert_eq!(
            error.as_response_error().status_code(),
            StatusCode::FORBIDDEN
        );
    }

    #[rstest]
    fn rejects_non_utf8_origin_header(policy: OriginPolicy) {
        let header = HeaderValue::from_bytes(&[0x80]).expect("opaque header value");
        let error = policy.validate(&header).expect_err("origin should be rejected");
        assert_eq!(
            error.as_response_error().status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[rstest]
    fn rejects_unparsable_origin_header(policy: OriginPolicy) {
        let error = policy
            .validate(&HeaderValue::from_static("not a url"))
            .expect_err("origin should be rejected");
        assert_eq!(
            error.as_response_error().status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[rstest]
    #[case("http://localhost:4000", true)]
    #[case("http://localhost:0", false)]
    #[case("http://localhost", false)]
    #[case("https://mentors.example", true)]
    #[case("https://chat.mentors.example", true)]
    #[case("https://mentors.example.evil.com", false)]
    #[case("https://evilmentors.example", false)]
    #[case("wss://mentors.example", false)]
    fn evaluates_allow_list(policy: OriginPolicy, #[case] origin: &str, #[case] expected: bool) {
        let parsed = Url::parse(origin).expect("url should parse");
        assert_eq!(policy.is_allowed(&parsed), expected);
    }

    #[rstest]
    fn primary_host_is_normalised() {
        let policy = OriginPolicy::new(" Mentors.Example ");
        assert_eq!(policy.primary_host(), "mentors.example");
    }
}
