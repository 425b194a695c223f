//! Inbound third-party webhooks: provider secrets, signature checks and the
//! recorded event log.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde_json::Value;
use sha2::Sha256;
use uuid::Uuid;
use zeroize::Zeroizing;

type HmacSha256 = Hmac<Sha256>;

/// Event type recorded when the provider omits one.
pub const UNKNOWN_EVENT_TYPE: &str = "unknown";
/// Longest accepted `X-Event-Type` value.
pub const EVENT_TYPE_MAX: usize = 128;
/// Longest accepted `X-Event-Id` value.
pub const EVENT_ID_MAX: usize = 255;

/// Errors raised while parsing the secrets setting.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WebhookSecretsError {
    #[error("webhook secret entry `{entry}` must look like provider=secret")]
    MalformedEntry { entry: String },
}

/// Shared secrets keyed by provider name.
#[derive(Clone, Default)]
pub struct WebhookSecrets(HashMap<String, Zeroizing<String>>);

impl WebhookSecrets {
    /// Parse `provider=secret` pairs separated by commas.
    ///
    /// # Examples
    /// ```
    /// use mentorship::domain::WebhookSecrets;
    ///
    /// let secrets = WebhookSecrets::parse("stripe=abc, zoom=def").expect("valid");
    /// assert!(secrets.knows("zoom"));
    /// assert!(!secrets.knows("calendly"));
    /// ```
    pub fn parse(raw: &str) -> Result<Self, WebhookSecretsError> {
        let mut secrets = HashMap::new();
        for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let Some((raw_provider, raw_secret)) = entry.split_once('=') else {
                return Err(WebhookSecretsError::MalformedEntry {
                    entry: redact_entry(entry),
                });
            };
            let provider = raw_provider.trim().to_lowercase();
            let secret = raw_secret.trim();
            if provider.is_empty() || secret.is_empty() {
                return Err(WebhookSecretsError::MalformedEntry {
                    entry: redact_entry(entry),
                });
            }
            secrets.insert(provider, Zeroizing::new(secret.to_owned()));
        }
        Ok(Self(secrets))
    }

    /// True when a secret is configured for `provider`.
    #[must_use]
    pub fn knows(&self, provider: &str) -> bool {
        self.0.contains_key(provider)
    }

    /// Verify `signature_hex` over `body` with the provider's secret.
    ///
    /// Returns `None` for unknown providers. Comparison is constant time.
    #[must_use]
    pub fn verify(&self, provider: &str, body: &[u8], signature_hex: &str) -> Option<bool> {
        let secret = self.0.get(provider)?;
        Some(verify_signature(secret.as_bytes(), body, signature_hex))
    }
}

fn redact_entry(entry: &str) -> String {
    entry
        .split_once('=')
        .map_or_else(|| "<redacted>".to_owned(), |(p, _)| format!("{p}=<redacted>"))
}

impl fmt::Debug for WebhookSecrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut providers: Vec<_> = self.0.keys().collect();
        providers.sort_unstable();
        f.debug_struct("WebhookSecrets")
            .field("providers", &providers)
            .finish()
    }
}

/// Compute the hex HMAC-SHA256 of `body` under `secret`.
pub fn sign(secret: &[u8], body: &[u8]) -> Result<String, hmac::digest::InvalidLength> {
    let mut mac = HmacSha256::new_from_slice(secret)?;
    mac.update(body);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Check a hex signature in constant time.
#[must_use]
pub fn verify_signature(secret: &[u8], body: &[u8], signature_hex: &str) -> bool {
    let Ok(expected) = hex::decode(signature_hex.trim()) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

/// Recorded webhook delivery.
#[derive(Debug, Clone, PartialEq)]
pub struct WebhookEvent {
    pub id: Uuid,
    pub provider: String,
    pub event_type: String,
    pub event_id: Option<String>,
    pub payload: Value,
    pub received_at: DateTime<Utc>,
}

/// Whether recording an event created a new row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookRecordOutcome {
    Recorded,
    /// The provider already delivered this event; `id` is the stored record.
    Duplicate { id: Uuid },
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn signatures_verify_only_the_signed_body() {
        let signature = sign(b"s3cret", br#"{"ok":true}"#).expect("sign");
        assert!(verify_signature(b"s3cret", br#"{"ok":true}"#, &signature));
        assert!(!verify_signature(b"s3cret", br#"{"ok":false}"#, &signature));
        assert!(!verify_signature(b"other", br#"{"ok":true}"#, &signature));
    }

    #[rstest]
    #[case("")]
    #[case("not-hex")]
    #[case("abcd")]
    fn malformed_signatures_fail(#[case] signature: &str) {
        assert!(!verify_signature(b"s3cret", b"{}", signature));
    }

    #[rstest]
    fn secrets_parse_and_lookup_by_provider() {
        let secrets = WebhookSecrets::parse("Stripe=abc,zoom = def").expect("valid");
        let body = b"{}";
        let signature = sign(b"abc", body).expect("sign");
        assert_eq!(secrets.verify("stripe", body, &signature), Some(true));
        assert_eq!(secrets.verify("zoom", body, &signature), Some(false));
        assert_eq!(secrets.verify("calendly", body, "00"), None);
    }

    #[rstest]
    #[case("stripe")]
    #[case("=abc")]
    #[case("stripe=")]
    fn malformed_entries_are_rejected(#[case] raw: &str) {
        assert!(WebhookSecrets::parse(raw).is_err());
    }

    #[rstest]
    fn debug_output_hides_secrets() {
        let secrets = WebhookSecrets::parse("stripe=abc").expect("valid");
        let rendered = format!("{secrets:?}");
        assert!(rendered.contains("stripe"));
        assert!(!rendered.contains("abc"));
    }
}
