//! Time-based one-time passwords (RFC 6238) and recovery codes for
//! two-factor sign-in.
//!
//! Secrets are 20 random bytes shown to the user once as base32 and as an
//! `otpauth://` URI. Codes are six digits over 30-second steps, HMAC-SHA1,
//! accepted one step either side of now. A step is never accepted twice.
//! Recovery codes are eight characters, stored as SHA-256 digests and spent
//! on use.

use std::fmt;

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use rand::Rng;
use rand::RngCore;
use rand::rngs::OsRng;
use sha1::Sha1;
use sha2::{Digest, Sha256};
use url::Url;
use zeroize::Zeroizing;

use super::{Email, TokenDigest, UserId};

type HmacSha1 = Hmac<Sha1>;

/// Seconds covered by one code.
pub const TOTP_PERIOD_SECONDS: i64 = 30;
/// Digits in a code.
pub const TOTP_DIGITS: u32 = 6;
/// Issuer label shown by authenticator apps.
pub const TOTP_ISSUER: &str = "Mentorship";
/// Recovery codes issued per enrolment.
pub const BACKUP_CODE_COUNT: usize = 10;
/// Minutes a login challenge stays open.
pub const CHALLENGE_TTL_MINUTES: i64 = 10;
/// Code attempts allowed per login challenge.
pub const CHALLENGE_MAX_ATTEMPTS: i32 = 5;

const TOTP_SKEW_STEPS: i64 = 1;
const SECRET_BYTES: usize = 20;
const BACKUP_CODE_LEN: usize = 8;
const BACKUP_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
const BASE32_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";

/// Validation errors for two-factor inputs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TwoFactorValidationError {
    #[error("code must be a 6-digit authenticator code or an 8-character recovery code")]
    MalformedCode,
    #[error("stored two-factor secret is not valid base32")]
    MalformedSecret,
}

/// Shared TOTP secret.
#[derive(Clone, PartialEq, Eq)]
pub struct TotpSecret(Zeroizing<Vec<u8>>);

impl TotpSecret {
    /// Fresh random secret.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = Zeroizing::new(vec![0_u8; SECRET_BYTES]);
        OsRng.fill_bytes(&mut bytes[..]);
        Self(bytes)
    }

    /// Decode an unpadded RFC 4648 base32 secret. Case and spaces are ignored.
    pub fn from_base32(encoded: &str) -> Result<Self, TwoFactorValidationError> {
        let mut bytes = Zeroizing::new(Vec::with_capacity(encoded.len() * 5 / 8));
        let mut buffer: u32 = 0;
        let mut bits = 0;
        for ch in encoded.chars().filter(|c| !c.is_whitespace() && *c != '=') {
            let upper = ch.to_ascii_uppercase();
            let value = BASE32_ALPHABET
                .iter()
                .position(|&b| char::from(b) == upper)
                .ok_or(TwoFactorValidationError::MalformedSecret)?;
            buffer = (buffer << 5) | u32::try_from(value).unwrap_or_default();
            bits += 5;
            if bits >= 8 {
                bits -= 8;
                bytes.push(low_byte(buffer >> bits));
                buffer &= (1 << bits) - 1;
            }
        }
        if bytes.is_empty() {
            return Err(TwoFactorValidationError::MalformedSecret);
        }
        Ok(Self(bytes))
    }

    /// Unpadded base32 text for storage and manual entry.
    ///
    /// # Examples
    /// ```
    /// use mentorship::domain::TotpSecret;
    ///
    /// let secret = TotpSecret::from_base32("GEZDGNBVGY3TQOJQ").unwrap();
    /// assert_eq!(secret.to_base32(), "GEZDGNBVGY3TQOJQ");
    /// ```
    #[must_use]
    pub fn to_base32(&self) -> String {
        let mut out = String::with_capacity(self.0.len().div_ceil(5) * 8);
        let mut buffer: u32 = 0;
        let mut bits = 0;
        for &byte in self.0.iter() {
            buffer = (buffer << 8) | u32::from(byte);
            bits += 8;
            while bits >= 5 {
                bits -= 5;
                out.push(base32_char(buffer >> bits));
            }
            buffer &= (1 << bits) - 1;
        }
        if bits > 0 {
            out.push(base32_char(buffer << (5 - bits)));
        }
        out
    }

    /// Code for a 30-second step counted from the Unix epoch.
    #[must_use]
    pub fn code_at_step(&self, step: i64) -> String {
        let Ok(mut mac) = HmacSha1::new_from_slice(&self.0) else {
            return String::new();
        };
        mac.update(&step.to_be_bytes());
        let digest = mac.finalize().into_bytes();
        let offset = usize::from(digest[digest.len() - 1] & 0x0f);
        let truncated = u32::from_be_bytes([
            digest[offset] & 0x7f,
            digest[offset + 1],
            digest[offset + 2],
            digest[offset + 3],
        ]);
        format!(
            "{:0width$}",
            truncated % 10_u32.pow(TOTP_DIGITS),
            width = TOTP_DIGITS as usize
        )
    }

    /// `otpauth://` URI for authenticator apps.
    #[must_use]
    pub fn provisioning_uri(&self, account: &Email) -> String {
        let label = format!("{TOTP_ISSUER}:{account}");
        let Ok(mut uri) = Url::parse("otpauth://totp/") else {
            return String::new();
        };
        uri.path_segments_mut()
            .map(|mut segments| {
                segments.pop_if_empty().push(&label);
            })
            .ok();
        uri.query_pairs_mut()
            .append_pair("secret", &self.to_base32())
            .append_pair("issuer", TOTP_ISSUER)
            .append_pair("algorithm", "SHA1")
            .append_pair("digits", &TOTP_DIGITS.to_string())
            .append_pair("period", &TOTP_PERIOD_SECONDS.to_string());
        uri.into()
    }
}

impl fmt::Debug for TotpSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TotpSecret(**redacted**)")
    }
}

fn low_byte(value: u32) -> u8 {
    value.to_be_bytes()[3]
}

fn base32_char(value: u32) -> char {
    let index = usize::from(low_byte(value) & 0x1f);
    BASE32_ALPHABET.get(index).map_or('A', |&b| char::from(b))
}

/// Step containing `now`.
#[must_use]
pub fn totp_step(now: DateTime<Utc>) -> i64 {
    now.timestamp().div_euclid(TOTP_PERIOD_SECONDS)
}

/// A code presented as the second factor.
#[derive(Clone, PartialEq, Eq)]
pub enum SecondFactor {
    Totp(Zeroizing<String>),
    Recovery(Zeroizing<String>),
}

impl SecondFactor {
    /// Parse a six-digit authenticator code or an eight-character recovery
    /// code. Spaces and dashes are ignored; recovery codes are case-blind.
    pub fn parse(raw: &str) -> Result<Self, TwoFactorValidationError> {
        let compact: String = raw
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '-')
            .collect();
        let digits = TOTP_DIGITS as usize;
        if compact.len() == digits && compact.chars().all(|c| c.is_ascii_digit()) {
            return Ok(Self::Totp(Zeroizing::new(compact)));
        }
        if compact.len() == BACKUP_CODE_LEN && compact.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Ok(Self::Recovery(Zeroizing::new(compact.to_ascii_uppercase())));
        }
        Err(TwoFactorValidationError::MalformedCode)
    }
}

impl fmt::Debug for SecondFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Totp(_) => f.write_str("SecondFactor::Totp(**redacted**)"),
            Self::Recovery(_) => f.write_str("SecondFactor::Recovery(**redacted**)"),
        }
    }
}

fn recovery_digest(code: &str) -> String {
    hex::encode(Sha256::digest(code.as_bytes()))
}

/// Fresh recovery codes with the digests to store.
fn recovery_codes() -> (Vec<String>, Vec<String>) {
    let mut rng = OsRng;
    let codes: Vec<String> = (0..BACKUP_CODE_COUNT)
        .map(|_| {
            (0..BACKUP_CODE_LEN)
                .map(|_| char::from(BACKUP_ALPHABET[rng.gen_range(0..BACKUP_ALPHABET.len())]))
                .collect()
        })
        .collect();
    let digests = codes.iter().map(|code| recovery_digest(code)).collect();
    (codes, digests)
}

/// Which factor satisfied a check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FactorKind {
    Totp,
    Recovery,
}

/// Per-user two-factor state.
///
/// ## Invariants
/// - `enabled` implies `secret` is present.
/// - `last_used_step` only moves forward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TwoFactorSettings {
    pub user_id: UserId,
    pub secret: Option<TotpSecret>,
    pub enabled: bool,
    pub recovery_digests: Vec<String>,
    pub last_used_step: Option<i64>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub last_used_at: Option<DateTime<Utc>>,
}

impl TwoFactorSettings {
    /// Unconfirmed enrolment holding a new secret.
    #[must_use]
    pub const fn pending(user_id: UserId, secret: TotpSecret) -> Self {
        Self {
            user_id,
            secret: Some(secret),
            enabled: false,
            recovery_digests: Vec::new(),
            last_used_step: None,
            confirmed_at: None,
            last_used_at: None,
        }
    }

    /// Check an authenticator code and burn its step.
    pub fn verify_totp(&mut self, code: &str, now: DateTime<Utc>) -> bool {
        let Some(secret) = &self.secret else {
            return false;
        };
        let current = totp_step(now);
        let floor = self.last_used_step.unwrap_or(i64::MIN);
        let matched = (current - TOTP_SKEW_STEPS..=current + TOTP_SKEW_STEPS)
            .filter(|step| *step > floor)
            .find(|step| secret.code_at_step(*step) == code);
        if let Some(step) = matched {
            self.last_used_step = Some(step);
            self.last_used_at = Some(now);
        }
        matched.is_some()
    }

    /// Spend a recovery code.
    pub fn redeem_recovery(&mut self, code: &str, now: DateTime<Utc>) -> bool {
        let digest = recovery_digest(code);
        let Some(index) = self.recovery_digests.iter().position(|d| *d == digest) else {
            return false;
        };
        self.recovery_digests.remove(index);
        self.last_used_at = Some(now);
        true
    }

    /// Check either factor. Recovery codes only count once enabled.
    pub fn verify(&mut self, factor: &SecondFactor, now: DateTime<Utc>) -> Option<FactorKind> {
        match factor {
            SecondFactor::Totp(code) => self.verify_totp(code, now).then_some(FactorKind::Totp),
            SecondFactor::Recovery(code) => (self.enabled && self.redeem_recovery(code, now))
                .then_some(FactorKind::Recovery),
        }
    }

    /// Turn on two-factor sign-in and issue recovery codes.
    pub fn enable(&mut self, now: DateTime<Utc>) -> Vec<String> {
        self.enabled = true;
        self.confirmed_at = Some(now);
        self.regenerate_recovery_codes()
    }

    /// Replace every recovery code.
    pub fn regenerate_recovery_codes(&mut self) -> Vec<String> {
        let (codes, digests) = recovery_codes();
        self.recovery_digests = digests;
        codes
    }

    /// Summary safe to show the account owner.
    #[must_use]
    pub fn status(&self) -> TwoFactorStatus {
        TwoFactorStatus {
            enabled: self.enabled,
            confirmed_at: self.confirmed_at,
            last_used_at: self.last_used_at,
            recovery_codes_remaining: self.recovery_digests.len(),
        }
    }
}

/// Two-factor summary for the account owner.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TwoFactorStatus {
    pub enabled: bool,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub last_used_at: Option<DateTime<Utc>>,
    pub recovery_codes_remaining: usize,
}

/// Secret handed to the user while enrolling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TwoFactorEnrolment {
    pub secret: String,
    pub otpauth_uri: String,
}

/// Pending second step of a password login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginChallenge {
    pub digest: TokenDigest,
    pub user_id: UserId,
    pub attempts: i32,
    pub expires_at: DateTime<Utc>,
}

impl LoginChallenge {
    /// True while codes may still be tried.
    #[must_use]
    pub fn is_open_at(&self, now: DateTime<Utc>) -> bool {
        self.attempts < CHALLENGE_MAX_ATTEMPTS && now < self.expires_at
    }

    #[must_use]
    pub const fn attempts_remaining(&self) -> i32 {
        let left = CHALLENGE_MAX_ATTEMPTS - self.attempts;
        if left < 0 { 0 } else { left }
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use chrono::{Duration, TimeZone};
    use rstest::rstest;

    /// RFC 6238 appendix B secret for SHA-1.
    fn rfc_secret() -> TotpSecret {
        TotpSecret::from_base32("GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ").expect("secret")
    }

    fn at(seconds: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(seconds, 0).single().expect("timestamp")
    }

    #[rstest]
    #[case(59, "287082")]
    #[case(1_111_111_109, "081804")]
    #[case(1_234_567_890, "005924")]
    #[case(2_000_000_000, "279037")]
    fn codes_match_the_published_vectors(#[case] unix: i64, #[case] expected: &str) {
        assert_eq!(rfc_secret().code_at_step(totp_step(at(unix))), expected);
    }

    #[rstest]
    fn base32_round_trips_generated_secrets() {
        let secret = TotpSecret::generate();
        let encoded = secret.to_base32();
        assert_eq!(encoded.len(), 32);
        assert_eq!(TotpSecret::from_base32(&encoded.to_lowercase()), Ok(secret));
        assert_eq!(
            TotpSecret::from_base32("not base32!"),
            Err(TwoFactorValidationError::MalformedSecret)
        );
    }

    #[rstest]
    fn provisioning_uri_names_issuer_and_account() {
        let email = Email::new("ada@example.com").expect("email");
        let uri = rfc_secret().provisioning_uri(&email);
        assert!(uri.starts_with("otpauth://totp/Mentorship:ada@example.com?"), "{uri}");
        assert!(uri.contains("secret=GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ"));
        assert!(uri.contains("issuer=Mentorship"));
    }

    #[rstest]
    #[case("123456", true)]
    #[case("123 456", true)]
    #[case("abcd-2345", false)]
    fn second_factors_are_classified(#[case] raw: &str, #[case] is_totp: bool) {
        let factor = SecondFactor::parse(raw).expect("parse");
        assert_eq!(matches!(factor, SecondFactor::Totp(_)), is_totp);
    }

    #[rstest]
    #[case("")]
    #[case("12345")]
    #[case("12345a")]
    #[case("too-long-for-either")]
    fn malformed_codes_are_rejected(#[case] raw: &str) {
        assert_eq!(
            SecondFactor::parse(raw),
            Err(TwoFactorValidationError::MalformedCode)
        );
    }

    #[rstest]
    fn codes_are_accepted_within_one_step_and_never_replayed() {
        let now = at(1_111_111_109);
        let mut settings = TwoFactorSettings::pending(UserId::random(), rfc_secret());
        let previous = rfc_secret().code_at_step(totp_step(now) - 1);
        let stale = rfc_secret().code_at_step(totp_step(now) - 2);

        assert!(!settings.verify_totp(&stale, now));
        assert!(settings.verify_totp(&previous, now));
        assert!(!settings.verify_totp(&previous, now), "replayed step");
        let current = rfc_secret().code_at_step(totp_step(now));
        assert!(settings.verify_totp(&current, now + Duration::seconds(1)));
        assert_eq!(settings.last_used_step, Some(totp_step(now)));
    }

    #[rstest]
    fn recovery_codes_are_single_use_and_need_enrolment() {
        let now = at(1_700_000_000);
        let mut settings = TwoFactorSettings::pending(UserId::random(), TotpSecret::generate());
        let codes = settings.enable(now);
        assert_eq!(codes.len(), BACKUP_CODE_COUNT);
        assert_eq!(settings.status().recovery_codes_remaining, BACKUP_CODE_COUNT);

        let factor = SecondFactor::parse(&codes[0].to_lowercase()).expect("recovery code");
        assert_eq!(settings.verify(&factor, now), Some(FactorKind::Recovery));
        assert_eq!(settings.verify(&factor, now), None);
        assert_eq!(
            settings.status().recovery_codes_remaining,
            BACKUP_CODE_COUNT - 1
        );

        settings.enabled = false;
        let other = SecondFactor::parse(&codes[1]).expect("recovery code");
        assert_eq!(settings.verify(&other, now), None);
    }

    #[rstest]
    fn challenges_close_after_expiry_or_too_many_attempts() {
        let now = at(1_700_000_000);
        let challenge = LoginChallenge {
            digest: TokenDigest::from_stored("ab".to_owned()),
            user_id: UserId::random(),
            attempts: 0,
            expires_at: now + Duration::minutes(CHALLENGE_TTL_MINUTES),
        };
        assert!(challenge.is_open_at(now));
        assert!(!challenge.is_open_at(challenge.expires_at));
        let spent = LoginChallenge {
            attempts: CHALLENGE_MAX_ATTEMPTS,
            ..challenge
        };
        assert!(!spent.is_open_at(now));
        assert_eq!(spent.attempts_remaining(), 0);
    }
}
