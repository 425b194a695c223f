//! Authentication primitives: credentials, password hashes and bearer tokens.
//!
//! Passwords are hashed with Argon2id and never stored in plain text. Bearer
//! tokens are random 32-byte values handed to the client once; only their
//! SHA-256 digest is persisted.

use std::fmt;

use argon2::password_hash::{SaltString, rand_core::OsRng as SaltRng};
use argon2::{Argon2, PasswordHash as PhcString, PasswordHasher, PasswordVerifier};
use chrono::{DateTime, Utc};
use rand::RngCore;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use super::{Email, UserId, UserValidationError};

/// Minimum accepted password length.
pub const PASSWORD_MIN: usize = 8;
/// Maximum accepted password length.
pub const PASSWORD_MAX: usize = 128;
const TOKEN_BYTES: usize = 32;

/// Validation errors for credentials.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CredentialsValidationError {
    #[error(transparent)]
    Email(#[from] UserValidationError),
    #[error("password must not be empty")]
    EmptyPassword,
    #[error("password must be between {min} and {max} characters")]
    PasswordLength { min: usize, max: usize },
}

/// Errors raised while hashing or verifying passwords.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PasswordHashError {
    #[error("password hashing failed: {message}")]
    Hash { message: String },
    #[error("stored password hash is malformed: {message}")]
    Malformed { message: String },
}

/// Plain-text password held in zeroising memory.
#[derive(Clone, PartialEq, Eq)]
pub struct Password(Zeroizing<String>);

impl Password {
    /// Validate a new password chosen at registration.
    pub fn new(raw: &str) -> Result<Self, CredentialsValidationError> {
        if raw.is_empty() {
            return Err(CredentialsValidationError::EmptyPassword);
        }
        let length = raw.chars().count();
        if !(PASSWORD_MIN..=PASSWORD_MAX).contains(&length) {
            return Err(CredentialsValidationError::PasswordLength {
                min: PASSWORD_MIN,
                max: PASSWORD_MAX,
            });
        }
        Ok(Self(Zeroizing::new(raw.to_owned())))
    }

    /// Plain text for comparison against a stored hash.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }

    fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(**redacted**)")
    }
}

/// Argon2 PHC-format password hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Hash a password with a fresh random salt.
    pub fn hash(password: &Password) -> Result<Self, PasswordHashError> {
        let salt = SaltString::generate(&mut SaltRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| Self(hash.to_string()))
            .map_err(|err| PasswordHashError::Hash {
                message: err.to_string(),
            })
    }

    /// Wrap a stored PHC string.
    #[must_use]
    pub const fn from_stored(phc: String) -> Self {
        Self(phc)
    }

    /// Check a candidate password against the hash.
    pub fn verify(&self, candidate: &str) -> Result<bool, PasswordHashError> {
        let parsed = PhcString::new(&self.0).map_err(|err| PasswordHashError::Malformed {
            message: err.to_string(),
        })?;
        Ok(Argon2::default()
            .verify_password(candidate.as_bytes(), &parsed)
            .is_ok())
    }
}

impl AsRef<str> for PasswordHash {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Validated login credentials.
///
/// # Examples
/// ```
/// use mentorship::domain::LoginCredentials;
///
/// let creds = LoginCredentials::try_from_parts("Ada@Example.com", "hunter22").unwrap();
/// assert_eq!(creds.email().as_ref(), "ada@example.com");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    email: Email,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    /// Construct credentials from raw inputs.
    ///
    /// Only emptiness is checked; length rules apply at registration.
    pub fn try_from_parts(email: &str, password: &str) -> Result<Self, CredentialsValidationError> {
        let email = Email::new(email)?;
        if password.is_empty() {
            return Err(CredentialsValidationError::EmptyPassword);
        }
        Ok(Self {
            email,
            password: Zeroizing::new(password.to_owned()),
        })
    }

    /// Normalised email used for lookup.
    #[must_use]
    pub const fn email(&self) -> &Email {
        &self.email
    }

    /// Candidate password.
    #[must_use]
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

/// Bearer token returned to the client on login.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(Zeroizing<String>);

impl BearerToken {
    /// Generate a new random token.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = Zeroizing::new([0_u8; TOKEN_BYTES]);
        OsRng.fill_bytes(&mut bytes[..]);
        Self(Zeroizing::new(hex::encode(&bytes[..])))
    }

    /// Wrap a token presented by a client.
    #[must_use]
    pub fn from_presented(raw: &str) -> Self {
        Self(Zeroizing::new(raw.trim().to_owned()))
    }

    /// Token text to hand to the client.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }

    /// Digest stored server-side.
    #[must_use]
    pub fn digest(&self) -> TokenDigest {
        TokenDigest(hex::encode(Sha256::digest(self.0.as_bytes())))
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken(**redacted**)")
    }
}

/// Hex-encoded SHA-256 digest of a bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TokenDigest(String);

impl TokenDigest {
    /// Wrap a stored digest.
    #[must_use]
    pub const fn from_stored(hex: String) -> Self {
        Self(hex)
    }
}

impl AsRef<str> for TokenDigest {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Persisted token record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    pub digest: TokenDigest,
    pub user_id: UserId,
    pub expires_at: DateTime<Utc>,
    pub revoked: bool,
}

impl AuthSession {
    /// True while the token may authenticate requests.
    #[must_use]
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        !self.revoked && now < self.expires_at
    }
}
