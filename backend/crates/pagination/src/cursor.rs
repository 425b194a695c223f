//! Opaque keyset cursors.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Errors raised while decoding a client-supplied cursor.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CursorError {
    /// The cursor is not valid base64.
    #[error("cursor is not valid base64: {message}")]
    Encoding { message: String },
    /// The decoded cursor does not match the expected key shape.
    #[error("cursor payload is malformed: {message}")]
    Payload { message: String },
}

/// Opaque cursor wrapping a keyset position.
///
/// # Examples
/// ```
/// use pagination::Cursor;
///
/// let cursor = Cursor::new((42_i64, "abc".to_owned()));
/// let token = cursor.encode().expect("encodes");
/// let decoded: Cursor<(i64, String)> = Cursor::decode(&token).expect("decodes");
/// assert_eq!(decoded.key(), &(42, "abc".to_owned()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor<K> {
    key: K,
}

impl<K> Cursor<K> {
    /// Wrap a key in a cursor.
    pub const fn new(key: K) -> Self {
        Self { key }
    }

    /// Borrow the wrapped key.
    pub const fn key(&self) -> &K {
        &self.key
    }

    /// Consume the cursor and return the key.
    pub fn into_key(self) -> K {
        self.key
    }
}

impl<K: Serialize> Cursor<K> {
    /// Encode the cursor as an opaque URL-safe token.
    ///
    /// # Errors
    /// Returns [`CursorError::Payload`] when the key cannot be serialised.
    pub fn encode(&self) -> Result<String, CursorError> {
        let json = serde_json::to_vec(&self.key).map_err(|err| CursorError::Payload {
            message: err.to_string(),
        })?;
        Ok(URL_SAFE_NO_PAD.encode(json))
    }
}

impl<K: DeserializeOwned> Cursor<K> {
    /// Decode an opaque token produced by [`Cursor::encode`].
    ///
    /// # Errors
    /// Returns [`CursorError`] when the token is not base64 or does not hold
    /// a key of the expected shape.
    pub fn decode(token: &str) -> Result<Self, CursorError> {
        let bytes = URL_SAFE_NO_PAD
            .decode(token.trim())
            .map_err(|err| CursorError::Encoding {
                message: err.to_string(),
            })?;
        let key = serde_json::from_slice(&bytes).map_err(|err| CursorError::Payload {
            message: err.to_string(),
        })?;
        Ok(Self { key })
    }
}
