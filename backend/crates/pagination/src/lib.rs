//! Opaque cursor and pagination envelope primitives.
//!
//! List endpoints page through results newest-first using a keyset cursor.
//! The cursor wraps an arbitrary serialisable key (typically a timestamp and
//! an identifier) encoded as URL-safe base64 JSON so clients treat it as an
//! opaque token.

mod cursor;
mod envelope;

pub use cursor::{Cursor, CursorError};
pub use envelope::{DEFAULT_LIMIT, MAX_LIMIT, PageParams, Paginated, PaginationLinks};
