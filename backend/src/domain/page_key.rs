//! Keyset position used by newest-first paginated listings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Position of the last item on a page: its creation time and id.
///
/// Items strictly older than the key (ties broken by id, descending) belong
/// to the next page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageKey {
    pub created_at: DateTime<Utc>,
    pub id: Uuid,
}

impl PageKey {
    #[must_use]
    pub const fn new(created_at: DateTime<Utc>, id: Uuid) -> Self {
        Self { created_at, id }
    }

    /// True when an item with this position sorts after the key.
    #[must_use]
    pub fn precedes(&self, created_at: DateTime<Utc>, id: Uuid) -> bool {
        (created_at, id) < (self.created_at, self.id)
    }
}
