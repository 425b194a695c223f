//! Page request parameters and response envelopes.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::cursor::{Cursor, CursorError};

/// Page size used when the client does not request one.
pub const DEFAULT_LIMIT: usize = 50;
/// Largest page size a client may request.
pub const MAX_LIMIT: usize = 100;

/// Client-supplied page parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageParams {
    /// Opaque cursor returned by a previous page.
    pub cursor: Option<String>,
    /// Requested page size.
    pub limit: Option<usize>,
}

impl PageParams {
    /// Effective page size clamped to `1..=MAX_LIMIT`.
    ///
    /// # Examples
    /// ```
    /// use pagination::{MAX_LIMIT, PageParams};
    ///
    /// let params = PageParams { cursor: None, limit: Some(500) };
    /// assert_eq!(params.limit(), MAX_LIMIT);
    /// ```
    #[must_use]
    pub fn limit(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }

    /// Decode the cursor, if present.
    ///
    /// # Errors
    /// Returns [`CursorError`] when the supplied token is malformed.
    pub fn decode_cursor<K>(&self) -> Result<Option<Cursor<K>>, CursorError>
    where
        K: serde::de::DeserializeOwned,
    {
        self.cursor.as_deref().map(Cursor::decode).transpose()
    }
}

/// Hypermedia links accompanying a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationLinks {
    /// Link to the current page.
    #[serde(rename = "self")]
    pub self_: String,
    /// Link to the next page, when one exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
}

impl PaginationLinks {
    /// Build links from the request URL, replacing the `cursor` and `limit`
    /// query parameters for the next page.
    #[must_use]
    pub fn from_request(request_url: &Url, limit: usize, next_cursor: Option<&str>) -> Self {
        let next = next_cursor.map(|cursor| {
            let mut next = request_url.clone();
            let retained: Vec<(String, String)> = request_url
                .query_pairs()
                .filter(|(name, _)| name != "cursor" && name != "limit")
                .map(|(name, value)| (name.into_owned(), value.into_owned()))
                .collect();
            {
                let mut pairs = next.query_pairs_mut();
                pairs.clear();
                for (name, value) in &retained {
                    pairs.append_pair(name, value);
                }
                pairs.append_pair("cursor", cursor);
                pairs.append_pair("limit", &limit.to_string());
            }
            next.to_string()
        });
        Self {
            self_: request_url.to_string(),
            next,
        }
    }
}

/// Page of results with an optional continuation cursor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paginated<T> {
    /// Items on this page.
    pub data: Vec<T>,
    /// Effective page size.
    pub limit: usize,
    /// Cursor for the next page, absent on the last page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

impl<T> Paginated<T> {
    /// Build a page from `limit + 1` over-fetched items.
    ///
    /// When more than `limit` items are supplied the surplus is dropped and a
    /// cursor pointing at the last retained item is produced via `key_of`.
    ///
    /// # Errors
    /// Returns [`CursorError`] when the key cannot be encoded.
    ///
    /// # Examples
    /// ```
    /// use pagination::Paginated;
    ///
    /// let page = Paginated::from_overfetched(vec![5, 4, 3], 2, |item| *item)
    ///     .expect("page builds");
    /// assert_eq!(page.data, vec![5, 4]);
    /// assert!(page.next_cursor.is_some());
    /// ```
    pub fn from_overfetched<K, F>(
        mut items: Vec<T>,
        limit: usize,
        key_of: F,
    ) -> Result<Self, CursorError>
    where
        K: Serialize,
        F: Fn(&T) -> K,
    {
        let has_more = items.len() > limit;
        items.truncate(limit);
        let next_cursor = match (has_more, items.last()) {
            (true, Some(last)) => Some(Cursor::new(key_of(last)).encode()?),
            _ => None,
        };
        Ok(Self {
            data: items,
            limit,
            next_cursor,
        })
    }

    /// Transform the items while keeping the paging metadata.
    pub fn map<U, F>(self, f: F) -> Paginated<U>
    where
        F: FnMut(T) -> U,
    {
        Paginated {
            data: self.data.into_iter().map(f).collect(),
            limit: self.limit,
            next_cursor: self.next_cursor,
        }
    }
}
