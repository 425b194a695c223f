//! Small conversions shared by the Diesel repositories.

use std::str::FromStr;

/// Collect row conversion results, mapping the first error through `map_err`.
pub fn collect_rows<T, E>(
    results: impl Iterator<Item = Result<T, String>>,
    map_err: impl FnOnce(String) -> E,
) -> Result<Vec<T>, E> {
    results.collect::<Result<Vec<_>, _>>().map_err(map_err)
}

/// Parse a stored enum label, naming the column on failure.
pub fn parse_label<T: FromStr>(column: &str, raw: &str) -> Result<T, String> {
    raw.parse()
        .map_err(|_| format!("unrecognised {column} value `{raw}`"))
}

/// Convert a `COUNT(*)` result.
#[expect(
    clippy::cast_sign_loss,
    reason = "row counts are never negative"
)]
pub const fn count(value: i64) -> u64 {
    value as u64
}

/// Clamp a page size for a `LIMIT` clause.
pub fn limit(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
