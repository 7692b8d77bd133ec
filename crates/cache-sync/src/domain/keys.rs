//! Store key namespacing.
//!
//! Persisted answers live under a fixed literal prefix so instances can
//! scan the shared keyspace without touching unrelated data. The
//! transform is pure string concatenation and invertible.

use crate::CACHE_KEY_PREFIX;

/// Namespace a logical cache key for the shared store.
pub fn prefix_key(key: &str) -> String {
    format!("{CACHE_KEY_PREFIX}{key}")
}

/// Recover the logical key from a scanned store key.
///
/// Keys without the namespace prefix are returned unchanged.
pub fn strip_prefix(key: &str) -> String {
    key.strip_prefix(CACHE_KEY_PREFIX).unwrap_or(key).to_owned()
}
