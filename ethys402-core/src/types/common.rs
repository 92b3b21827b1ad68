//! Miscellaneous common types used throughout the ETHYS codebase.

use std::time::{SystemTime, UNIX_EPOCH};

/// Represents a key-value mapping on the wire. The key is a `String`.
pub type Record<V> = std::collections::HashMap<String, V>;

/// Represents any JSON value. Used for serializing/deserializing arbitrary JSON data.
pub type AnyJson = serde_json::Value;

/// Current wall-clock time in unix seconds.
///
/// A clock set before the epoch reads as `0` rather than failing; the server
/// rejects stale timestamps anyway.
pub fn unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}
