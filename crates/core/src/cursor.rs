//! Opaque keyset-pagination cursor for notification listings.
//!
//! A cursor encodes the `(created_at, id)` of the last row on a page as
//! `"{unix_millis}:{id}"`. The next page contains rows strictly older than
//! that pair.

use chrono::DateTime;

use crate::types::{DbId, Timestamp};

/// Encode the position of the last row on a page.
pub fn encode(created_at: Timestamp, id: DbId) -> String {
    format!("{}:{}", created_at.timestamp_millis(), id)
}

/// Decode a cursor produced by [`encode`].
///
/// Returns `None` for anything malformed; callers turn that into a
/// `400 Bad Request`.
pub fn decode(value: &str) -> Option<(Timestamp, DbId)> {
    let (millis, id) = value.split_once(':')?;
    let millis: i64 = millis.trim().parse().ok()?;
    let id: DbId = id.trim().parse().ok()?;
    let created_at = DateTime::from_timestamp_millis(millis)?;
    Some((created_at, id))
}
