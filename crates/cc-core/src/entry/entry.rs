use std::cmp::Ordering;
use std::collections::HashSet;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{EntryId, UserId};

/// Server-assigned creation time, Unix epoch milliseconds (UTC).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ServerTimestamp(i64);

impl ServerTimestamp {
    pub fn from_epoch_millis(ms: i64) -> Self {
        Self(ms)
    }

    pub fn as_millis(&self) -> i64 {
        self.0
    }

    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.0).single()
    }
}

/// One stored text snippet. Entries are never edited in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub id: EntryId,
    pub owner_id: UserId,
    pub text: String,
    pub created_at: ServerTimestamp,
}

/// A record proposed to the document store; id and timestamp are assigned remotely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEntry {
    pub owner_id: UserId,
    pub text: String,
}

impl Entry {
    /// Local view order: newest first, ties broken by ascending id.
    pub fn view_order(a: &Entry, b: &Entry) -> Ordering {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| a.id.cmp(&b.id))
    }
}

/// Sort into view order and drop repeated ids (first occurrence wins).
pub fn sort_for_view(mut entries: Vec<Entry>) -> Vec<Entry> {
    let mut seen = HashSet::with_capacity(entries.len());
    entries.retain(|entry| seen.insert(entry.id.clone()));
    entries.sort_by(Entry::view_order);
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, ts: i64) -> Entry {
        Entry {
            id: EntryId::from(id),
            owner_id: UserId::from("u1"),
            text: format!("text {id}"),
            created_at: ServerTimestamp::from_epoch_millis(ts),
        }
    }

    #[test]
    fn sorts_newest_first() {
        let sorted = sort_for_view(vec![entry("a", 1), entry("b", 3), entry("c", 2)]);
        let ids: Vec<_> = sorted.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["b", "c", "a"]);
    }

    #[test]
    fn equal_timestamps_fall_back_to_id() {
        let sorted = sort_for_view(vec![entry("z", 5), entry("m", 5), entry("a", 5)]);
        let ids: Vec<_> = sorted.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["a", "m", "z"]);
    }

    #[test]
    fn duplicate_ids_are_dropped() {
        let sorted = sort_for_view(vec![entry("a", 1), entry("a", 1), entry("b", 2)]);
        assert_eq!(sorted.len(), 2);
    }

    #[test]
    fn timestamp_converts_to_datetime() {
        let ts = ServerTimestamp::from_epoch_millis(1_700_000_000_000);
        assert_eq!(ts.to_datetime().unwrap().timestamp(), 1_700_000_000);
    }
}
