use serde::{Deserialize, Serialize};

use crate::entry::Entry;
use crate::ids::{EntryId, UserId};
use crate::subscription::Generation;

/// Whether the live subscription behind a view is keeping up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ViewHealth {
    #[default]
    Live,
    /// Transport retries went past the configured ceiling; the entries shown
    /// are the last snapshot that arrived.
    Degraded { consecutive_failures: u32 },
}

/// Client-materialized, ordered cache of the current identity's entries.
///
/// Only the active subscription replaces it; user actions never touch it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalView {
    pub generation: Generation,
    pub owner: Option<UserId>,
    pub entries: Vec<Entry>,
    pub health: ViewHealth,
}

impl LocalView {
    /// The view shown when nobody is signed in.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &EntryId) -> bool {
        self.entries.iter().any(|entry| &entry.id == id)
    }

    pub fn get(&self, id: &EntryId) -> Option<&Entry> {
        self.entries.iter().find(|entry| &entry.id == id)
    }

    pub fn texts(&self) -> Vec<&str> {
        self.entries.iter().map(|entry| entry.text.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
