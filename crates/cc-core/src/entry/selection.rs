use std::collections::BTreeSet;

use crate::ids::EntryId;

/// Entry ids staged for deletion during one open/close cycle of the delete gate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet(BTreeSet<EntryId>);

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or remove `id`; returns whether it is selected afterwards.
    pub fn toggle(&mut self, id: EntryId) -> bool {
        if self.0.remove(&id) {
            false
        } else {
            self.0.insert(id);
            true
        }
    }

    pub fn insert(&mut self, id: EntryId) -> bool {
        self.0.insert(id)
    }

    pub fn contains(&self, id: &EntryId) -> bool {
        self.0.contains(id)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &EntryId> {
        self.0.iter()
    }

    pub fn to_vec(&self) -> Vec<EntryId> {
        self.0.iter().cloned().collect()
    }
}

impl FromIterator<EntryId> for SelectionSet {
    fn from_iter<T: IntoIterator<Item = EntryId>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}
