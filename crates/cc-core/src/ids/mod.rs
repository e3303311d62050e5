//! ID type wrappers for type safety.

mod id_macro;

use serde::{Deserialize, Serialize};

use id_macro::impl_id;

/// Stable identifier of an authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UserId(String);

/// Opaque identifier of a stored clipboard entry, assigned by the document store.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntryId(String);

impl_id!(UserId, EntryId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_ids_are_unique() {
        assert_ne!(EntryId::new(), EntryId::new());
        assert_ne!(UserId::new(), UserId::new());
    }

    #[test]
    fn entry_id_from_str() {
        let id: EntryId = "entry-1".into();
        assert_eq!(id.as_str(), "entry-1");
        assert_eq!(id.to_string(), "entry-1");
    }

    #[test]
    fn ids_order_lexicographically() {
        let a = EntryId::from("a");
        let b = EntryId::from("b");
        assert!(a < b);
    }
}
