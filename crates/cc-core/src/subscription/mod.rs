//! Live subscription lifecycle.
//!
//! ```text
//! Unsubscribed -> Subscribing -> Active -> Unsubscribed
//!                      ^           |
//!                      |           v
//!                      +------- Error  (retry with backoff, never terminal)
//! ```

use serde::{Deserialize, Serialize};

use crate::ids::UserId;

/// Monotonically increasing tag distinguishing successive subscriptions.
///
/// Snapshots carry the generation of the subscription that produced them and
/// are discarded unless it is still the current one.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Generation(u64);

impl Generation {
    /// Tag of the empty, unsubscribed view.
    pub const NONE: Generation = Generation(0);

    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for Generation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "gen-{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubscriptionState {
    Unsubscribed,
    Subscribing {
        generation: Generation,
        owner: UserId,
    },
    Active {
        generation: Generation,
        owner: UserId,
    },
    Error {
        generation: Generation,
        owner: UserId,
        /// Consecutive failures since the last delivered snapshot.
        attempt: u32,
        reason: String,
    },
}

impl SubscriptionState {
    pub fn generation(&self) -> Generation {
        match self {
            SubscriptionState::Unsubscribed => Generation::NONE,
            SubscriptionState::Subscribing { generation, .. }
            | SubscriptionState::Active { generation, .. }
            | SubscriptionState::Error { generation, .. } => *generation,
        }
    }

    pub fn owner(&self) -> Option<&UserId> {
        match self {
            SubscriptionState::Unsubscribed => None,
            SubscriptionState::Subscribing { owner, .. }
            | SubscriptionState::Active { owner, .. }
            | SubscriptionState::Error { owner, .. } => Some(owner),
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, SubscriptionState::Active { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generations_increase() {
        let first = Generation::NONE.next();
        assert!(first > Generation::NONE);
        assert_eq!(first.next().value(), 2);
    }

    #[test]
    fn unsubscribed_has_no_owner() {
        assert_eq!(SubscriptionState::Unsubscribed.owner(), None);
        assert_eq!(SubscriptionState::Unsubscribed.generation(), Generation::NONE);
    }
}
