//! Infrastructure adapters for CloudClip.
//!
//! The in-memory adapters stand in for the hosted document store and
//! identity service; they keep the same observable contract (live queries,
//! server timestamps, owner rules, credential checks) and expose fault
//! injection hooks so the sync engine's retry paths can be exercised.

pub mod identity;
pub mod store;
pub mod time;

pub use identity::InMemoryIdentityService;
pub use store::InMemoryDocumentStore;
pub use time::SystemClock;
