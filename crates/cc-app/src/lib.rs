//! CloudClip application layer.
//!
//! Wires the domain rules from `cc-core` to the ports:
//!
//! ```text
//! SessionProvider ──identity transitions──▶ EntryStore ──LocalView──▶ renderer
//!        ▲                                     ▲
//!        └──── reauthenticate ── SecureDeleteGate ── delete_many
//! ```
//!
//! [`CloudClipboard`] groups the components and reports every user-facing
//! outcome through the notification port.

pub mod app;
pub mod clipboard_bridge;
pub mod delete_gate;
pub mod deps;
pub mod entry_store;
mod errors;
pub mod policy;
pub mod session;

pub use app::CloudClipboard;
pub use clipboard_bridge::{ClipboardBridge, CopyMethod};
pub use delete_gate::SecureDeleteGate;
pub use deps::AppDeps;
pub use entry_store::EntryStore;
pub use policy::{EntryPolicy, PasswordPolicy, SubscriptionPolicy};
pub use session::{ListenerHandle, SessionProvider};
