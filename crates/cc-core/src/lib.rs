//! # cc-core
//!
//! Core domain models and business rules for CloudClip.
//!
//! This crate contains pure business logic without any infrastructure dependencies.
//! Everything that talks to the outside world (document store, identity service,
//! platform clipboard, notifications) is expressed as a port trait in [`ports`].

pub mod config;
pub mod crypto;
pub mod entry;
pub mod error;
pub mod gate;
pub mod identity;
pub mod ids;
pub mod notification;
pub mod ports;
pub mod subscription;

// Re-export commonly used types at the crate root
pub use config::AppConfig;
pub use entry::{Entry, LocalView, NewEntry, SelectionSet, ServerTimestamp, ViewHealth};
pub use error::{BatchDeleteReport, ClipError, CredentialError, ErrorKind, ValidationError};
pub use identity::{Email, Identity};
pub use ids::{EntryId, UserId};
pub use notification::{Notification, NotificationLevel};
pub use subscription::{Generation, SubscriptionState};
