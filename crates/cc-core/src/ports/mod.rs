//! Port interfaces for the application layer
//!
//! Ports define the contract between the application logic and the
//! infrastructure/platform implementations (hexagonal architecture), so the
//! sync engine never depends on a concrete document store, identity service
//! or clipboard backend.

mod clipboard_writer;
mod clock;
pub mod document_store;
pub mod identity_service;
mod notification;

pub use clipboard_writer::{ClipboardWriteError, ClipboardWriterPort};
pub use clock::ClockPort;
pub use document_store::{DocumentStorePort, SnapshotResult, SnapshotStream, StoreError};
pub use identity_service::{IdentityServiceError, IdentityServicePort};
pub use notification::NotificationPort;
