//! Platform-specific implementations for CloudClip.
//!
//! - `clipboard`: system clipboard writers (native + fallback backend)
//! - `adapters`: notification sink

pub mod adapters;
pub mod clipboard;

pub use adapters::notification::ChannelNotificationSink;
pub use clipboard::{ArboardClipboardWriter, NativeClipboardWriter};
