//! System clipboard writers.
//!
//! `NativeClipboardWriter` talks to the OS clipboard through `clipboard-rs`;
//! `ArboardClipboardWriter` goes through `arboard`, which carries its own
//! X11/Wayland/Win32/AppKit backends and is used when the native path fails.

mod fallback;
mod native;

pub use fallback::ArboardClipboardWriter;
pub use native::NativeClipboardWriter;
