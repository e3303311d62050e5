use std::sync::{Mutex, MutexGuard, PoisonError};

use clipboard_rs::{Clipboard, ClipboardContext};
use tracing::{debug, warn};

use cc_core::ports::{ClipboardWriteError, ClipboardWriterPort};

/// Writes through `clipboard-rs`.
///
/// The context is opened on the first write and then kept for the writer's
/// lifetime: on X11/Wayland the owning context has to stay alive to serve
/// the selection to other applications.
/// 剪贴板上下文在首次写入时创建并长期持有。
pub struct NativeClipboardWriter {
    context: Mutex<Option<ClipboardContext>>,
}

impl NativeClipboardWriter {
    pub fn new() -> Self {
        Self {
            context: Mutex::new(None),
        }
    }

    fn context(&self) -> MutexGuard<'_, Option<ClipboardContext>> {
        self.context.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for NativeClipboardWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl ClipboardWriterPort for NativeClipboardWriter {
    fn name(&self) -> &'static str {
        "clipboard-rs"
    }

    fn write_text(&self, text: &str) -> Result<(), ClipboardWriteError> {
        let mut slot = self.context();
        let ctx = match slot.take() {
            Some(ctx) => ctx,
            None => ClipboardContext::new()
                .map_err(|e| ClipboardWriteError::Unavailable(e.to_string()))?,
        };
        let ctx = slot.insert(ctx);
        if let Err(e) = ctx.set_text(text.to_string()) {
            // Reopen on the next write.
            *slot = None;
            warn!(error = %e, "clipboard-rs write failed, context dropped");
            return Err(ClipboardWriteError::Failed(e.to_string()));
        }
        debug!(len = text.len(), "Wrote text via clipboard-rs");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_context_is_opened_before_the_first_write() {
        let writer = NativeClipboardWriter::new();
        assert!(writer.context().is_none());
    }
}
