use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use cc_core::ports::{ClipboardWriteError, ClipboardWriterPort};

/// Writes through `arboard`. Like the native writer it keeps its clipboard
/// handle alive after the first write so the selection stays served.
pub struct ArboardClipboardWriter {
    clipboard: Mutex<Option<arboard::Clipboard>>,
}

impl ArboardClipboardWriter {
    pub fn new() -> Self {
        Self {
            clipboard: Mutex::new(None),
        }
    }

    fn clipboard(&self) -> MutexGuard<'_, Option<arboard::Clipboard>> {
        self.clipboard.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ArboardClipboardWriter {
    fn default() -> Self {
        Self::new()
    }
}

fn map_arboard_err(err: arboard::Error) -> ClipboardWriteError {
    match err {
        arboard::Error::ClipboardNotSupported => {
            ClipboardWriteError::Unavailable("clipboard not supported".into())
        }
        arboard::Error::ClipboardOccupied => {
            ClipboardWriteError::PermissionDenied("clipboard occupied".into())
        }
        other => ClipboardWriteError::Failed(other.to_string()),
    }
}

impl ClipboardWriterPort for ArboardClipboardWriter {
    fn name(&self) -> &'static str {
        "arboard"
    }

    fn write_text(&self, text: &str) -> Result<(), ClipboardWriteError> {
        let mut slot = self.clipboard();
        let clipboard = match slot.take() {
            Some(clipboard) => clipboard,
            None => arboard::Clipboard::new().map_err(map_arboard_err)?,
        };
        let clipboard = slot.insert(clipboard);
        if let Err(err) = clipboard.set_text(text) {
            *slot = None;
            warn!(error = %err, "arboard write failed, handle dropped");
            return Err(map_arboard_err(err));
        }
        debug!(len = text.len(), "Wrote text via arboard");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_is_opened_lazily() {
        assert!(ArboardClipboardWriter::new().clipboard().is_none());
    }

    #[test]
    fn unsupported_maps_to_unavailable() {
        assert!(matches!(
            map_arboard_err(arboard::Error::ClipboardNotSupported),
            ClipboardWriteError::Unavailable(_)
        ));
    }

    #[test]
    fn other_errors_map_to_failed() {
        assert!(matches!(
            map_arboard_err(arboard::Error::ContentNotAvailable),
            ClipboardWriteError::Failed(_)
        ));
    }
}
