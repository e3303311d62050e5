use std::sync::Arc;

use tracing::{debug, warn};

use cc_core::ports::ClipboardWriterPort;
use cc_core::ClipError;

/// Which mechanism ended up holding the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyMethod {
    Native,
    Fallback,
}

/// Stateless clipboard writer: native backend first, then one fallback.
pub struct ClipboardBridge {
    primary: Arc<dyn ClipboardWriterPort>,
    fallback: Arc<dyn ClipboardWriterPort>,
}

impl ClipboardBridge {
    pub fn new(primary: Arc<dyn ClipboardWriterPort>, fallback: Arc<dyn ClipboardWriterPort>) -> Self {
        Self { primary, fallback }
    }

    /// Put `text` on the system clipboard. No retries.
    #[tracing::instrument(name = "clipboard_bridge.copy", skip(self, text), fields(len = text.len()))]
    pub fn copy(&self, text: &str) -> Result<CopyMethod, ClipError> {
        let primary_err = match self.primary.write_text(text) {
            Ok(()) => {
                debug!(backend = self.primary.name(), "Copied via native clipboard");
                return Ok(CopyMethod::Native);
            }
            Err(err) => err,
        };
        warn!(
            backend = self.primary.name(),
            error = %primary_err,
            "Native clipboard write failed, trying fallback"
        );

        match self.fallback.write_text(text) {
            Ok(()) => {
                debug!(backend = self.fallback.name(), "Copied via fallback clipboard");
                Ok(CopyMethod::Fallback)
            }
            Err(fallback_err) => {
                warn!(
                    backend = self.fallback.name(),
                    error = %fallback_err,
                    "Fallback clipboard write failed"
                );
                Err(ClipError::Unsupported(format!(
                    "{}: {primary_err}; {}: {fallback_err}",
                    self.primary.name(),
                    self.fallback.name()
                )))
            }
        }
    }
}
