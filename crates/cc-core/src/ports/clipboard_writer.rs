use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClipboardWriteError {
    #[error("clipboard backend unavailable: {0}")]
    Unavailable(String),

    #[error("clipboard access denied: {0}")]
    PermissionDenied(String),

    #[error("clipboard write failed: {0}")]
    Failed(String),
}

/// One mechanism for putting text on the system clipboard.
pub trait ClipboardWriterPort: Send + Sync {
    /// Short backend name, used in logs.
    fn name(&self) -> &'static str;

    fn write_text(&self, text: &str) -> Result<(), ClipboardWriteError>;
}
