//! Error taxonomy shared by every CloudClip component.
//!
//! Port adapters have their own narrow error enums (see [`crate::ports`]);
//! the application layer maps them into [`ClipError`] before surfacing.

use thiserror::Error;

use crate::ids::EntryId;

/// Bad local input. Never reaches a remote collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("entry text is empty")]
    EmptyText,

    #[error("entry text is {len} characters long (max {max})")]
    TextTooLong { len: usize, max: usize },

    #[error("no signed-in identity")]
    MissingIdentity,

    #[error("nothing is selected for deletion")]
    EmptySelection,

    #[error("no deletion is awaiting confirmation")]
    NoPendingDelete,
}

/// Rejected sign-up credentials.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialError {
    #[error("malformed email address: {0:?}")]
    MalformedEmail(String),

    #[error("password must be at least {min_len} characters")]
    WeakPassword { min_len: usize },

    #[error("email already registered: {0}")]
    EmailInUse(String),
}

/// Coarse error category, used by callers that only need to branch on the kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    Authentication,
    Credential,
    NotFound,
    Transport,
    Unsupported,
    Busy,
    NoSession,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClipError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("invalid credentials")]
    Authentication,

    #[error(transparent)]
    Credential(#[from] CredentialError),

    #[error("entry not found: {0}")]
    NotFound(EntryId),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("clipboard unsupported: {0}")]
    Unsupported(String),

    #[error("another operation is already in progress")]
    Busy,

    #[error("no active session")]
    NoSession,

    #[error("{}", .0.summary())]
    BatchDelete(BatchDeleteReport),
}

impl ClipError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClipError::Validation(_) => ErrorKind::Validation,
            ClipError::Authentication => ErrorKind::Authentication,
            ClipError::Credential(_) => ErrorKind::Credential,
            ClipError::NotFound(_) => ErrorKind::NotFound,
            ClipError::Transport(_) => ErrorKind::Transport,
            ClipError::Unsupported(_) => ErrorKind::Unsupported,
            ClipError::Busy => ErrorKind::Busy,
            ClipError::NoSession => ErrorKind::NoSession,
            ClipError::BatchDelete(report) => report.kind(),
        }
    }
}

/// Per-item outcome of a batch delete.
///
/// Deletions are issued independently; entries listed in `deleted` stay
/// deleted even when `failed` is non-empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchDeleteReport {
    pub deleted: Vec<EntryId>,
    pub failed: Vec<(EntryId, ClipError)>,
}

impl BatchDeleteReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    /// `NotFound` when every failure is a not-found, otherwise `Transport`.
    pub fn kind(&self) -> ErrorKind {
        if !self.failed.is_empty()
            && self
                .failed
                .iter()
                .all(|(_, err)| err.kind() == ErrorKind::NotFound)
        {
            ErrorKind::NotFound
        } else {
            ErrorKind::Transport
        }
    }

    pub fn summary(&self) -> String {
        match self.failed.first() {
            None => format!("deleted {} entries", self.deleted.len()),
            Some((id, err)) => format!(
                "deleted {} of {} entries; {} failed (first: {id}: {err})",
                self.deleted.len(),
                self.deleted.len() + self.failed.len(),
                self.failed.len(),
            ),
        }
    }
}
