//! Authenticated user principal.
//!
//! An [`Identity`] is owned by the session provider; every other component
//! only ever reads it.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::CredentialError;
use crate::ids::UserId;

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is a valid regex")
});

/// Normalized email address used as the sign-in credential.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Email(String);

impl Email {
    /// Parse and normalize an email address (trimmed, lower-cased).
    pub fn parse(raw: &str) -> Result<Self, CredentialError> {
        let normalized = raw.trim().to_lowercase();
        if !EMAIL_PATTERN.is_match(&normalized) {
            return Err(CredentialError::MalformedEmail(raw.trim().to_string()));
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Email {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The signed-in user: a stable id plus the email it signed in with.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    pub id: UserId,
    pub email: Email,
}

impl Identity {
    pub fn new(id: UserId, email: Email) -> Self {
        Self { id, email }
    }

    /// Two identities denote the same principal when their ids match.
    pub fn same_principal(&self, other: &Identity) -> bool {
        self.id == other.id
    }
}
