use async_trait::async_trait;
use thiserror::Error;

use crate::error::CredentialError;
use crate::identity::{Email, Identity};
use crate::ids::UserId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityServiceError {
    #[error(transparent)]
    Credential(#[from] CredentialError),

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("unknown user: {0}")]
    UnknownUser(UserId),

    #[error("identity service unreachable: {0}")]
    Transport(String),
}

/// Remote identity service: account creation and credential verification.
#[async_trait]
pub trait IdentityServicePort: Send + Sync {
    /// Register a new account. Fails with `Credential(EmailInUse)` for a
    /// registered email.
    async fn create_account(
        &self,
        email: &Email,
        password: &str,
    ) -> Result<Identity, IdentityServiceError>;

    /// Check an email/password pair and return the matching identity.
    async fn verify_credentials(
        &self,
        email: &Email,
        password: &str,
    ) -> Result<Identity, IdentityServiceError>;

    /// Re-verify the password of an existing account without touching any
    /// session state.
    async fn verify_password(&self, user: &UserId, password: &str)
        -> Result<(), IdentityServiceError>;
}
