use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{info, warn};

use cc_core::crypto::{PasswordHashError, PasswordHasher};
use cc_core::ports::{IdentityServiceError, IdentityServicePort};
use cc_core::{CredentialError, Email, Identity, UserId};

struct Account {
    identity: Identity,
    password_hash: Vec<u8>,
}

/// In-process identity service storing Argon2id password hashes.
///
/// 内存版身份服务。
pub struct InMemoryIdentityService {
    hasher: PasswordHasher,
    accounts: RwLock<HashMap<Email, Account>>,
    offline: AtomicBool,
}

impl InMemoryIdentityService {
    pub fn new(hasher: PasswordHasher) -> Self {
        Self {
            hasher,
            accounts: RwLock::new(HashMap::new()),
            offline: AtomicBool::new(false),
        }
    }

    /// Simulate the service being unreachable.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub async fn account_count(&self) -> usize {
        self.accounts.read().await.len()
    }

    fn ensure_online(&self) -> Result<(), IdentityServiceError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(IdentityServiceError::Transport(
                "identity service offline".into(),
            ));
        }
        Ok(())
    }

    fn check(&self, password: &str, hash: &[u8]) -> Result<bool, IdentityServiceError> {
        self.hasher
            .verify(password, hash)
            .map_err(|e: PasswordHashError| IdentityServiceError::Transport(e.to_string()))
    }
}

#[async_trait]
impl IdentityServicePort for InMemoryIdentityService {
    async fn create_account(
        &self,
        email: &Email,
        password: &str,
    ) -> Result<Identity, IdentityServiceError> {
        self.ensure_online()?;
        if self.accounts.read().await.contains_key(email) {
            return Err(CredentialError::EmailInUse(email.to_string()).into());
        }

        let password_hash = self
            .hasher
            .hash(password)
            .map_err(|e| IdentityServiceError::Transport(e.to_string()))?;

        let mut accounts = self.accounts.write().await;
        // Re-check under the write lock; another sign-up may have won.
        if accounts.contains_key(email) {
            return Err(CredentialError::EmailInUse(email.to_string()).into());
        }
        let identity = Identity::new(UserId::new(), email.clone());
        accounts.insert(
            email.clone(),
            Account {
                identity: identity.clone(),
                password_hash,
            },
        );
        info!(user_id = %identity.id, "Created account");
        Ok(identity)
    }

    async fn verify_credentials(
        &self,
        email: &Email,
        password: &str,
    ) -> Result<Identity, IdentityServiceError> {
        self.ensure_online()?;
        let accounts = self.accounts.read().await;
        let account = accounts
            .get(email)
            .ok_or(IdentityServiceError::InvalidCredentials)?;
        if !self.check(password, &account.password_hash)? {
            warn!(user_id = %account.identity.id, "Rejected sign-in");
            return Err(IdentityServiceError::InvalidCredentials);
        }
        Ok(account.identity.clone())
    }

    async fn verify_password(
        &self,
        user: &UserId,
        password: &str,
    ) -> Result<(), IdentityServiceError> {
        self.ensure_online()?;
        let accounts = self.accounts.read().await;
        let account = accounts
            .values()
            .find(|account| &account.identity.id == user)
            .ok_or_else(|| IdentityServiceError::UnknownUser(user.clone()))?;
        if !self.check(password, &account.password_hash)? {
            return Err(IdentityServiceError::InvalidCredentials);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> InMemoryIdentityService {
        InMemoryIdentityService::new(PasswordHasher::with_cost(1024, 1, 1).unwrap())
    }

    fn email(raw: &str) -> Email {
        Email::parse(raw).unwrap()
    }

    #[tokio::test]
    async fn create_then_verify_credentials() {
        let service = service();
        let created = service
            .create_account(&email("a@x.io"), "secret1")
            .await
            .unwrap();
        let verified = service
            .verify_credentials(&email("a@x.io"), "secret1")
            .await
            .unwrap();
        assert_eq!(created, verified);
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let service = service();
        service.create_account(&email("a@x.io"), "secret1").await.unwrap();
        let err = service
            .create_account(&email("a@x.io"), "another1")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            IdentityServiceError::Credential(CredentialError::EmailInUse(_))
        ));
        assert_eq!(service.account_count().await, 1);
    }

    #[tokio::test]
    async fn unknown_email_and_wrong_password_look_the_same() {
        let service = service();
        service.create_account(&email("a@x.io"), "secret1").await.unwrap();
        assert_eq!(
            service.verify_credentials(&email("b@x.io"), "secret1").await,
            Err(IdentityServiceError::InvalidCredentials)
        );
        assert_eq!(
            service.verify_credentials(&email("a@x.io"), "wrong").await,
            Err(IdentityServiceError::InvalidCredentials)
        );
    }

    #[tokio::test]
    async fn verify_password_checks_the_given_user() {
        let service = service();
        let identity = service
            .create_account(&email("a@x.io"), "secret1")
            .await
            .unwrap();
        assert!(service.verify_password(&identity.id, "secret1").await.is_ok());
        assert_eq!(
            service.verify_password(&identity.id, "nope").await,
            Err(IdentityServiceError::InvalidCredentials)
        );
        let stranger = UserId::from("stranger");
        assert_eq!(
            service.verify_password(&stranger, "secret1").await,
            Err(IdentityServiceError::UnknownUser(stranger))
        );
    }

    #[tokio::test]
    async fn offline_service_reports_transport_errors() {
        let service = service();
        service.set_offline(true);
        assert!(matches!(
            service.create_account(&email("a@x.io"), "secret1").await,
            Err(IdentityServiceError::Transport(_))
        ));
    }
}
