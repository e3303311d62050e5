//! Session provider: the single authority over the signed-in identity.
//!
//! 会话提供者：当前登录身份的唯一权威来源。

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tracing::{info, warn};

use cc_core::ports::IdentityServicePort;
use cc_core::{ClipError, Email, Identity};

use crate::errors::from_identity_error;
use crate::policy::PasswordPolicy;

/// Callback invoked with the new identity (or `None`) on every transition.
pub type IdentityListener = Arc<dyn Fn(Option<&Identity>) + Send + Sync>;

/// Registration returned by [`SessionProvider::on_identity_change`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerHandle(u64);

pub struct SessionProvider {
    identity_service: Arc<dyn IdentityServicePort>,
    password_policy: PasswordPolicy,
    current: watch::Sender<Option<Identity>>,
    listeners: Mutex<Vec<(ListenerHandle, IdentityListener)>>,
    next_listener: AtomicU64,
}

impl SessionProvider {
    pub fn new(identity_service: Arc<dyn IdentityServicePort>, password_policy: PasswordPolicy) -> Self {
        let (current, _) = watch::channel(None);
        Self {
            identity_service,
            password_policy,
            current,
            listeners: Mutex::new(Vec::new()),
            next_listener: AtomicU64::new(1),
        }
    }

    fn listeners(&self) -> MutexGuard<'_, Vec<(ListenerHandle, IdentityListener)>> {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn current_identity(&self) -> Option<Identity> {
        self.current.borrow().clone()
    }

    /// Async view of the identity for task-based consumers.
    pub fn watch_identity(&self) -> watch::Receiver<Option<Identity>> {
        self.current.subscribe()
    }

    /// Register `callback`; it fires once right away with the current identity,
    /// then on every transition until [`remove_listener`](Self::remove_listener).
    pub fn on_identity_change<F>(&self, callback: F) -> ListenerHandle
    where
        F: Fn(Option<&Identity>) + Send + Sync + 'static,
    {
        let handle = ListenerHandle(self.next_listener.fetch_add(1, Ordering::Relaxed));
        let listener: IdentityListener = Arc::new(callback);
        let current = self.current_identity();
        listener(current.as_ref());
        self.listeners().push((handle, listener));
        handle
    }

    /// Returns whether the handle was still registered.
    pub fn remove_listener(&self, handle: ListenerHandle) -> bool {
        let mut listeners = self.listeners();
        let before = listeners.len();
        listeners.retain(|(h, _)| *h != handle);
        listeners.len() != before
    }

    /// Create an account and sign it in.
    #[tracing::instrument(name = "session.sign_up", skip(self, password))]
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<Identity, ClipError> {
        let email = Email::parse(email)?;
        self.password_policy.check(password)?;
        let identity = self
            .identity_service
            .create_account(&email, password)
            .await
            .map_err(from_identity_error)?;
        info!(user_id = %identity.id, "Signed up");
        self.transition(Some(identity.clone()));
        Ok(identity)
    }

    #[tracing::instrument(name = "session.sign_in", skip(self, password))]
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, ClipError> {
        // A malformed address cannot belong to any account.
        let email = Email::parse(email).map_err(|_| ClipError::Authentication)?;
        let identity = self
            .identity_service
            .verify_credentials(&email, password)
            .await
            .map_err(from_identity_error)?;
        info!(user_id = %identity.id, "Signed in");
        self.transition(Some(identity.clone()));
        Ok(identity)
    }

    /// Always succeeds locally.
    pub fn sign_out(&self) {
        if let Some(identity) = self.current_identity() {
            info!(user_id = %identity.id, "Signed out");
        }
        self.transition(None);
    }

    /// Verify `password` against the signed-in identity. Session state is untouched.
    #[tracing::instrument(name = "session.reauthenticate", skip(self, password))]
    pub async fn reauthenticate(&self, password: &str) -> Result<(), ClipError> {
        let identity = self.current_identity().ok_or(ClipError::NoSession)?;
        self.identity_service
            .verify_password(&identity.id, password)
            .await
            .map_err(|err| {
                warn!(user_id = %identity.id, error = %err, "Re-authentication failed");
                from_identity_error(err)
            })
    }

    fn transition(&self, next: Option<Identity>) {
        let changed = self.current.send_if_modified(|current| {
            let same = match (current.as_ref(), next.as_ref()) {
                (None, None) => true,
                (Some(a), Some(b)) => a.same_principal(b),
                _ => false,
            };
            if !same {
                *current = next.clone();
            }
            !same
        });
        if !changed {
            return;
        }

        // Run callbacks outside the lock so they may call back into the provider.
        let listeners: Vec<IdentityListener> =
            self.listeners().iter().map(|(_, l)| Arc::clone(l)).collect();
        for listener in listeners {
            listener(next.as_ref());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use cc_core::ports::IdentityServiceError;
    use cc_core::{CredentialError, ErrorKind, UserId};

    mockall::mock! {
        pub IdentityService {}

        #[async_trait]
        impl IdentityServicePort for IdentityService {
            async fn create_account(&self, email: &Email, password: &str) -> Result<Identity, IdentityServiceError>;
            async fn verify_credentials(&self, email: &Email, password: &str) -> Result<Identity, IdentityServiceError>;
            async fn verify_password(&self, user: &UserId, password: &str) -> Result<(), IdentityServiceError>;
        }
    }

    fn identity(id: &str, email: &str) -> Identity {
        Identity::new(UserId::from(id), Email::parse(email).unwrap())
    }

    fn provider(service: MockIdentityService) -> SessionProvider {
        SessionProvider::new(Arc::new(service), PasswordPolicy::default())
    }

    fn recorder(provider: &SessionProvider) -> Arc<Mutex<Vec<Option<UserId>>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        provider.on_identity_change(move |identity| {
            sink.lock().unwrap().push(identity.map(|i| i.id.clone()));
        });
        seen
    }

    #[tokio::test]
    async fn listener_fires_immediately_with_current_identity() {
        let provider = provider(MockIdentityService::new());
        let seen = recorder(&provider);
        assert_eq!(*seen.lock().unwrap(), vec![None]);
    }

    #[tokio::test]
    async fn sign_up_signs_in_and_notifies() {
        let mut service = MockIdentityService::new();
        service
            .expect_create_account()
            .withf(|email, password| email.as_str() == "u1@example.com" && password == "secret1")
            .times(1)
            .returning(|_, _| Ok(identity("u1", "u1@example.com")));
        let provider = provider(service);
        let seen = recorder(&provider);

        let created = provider.sign_up("U1@example.com", "secret1").await.unwrap();
        assert_eq!(created.id, UserId::from("u1"));
        assert_eq!(provider.current_identity(), Some(created));
        assert_eq!(*seen.lock().unwrap(), vec![None, Some(UserId::from("u1"))]);
    }

    #[tokio::test]
    async fn sign_up_validates_before_calling_the_service() {
        let mut service = MockIdentityService::new();
        service.expect_create_account().never();
        let provider = provider(service);

        let err = provider.sign_up("not-an-email", "secret1").await.unwrap_err();
        assert!(matches!(err, ClipError::Credential(CredentialError::MalformedEmail(_))));

        let err = provider.sign_up("a@x.io", "123").await.unwrap_err();
        assert_eq!(
            err,
            ClipError::Credential(CredentialError::WeakPassword { min_len: 6 })
        );
        assert_eq!(provider.current_identity(), None);
    }

    #[tokio::test]
    async fn duplicate_sign_up_is_a_credential_error() {
        let mut service = MockIdentityService::new();
        service.expect_create_account().returning(|email, _| {
            Err(CredentialError::EmailInUse(email.to_string()).into())
        });
        let provider = provider(service);
        let err = provider.sign_up("a@x.io", "secret1").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Credential);
    }

    #[tokio::test]
    async fn wrong_credentials_leave_session_unchanged() {
        let mut service = MockIdentityService::new();
        service
            .expect_verify_credentials()
            .returning(|_, _| Err(IdentityServiceError::InvalidCredentials));
        let provider = provider(service);
        let seen = recorder(&provider);

        let err = provider.sign_in("a@x.io", "wrong").await.unwrap_err();
        assert_eq!(err, ClipError::Authentication);
        let err = provider.sign_in("garbage", "wrong").await.unwrap_err();
        assert_eq!(err, ClipError::Authentication);
        assert_eq!(*seen.lock().unwrap(), vec![None]);
    }

    #[tokio::test]
    async fn switching_identity_notifies_each_transition_once() {
        let mut service = MockIdentityService::new();
        service.expect_verify_credentials().returning(|email, _| {
            let id = email.as_str().split('@').next().unwrap().to_string();
            Ok(Identity::new(UserId::from(id), email.clone()))
        });
        let provider = provider(service);
        let seen = recorder(&provider);

        provider.sign_in("a@x.io", "pw").await.unwrap();
        provider.sign_in("a@x.io", "pw").await.unwrap();
        provider.sign_in("b@x.io", "pw").await.unwrap();
        provider.sign_out();
        provider.sign_out();

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                None,
                Some(UserId::from("a")),
                Some(UserId::from("b")),
                None,
            ]
        );
    }

    #[tokio::test]
    async fn removed_listener_stops_receiving() {
        let mut service = MockIdentityService::new();
        service
            .expect_verify_credentials()
            .returning(|_, _| Ok(identity("u1", "u1@x.io")));
        let provider = provider(service);
        let seen = Arc::new(Mutex::new(0));
        let sink = Arc::clone(&seen);
        let handle = provider.on_identity_change(move |_| *sink.lock().unwrap() += 1);

        assert!(provider.remove_listener(handle));
        assert!(!provider.remove_listener(handle));
        provider.sign_in("u1@x.io", "pw").await.unwrap();
        assert_eq!(*seen.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn watch_identity_observes_transitions() {
        let mut service = MockIdentityService::new();
        service
            .expect_verify_credentials()
            .returning(|_, _| Ok(identity("u1", "u1@x.io")));
        let provider = provider(service);
        let mut rx = provider.watch_identity();

        provider.sign_in("u1@x.io", "pw").await.unwrap();
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().as_ref().map(|i| i.id.clone()), Some(UserId::from("u1")));
    }

    #[tokio::test]
    async fn reauthenticate_without_session_is_no_session() {
        let mut service = MockIdentityService::new();
        service.expect_verify_password().never();
        let provider = provider(service);
        assert_eq!(provider.reauthenticate("pw").await, Err(ClipError::NoSession));
    }

    #[tokio::test]
    async fn reauthenticate_checks_current_user_without_transition() {
        let mut service = MockIdentityService::new();
        service
            .expect_verify_credentials()
            .returning(|_, _| Ok(identity("u1", "u1@x.io")));
        service
            .expect_verify_password()
            .withf(|user, _| user.as_str() == "u1")
            .returning(|_, password| {
                if password == "right" {
                    Ok(())
                } else {
                    Err(IdentityServiceError::InvalidCredentials)
                }
            });
        let provider = provider(service);
        provider.sign_in("u1@x.io", "right").await.unwrap();
        let seen = recorder(&provider);

        assert_eq!(provider.reauthenticate("wrong").await, Err(ClipError::Authentication));
        assert_eq!(provider.reauthenticate("right").await, Ok(()));
        assert_eq!(seen.lock().unwrap().len(), 1, "no identity transition");
        assert!(provider.current_identity().is_some());
    }
}
