//! # Dependency Injection / 依赖注入模块
//!
//! The only place that depends on `cc-infra`, `cc-platform` and `cc-app`
//! together. It assembles; it does not decide.
//! 仅用于组装，不用于决策。

use std::sync::Arc;

use cc_app::{AppDeps, CloudClipboard};
use cc_core::config::AppConfig;
use cc_core::crypto::PasswordHasher;
use cc_core::Notification;
use cc_infra::{InMemoryDocumentStore, InMemoryIdentityService, SystemClock};
use cc_platform::{ArboardClipboardWriter, ChannelNotificationSink, NativeClipboardWriter};
use tokio::sync::mpsc;
use tracing::info;

/// Result type for wiring operations
pub type WiringResult<T> = Result<T, WiringError>;

/// Errors during dependency injection
/// 依赖注入错误（基础设施初始化失败）
#[derive(Debug, thiserror::Error)]
pub enum WiringError {
    #[error("Password hasher initialization failed: {0}")]
    PasswordHasherInit(String),
}

/// Everything the presentation layer needs after wiring.
///
/// The concrete in-memory backends are kept alongside the app so the shell
/// can drive their fault injection hooks.
pub struct WiredApp {
    pub app: CloudClipboard,
    pub document_store: Arc<InMemoryDocumentStore>,
    pub identity_service: Arc<InMemoryIdentityService>,
}

/// Build the application and the receiving end of its notification sink.
///
/// Must be called from within a Tokio runtime.
pub fn wire_dependencies(
    config: &AppConfig,
) -> WiringResult<(WiredApp, mpsc::UnboundedReceiver<Notification>)> {
    let hasher =
        PasswordHasher::standard().map_err(|e| WiringError::PasswordHasherInit(e.to_string()))?;

    let document_store = Arc::new(InMemoryDocumentStore::new(Arc::new(SystemClock)));
    let identity_service = Arc::new(InMemoryIdentityService::new(hasher));
    let (notifier, notifications) = ChannelNotificationSink::new();

    let deps = AppDeps {
        identity_service: identity_service.clone(),
        document_store: document_store.clone(),
        primary_clipboard: Arc::new(NativeClipboardWriter::new()),
        fallback_clipboard: Arc::new(ArboardClipboardWriter::new()),
        notifier: Arc::new(notifier),
    };
    let app = CloudClipboard::new(deps, config);
    info!("Application wired");

    Ok((
        WiredApp {
            app,
            document_store,
            identity_service,
        },
        notifications,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn wired_app_starts_signed_out() {
        let (wired, _notifications) = wire_dependencies(&AppConfig::empty()).unwrap();
        assert!(wired.app.current_identity().is_none());
        assert!(wired.app.view().is_empty());
        assert_eq!(wired.identity_service.account_count().await, 0);
    }
}
