//! # Application Dependencies / 应用依赖
//!
//! Parameter grouping for [`CloudClipboard`](crate::CloudClipboard) construction.
//! 仅用于参数打包：无默认值，无隐藏逻辑。

use std::sync::Arc;

use cc_core::ports::{
    ClipboardWriterPort, DocumentStorePort, IdentityServicePort, NotificationPort,
};

/// Every port the application layer talks to. All fields are required.
pub struct AppDeps {
    // Remote collaborators / 远程协作方
    pub identity_service: Arc<dyn IdentityServicePort>,
    pub document_store: Arc<dyn DocumentStorePort>,

    // Platform / 平台
    pub primary_clipboard: Arc<dyn ClipboardWriterPort>,
    pub fallback_clipboard: Arc<dyn ClipboardWriterPort>,

    // UI / 界面
    pub notifier: Arc<dyn NotificationPort>,
}
