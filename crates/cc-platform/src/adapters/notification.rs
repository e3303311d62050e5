//! Notification sink feeding the renderer.
//!
//! 通知输出适配器。

use tokio::sync::mpsc;
use tracing::{error, info, warn};

use cc_core::ports::NotificationPort;
use cc_core::{Notification, NotificationLevel};

fn log_notification(notification: &Notification) {
    match notification.level {
        NotificationLevel::Success => info!(message = %notification.message, "notify"),
        NotificationLevel::Warning => warn!(message = %notification.message, "notify"),
        NotificationLevel::Error => error!(message = %notification.message, "notify"),
    }
}

/// Forwards notifications to a renderer over an in-process channel.
pub struct ChannelNotificationSink {
    tx: mpsc::UnboundedSender<Notification>,
}

impl ChannelNotificationSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl NotificationPort for ChannelNotificationSink {
    fn notify(&self, notification: Notification) {
        log_notification(&notification);
        if self.tx.send(notification).is_err() {
            warn!("Notification renderer is gone, dropping notification");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn channel_sink_forwards_in_order() {
        let (sink, mut rx) = ChannelNotificationSink::new();
        sink.notify(Notification::success("Saved to clipboard history"));
        sink.notify(Notification::error("Copy not supported on this device"));

        let first = rx.recv().await.unwrap();
        assert_eq!(first.level, NotificationLevel::Success);
        let second = rx.recv().await.unwrap();
        assert_eq!(second.message, "Copy not supported on this device");
    }

    #[test]
    fn channel_sink_survives_closed_receiver() {
        let (sink, rx) = ChannelNotificationSink::new();
        drop(rx);
        sink.notify(Notification::warning("ignored"));
    }
}
