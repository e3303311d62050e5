use crate::notification::Notification;

/// Surfaces transient success/failure signals to the user.
pub trait NotificationPort: Send + Sync {
    fn notify(&self, notification: Notification);
}
