//! Application facade.
//!
//! Groups the components behind one object and turns each user action into
//! exactly one notification, the way the UI layer expects.
//!
//! 应用门面：每个用户操作只产生一条通知。

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tracing::info;

use cc_core::gate::DeleteGateState;
use cc_core::ports::NotificationPort;
use cc_core::{
    AppConfig, BatchDeleteReport, ClipError, EntryId, Identity, LocalView, Notification,
    SelectionSet, SubscriptionState,
};

use crate::clipboard_bridge::{ClipboardBridge, CopyMethod};
use crate::delete_gate::SecureDeleteGate;
use crate::deps::AppDeps;
use crate::entry_store::EntryStore;
use crate::policy::{EntryPolicy, PasswordPolicy, SubscriptionPolicy};
use crate::session::SessionProvider;

pub const MSG_SIGNUP_OK: &str = "Signup successful!";
pub const MSG_SAVED: &str = "Saved to clipboard history";
pub const MSG_COPIED: &str = "Copied to clipboard";
pub const MSG_COPY_UNSUPPORTED: &str = "Copy not supported on this device";
pub const MSG_INCORRECT_PASSWORD: &str = "Incorrect password";
pub const MSG_SIGNED_OUT: &str = "Signed out";

pub struct CloudClipboard {
    session: Arc<SessionProvider>,
    entries: Arc<EntryStore>,
    gate: SecureDeleteGate,
    clipboard: ClipboardBridge,
    notifier: Arc<dyn NotificationPort>,
    /// Draft selection. `request_delete` hands it to the gate.
    selection: Mutex<SelectionSet>,
}

impl CloudClipboard {
    /// Wire the components and bind the entry store to the session.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(deps: AppDeps, config: &AppConfig) -> Self {
        let session = Arc::new(SessionProvider::new(
            deps.identity_service,
            PasswordPolicy::from_config(config),
        ));
        let entries = Arc::new(EntryStore::new(
            deps.document_store,
            Arc::clone(&deps.notifier),
            SubscriptionPolicy::from_config(config),
            EntryPolicy::from_config(config),
        ));
        entries.bind_to_session(&session);

        Self {
            gate: SecureDeleteGate::new(Arc::clone(&session), Arc::clone(&entries)),
            clipboard: ClipboardBridge::new(deps.primary_clipboard, deps.fallback_clipboard),
            session,
            entries,
            notifier: deps.notifier,
            selection: Mutex::new(SelectionSet::new()),
        }
    }

    pub fn session(&self) -> &Arc<SessionProvider> {
        &self.session
    }

    pub fn entries(&self) -> &Arc<EntryStore> {
        &self.entries
    }

    pub fn current_identity(&self) -> Option<Identity> {
        self.session.current_identity()
    }

    pub fn view(&self) -> LocalView {
        self.entries.view()
    }

    pub fn watch_view(&self) -> watch::Receiver<LocalView> {
        self.entries.watch_view()
    }

    pub fn subscription_state(&self) -> SubscriptionState {
        self.entries.subscription_state()
    }

    pub fn delete_gate_state(&self) -> DeleteGateState {
        self.gate.state()
    }

    // ===== Session =====

    pub async fn sign_up(&self, email: &str, password: &str) -> Result<Identity, ClipError> {
        let before = self.current_identity();
        let result = self.session.sign_up(email, password).await;
        if let Ok(identity) = &result {
            self.on_identity_switch(before.as_ref(), Some(identity));
        }
        self.report(&result, |_| MSG_SIGNUP_OK.to_string());
        result
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, ClipError> {
        let before = self.current_identity();
        let result = self.session.sign_in(email, password).await;
        if let Ok(identity) = &result {
            self.on_identity_switch(before.as_ref(), Some(identity));
        }
        self.report(&result, |identity| format!("Signed in as {}", identity.email));
        result
    }

    pub fn sign_out(&self) {
        let before = self.current_identity();
        self.session.sign_out();
        self.on_identity_switch(before.as_ref(), None);
        self.notifier.notify(Notification::success(MSG_SIGNED_OUT));
    }

    // ===== Entries =====

    /// Save `text` for the signed-in identity.
    pub async fn save(&self, text: &str) -> Result<EntryId, ClipError> {
        let identity = self.current_identity();
        let result = self.entries.add(identity.as_ref(), text).await;
        self.report(&result, |_| MSG_SAVED.to_string());
        result
    }

    /// Copy the text of a visible entry to the system clipboard.
    pub fn copy(&self, id: &EntryId) -> Result<CopyMethod, ClipError> {
        let text = self
            .entries
            .view()
            .get(id)
            .map(|entry| entry.text.clone())
            .ok_or_else(|| ClipError::NotFound(id.clone()));
        let result = text.and_then(|text| self.clipboard.copy(&text));
        match &result {
            Ok(_) => self.notifier.notify(Notification::success(MSG_COPIED)),
            Err(ClipError::Unsupported(_)) => {
                self.notifier.notify(Notification::error(MSG_COPY_UNSUPPORTED))
            }
            Err(err) => self.notifier.notify(Notification::error(err.to_string())),
        }
        result
    }

    // ===== Selection & delete =====

    /// Flip `id` in the selection; returns whether it is selected afterwards.
    ///
    /// Only entries in the current view can be selected, and the selection is
    /// frozen while the delete gate is open.
    pub fn toggle_selection(&self, id: &EntryId) -> Result<bool, ClipError> {
        if self.gate.is_open() {
            return Err(ClipError::Busy);
        }
        if !self.entries.view().contains(id) {
            return Err(ClipError::NotFound(id.clone()));
        }
        Ok(self.selection_lock().toggle(id.clone()))
    }

    /// The pending selection while the delete gate is open, else the draft.
    pub fn selection(&self) -> SelectionSet {
        match self.gate.pending_selection() {
            Some(pending) => pending,
            None => self.selection_lock().clone(),
        }
    }

    /// Open the delete gate with the current selection.
    ///
    /// The gate takes the selection over; from here on it is the only holder,
    /// so closing the gate by any path also clears it.
    pub fn request_delete(&self) -> Result<(), ClipError> {
        let mut draft = self.selection_lock();
        let result = self.gate.request_delete(draft.clone());
        match &result {
            Ok(()) => draft.clear(),
            Err(err) => self.notifier.notify(Notification::error(err.to_string())),
        }
        result
    }

    pub async fn confirm_delete(&self, password: &str) -> Result<BatchDeleteReport, ClipError> {
        let result = self.gate.confirm(password).await;
        match &result {
            Ok(report) => self
                .notifier
                .notify(Notification::success(deleted_message(report.deleted.len()))),
            Err(ClipError::Authentication) => self
                .notifier
                .notify(Notification::error(MSG_INCORRECT_PASSWORD)),
            Err(err) => self.notifier.notify(Notification::error(err.to_string())),
        }
        result
    }

    pub fn cancel_delete(&self) -> Result<(), ClipError> {
        let result = self.gate.cancel();
        if let Err(err) = &result {
            self.notifier.notify(Notification::error(err.to_string()));
        }
        result
    }

    fn selection_lock(&self) -> MutexGuard<'_, SelectionSet> {
        self.selection.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// A selection never outlives the identity it was made under.
    fn on_identity_switch(&self, before: Option<&Identity>, after: Option<&Identity>) {
        let same = match (before, after) {
            (Some(a), Some(b)) => a.same_principal(b),
            (None, None) => true,
            _ => false,
        };
        if same {
            return;
        }
        let _ = self.gate.cancel();
        self.selection_lock().clear();
        info!("Identity switched; selection reset");
    }

    fn report<T>(&self, result: &Result<T, ClipError>, on_success: impl FnOnce(&T) -> String) {
        let notification = match result {
            Ok(value) => Notification::success(on_success(value)),
            Err(err) => Notification::error(err.to_string()),
        };
        self.notifier.notify(notification);
    }
}

fn deleted_message(count: usize) -> String {
    match count {
        1 => "Deleted 1 entry".to_string(),
        n => format!("Deleted {n} entries"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deleted_message_pluralizes() {
        assert_eq!(deleted_message(1), "Deleted 1 entry");
        assert_eq!(deleted_message(3), "Deleted 3 entries");
    }
}
