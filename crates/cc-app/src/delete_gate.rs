//! Secure delete gate: selection → confirmation → re-authentication → batch delete.
//!
//! The protocol itself lives in [`DeleteGateStateMachine`]; this orchestrator
//! only performs the actions it emits.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

use cc_core::gate::{
    DeleteGateAction, DeleteGateEvent, DeleteGateState, DeleteGateStateMachine, GateRejection,
};
use cc_core::{BatchDeleteReport, ClipError, SelectionSet, ValidationError};

use crate::entry_store::EntryStore;
use crate::session::SessionProvider;

pub struct SecureDeleteGate {
    session: Arc<SessionProvider>,
    entries: Arc<EntryStore>,
    state: Mutex<DeleteGateState>,
}

impl SecureDeleteGate {
    pub fn new(session: Arc<SessionProvider>, entries: Arc<EntryStore>) -> Self {
        Self {
            session,
            entries,
            state: Mutex::new(DeleteGateState::Closed),
        }
    }

    pub fn state(&self) -> DeleteGateState {
        self.lock().clone()
    }

    /// Selection awaiting (or undergoing) confirmation, if the gate is open.
    pub fn pending_selection(&self) -> Option<SelectionSet> {
        self.lock().selection().cloned()
    }

    pub fn is_open(&self) -> bool {
        self.lock().is_open()
    }

    /// Open the gate holding `selection` until it closes.
    #[tracing::instrument(name = "delete_gate.request", skip(self, selection), fields(count = selection.len()))]
    pub fn request_delete(&self, selection: SelectionSet) -> Result<(), ClipError> {
        let actions = self.step(DeleteGateEvent::RequestDelete { selection });
        match rejection(&actions) {
            Some(rejected) => Err(rejected),
            None => Ok(()),
        }
    }

    /// Re-authenticate with `password`, then delete the pending selection.
    ///
    /// A wrong password leaves the gate open with the selection intact. Once
    /// the password is accepted the gate closes whatever the delete outcome.
    #[tracing::instrument(name = "delete_gate.confirm", skip(self, password))]
    pub async fn confirm(&self, password: &str) -> Result<BatchDeleteReport, ClipError> {
        let mut actions = self.step(DeleteGateEvent::ConfirmSubmitted);
        if let Some(rejected) = rejection(&actions) {
            return Err(rejected);
        }

        let mut in_flight = InFlight {
            gate: self,
            settled: false,
        };
        let mut outcome = None;

        loop {
            let mut follow_up = None;
            for action in actions {
                debug!(?action, "delete gate executing action");
                match action {
                    DeleteGateAction::Reauthenticate => {
                        match self.session.reauthenticate(password).await {
                            Ok(()) => follow_up = Some(DeleteGateEvent::ReauthSucceeded),
                            Err(ClipError::Authentication) => {
                                follow_up = Some(DeleteGateEvent::ReauthRejected);
                                outcome = Some(Err(ClipError::Authentication));
                            }
                            Err(err) => {
                                follow_up = Some(DeleteGateEvent::ReauthFailed);
                                outcome = Some(Err(err));
                            }
                        }
                    }
                    DeleteGateAction::DeleteMany { ids } => {
                        outcome = Some(self.entries.delete_many(&ids).await);
                        follow_up = Some(DeleteGateEvent::DeleteFinished);
                    }
                    DeleteGateAction::ClearSelection => debug!("selection cleared"),
                    DeleteGateAction::Reject(rejected) => {
                        warn!(?rejected, "delete gate rejected a follow-up event");
                    }
                }
            }
            match follow_up {
                Some(event) => actions = self.step(event),
                None => break,
            }
        }

        in_flight.settled = true;
        outcome.unwrap_or_else(|| Err(ValidationError::NoPendingDelete.into()))
    }

    /// Close the gate without any remote effect.
    pub fn cancel(&self) -> Result<(), ClipError> {
        let actions = self.step(DeleteGateEvent::Cancel);
        match rejection(&actions) {
            Some(rejected) => Err(rejected),
            None => Ok(()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, DeleteGateState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn step(&self, event: DeleteGateEvent) -> Vec<DeleteGateAction> {
        let mut state = self.lock();
        let from = std::mem::take(&mut *state);
        let from_label = state_label(&from);
        let event_label = format!("{event:?}");
        let (next, actions) = DeleteGateStateMachine::transition(from, event);
        info!(
            from = from_label,
            to = state_label(&next),
            event = %event_label,
            "delete gate transition"
        );
        *state = next;
        actions
    }
}

/// Closes the gate if a confirmation is abandoned mid-flight.
struct InFlight<'a> {
    gate: &'a SecureDeleteGate,
    settled: bool,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let mut state = self.gate.lock();
        if state.is_in_flight() {
            warn!(from = state_label(&state), "confirmation abandoned; closing delete gate");
            *state = DeleteGateState::Closed;
        }
    }
}

fn rejection(actions: &[DeleteGateAction]) -> Option<ClipError> {
    actions.iter().find_map(|action| match action {
        DeleteGateAction::Reject(GateRejection::EmptySelection) => {
            Some(ValidationError::EmptySelection.into())
        }
        DeleteGateAction::Reject(GateRejection::NotPending) => {
            Some(ValidationError::NoPendingDelete.into())
        }
        DeleteGateAction::Reject(GateRejection::Busy) => Some(ClipError::Busy),
        _ => None,
    })
}

fn state_label(state: &DeleteGateState) -> &'static str {
    match state {
        DeleteGateState::Closed => "Closed",
        DeleteGateState::AwaitingConfirmation { .. } => "AwaitingConfirmation",
        DeleteGateState::Verifying { .. } => "Verifying",
        DeleteGateState::Deleting { .. } => "Deleting",
    }
}
