use crate::entry::SelectionSet;
use crate::ids::EntryId;

/// Delete gate state.
///
/// 删除闸门状态。
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DeleteGateState {
    /// No deletion pending. The selection set does not exist.
    #[default]
    Closed,
    /// Selection frozen, waiting for the user's password.
    AwaitingConfirmation {
        selection: SelectionSet,
        /// Wrong passwords entered so far in this cycle.
        rejected_attempts: u32,
    },
    /// Re-authentication round-trip in flight.
    Verifying {
        selection: SelectionSet,
        rejected_attempts: u32,
    },
    /// Batch delete in flight. Whatever happens next, the gate closes.
    Deleting { selection: SelectionSet },
}

impl DeleteGateState {
    pub fn selection(&self) -> Option<&SelectionSet> {
        match self {
            DeleteGateState::Closed => None,
            DeleteGateState::AwaitingConfirmation { selection, .. }
            | DeleteGateState::Verifying { selection, .. }
            | DeleteGateState::Deleting { selection } => Some(selection),
        }
    }

    pub fn is_open(&self) -> bool {
        !matches!(self, DeleteGateState::Closed)
    }

    pub fn is_in_flight(&self) -> bool {
        matches!(
            self,
            DeleteGateState::Verifying { .. } | DeleteGateState::Deleting { .. }
        )
    }
}

/// Events that drive the gate.
///
/// 驱动删除闸门的事件。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteGateEvent {
    /// User asks to delete the given selection.
    RequestDelete { selection: SelectionSet },
    /// User submitted a password.
    ConfirmSubmitted,
    /// Identity service accepted the password.
    ReauthSucceeded,
    /// Identity service rejected the password.
    ReauthRejected,
    /// Re-authentication could not run (no session, transport fault).
    ReauthFailed,
    /// Batch delete returned, successfully or not.
    DeleteFinished,
    /// User dismissed the confirmation.
    Cancel,
}

/// Side-effects produced by transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteGateAction {
    Reauthenticate,
    DeleteMany { ids: Vec<EntryId> },
    ClearSelection,
    Reject(GateRejection),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateRejection {
    EmptySelection,
    Busy,
    NotPending,
}

/// Pure delete gate state machine.
///
/// 纯状态机：不包含副作用。
pub struct DeleteGateStateMachine;

impl DeleteGateStateMachine {
    pub fn transition(
        state: DeleteGateState,
        event: DeleteGateEvent,
    ) -> (DeleteGateState, Vec<DeleteGateAction>) {
        use DeleteGateAction as A;
        use DeleteGateEvent as E;
        use DeleteGateState as S;

        match (state, event) {
            // ===== Open =====
            (S::Closed, E::RequestDelete { selection }) => {
                if selection.is_empty() {
                    (S::Closed, vec![A::Reject(GateRejection::EmptySelection)])
                } else {
                    (
                        S::AwaitingConfirmation {
                            selection,
                            rejected_attempts: 0,
                        },
                        Vec::new(),
                    )
                }
            }
            (state, E::RequestDelete { .. }) => (state, vec![A::Reject(GateRejection::Busy)]),

            // ===== Confirm =====
            (
                S::AwaitingConfirmation {
                    selection,
                    rejected_attempts,
                },
                E::ConfirmSubmitted,
            ) => (
                S::Verifying {
                    selection,
                    rejected_attempts,
                },
                vec![A::Reauthenticate],
            ),
            (S::Closed, E::ConfirmSubmitted) => {
                (S::Closed, vec![A::Reject(GateRejection::NotPending)])
            }
            (state, E::ConfirmSubmitted) => (state, vec![A::Reject(GateRejection::Busy)]),

            // ===== Re-authentication result =====
            (S::Verifying { selection, .. }, E::ReauthSucceeded) => {
                let ids = selection.to_vec();
                (S::Deleting { selection }, vec![A::DeleteMany { ids }])
            }
            (
                S::Verifying {
                    selection,
                    rejected_attempts,
                },
                E::ReauthRejected,
            ) => (
                S::AwaitingConfirmation {
                    selection,
                    rejected_attempts: rejected_attempts.saturating_add(1),
                },
                Vec::new(),
            ),
            (S::Verifying { .. }, E::ReauthFailed) => (S::Closed, vec![A::ClearSelection]),

            // ===== Delete result =====
            (S::Deleting { .. }, E::DeleteFinished) => (S::Closed, vec![A::ClearSelection]),

            // ===== Cancel =====
            (S::AwaitingConfirmation { .. }, E::Cancel) => (S::Closed, vec![A::ClearSelection]),
            (S::Closed, E::Cancel) => (S::Closed, Vec::new()),
            (state, E::Cancel) => (state, vec![A::Reject(GateRejection::Busy)]),

            // Out-of-order completion events are ignored.
            (state, _event) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(?state, event = ?_event, "ignoring delete gate event in current state");
                (state, Vec::new())
            }
        }
    }
}
