//! Secure delete gate protocol.
//!
//! Selection -> confirmation -> credential check -> batch delete, expressed
//! as a pure state machine. The `cc-app` orchestrator performs the actions.

mod state_machine;

pub use state_machine::{
    DeleteGateAction, DeleteGateEvent, DeleteGateState, DeleteGateStateMachine, GateRejection,
};
