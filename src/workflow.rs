//! The invocation workflow every state-changing command goes through:
//! signer normalization, script assembly, dry-run, finalization and the
//! confirm-and-relay gate.

pub mod finalizer;
pub mod relay;
pub mod runner;

pub use finalizer::Finalizer;
pub use relay::{is_affirmative, RelayGate, RelayState, RELAY_PROMPT};
pub use runner::{
    FaultPolicy, InvocationRequest, InvocationWorkflow, Operator, WorkflowEvent, WorkflowOutcome,
    CONTINUE_AFTER_FAULT_PROMPT,
};
