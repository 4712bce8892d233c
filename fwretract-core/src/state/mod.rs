//! Retraction state machine
//!
//! Two phases, unretracted and retracted. The machine owns the live
//! configuration, the deferred `SET_RETRACTION` queue and the motion
//! rewriter, and is the only place any of them change.

pub mod machine;
pub mod outcome;
pub mod queue;
pub mod status;

pub use machine::{
    Operation, Phase, RetractionState, RetractionStateMachine, Script, MAX_SCRIPT_LEN,
    RETRACTION_MOVE_SPEED_FRACTION,
};
pub use outcome::{Outcome, Rejection};
pub use queue::{DeferredQueue, DEFERRED_QUEUE_CAPACITY};
pub use status::{Report, Status};
