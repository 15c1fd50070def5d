//! Per-machine execution state and the suspension protocol.
//!
//! A machine runs one step at a time: the driver calls into a function
//! (found through the state stack), the function runs until it reaches a
//! suspension point, records a [`Continuation`] and returns. The driver reads
//! the continuation and decides what happens next.
//!
//! # Key Concepts
//!
//! - **State stack**: nested active states with derived deferred/action sets
//! - **Function stack**: explicit call frames, so execution can pause and resume
//! - **Mailbox**: FIFO of pending events filtered by deferral and receive sets
//! - **Continuation**: the single reason the last step ended
//!
//! Every container here clones deeply, so a whole [`Machine`] can be
//! snapshotted before exploring a choice and restored afterwards.

mod continuation;
mod error;
mod fun_stack;
mod machine;
mod mailbox;
mod state_stack;

pub use continuation::{Continuation, ContinuationKind};
pub use error::{FatalError, RuntimeError};
pub use fun_stack::{FunFrame, FunStack};
pub use machine::{Machine, MachineId, MachineKind, MachineStatus};
pub use mailbox::{is_eligible, EventEntry, Mailbox};
pub use state_stack::{StateFrame, StateStack};
