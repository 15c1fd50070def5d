//! Static definitions shared by every machine of a type.
//!
//! This module contains the immutable side of the kernel:
//! - The value contract payloads, fields and locals must satisfy
//! - Event declarations and event identities (including null and halt)
//! - Resumable function bodies and the builtin ignore/skip functions
//! - States, transitions and machine types
//!
//! Nothing here is mutated after construction. Per-instance execution state
//! lives in [`crate::runtime`].

mod event;
mod function;
mod machine_type;
mod state;
mod value;

pub use event::{Event, EventDecl, MaxInstances, HALT_EVENT_NAME, NULL_EVENT_NAME};
pub use function::{ignore, skip, FnFunction, FunRef, Function, Ignore, ReceiveCase, Skip};
pub use machine_type::MachineType;
pub use state::{State, Temperature, Transition};
pub use value::Value;
