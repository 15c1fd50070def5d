//! Why the most recent execution step handed control back to the driver.

use crate::core::Value;
use crate::runtime::machine::Machine;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Suspension reason written by a function immediately before it yields.
///
/// There is exactly one active reason per machine. Writing a new one
/// overwrites the previous one.
pub enum Continuation<V: Value, Env> {
    /// The function completed. `locals` is its final local store.
    Return { value: Option<V>, locals: Vec<V> },
    /// The current trigger and payload are to be handled as a local event.
    Raise,
    /// An explicit pop statement ran.
    Pop,
    /// An explicit goto ran; the target sits in the machine's goto slot.
    Goto,
    /// An event was sent; the resumption frame is on the function stack.
    Send,
    /// Blocked on the receive statement with index `case`.
    Receive { case: usize },
    /// A machine was created and must be registered by the driver.
    NewMachine { machine: Box<Machine<V, Env>> },
    /// Waiting for the driver to supply a boolean.
    Nondet { choice: Option<bool> },
}

/// Discriminant of a [`Continuation`], for dispatch and diagnostics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContinuationKind {
    Return,
    Raise,
    Pop,
    Goto,
    Send,
    Receive,
    NewMachine,
    Nondet,
}

impl<V: Value, Env> Continuation<V, Env> {
    pub fn kind(&self) -> ContinuationKind {
        match self {
            Self::Return { .. } => ContinuationKind::Return,
            Self::Raise => ContinuationKind::Raise,
            Self::Pop => ContinuationKind::Pop,
            Self::Goto => ContinuationKind::Goto,
            Self::Send => ContinuationKind::Send,
            Self::Receive { .. } => ContinuationKind::Receive,
            Self::NewMachine { .. } => ContinuationKind::NewMachine,
            Self::Nondet { .. } => ContinuationKind::Nondet,
        }
    }

    /// True when the function stack holds a frame the driver must resume.
    pub fn is_suspended(&self) -> bool {
        matches!(
            self,
            Self::Send | Self::Receive { .. } | Self::NewMachine { .. } | Self::Nondet { .. }
        )
    }
}

impl<V: Value, Env> Default for Continuation<V, Env> {
    fn default() -> Self {
        Self::Return {
            value: None,
            locals: Vec::new(),
        }
    }
}

impl<V: Value, Env> Clone for Continuation<V, Env> {
    fn clone(&self) -> Self {
        match self {
            Self::Return { value, locals } => Self::Return {
                value: value.clone(),
                locals: locals.clone(),
            },
            Self::Raise => Self::Raise,
            Self::Pop => Self::Pop,
            Self::Goto => Self::Goto,
            Self::Send => Self::Send,
            Self::Receive { case } => Self::Receive { case: *case },
            Self::NewMachine { machine } => Self::NewMachine {
                machine: machine.clone(),
            },
            Self::Nondet { choice } => Self::Nondet { choice: *choice },
        }
    }
}

impl<V: Value, Env> fmt::Debug for Continuation<V, Env> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Return { value, locals } => f
                .debug_struct("Return")
                .field("value", value)
                .field("locals", locals)
                .finish(),
            Self::Receive { case } => f.debug_struct("Receive").field("case", case).finish(),
            Self::NewMachine { machine } => f
                .debug_struct("NewMachine")
                .field("machine", &machine.id())
                .finish(),
            Self::Nondet { choice } => f.debug_struct("Nondet").field("choice", choice).finish(),
            other => write!(f, "{:?}", other.kind()),
        }
    }
}
