//! Immutable state and transition definitions.
//!
//! A `State` is shared by every machine of its type. All per-instance data
//! (derived deferred and action sets) lives in the runtime state stack.

use super::event::Event;
use super::function::FunRef;
use super::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Liveness classification consumed by external liveness checking.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Temperature {
    Cold,
    #[default]
    Warm,
    Hot,
}

/// How a state reacts to a triggering event by changing state.
pub enum Transition<V: Value, Env> {
    /// Exit the current state, run `fun`, then replace it with `target`.
    Goto { fun: FunRef<V, Env>, target: String },
    /// Push `target` on top of the current state, which stays beneath it.
    Push { target: String },
}

impl<V: Value, Env> Transition<V, Env> {
    pub fn target(&self) -> &str {
        match self {
            Self::Goto { target, .. } | Self::Push { target } => target,
        }
    }

    /// The transition function, absent for push transitions.
    pub fn fun(&self) -> Option<&FunRef<V, Env>> {
        match self {
            Self::Goto { fun, .. } => Some(fun),
            Self::Push { .. } => None,
        }
    }

    pub fn is_push(&self) -> bool {
        matches!(self, Self::Push { .. })
    }
}

impl<V: Value, Env> Clone for Transition<V, Env> {
    fn clone(&self) -> Self {
        match self {
            Self::Goto { fun, target } => Self::Goto {
                fun: fun.clone(),
                target: target.clone(),
            },
            Self::Push { target } => Self::Push {
                target: target.clone(),
            },
        }
    }
}

impl<V: Value, Env> fmt::Debug for Transition<V, Env> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Goto { fun, target } => f
                .debug_struct("Goto")
                .field("fun", &fun.name())
                .field("target", target)
                .finish(),
            Self::Push { target } => f.debug_struct("Push").field("target", target).finish(),
        }
    }
}

/// A state of a machine type.
///
/// Built with [`StateBuilder`](crate::builder::StateBuilder).
pub struct State<V: Value, Env> {
    pub name: String,
    pub entry_fun: FunRef<V, Env>,
    pub exit_fun: FunRef<V, Env>,
    pub transitions: HashMap<Event, Transition<V, Env>>,
    /// "do" handlers, keyed by triggering event.
    pub actions: HashMap<Event, FunRef<V, Env>>,
    /// A transition keyed on the null event exists.
    pub has_null_transition: bool,
    pub temperature: Temperature,
    /// Events this state declares deferred.
    pub deferred: HashSet<Event>,
}

impl<V: Value, Env> State<V, Env> {
    pub fn transition(&self, event: &Event) -> Option<&Transition<V, Env>> {
        self.transitions.get(event)
    }

    pub fn action(&self, event: &Event) -> Option<&FunRef<V, Env>> {
        self.actions.get(event)
    }
}

impl<V: Value, Env> fmt::Debug for State<V, Env> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("State")
            .field("name", &self.name)
            .field("entry_fun", &self.entry_fun.name())
            .field("exit_fun", &self.exit_fun.name())
            .field("transitions", &self.transitions)
            .field("actions", &self.actions.keys().collect::<Vec<_>>())
            .field("has_null_transition", &self.has_null_transition)
            .field("temperature", &self.temperature)
            .field("deferred", &self.deferred)
            .finish()
    }
}
