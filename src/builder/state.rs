//! Builder for constructing states.

use crate::core::{ignore, skip, Event, FunRef, State, Temperature, Transition, Value};
use std::collections::{HashMap, HashSet};

/// Builder for a [`State`] with a fluent API.
///
/// Entry and exit functions default to [`skip`]. Whether the state has a
/// wildcard transition is derived from a transition keyed on
/// [`Event::Null`].
pub struct StateBuilder<V: Value, Env> {
    name: String,
    entry: FunRef<V, Env>,
    exit: FunRef<V, Env>,
    transitions: HashMap<Event, Transition<V, Env>>,
    actions: HashMap<Event, FunRef<V, Env>>,
    temperature: Temperature,
    deferred: HashSet<Event>,
}

impl<V: Value, Env> StateBuilder<V, Env> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entry: skip(),
            exit: skip(),
            transitions: HashMap::new(),
            actions: HashMap::new(),
            temperature: Temperature::default(),
            deferred: HashSet::new(),
        }
    }

    pub fn entry(mut self, fun: FunRef<V, Env>) -> Self {
        self.entry = fun;
        self
    }

    pub fn exit(mut self, fun: FunRef<V, Env>) -> Self {
        self.exit = fun;
        self
    }

    /// On `event`, exit this state, run `fun` and enter `target`.
    pub fn on_goto(mut self, event: Event, target: impl Into<String>, fun: FunRef<V, Env>) -> Self {
        self.transitions.insert(
            event,
            Transition::Goto {
                fun,
                target: target.into(),
            },
        );
        self
    }

    /// On `event`, push `target` on top of this state.
    pub fn on_push(mut self, event: Event, target: impl Into<String>) -> Self {
        self.transitions.insert(
            event,
            Transition::Push {
                target: target.into(),
            },
        );
        self
    }

    /// On `event`, run `fun` without leaving the state.
    pub fn on_do(mut self, event: Event, fun: FunRef<V, Env>) -> Self {
        self.actions.insert(event, fun);
        self
    }

    /// Consume `event` and do nothing.
    pub fn ignore(self, event: Event) -> Self {
        self.on_do(event, ignore())
    }

    pub fn defer(mut self, event: Event) -> Self {
        self.deferred.insert(event);
        self
    }

    pub fn temperature(mut self, temperature: Temperature) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn build(self) -> State<V, Env> {
        let has_null_transition = self.transitions.contains_key(&Event::Null);
        State {
            name: self.name,
            entry_fun: self.entry,
            exit_fun: self.exit,
            transitions: self.transitions,
            actions: self.actions,
            has_null_transition,
            temperature: self.temperature,
            deferred: self.deferred,
        }
    }
}
