//! Stack of active, possibly nested, states.
//!
//! Each frame caches the deferred and action sets in effect while its state
//! is on top. They are derived once, at push time, from the frame beneath:
//!
//! ```text
//! deferred = (parent.deferred ∪ state.deferred) − keys(state.actions) − keys(state.transitions)
//! actions  = ((parent.actions − state.deferred) ∪ keys(state.actions)) − keys(state.transitions)
//! ```
//!
//! Handlers declared directly on a state therefore always win over deferral
//! inherited from the states pushed beneath it.

use crate::core::{Event, State, Value};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// One active state together with its derived sets.
pub struct StateFrame<V: Value, Env> {
    state: Arc<State<V, Env>>,
    deferred: HashSet<Event>,
    actions: HashSet<Event>,
}

impl<V: Value, Env> StateFrame<V, Env> {
    fn derive(state: Arc<State<V, Env>>, parent: Option<&StateFrame<V, Env>>) -> Self {
        let mut deferred: HashSet<Event> = parent
            .map(|frame| frame.deferred.clone())
            .unwrap_or_default();
        deferred.extend(state.deferred.iter().cloned());
        deferred.retain(|event| {
            !state.actions.contains_key(event) && !state.transitions.contains_key(event)
        });

        let mut actions: HashSet<Event> = parent
            .map(|frame| frame.actions.clone())
            .unwrap_or_default();
        actions.retain(|event| !state.deferred.contains(event));
        actions.extend(state.actions.keys().cloned());
        actions.retain(|event| !state.transitions.contains_key(event));

        Self {
            state,
            deferred,
            actions,
        }
    }

    pub fn state(&self) -> &Arc<State<V, Env>> {
        &self.state
    }

    pub fn deferred(&self) -> &HashSet<Event> {
        &self.deferred
    }

    pub fn actions(&self) -> &HashSet<Event> {
        &self.actions
    }
}

impl<V: Value, Env> Clone for StateFrame<V, Env> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            deferred: self.deferred.clone(),
            actions: self.actions.clone(),
        }
    }
}

impl<V: Value, Env> PartialEq for StateFrame<V, Env> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
            && self.deferred == other.deferred
            && self.actions == other.actions
    }
}

impl<V: Value, Env> fmt::Debug for StateFrame<V, Env> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateFrame")
            .field("state", &self.state.name)
            .field("deferred", &self.deferred)
            .field("actions", &self.actions)
            .finish()
    }
}

/// Ordered stack of state frames, bottom first.
pub struct StateStack<V: Value, Env> {
    frames: Vec<StateFrame<V, Env>>,
}

impl<V: Value, Env> StateStack<V, Env> {
    pub fn new() -> Self {
        Self { frames: Vec::new() }
    }

    pub fn top(&self) -> Option<&StateFrame<V, Env>> {
        self.frames.last()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Frames from the innermost (current) state outwards.
    pub fn iter(&self) -> impl Iterator<Item = &StateFrame<V, Env>> {
        self.frames.iter().rev()
    }

    /// Push `state`, deriving its sets from the current top frame.
    pub fn push(&mut self, state: Arc<State<V, Env>>) {
        let frame = StateFrame::derive(state, self.frames.last());
        self.frames.push(frame);
    }

    pub fn pop(&mut self) -> Option<StateFrame<V, Env>> {
        self.frames.pop()
    }

    /// Replace the top frame with `state`, deriving against the frame beneath.
    ///
    /// # Panics
    ///
    /// Panics if the stack is empty.
    pub fn change_state(&mut self, state: Arc<State<V, Env>>) {
        assert!(
            self.frames.pop().is_some(),
            "change_state on an empty state stack"
        );
        self.push(state);
    }

    /// True if the current state may take a step on the null event.
    ///
    /// # Panics
    ///
    /// Panics if the stack is empty.
    pub fn has_null_transition_or_action(&self) -> bool {
        let top = self
            .top()
            .expect("has_null_transition_or_action on an empty state stack");
        top.state.has_null_transition || top.actions.contains(&Event::Null)
    }
}

impl<V: Value, Env> Default for StateStack<V, Env> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Value, Env> Clone for StateStack<V, Env> {
    fn clone(&self) -> Self {
        Self {
            frames: self.frames.clone(),
        }
    }
}

impl<V: Value, Env> PartialEq for StateStack<V, Env> {
    fn eq(&self, other: &Self) -> bool {
        self.frames == other.frames
    }
}

impl<V: Value, Env> fmt::Debug for StateStack<V, Env> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.frames.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::StateBuilder;
    use crate::core::{skip, EventDecl};
    use serde_json::Value as Json;

    fn event(name: &str) -> Event {
        Event::new(EventDecl::new(name))
    }

    fn set(events: &[&str]) -> HashSet<Event> {
        events.iter().map(|name| event(name)).collect()
    }

    #[test]
    fn push_on_empty_stack_uses_declared_sets() {
        let state = StateBuilder::<Json, ()>::new("Idle")
            .defer(event("A"))
            .defer(event("B"))
            .on_do(event("B"), skip())
            .on_do(event("C"), skip())
            .build();

        let mut stack = StateStack::new();
        stack.push(Arc::new(state));

        let top = stack.top().unwrap();
        assert_eq!(top.deferred(), &set(&["A"]));
        assert_eq!(top.actions(), &set(&["B", "C"]));
    }

    #[test]
    fn pushed_state_handlers_override_inherited_deferral() {
        let outer = StateBuilder::<Json, ()>::new("Outer")
            .defer(event("Tick"))
            .defer(event("Go"))
            .on_do(event("Ping"), skip())
            .build();
        let inner = StateBuilder::<Json, ()>::new("Inner")
            .on_do(event("Tick"), skip())
            .on_push(event("Go"), "Deeper")
            .defer(event("Ping"))
            .build();

        let mut stack = StateStack::new();
        stack.push(Arc::new(outer));
        stack.push(Arc::new(inner));

        let top = stack.top().unwrap();
        assert_eq!(top.deferred(), &set(&["Ping"]));
        assert_eq!(top.actions(), &set(&["Tick"]));
    }

    #[test]
    fn change_state_derives_against_new_parent() {
        let base = StateBuilder::<Json, ()>::new("Base")
            .defer(event("X"))
            .build();
        let first = StateBuilder::<Json, ()>::new("First")
            .defer(event("Y"))
            .build();
        let second = StateBuilder::<Json, ()>::new("Second").build();

        let mut stack = StateStack::new();
        stack.push(Arc::new(base));
        stack.push(Arc::new(first));
        assert_eq!(stack.top().unwrap().deferred(), &set(&["X", "Y"]));

        stack.change_state(Arc::new(second));
        assert_eq!(stack.len(), 2);
        assert_eq!(stack.top().unwrap().state().name, "Second");
        assert_eq!(stack.top().unwrap().deferred(), &set(&["X"]));
    }

    #[test]
    #[should_panic(expected = "empty state stack")]
    fn change_state_on_empty_stack_panics() {
        let mut stack: StateStack<Json, ()> = StateStack::new();
        stack.change_state(Arc::new(StateBuilder::new("Lost").build()));
    }

    #[test]
    fn null_transition_or_action_detection() {
        let plain = StateBuilder::<Json, ()>::new("Plain").build();
        let wildcard = StateBuilder::<Json, ()>::new("Wildcard")
            .on_goto(Event::Null, "Plain", skip())
            .build();
        let null_action = StateBuilder::<Json, ()>::new("NullAction")
            .on_do(Event::Null, skip())
            .build();

        let mut stack = StateStack::new();
        stack.push(Arc::new(plain));
        assert!(!stack.has_null_transition_or_action());

        stack.push(Arc::new(null_action));
        assert!(stack.has_null_transition_or_action());

        stack.change_state(Arc::new(wildcard));
        assert!(stack.has_null_transition_or_action());
    }

    #[test]
    fn clone_is_independent() {
        let a = Arc::new(StateBuilder::<Json, ()>::new("A").build());
        let b = Arc::new(StateBuilder::<Json, ()>::new("B").build());

        let mut stack = StateStack::new();
        stack.push(Arc::clone(&a));
        let snapshot = stack.clone();
        assert_eq!(stack, snapshot);

        stack.push(b);
        assert_eq!(snapshot.len(), 1);
        assert_ne!(stack, snapshot);

        let names: Vec<&str> = stack.iter().map(|f| f.state().name.as_str()).collect();
        assert_eq!(names, vec!["B", "A"]);
    }
}
