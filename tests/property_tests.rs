//! Property-based tests for the state stack, mailbox and function stack.
//!
//! These tests use proptest to verify properties hold across
//! many randomly generated inputs.

use proptest::prelude::*;
use serde_json::{json, Value as Json};
use std::collections::HashSet;
use std::sync::Arc;
use stepwise::builder::StateBuilder;
use stepwise::core::{skip, Event, EventDecl, State};
use stepwise::runtime::{is_eligible, FunStack, Mailbox, RuntimeError, StateStack};

const EVENTS: [&str; 5] = ["A", "B", "C", "D", "E"];

fn event(name: &str) -> Event {
    Event::new(EventDecl::new(name))
}

fn events_of(mask: u8) -> HashSet<Event> {
    EVENTS
        .iter()
        .enumerate()
        .filter(|(bit, _)| mask & (1 << bit) != 0)
        .map(|(_, name)| event(name))
        .collect()
}

/// Declared sets of one generated state, as bitmasks over `EVENTS`.
#[derive(Clone, Debug)]
struct StateShape {
    deferred: u8,
    actions: u8,
    transitions: u8,
}

impl StateShape {
    fn build(&self, name: &str) -> Arc<State<Json, ()>> {
        let mut builder = StateBuilder::new(name);
        for ev in events_of(self.deferred) {
            builder = builder.defer(ev);
        }
        for ev in events_of(self.actions) {
            builder = builder.on_do(ev, skip());
        }
        for ev in events_of(self.transitions) {
            builder = builder.on_push(ev, name.to_string());
        }
        Arc::new(builder.build())
    }
}

prop_compose! {
    fn arbitrary_shape()(
        deferred in 0u8..32,
        actions in 0u8..32,
        transitions in 0u8..32,
    ) -> StateShape {
        // A state never installs both an action and a transition for one event.
        StateShape { deferred, actions: actions & !transitions, transitions }
    }
}

#[derive(Clone, Debug)]
enum StackOp {
    Push(StateShape),
    Change(StateShape),
    Pop,
}

fn arbitrary_op() -> impl Strategy<Value = StackOp> {
    prop_oneof![
        3 => arbitrary_shape().prop_map(StackOp::Push),
        2 => arbitrary_shape().prop_map(StackOp::Change),
        1 => Just(StackOp::Pop),
    ]
}

/// Sets a frame must carry, computed from the frame beneath it.
fn expected_sets(
    parent: Option<(&HashSet<Event>, &HashSet<Event>)>,
    state: &State<Json, ()>,
) -> (HashSet<Event>, HashSet<Event>) {
    let (parent_deferred, parent_actions) = parent
        .map(|(d, a)| (d.clone(), a.clone()))
        .unwrap_or_default();
    let action_keys: HashSet<Event> = state.actions.keys().cloned().collect();
    let transition_keys: HashSet<Event> = state.transitions.keys().cloned().collect();

    let deferred: HashSet<Event> = parent_deferred
        .union(&state.deferred)
        .filter(|ev| !action_keys.contains(ev) && !transition_keys.contains(ev))
        .cloned()
        .collect();
    let actions: HashSet<Event> = parent_actions
        .difference(&state.deferred)
        .cloned()
        .chain(action_keys.iter().cloned())
        .filter(|ev| !transition_keys.contains(ev))
        .collect();

    (deferred, actions)
}

fn assert_frames_consistent(stack: &StateStack<Json, ()>) -> Result<(), TestCaseError> {
    let frames: Vec<_> = stack.iter().collect();
    for (depth, frame) in frames.iter().enumerate() {
        let parent = frames
            .get(depth + 1)
            .map(|below| (below.deferred(), below.actions()));
        let (deferred, actions) = expected_sets(parent, frame.state());
        prop_assert_eq!(frame.deferred(), &deferred);
        prop_assert_eq!(frame.actions(), &actions);

        for ev in frame.state().actions.keys() {
            prop_assert!(!frame.deferred().contains(ev));
        }
        for ev in frame.state().transitions.keys() {
            prop_assert!(!frame.deferred().contains(ev));
            prop_assert!(!frame.actions().contains(ev));
        }
    }
    Ok(())
}

proptest! {
    #[test]
    fn derived_sets_follow_precedence(ops in prop::collection::vec(arbitrary_op(), 1..12)) {
        let mut stack: StateStack<Json, ()> = StateStack::new();

        for (step, op) in ops.iter().enumerate() {
            let name = format!("S{}", step);
            match op {
                StackOp::Push(shape) => stack.push(shape.build(&name)),
                StackOp::Change(shape) if !stack.is_empty() => {
                    stack.change_state(shape.build(&name))
                }
                StackOp::Change(shape) => stack.push(shape.build(&name)),
                StackOp::Pop => {
                    stack.pop();
                }
            }
            assert_frames_consistent(&stack)?;
        }
    }

    #[test]
    fn state_stack_clone_is_independent(
        shapes in prop::collection::vec(arbitrary_shape(), 1..6),
        extra in arbitrary_shape(),
    ) {
        let mut stack: StateStack<Json, ()> = StateStack::new();
        for (i, shape) in shapes.iter().enumerate() {
            stack.push(shape.build(&format!("S{}", i)));
        }

        let snapshot = stack.clone();
        prop_assert_eq!(&snapshot, &stack);
        stack.push(extra.build("Extra"));
        stack.pop();
        stack.pop();

        prop_assert_eq!(snapshot.len(), shapes.len());
        prop_assert_eq!(stack.len(), shapes.len() - 1);
        assert_frames_consistent(&snapshot)?;
    }

    #[test]
    fn dequeue_returns_first_eligible_entry(
        arrivals in prop::collection::vec(0usize..5, 0..20),
        deferred_mask in 0u8..32,
        receive_mask in 0u8..32,
    ) {
        let deferred = events_of(deferred_mask);
        let receive_set = events_of(receive_mask);
        let mut mailbox: Mailbox<Json> = Mailbox::new();
        for (seq, index) in arrivals.iter().enumerate() {
            mailbox.enqueue(event(EVENTS[*index]), &json!(seq)).unwrap();
        }

        let expected = arrivals
            .iter()
            .enumerate()
            .find(|(_, index)| is_eligible(&event(EVENTS[**index]), &deferred, &receive_set));

        prop_assert_eq!(mailbox.is_enabled(&deferred, &receive_set), expected.is_some());

        let before = mailbox.len();
        match (mailbox.dequeue(&deferred, &receive_set), expected) {
            (Some(entry), Some((seq, index))) => {
                prop_assert_eq!(entry.event, event(EVENTS[*index]));
                prop_assert_eq!(entry.payload, json!(seq));
                prop_assert_eq!(mailbox.len(), before - 1);
            }
            (None, None) => prop_assert_eq!(mailbox.len(), before),
            (got, want) => prop_assert!(false, "dequeue {:?}, expected {:?}", got, want),
        }
    }

    #[test]
    fn dequeue_preserves_order_of_skipped_entries(
        arrivals in prop::collection::vec(0usize..5, 0..20),
        deferred_mask in 0u8..32,
    ) {
        let deferred = events_of(deferred_mask);
        let none = HashSet::new();
        let mut mailbox: Mailbox<Json> = Mailbox::new();
        for (seq, index) in arrivals.iter().enumerate() {
            mailbox.enqueue(event(EVENTS[*index]), &json!(seq)).unwrap();
        }

        let mut delivered = Vec::new();
        while let Some(entry) = mailbox.dequeue(&deferred, &none) {
            delivered.push(entry.payload);
        }
        let remaining: Vec<Json> = mailbox.iter().map(|entry| entry.payload.clone()).collect();

        // Both partitions stay in arrival order.
        let is_sorted = |values: &[Json]| {
            values.windows(2).all(|pair| pair[0].as_u64() < pair[1].as_u64())
        };
        prop_assert!(is_sorted(&delivered));
        prop_assert!(is_sorted(&remaining));
        prop_assert_eq!(delivered.len() + remaining.len(), arrivals.len());
        prop_assert!(mailbox.iter().all(|entry| deferred.contains(&entry.event)));
    }

    #[test]
    fn bounded_event_never_exceeds_max(max in 1usize..5, attempts in 1usize..12, assume in any::<bool>()) {
        let mut decl = EventDecl::new("Bounded").max_instances(max);
        if assume {
            decl = decl.assume_on_overflow();
        }
        let bounded = Event::new(decl);
        let mut mailbox: Mailbox<Json> = Mailbox::new();

        for attempt in 0..attempts {
            let result = mailbox.enqueue(bounded.clone(), &json!(attempt));
            if attempt < max {
                prop_assert!(result.is_ok());
            } else {
                match result {
                    Err(RuntimeError::AssumeFailure { .. }) => prop_assert!(assume),
                    Err(RuntimeError::Fatal(_)) => prop_assert!(!assume),
                    Ok(()) => prop_assert!(false, "enqueue past bound succeeded"),
                }
            }
            prop_assert!(mailbox.count_instances(&bounded) <= max);
        }
    }

    #[test]
    fn unbounded_event_always_enqueues(attempts in 0usize..50) {
        let free = event("Free");
        let mut mailbox: Mailbox<Json> = Mailbox::new();
        for attempt in 0..attempts {
            prop_assert!(mailbox.enqueue(free.clone(), &json!(attempt)).is_ok());
        }
        prop_assert_eq!(mailbox.count_instances(&free), attempts);
    }

    #[test]
    fn mailbox_clone_is_independent(
        arrivals in prop::collection::vec(0usize..5, 1..10),
    ) {
        let mut mailbox: Mailbox<Json> = Mailbox::new();
        for (seq, index) in arrivals.iter().enumerate() {
            mailbox.enqueue(event(EVENTS[*index]), &json!(seq)).unwrap();
        }

        let snapshot = mailbox.clone();
        prop_assert_eq!(&snapshot, &mailbox);
        let none = HashSet::new();
        while mailbox.dequeue(&none, &none).is_some() {}

        prop_assert!(mailbox.is_empty());
        prop_assert_eq!(snapshot.len(), arrivals.len());
    }

    #[test]
    fn fun_stack_clone_is_independent(
        frames in prop::collection::vec((any::<i64>(), 0usize..8), 1..8),
    ) {
        let mut stack: FunStack<Json, ()> = FunStack::new();
        for (local, return_to) in &frames {
            stack.push(skip(), vec![json!(local)], *return_to);
        }

        let snapshot = stack.clone();
        prop_assert_eq!(&snapshot, &stack);
        if let Some(top) = stack.top_mut() {
            top.locals[0] = json!("changed");
        }
        stack.pop();

        prop_assert_eq!(snapshot.len(), frames.len());
        let (local, return_to) = frames[frames.len() - 1];
        let top = snapshot.top().unwrap();
        prop_assert_eq!(&top.locals[0], &json!(local));
        prop_assert_eq!(top.return_to, return_to);
    }
}
