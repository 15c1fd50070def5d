//! A running machine instance and the operations the driver and generated
//! function bodies call on it.

use crate::core::{Event, FunRef, MachineType, State, Transition, Value};
use crate::runtime::continuation::Continuation;
use crate::runtime::error::{FatalError, RuntimeError};
use crate::runtime::fun_stack::{FunFrame, FunStack};
use crate::runtime::mailbox::Mailbox;
use crate::runtime::state_stack::StateStack;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

/// Whether a machine can still take steps.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum MachineStatus {
    Enabled,
    Halted,
}

/// Selects how a machine treats incoming events.
///
/// - `Implementation` machines silently drop events sent after they halted.
/// - `Monitor` machines observe but never halt on request: the halt event is
///   dropped at enqueue, and exhausting the stack under halt halts them
///   instead of failing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MachineKind {
    #[default]
    Implementation,
    Monitor,
}

/// Identity of a machine instance, for diagnostics.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MachineId {
    pub name: String,
    pub instance: usize,
}

impl fmt::Display for MachineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, self.instance)
    }
}

/// One running instance of a machine type.
///
/// A machine owns all of its execution state: state stack, function stack,
/// mailbox, fields and the current continuation. `Clone` copies all of it,
/// so a driver can snapshot a machine, explore one choice on the copy and
/// fall back to the original. Only the immutable machine type is shared.
pub struct Machine<V: Value, Env> {
    machine_type: Arc<MachineType<V, Env>>,
    kind: MachineKind,
    instance: usize,
    /// Machine-local variables, owned by generated code.
    pub fields: Vec<V>,
    current_trigger: Event,
    current_payload: V,
    status: MachineStatus,
    state_stack: StateStack<V, Env>,
    fun_stack: FunStack<V, Env>,
    continuation: Continuation<V, Env>,
    dest_of_goto: Option<String>,
    receive_set: HashSet<Event>,
    mailbox: Mailbox<V>,
}

impl<V: Value, Env> Machine<V, Env> {
    /// Create an enabled machine with its start state pushed.
    ///
    /// The start state's entry function is not run; that is the driver's
    /// first step.
    pub fn new(machine_type: Arc<MachineType<V, Env>>, instance: usize) -> Self {
        let mut state_stack = StateStack::new();
        state_stack.push(Arc::clone(machine_type.start_state()));

        let machine = Self {
            machine_type,
            kind: MachineKind::Implementation,
            instance,
            fields: Vec::new(),
            current_trigger: Event::Null,
            current_payload: V::null(),
            status: MachineStatus::Enabled,
            state_stack,
            fun_stack: FunStack::new(),
            continuation: Continuation::default(),
            dest_of_goto: None,
            receive_set: HashSet::new(),
            mailbox: Mailbox::new(),
        };
        debug!(machine = %machine.id(), state = %machine.start_state().name, "created machine");
        machine
    }

    pub fn with_kind(mut self, kind: MachineKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_fields(mut self, fields: Vec<V>) -> Self {
        self.fields = fields;
        self
    }

    pub fn id(&self) -> MachineId {
        MachineId {
            name: self.machine_type.name().to_string(),
            instance: self.instance,
        }
    }

    pub fn name(&self) -> &str {
        self.machine_type.name()
    }

    pub fn instance(&self) -> usize {
        self.instance
    }

    pub fn kind(&self) -> MachineKind {
        self.kind
    }

    pub fn machine_type(&self) -> &Arc<MachineType<V, Env>> {
        &self.machine_type
    }

    pub fn start_state(&self) -> &Arc<State<V, Env>> {
        self.machine_type.start_state()
    }

    pub fn status(&self) -> MachineStatus {
        self.status
    }

    pub fn is_halted(&self) -> bool {
        self.status == MachineStatus::Halted
    }

    /// Mark the machine halted. Its mailbox stops accepting events.
    pub fn halt(&mut self) {
        if !self.is_halted() {
            debug!(machine = %self.id(), "machine halted");
        }
        self.status = MachineStatus::Halted;
    }

    /// The innermost active state.
    ///
    /// # Panics
    ///
    /// Panics if the state stack is empty, which only happens once the
    /// machine has halted by popping its last state.
    pub fn current_state(&self) -> &Arc<State<V, Env>> {
        self.state_stack
            .top()
            .map(|frame| frame.state())
            .expect("machine has no active state")
    }

    pub fn current_trigger(&self) -> &Event {
        &self.current_trigger
    }

    pub fn current_payload(&self) -> &V {
        &self.current_payload
    }

    pub fn state_stack(&self) -> &StateStack<V, Env> {
        &self.state_stack
    }

    pub fn fun_stack(&self) -> &FunStack<V, Env> {
        &self.fun_stack
    }

    pub fn mailbox(&self) -> &Mailbox<V> {
        &self.mailbox
    }

    pub fn receive_set(&self) -> &HashSet<Event> {
        &self.receive_set
    }

    /// Target of the pending goto, if one was requested.
    pub fn dest_of_goto(&self) -> Option<&str> {
        self.dest_of_goto.as_deref()
    }

    pub fn take_dest_of_goto(&mut self) -> Option<String> {
        self.dest_of_goto.take()
    }

    // Mailbox

    /// Deliver an event sent by `source` (or by the environment when `None`).
    pub fn enqueue_event(
        &mut self,
        event: Event,
        payload: &V,
        source: Option<&MachineId>,
    ) -> Result<(), RuntimeError> {
        match self.kind {
            MachineKind::Implementation if self.is_halted() => {
                debug!(machine = %self.id(), event = %event, "dropping event sent to halted machine");
                return Ok(());
            }
            MachineKind::Monitor if event.is_halt() => {
                debug!(machine = %self.id(), "monitor ignores halt");
                return Ok(());
            }
            _ => {}
        }

        trace!(machine = %self.id(), event = %event, source = ?source, "enqueue event");
        self.mailbox.enqueue(event, payload)
    }

    /// Move the first eligible pending event into the current trigger and
    /// payload. Returns `false`, leaving everything untouched, if none is
    /// eligible or the machine has halted.
    ///
    /// A successful dequeue satisfies the active receive, so the receive set
    /// is cleared.
    pub fn dequeue_event(&mut self) -> bool {
        if self.is_halted() {
            return false;
        }
        let Some(top) = self.state_stack.top() else {
            return false;
        };

        match self.mailbox.dequeue(top.deferred(), &self.receive_set) {
            Some(entry) => {
                debug!(machine = %self.id(), event = %entry.event, "dequeued event");
                self.current_trigger = entry.event;
                self.current_payload = entry.payload;
                self.receive_set.clear();
                true
            }
            None => false,
        }
    }

    /// True iff the machine is enabled and [`dequeue_event`](Self::dequeue_event)
    /// would succeed.
    pub fn is_enabled(&self) -> bool {
        if self.is_halted() {
            return false;
        }
        self.state_stack
            .top()
            .is_some_and(|top| self.mailbox.is_enabled(top.deferred(), &self.receive_set))
    }

    /// Install the keys of `fun`'s receive statement `case` as the receive set.
    ///
    /// # Panics
    ///
    /// Panics if `fun` has no receive statement with that index, or if that
    /// statement accepts no events. An empty receive set means "no receive
    /// active" to the mailbox.
    pub fn set_receive_set(&mut self, fun: &FunRef<V, Env>, case: usize) {
        let handlers = fun.receive_cases().get(case).unwrap_or_else(|| {
            panic!("function '{}' has no receive statement {}", fun.name(), case)
        });
        assert!(
            !handlers.is_empty(),
            "receive statement {} of function '{}' accepts no events",
            case,
            fun.name()
        );
        self.receive_set = handlers.keys().cloned().collect();
    }

    pub fn clear_receive_set(&mut self) {
        self.receive_set.clear();
    }

    // State stack

    /// Find the handler for `event`, searching from the current state
    /// outwards through the states pushed beneath it.
    ///
    /// # Panics
    ///
    /// Panics if no active state installs an action for `event`. Drivers only
    /// call this after checking the action set.
    pub fn find_action_handler(&self, event: &Event) -> FunRef<V, Env> {
        self.state_stack
            .iter()
            .find_map(|frame| frame.state().action(event))
            .cloned()
            .unwrap_or_else(|| {
                panic!(
                    "no action handler for event '{}' in machine {}",
                    event,
                    self.id()
                )
            })
    }

    pub fn push_state(&mut self, name: &str) {
        let state = self.resolve_state(name);
        debug!(machine = %self.id(), state = %name, depth = self.state_stack.len() + 1, "push state");
        self.state_stack.push(state);
    }

    /// Replace the current state with `name`.
    ///
    /// # Panics
    ///
    /// Panics if the state stack is empty.
    pub fn change_state(&mut self, name: &str) {
        let state = self.resolve_state(name);
        debug!(machine = %self.id(), from = %self.current_state().name, to = %name, "change state");
        self.state_stack.change_state(state);
    }

    /// Pop the current state. Returns whether the machine is now halted.
    ///
    /// When the stack runs empty: an explicit pop statement is an
    /// [`FatalError::InvalidPopStatement`]; running out of states while
    /// handling the halt event is an [`FatalError::UnhandledEvent`]
    /// (monitors halt instead); anything else halts the machine.
    ///
    /// # Panics
    ///
    /// Panics if the state stack is already empty.
    pub fn pop_state(&mut self, is_pop_statement: bool) -> Result<bool, RuntimeError> {
        let popped = self
            .state_stack
            .pop()
            .expect("pop_state on an empty state stack");
        debug!(machine = %self.id(), state = %popped.state().name, "pop state");

        if self.state_stack.is_empty() {
            if is_pop_statement {
                return Err(FatalError::InvalidPopStatement {
                    machine: self.id().to_string(),
                }
                .into());
            }
            if self.current_trigger.is_halt() && self.kind == MachineKind::Implementation {
                return Err(FatalError::UnhandledEvent {
                    machine: self.id().to_string(),
                    event: self.current_trigger.name().to_string(),
                }
                .into());
            }
            self.halt();
        }

        Ok(self.is_halted())
    }

    pub fn has_null_transition_or_action(&self) -> bool {
        self.state_stack.has_null_transition_or_action()
    }

    pub fn is_transition_present(&self, event: &Event) -> bool {
        self.current_state().transitions.contains_key(event)
    }

    pub fn is_action_installed(&self, event: &Event) -> bool {
        self.current_state().actions.contains_key(event)
    }

    pub fn transition(&self, event: &Event) -> Option<Transition<V, Env>> {
        self.current_state().transition(event).cloned()
    }

    fn resolve_state(&self, name: &str) -> Arc<State<V, Env>> {
        self.machine_type
            .state(name)
            .cloned()
            .unwrap_or_else(|| {
                panic!(
                    "machine type '{}' has no state '{}'",
                    self.machine_type.name(),
                    name
                )
            })
    }

    // Function stack

    pub fn push_fun_frame(&mut self, fun: FunRef<V, Env>, locals: Vec<V>) {
        self.fun_stack.push(fun, locals, 0);
    }

    pub fn push_fun_frame_at(&mut self, fun: FunRef<V, Env>, locals: Vec<V>, return_to: usize) {
        self.fun_stack.push(fun, locals, return_to);
    }

    /// # Panics
    ///
    /// Panics if the function stack is empty.
    pub fn pop_fun_frame(&mut self) -> FunFrame<V, Env> {
        self.fun_stack.pop()
    }

    pub fn top_fun_frame(&self) -> Option<&FunFrame<V, Env>> {
        self.fun_stack.top()
    }

    /// Push a fresh frame for `fun` and run it until it returns or suspends.
    pub fn invoke(
        &mut self,
        fun: FunRef<V, Env>,
        locals: Vec<V>,
        env: &mut Env,
    ) -> Result<(), RuntimeError> {
        trace!(machine = %self.id(), fun = %fun.name(), "invoke");
        self.fun_stack.push(Arc::clone(&fun), locals, 0);
        fun.execute(env, self)
    }

    /// Re-enter the function whose frame is on top of the function stack.
    ///
    /// # Panics
    ///
    /// Panics if the function stack is empty.
    pub fn resume(&mut self, env: &mut Env) -> Result<(), RuntimeError> {
        let fun = self
            .fun_stack
            .top()
            .map(|frame| Arc::clone(&frame.fun))
            .expect("resume with an empty function stack");
        trace!(machine = %self.id(), fun = %fun.name(), "resume");
        fun.execute(env, self)
    }

    /// Run the current state's entry function with the current payload.
    pub fn execute_entry_function(&mut self, env: &mut Env) -> Result<(), RuntimeError> {
        let fun = Arc::clone(&self.current_state().entry_fun);
        let locals = fun.create_locals(std::slice::from_ref(&self.current_payload));
        self.invoke(fun, locals, env)
    }

    pub fn execute_exit_function(&mut self, env: &mut Env) -> Result<(), RuntimeError> {
        let fun = Arc::clone(&self.current_state().exit_fun);
        let locals = fun.create_locals(&[]);
        self.invoke(fun, locals, env)
    }

    /// Run the function of the current state's goto transition on `event`,
    /// with the current payload as its argument.
    ///
    /// # Panics
    ///
    /// Panics if the current state has no goto transition on `event`.
    pub fn execute_transition_function(
        &mut self,
        event: &Event,
        env: &mut Env,
    ) -> Result<(), RuntimeError> {
        let fun = match self.current_state().transition(event) {
            Some(Transition::Goto { fun, .. }) => Arc::clone(fun),
            Some(Transition::Push { .. }) => {
                panic!("push transition on '{}' has no function", event)
            }
            None => panic!(
                "state '{}' has no transition on '{}'",
                self.current_state().name,
                event
            ),
        };
        let locals = fun.create_locals(std::slice::from_ref(&self.current_payload));
        self.invoke(fun, locals, env)
    }

    /// Run the handler [`find_action_handler`](Self::find_action_handler)
    /// selects for `event`, with the current payload as its argument.
    pub fn execute_action_handler(
        &mut self,
        event: &Event,
        env: &mut Env,
    ) -> Result<(), RuntimeError> {
        let fun = self.find_action_handler(event);
        let locals = fun.create_locals(std::slice::from_ref(&self.current_payload));
        self.invoke(fun, locals, env)
    }

    // Continuations

    pub fn continuation(&self) -> &Continuation<V, Env> {
        &self.continuation
    }

    /// Hand the continuation to the driver, leaving an empty return behind.
    pub fn take_continuation(&mut self) -> Continuation<V, Env> {
        std::mem::take(&mut self.continuation)
    }

    fn set_continuation(&mut self, continuation: Continuation<V, Env>) {
        trace!(machine = %self.id(), reason = ?continuation.kind(), "continuation");
        self.continuation = continuation;
    }

    pub fn cont_return(&mut self, locals: Vec<V>) {
        self.set_continuation(Continuation::Return {
            value: None,
            locals,
        });
    }

    pub fn cont_return_val(&mut self, value: V, locals: Vec<V>) {
        self.set_continuation(Continuation::Return {
            value: Some(value),
            locals,
        });
    }

    pub fn cont_pop(&mut self) {
        self.set_continuation(Continuation::Pop);
    }

    /// Raise `event` against this machine; it becomes the current trigger.
    pub fn cont_raise(&mut self, event: Event, payload: V) {
        self.current_trigger = event;
        self.current_payload = payload;
        self.set_continuation(Continuation::Raise);
    }

    /// Request a transition to `target`, entered with `payload`.
    ///
    /// # Panics
    ///
    /// Panics if the machine type has no state named `target`.
    pub fn cont_goto(&mut self, target: &str, payload: V) {
        let state = self.resolve_state(target);
        self.dest_of_goto = Some(state.name.clone());
        self.current_payload = payload;
        self.set_continuation(Continuation::Goto);
    }

    pub fn cont_send(&mut self, fun: FunRef<V, Env>, locals: Vec<V>, return_to: usize) {
        self.push_fun_frame_at(fun, locals, return_to);
        self.set_continuation(Continuation::Send);
    }

    /// Block on receive statement `case` of `fun`.
    ///
    /// # Panics
    ///
    /// Panics if `fun` has no receive statement with that index.
    pub fn cont_receive(
        &mut self,
        fun: FunRef<V, Env>,
        locals: Vec<V>,
        return_to: usize,
        case: usize,
    ) {
        self.set_receive_set(&fun, case);
        self.push_fun_frame_at(fun, locals, return_to);
        self.set_continuation(Continuation::Receive { case });
    }

    pub fn cont_nondet(&mut self, fun: FunRef<V, Env>, locals: Vec<V>, return_to: usize) {
        self.push_fun_frame_at(fun, locals, return_to);
        self.set_continuation(Continuation::Nondet { choice: None });
    }

    pub fn cont_new_machine(
        &mut self,
        fun: FunRef<V, Env>,
        locals: Vec<V>,
        return_to: usize,
        created: Machine<V, Env>,
    ) {
        self.push_fun_frame_at(fun, locals, return_to);
        self.set_continuation(Continuation::NewMachine {
            machine: Box::new(created),
        });
    }

    /// Supply the boolean a pending nondeterministic choice waits for.
    ///
    /// # Panics
    ///
    /// Panics if the continuation is not `Nondet`.
    pub fn supply_nondet(&mut self, value: bool) {
        match &mut self.continuation {
            Continuation::Nondet { choice } => *choice = Some(value),
            other => panic!("supply_nondet with a {:?} continuation", other.kind()),
        }
    }

    /// The choice supplied for the pending nondeterministic choice point.
    pub fn nondet_choice(&self) -> Option<bool> {
        match self.continuation {
            Continuation::Nondet { choice } => choice,
            _ => None,
        }
    }

    // Checks for generated code

    pub fn assert(&self, condition: bool, message: &str) -> Result<(), RuntimeError> {
        if condition {
            Ok(())
        } else {
            Err(FatalError::AssertionFailed {
                machine: self.id().to_string(),
                message: message.to_string(),
            }
            .into())
        }
    }

    pub fn assume(&self, condition: bool, reason: &str) -> Result<(), RuntimeError> {
        if condition {
            Ok(())
        } else {
            Err(RuntimeError::AssumeFailure {
                reason: reason.to_string(),
            })
        }
    }
}

impl<V: Value, Env> Clone for Machine<V, Env> {
    fn clone(&self) -> Self {
        Self {
            machine_type: Arc::clone(&self.machine_type),
            kind: self.kind,
            instance: self.instance,
            fields: self.fields.clone(),
            current_trigger: self.current_trigger.clone(),
            current_payload: self.current_payload.clone(),
            status: self.status,
            state_stack: self.state_stack.clone(),
            fun_stack: self.fun_stack.clone(),
            continuation: self.continuation.clone(),
            dest_of_goto: self.dest_of_goto.clone(),
            receive_set: self.receive_set.clone(),
            mailbox: self.mailbox.clone(),
        }
    }
}

impl<V: Value, Env> fmt::Debug for Machine<V, Env> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Machine")
            .field("id", &self.id())
            .field("kind", &self.kind)
            .field("status", &self.status)
            .field("fields", &self.fields)
            .field("current_trigger", &self.current_trigger)
            .field("current_payload", &self.current_payload)
            .field("state_stack", &self.state_stack)
            .field("fun_stack", &self.fun_stack)
            .field("continuation", &self.continuation)
            .field("dest_of_goto", &self.dest_of_goto)
            .field("receive_set", &self.receive_set)
            .field("mailbox", &self.mailbox)
            .finish()
    }
}
