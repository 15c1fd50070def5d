//! Executable function bodies: entry/exit functions, transition functions
//! and action handlers.
//!
//! The kernel treats function bodies as opaque, resumable units. A function
//! is entered with its own frame on top of the machine's function stack. It
//! pops that frame, uses the frame's `return_to` marker to pick its
//! resumption point, and must end every path by calling exactly one of the
//! machine's `cont_*` helpers.

use super::event::Event;
use super::value::Value;
use crate::runtime::{Machine, RuntimeError};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Shared handle to a function body.
pub type FunRef<V, Env> = Arc<dyn Function<V, Env>>;

/// Handlers for one receive statement, keyed by the events it accepts.
pub type ReceiveCase<V, Env> = HashMap<Event, FunRef<V, Env>>;

/// A resumable function body.
pub trait Function<V: Value, Env>: Send + Sync {
    fn name(&self) -> &str;

    /// Anonymous functions are compiler-generated (inline handlers, builtins).
    fn is_anonymous(&self) -> bool {
        false
    }

    /// Build the initial local-variable store from the call arguments.
    fn create_locals(&self, args: &[V]) -> Vec<V> {
        args.to_vec()
    }

    /// One entry per receive statement in the body.
    fn receive_cases(&self) -> &[ReceiveCase<V, Env>] {
        &[]
    }

    fn execute(&self, env: &mut Env, machine: &mut Machine<V, Env>) -> Result<(), RuntimeError>;
}

impl<V: Value, Env> fmt::Debug for dyn Function<V, Env> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Function({})", self.name())
    }
}

type Body<V, Env> =
    dyn Fn(&mut Env, &mut Machine<V, Env>) -> Result<(), RuntimeError> + Send + Sync;

/// Function backed by a closure.
///
/// # Example
///
/// ```rust
/// use stepwise::core::{FnFunction, FunRef};
///
/// let noop: FunRef<serde_json::Value, ()> = FnFunction::new("Noop", |_env, machine| {
///     machine.pop_fun_frame();
///     machine.cont_return(Vec::new());
///     Ok(())
/// })
/// .into_ref();
///
/// assert_eq!(noop.name(), "Noop");
/// ```
pub struct FnFunction<V: Value, Env> {
    name: String,
    anonymous: bool,
    receive_cases: Vec<ReceiveCase<V, Env>>,
    body: Box<Body<V, Env>>,
}

impl<V: Value, Env: 'static> FnFunction<V, Env> {
    pub fn new<F>(name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&mut Env, &mut Machine<V, Env>) -> Result<(), RuntimeError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            anonymous: false,
            receive_cases: Vec::new(),
            body: Box::new(body),
        }
    }

    pub fn anonymous(mut self) -> Self {
        self.anonymous = true;
        self
    }

    /// Append the handlers of one receive statement.
    pub fn receive_case(mut self, case: ReceiveCase<V, Env>) -> Self {
        self.receive_cases.push(case);
        self
    }

    pub fn into_ref(self) -> FunRef<V, Env> {
        Arc::new(self)
    }
}

impl<V: Value, Env> Function<V, Env> for FnFunction<V, Env> {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_anonymous(&self) -> bool {
        self.anonymous
    }

    fn receive_cases(&self) -> &[ReceiveCase<V, Env>] {
        &self.receive_cases
    }

    fn execute(&self, env: &mut Env, machine: &mut Machine<V, Env>) -> Result<(), RuntimeError> {
        (self.body)(env, machine)
    }
}

/// Action installed for ignored events: consumes the event and returns.
#[derive(Clone, Copy, Debug, Default)]
pub struct Ignore;

/// Default entry/exit function: does nothing and returns.
#[derive(Clone, Copy, Debug, Default)]
pub struct Skip;

impl<V: Value, Env> Function<V, Env> for Ignore {
    fn name(&self) -> &str {
        "ignore"
    }

    fn is_anonymous(&self) -> bool {
        true
    }

    fn create_locals(&self, _args: &[V]) -> Vec<V> {
        Vec::new()
    }

    fn execute(&self, _env: &mut Env, machine: &mut Machine<V, Env>) -> Result<(), RuntimeError> {
        machine.pop_fun_frame();
        machine.cont_return(Vec::new());
        Ok(())
    }
}

impl<V: Value, Env> Function<V, Env> for Skip {
    fn name(&self) -> &str {
        "skip"
    }

    fn is_anonymous(&self) -> bool {
        true
    }

    fn create_locals(&self, _args: &[V]) -> Vec<V> {
        Vec::new()
    }

    fn execute(&self, _env: &mut Env, machine: &mut Machine<V, Env>) -> Result<(), RuntimeError> {
        machine.pop_fun_frame();
        machine.cont_return(Vec::new());
        Ok(())
    }
}

pub fn ignore<V: Value, Env>() -> FunRef<V, Env> {
    Arc::new(Ignore)
}

pub fn skip<V: Value, Env>() -> FunRef<V, Env> {
    Arc::new(Skip)
}
