//! Builder for constructing machine types.

use crate::builder::error::{BuildError, DefinitionError};
use crate::core::{Event, MachineType, State, Value};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

type Check = Validation<(), NonEmptyVec<DefinitionError>>;

/// Builder for a [`MachineType`] with a fluent API.
///
/// `build()` reports every problem in the definition at once rather than
/// stopping at the first.
pub struct MachineTypeBuilder<V: Value, Env> {
    name: String,
    start: Option<String>,
    states: Vec<State<V, Env>>,
}

impl<V: Value, Env> MachineTypeBuilder<V, Env> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            start: None,
            states: Vec::new(),
        }
    }

    /// Set the start state (required).
    pub fn start(mut self, state: impl Into<String>) -> Self {
        self.start = Some(state.into());
        self
    }

    pub fn state(mut self, state: State<V, Env>) -> Self {
        self.states.push(state);
        self
    }

    pub fn states(mut self, states: impl IntoIterator<Item = State<V, Env>>) -> Self {
        self.states.extend(states);
        self
    }

    /// Validate and build the machine type.
    pub fn build(self) -> Result<MachineType<V, Env>, BuildError> {
        let start = self.start.ok_or(BuildError::MissingStartState)?;

        if self.states.is_empty() {
            return Err(BuildError::NoStates);
        }

        if let Validation::Failure(errors) = validate(&start, &self.states) {
            return Err(BuildError::Invalid {
                machine: self.name,
                problems: errors.iter().cloned().collect(),
            });
        }

        let states: HashMap<String, Arc<State<V, Env>>> = self
            .states
            .into_iter()
            .map(|state| (state.name.clone(), Arc::new(state)))
            .collect();
        let start = states
            .get(&start)
            .cloned()
            .ok_or(BuildError::MissingStartState)?;

        Ok(MachineType {
            name: self.name,
            start,
            states,
        })
    }
}

fn validate<V: Value, Env>(start: &str, states: &[State<V, Env>]) -> Check {
    let mut checks: Vec<Check> = Vec::new();
    let mut names: HashSet<&str> = HashSet::new();

    for state in states {
        if !names.insert(state.name.as_str()) {
            checks.push(Validation::fail(DefinitionError::DuplicateState {
                state: state.name.clone(),
            }));
        }
    }

    checks.push(if names.contains(start) {
        Validation::success(())
    } else {
        Validation::fail(DefinitionError::UnknownStartState {
            state: start.to_string(),
        })
    });

    for state in states {
        for (event, transition) in &state.transitions {
            if !names.contains(transition.target()) {
                checks.push(Validation::fail(DefinitionError::UnknownTarget {
                    state: state.name.clone(),
                    event: event.name().to_string(),
                    target: transition.target().to_string(),
                }));
            }
            if state.actions.contains_key(event) {
                checks.push(Validation::fail(DefinitionError::ConflictingHandlers {
                    state: state.name.clone(),
                    event: event.name().to_string(),
                }));
            }
        }

        if state.deferred.contains(&Event::Null) {
            checks.push(Validation::fail(DefinitionError::DeferredNull {
                state: state.name.clone(),
            }));
        }
    }

    Validation::all_vec(checks).map(|_| ())
}

impl<V: Value, Env> Default for MachineTypeBuilder<V, Env> {
    fn default() -> Self {
        Self::new("Machine")
    }
}
