//! Machine type: the shared, immutable table a machine instance runs.

use super::state::State;
use super::value::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Name, start state and states of one kind of machine.
///
/// Built and validated by
/// [`MachineTypeBuilder`](crate::builder::MachineTypeBuilder), which
/// guarantees that the start state and every transition target exist.
pub struct MachineType<V: Value, Env> {
    pub(crate) name: String,
    pub(crate) start: Arc<State<V, Env>>,
    pub(crate) states: HashMap<String, Arc<State<V, Env>>>,
}

impl<V: Value, Env> MachineType<V, Env> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn start_state(&self) -> &Arc<State<V, Env>> {
        &self.start
    }

    pub fn state(&self, name: &str) -> Option<&Arc<State<V, Env>>> {
        self.states.get(name)
    }

    pub fn states(&self) -> impl Iterator<Item = &Arc<State<V, Env>>> {
        self.states.values()
    }
}

impl<V: Value, Env> fmt::Debug for MachineType<V, Env> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.states.keys().collect();
        names.sort();
        f.debug_struct("MachineType")
            .field("name", &self.name)
            .field("start", &self.start.name)
            .field("states", &names)
            .finish()
    }
}
