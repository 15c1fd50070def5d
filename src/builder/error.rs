//! Build errors for machine type and state builders.

use thiserror::Error;

/// Errors that can occur when building a machine type.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Start state not specified. Call .start(name) before .build()")]
    MissingStartState,

    #[error("No states defined. Add at least one state")]
    NoStates,

    #[error("Machine type '{machine}' is invalid: {}", format_problems(.problems))]
    Invalid {
        machine: String,
        problems: Vec<DefinitionError>,
    },
}

/// A single problem found while validating a machine type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DefinitionError {
    #[error("start state '{state}' is not defined")]
    UnknownStartState { state: String },

    #[error("state '{state}' is defined more than once")]
    DuplicateState { state: String },

    #[error("state '{state}' has a transition on '{event}' to undefined state '{target}'")]
    UnknownTarget {
        state: String,
        event: String,
        target: String,
    },

    #[error("state '{state}' installs both a transition and an action on '{event}'")]
    ConflictingHandlers { state: String, event: String },

    #[error("state '{state}' defers the null event")]
    DeferredNull { state: String },
}

fn format_problems(problems: &[DefinitionError]) -> String {
    problems
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
