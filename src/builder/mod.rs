//! Builder API for ergonomic machine type construction.
//!
//! This module provides fluent builders for states and machine types. A
//! front-end that compiles state-machine programs emits its tables through
//! these builders, which validate the result before it can be run.

pub mod error;
pub mod machine;
pub mod state;

pub use error::{BuildError, DefinitionError};
pub use machine::MachineTypeBuilder;
pub use state::StateBuilder;
