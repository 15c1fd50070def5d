//! Stepwise: an execution kernel for communicating state machines
//!
//! Stepwise holds everything a single machine needs to run one step at a
//! time: a stack of active states, a stack of suspended call frames, a
//! mailbox of pending events and the continuation that says why the last
//! step stopped. An external driver (a scheduler or a systematic testing
//! engine) decides what happens between steps.
//!
//! # Core Concepts
//!
//! - **Machine types**: immutable state tables built with [`builder`]
//! - **State stack**: pushed states inherit deferred events and actions
//! - **Mailbox**: FIFO delivery filtered by deferral and receive sets
//! - **Continuations**: functions suspend instead of blocking, so a driver
//!   can clone a machine, explore a choice and come back
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use serde_json::json;
//! use stepwise::builder::{MachineTypeBuilder, StateBuilder};
//! use stepwise::core::{skip, Event, EventDecl};
//! use stepwise::runtime::Machine;
//!
//! let ping = Event::new(EventDecl::new("Ping"));
//! let later = Event::new(EventDecl::new("Later"));
//!
//! let machine_type = MachineTypeBuilder::<serde_json::Value, ()>::new("Server")
//!     .start("Idle")
//!     .state(
//!         StateBuilder::new("Idle")
//!             .on_do(ping.clone(), skip())
//!             .defer(later.clone())
//!             .build(),
//!     )
//!     .build()
//!     .unwrap();
//!
//! let mut server = Machine::new(Arc::new(machine_type), 0);
//! server.enqueue_event(later, &json!(null), None).unwrap();
//! server.enqueue_event(ping.clone(), &json!({ "seq": 1 }), None).unwrap();
//!
//! // "Later" is deferred in Idle, so "Ping" is delivered first.
//! assert!(server.dequeue_event());
//! assert_eq!(server.current_trigger(), &ping);
//! assert_eq!(server.current_payload(), &json!({ "seq": 1 }));
//!
//! server.execute_action_handler(&ping, &mut ()).unwrap();
//! assert!(!server.is_enabled());
//! ```

pub mod builder;
pub mod checkpoint;
pub mod core;
pub mod runtime;

// Re-export commonly used types
pub use crate::builder::{BuildError, MachineTypeBuilder, StateBuilder};
pub use crate::checkpoint::{Checkpoint, CheckpointError};
pub use crate::core::{Event, EventDecl, FnFunction, FunRef, Function, MachineType, State, Value};
pub use crate::runtime::{Continuation, FatalError, Machine, MachineStatus, RuntimeError};
