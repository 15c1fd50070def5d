//! Serializable snapshots of a machine's execution state.
//!
//! A checkpoint records what a machine looked like at one point of a run:
//! its active states, pending events, suspended call frames and the last
//! continuation. Drivers attach checkpoints to defect reports and traces.
//! Function bodies are recorded by name only.

use crate::core::Value;
use crate::runtime::{ContinuationKind, Machine, MachineKind, MachineStatus};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod error;

pub use error::CheckpointError;

/// Version identifier for checkpoint format
pub const CHECKPOINT_VERSION: u32 = 1;

/// One active state, innermost last in [`Checkpoint::states`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StateCheckpoint {
    pub name: String,
    /// Derived deferred set, sorted by event name.
    pub deferred: Vec<String>,
    /// Derived action set, sorted by event name.
    pub actions: Vec<String>,
}

/// One function frame, innermost last in [`Checkpoint::frames`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FrameCheckpoint<V> {
    pub function: String,
    pub return_to: usize,
    pub locals: Vec<V>,
}

/// One pending event, in arrival order in [`Checkpoint::mailbox`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EventCheckpoint<V> {
    pub event: String,
    pub payload: V,
}

/// Serializable checkpoint of a machine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint<V> {
    /// Checkpoint format version
    pub version: u32,

    /// Unique checkpoint identifier
    pub id: String,

    /// When checkpoint was created
    pub timestamp: DateTime<Utc>,

    pub machine: String,
    pub instance: usize,
    pub kind: MachineKind,
    pub status: MachineStatus,
    pub fields: Vec<V>,
    pub trigger: String,
    pub payload: V,
    pub states: Vec<StateCheckpoint>,
    pub frames: Vec<FrameCheckpoint<V>>,
    pub mailbox: Vec<EventCheckpoint<V>>,
    /// Sorted by event name.
    pub receive_set: Vec<String>,
    pub dest_of_goto: Option<String>,
    pub continuation: ContinuationKind,
}

fn sorted_names<'a>(events: impl Iterator<Item = &'a crate::core::Event>) -> Vec<String> {
    let mut names: Vec<String> = events.map(|event| event.name().to_string()).collect();
    names.sort();
    names
}

impl<V: Value, Env> Machine<V, Env> {
    /// Capture the current execution state.
    pub fn checkpoint(&self) -> Checkpoint<V> {
        let mut states: Vec<StateCheckpoint> = self
            .state_stack()
            .iter()
            .map(|frame| StateCheckpoint {
                name: frame.state().name.clone(),
                deferred: sorted_names(frame.deferred().iter()),
                actions: sorted_names(frame.actions().iter()),
            })
            .collect();
        states.reverse();

        Checkpoint {
            version: CHECKPOINT_VERSION,
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            machine: self.name().to_string(),
            instance: self.instance(),
            kind: self.kind(),
            status: self.status(),
            fields: self.fields.clone(),
            trigger: self.current_trigger().name().to_string(),
            payload: self.current_payload().clone(),
            states,
            frames: self
                .fun_stack()
                .iter()
                .map(|frame| FrameCheckpoint {
                    function: frame.fun.name().to_string(),
                    return_to: frame.return_to,
                    locals: frame.locals.clone(),
                })
                .collect(),
            mailbox: self
                .mailbox()
                .iter()
                .map(|entry| EventCheckpoint {
                    event: entry.event.name().to_string(),
                    payload: entry.payload.clone(),
                })
                .collect(),
            receive_set: sorted_names(self.receive_set().iter()),
            dest_of_goto: self.dest_of_goto().map(str::to_string),
            continuation: self.continuation().kind(),
        }
    }
}

impl<V> Checkpoint<V> {
    /// Name of the innermost active state, if the machine has one.
    pub fn current_state(&self) -> Option<&str> {
        self.states.last().map(|state| state.name.as_str())
    }

    fn check_version(self) -> Result<Self, CheckpointError> {
        if self.version == CHECKPOINT_VERSION {
            Ok(self)
        } else {
            Err(CheckpointError::UnsupportedVersion {
                found: self.version,
                supported: CHECKPOINT_VERSION,
            })
        }
    }

    /// Rebuild the checkpoint with every value converted by `convert`.
    fn try_map_values<U, E>(
        &self,
        convert: impl Fn(&V) -> Result<U, E>,
    ) -> Result<Checkpoint<U>, E> {
        let convert_all =
            |values: &[V]| values.iter().map(&convert).collect::<Result<Vec<U>, E>>();

        Ok(Checkpoint {
            version: self.version,
            id: self.id.clone(),
            timestamp: self.timestamp,
            machine: self.machine.clone(),
            instance: self.instance,
            kind: self.kind,
            status: self.status,
            fields: convert_all(&self.fields)?,
            trigger: self.trigger.clone(),
            payload: convert(&self.payload)?,
            states: self.states.clone(),
            frames: self
                .frames
                .iter()
                .map(|frame| -> Result<FrameCheckpoint<U>, E> {
                    Ok(FrameCheckpoint {
                        function: frame.function.clone(),
                        return_to: frame.return_to,
                        locals: convert_all(&frame.locals)?,
                    })
                })
                .collect::<Result<Vec<_>, E>>()?,
            mailbox: self
                .mailbox
                .iter()
                .map(|entry| -> Result<EventCheckpoint<U>, E> {
                    Ok(EventCheckpoint {
                        event: entry.event.clone(),
                        payload: convert(&entry.payload)?,
                    })
                })
                .collect::<Result<Vec<_>, E>>()?,
            receive_set: self.receive_set.clone(),
            dest_of_goto: self.dest_of_goto.clone(),
            continuation: self.continuation,
        })
    }
}

impl<V: Serialize> Checkpoint<V> {
    pub fn to_json(&self) -> Result<String, CheckpointError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| CheckpointError::SerializationFailed(e.to_string()))
    }

    /// Binary form. Values are stored as embedded JSON so self-describing
    /// value types such as `serde_json::Value` survive the bincode envelope.
    pub fn to_bytes(&self) -> Result<Vec<u8>, CheckpointError> {
        let envelope = self
            .try_map_values(serde_json::to_string)
            .map_err(|e| CheckpointError::SerializationFailed(e.to_string()))?;
        bincode::serialize(&envelope)
            .map_err(|e| CheckpointError::SerializationFailed(e.to_string()))
    }
}

impl<V: DeserializeOwned> Checkpoint<V> {
    pub fn from_json(json: &str) -> Result<Self, CheckpointError> {
        let checkpoint: Self = serde_json::from_str(json)
            .map_err(|e| CheckpointError::DeserializationFailed(e.to_string()))?;
        checkpoint.check_version()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CheckpointError> {
        let envelope: Checkpoint<String> = bincode::deserialize(bytes)
            .map_err(|e| CheckpointError::DeserializationFailed(e.to_string()))?;
        envelope
            .check_version()?
            .try_map_values(|value: &String| serde_json::from_str(value))
            .map_err(|e| CheckpointError::DeserializationFailed(e.to_string()))
    }
}
