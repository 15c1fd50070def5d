//! Per-machine FIFO of pending events.

use crate::core::{Event, MaxInstances, Value};
use crate::runtime::error::{FatalError, RuntimeError};
use std::collections::{HashSet, VecDeque};
use tracing::{trace, warn};

/// A pending event and its payload.
#[derive(Clone, Debug, PartialEq)]
pub struct EventEntry<V> {
    pub event: Event,
    pub payload: V,
}

/// Check whether `event` may be dequeued.
///
/// With an active receive set only its members are eligible. Otherwise every
/// event outside the deferred set is.
pub fn is_eligible(event: &Event, deferred: &HashSet<Event>, receive_set: &HashSet<Event>) -> bool {
    if receive_set.is_empty() {
        !deferred.contains(event)
    } else {
        receive_set.contains(event)
    }
}

/// Mailbox of pending events in arrival order.
#[derive(Clone, Debug, PartialEq)]
pub struct Mailbox<V> {
    entries: VecDeque<EventEntry<V>>,
}

impl<V: Value> Mailbox<V> {
    pub fn new() -> Self {
        Self {
            entries: VecDeque::new(),
        }
    }

    /// Append `event` with a private copy of `payload`.
    ///
    /// Fails when the event's bound is already reached: with an assume
    /// failure if the event is declared assume-on-overflow, otherwise with
    /// [`FatalError::MaxEventInstancesExceeded`]. Nothing is enqueued then.
    ///
    /// # Panics
    ///
    /// Panics if `event` is the null event.
    pub fn enqueue(&mut self, event: Event, payload: &V) -> Result<(), RuntimeError> {
        assert!(!event.is_null(), "illegal enqueue of the null event");

        if let MaxInstances::Bounded(max) = event.max_instances() {
            let pending = self.count_instances(&event);
            if pending >= max {
                warn!(event = %event, max, "event bound exceeded");
                return Err(if event.assume_on_overflow() {
                    RuntimeError::AssumeFailure {
                        reason: format!("event '{}' exceeded max instances of {}", event, max),
                    }
                } else {
                    FatalError::MaxEventInstancesExceeded {
                        event: event.name().to_string(),
                        max,
                    }
                    .into()
                });
            }
        }

        trace!(event = %event, pending = self.entries.len(), "enqueue");
        self.entries.push_back(EventEntry {
            event,
            payload: payload.clone(),
        });
        Ok(())
    }

    /// Remove and return the first eligible entry.
    ///
    /// Scans once, in arrival order. Ineligible entries keep their position.
    pub fn dequeue(
        &mut self,
        deferred: &HashSet<Event>,
        receive_set: &HashSet<Event>,
    ) -> Option<EventEntry<V>> {
        let index = self
            .entries
            .iter()
            .position(|entry| is_eligible(&entry.event, deferred, receive_set))?;
        let entry = self.entries.remove(index)?;
        trace!(event = %entry.event, skipped = index, "dequeue");
        Some(entry)
    }

    /// Same predicate as [`dequeue`](Self::dequeue), without removing anything.
    pub fn is_enabled(&self, deferred: &HashSet<Event>, receive_set: &HashSet<Event>) -> bool {
        self.entries
            .iter()
            .any(|entry| is_eligible(&entry.event, deferred, receive_set))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn count_instances(&self, event: &Event) -> usize {
        self.entries.iter().filter(|entry| entry.event == *event).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EventEntry<V>> {
        self.entries.iter()
    }
}

impl<V: Value> Default for Mailbox<V> {
    fn default() -> Self {
        Self::new()
    }
}
