//! Event declarations and event identities.
//!
//! Events are the keys of every dispatch table in a machine type. Two
//! sentinel events always exist: the null event (used for wildcard
//! transitions and actions) and the halt event.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Name reported for the null event.
pub const NULL_EVENT_NAME: &str = "null";

/// Name reported for the halt event.
pub const HALT_EVENT_NAME: &str = "halt";

/// Bound on how many instances of an event may be pending in one mailbox.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaxInstances {
    #[default]
    Unbounded,
    Bounded(usize),
}

impl MaxInstances {
    /// Check whether `pending` instances already exhaust this bound.
    pub fn is_reached(&self, pending: usize) -> bool {
        match self {
            Self::Unbounded => false,
            Self::Bounded(max) => pending >= *max,
        }
    }
}

/// Immutable declaration of a user event.
///
/// # Example
///
/// ```rust
/// use stepwise::core::{EventDecl, MaxInstances};
///
/// let ping = EventDecl::new("Ping")
///     .payload_type("int")
///     .max_instances(2)
///     .assume_on_overflow();
///
/// assert_eq!(ping.max_instances, MaxInstances::Bounded(2));
/// assert!(ping.assume_on_overflow);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDecl {
    pub name: String,
    pub payload_type: Option<String>,
    pub max_instances: MaxInstances,
    /// Exceeding the bound is an assume failure rather than a hard error.
    pub assume_on_overflow: bool,
}

impl EventDecl {
    /// Declare an unbounded event without a payload type.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            payload_type: None,
            max_instances: MaxInstances::Unbounded,
            assume_on_overflow: false,
        }
    }

    pub fn payload_type(mut self, tag: impl Into<String>) -> Self {
        self.payload_type = Some(tag.into());
        self
    }

    pub fn max_instances(mut self, max: usize) -> Self {
        self.max_instances = MaxInstances::Bounded(max);
        self
    }

    pub fn assume_on_overflow(mut self) -> Self {
        self.assume_on_overflow = true;
        self
    }
}

/// Identity of an event as used in dispatch tables, mailboxes and triggers.
///
/// Equality and hashing look only at the kind and the name, so two
/// `Declared` events built from separate declarations of the same name are
/// the same key.
#[derive(Clone, Debug)]
pub enum Event {
    Null,
    Halt,
    Declared(Arc<EventDecl>),
}

impl Event {
    pub fn new(decl: EventDecl) -> Self {
        Self::Declared(Arc::new(decl))
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Null => NULL_EVENT_NAME,
            Self::Halt => HALT_EVENT_NAME,
            Self::Declared(decl) => &decl.name,
        }
    }

    pub fn max_instances(&self) -> MaxInstances {
        match self {
            Self::Null | Self::Halt => MaxInstances::Unbounded,
            Self::Declared(decl) => decl.max_instances,
        }
    }

    pub fn assume_on_overflow(&self) -> bool {
        match self {
            Self::Null | Self::Halt => false,
            Self::Declared(decl) => decl.assume_on_overflow,
        }
    }

    pub fn payload_type(&self) -> Option<&str> {
        match self {
            Self::Null | Self::Halt => None,
            Self::Declared(decl) => decl.payload_type.as_deref(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn is_halt(&self) -> bool {
        matches!(self, Self::Halt)
    }
}

impl From<EventDecl> for Event {
    fn from(decl: EventDecl) -> Self {
        Self::new(decl)
    }
}

impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) | (Self::Halt, Self::Halt) => true,
            (Self::Declared(a), Self::Declared(b)) => a.name == b.name,
            _ => false,
        }
    }
}

impl Eq for Event {}

impl Hash for Event {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        if let Self::Declared(decl) = self {
            decl.name.hash(state);
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn declared_events_compare_by_name() {
        let a = Event::new(EventDecl::new("Ping"));
        let b = Event::new(EventDecl::new("Ping").max_instances(3));
        let c = Event::new(EventDecl::new("Pong"));

        assert_eq!(a, b);
        assert_ne!(a, c);

        let set: HashSet<Event> = [a, b, c].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn sentinels_are_distinct_from_declared_namesakes() {
        let fake_halt = Event::new(EventDecl::new(HALT_EVENT_NAME));

        assert_ne!(Event::Halt, fake_halt);
        assert_ne!(Event::Null, Event::Halt);
        assert_eq!(Event::Halt.name(), "halt");
        assert_eq!(Event::Null.to_string(), "null");
    }

    #[test]
    fn sentinels_are_unbounded() {
        assert_eq!(Event::Null.max_instances(), MaxInstances::Unbounded);
        assert_eq!(Event::Halt.max_instances(), MaxInstances::Unbounded);
        assert!(!Event::Halt.assume_on_overflow());
    }

    #[test]
    fn bound_is_reached_at_max() {
        assert!(!MaxInstances::Unbounded.is_reached(usize::MAX));
        assert!(!MaxInstances::Bounded(2).is_reached(1));
        assert!(MaxInstances::Bounded(2).is_reached(2));
        assert!(MaxInstances::Bounded(0).is_reached(0));
    }

    #[test]
    fn event_decl_serializes_correctly() {
        let decl = EventDecl::new("Tick").payload_type("int").max_instances(1);
        let json = serde_json::to_string(&decl).unwrap();
        let deserialized: EventDecl = serde_json::from_str(&json).unwrap();
        assert_eq!(decl, deserialized);
    }
}
