//! The value contract every payload, field and local must satisfy.

use std::fmt::Debug;

/// Trait for values that cross a machine boundary.
///
/// `Clone` must be a deep clone: once a value is cloned, mutating the copy
/// never becomes visible through the original. Machine snapshots rely on
/// this to explore alternative schedules without corrupting the original run.
///
/// # Example
///
/// ```rust
/// use stepwise::core::Value;
///
/// #[derive(Clone, PartialEq, Debug)]
/// enum Payload {
///     Null,
///     Int(i64),
/// }
///
/// impl Value for Payload {
///     fn null() -> Self {
///         Payload::Null
///     }
/// }
///
/// assert!(Payload::null().is_null());
/// assert!(!Payload::Int(3).is_null());
/// ```
pub trait Value: Clone + PartialEq + Debug + Send + Sync + 'static {
    /// The distinguished null value.
    fn null() -> Self;

    /// Check whether this value is the null value.
    fn is_null(&self) -> bool {
        *self == Self::null()
    }
}

impl Value for serde_json::Value {
    fn null() -> Self {
        serde_json::Value::Null
    }

    fn is_null(&self) -> bool {
        serde_json::Value::is_null(self)
    }
}
