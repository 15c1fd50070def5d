//! Errors that unwind out of a running function to the driver.

use thiserror::Error;

/// Conditions that abort the whole run and are reported as defects.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FatalError {
    #[error("Pop statement emptied the state stack of machine {machine}")]
    InvalidPopStatement { machine: String },

    #[error("Machine {machine} has no handler for event '{event}'")]
    UnhandledEvent { machine: String, event: String },

    #[error("Attempting to enqueue event '{event}' more than max instance of {max}")]
    MaxEventInstancesExceeded { event: String, max: usize },

    #[error("Assertion failed in machine {machine}: {message}")]
    AssertionFailed { machine: String, message: String },
}

/// Error returned to the driver's step loop.
///
/// The split is the driver's policy switch: an assume failure marks the
/// current execution path as invalid and should be pruned, while a fatal
/// error is a defect to report.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    #[error("Assume failed: {reason}")]
    AssumeFailure { reason: String },

    #[error(transparent)]
    Fatal(#[from] FatalError),
}

impl RuntimeError {
    pub fn is_assume_failure(&self) -> bool {
        matches!(self, Self::AssumeFailure { .. })
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal(_))
    }

    pub fn as_fatal(&self) -> Option<&FatalError> {
        match self {
            Self::Fatal(fatal) => Some(fatal),
            Self::AssumeFailure { .. } => None,
        }
    }
}
