//! Errors raised while encoding or decoding machine checkpoints.

use thiserror::Error;

/// Failure to write or read a [`Checkpoint`](super::Checkpoint).
#[derive(Debug, Error)]
pub enum CheckpointError {
    /// A checkpoint or one of its values could not be encoded
    #[error("Serialization failed: {0}")]
    SerializationFailed(String),

    /// Input is not a well-formed checkpoint, or a stored value does not
    /// decode as the requested value type
    #[error("Deserialization failed: {0}")]
    DeserializationFailed(String),

    /// The checkpoint was written in a format revision this build cannot read
    #[error("Unsupported checkpoint version {found}, supported: {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },
}
