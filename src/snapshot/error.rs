//! Snapshot error types.

use thiserror::Error;

/// Errors that can occur while encoding, decoding or restoring a snapshot.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SnapshotError {
    /// The persisted state is not a state of the machine's graph
    #[error("Snapshot state {state} is not a declared state of the machine")]
    StateInvalid { state: String },

    /// The persisted status is not one of stopped/pending/running/done
    #[error("Snapshot status {status} is not a recognized runtime status")]
    StatusInvalid { status: String },

    /// Serialization to JSON failed
    #[error("Serialization failed: {0}")]
    Serialization(String),

    /// Deserialization from JSON failed
    #[error("Deserialization failed: {0}")]
    Deserialization(String),
}
