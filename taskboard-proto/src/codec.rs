//! Snapshot codec for persisted task records.
//!
//! File-backed stores keep every record in a single postcard-encoded
//! [`TaskSnapshot`]. The first byte of the encoding is a format version so
//! that older files are rejected instead of misread.

use serde::{Deserialize, Serialize};

use crate::task::Task;

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u8 = 1;

/// Error type for snapshot encode/decode operations.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// Serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),
    /// The snapshot was written by an unknown format version.
    #[error("unsupported snapshot version {found} (expected {SNAPSHOT_VERSION})")]
    UnsupportedVersion {
        /// Version byte found in the input.
        found: u8,
    },
}

/// Every stored task record, in storage order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSnapshot {
    /// Stored records across all owners.
    pub tasks: Vec<Task>,
}

/// Encodes a snapshot as `[version][postcard payload]`.
///
/// # Errors
///
/// Returns [`CodecError::Serialization`] if the snapshot cannot be serialized.
pub fn encode(snapshot: &TaskSnapshot) -> Result<Vec<u8>, CodecError> {
    let payload =
        postcard::to_allocvec(snapshot).map_err(|e| CodecError::Serialization(e.to_string()))?;
    let mut bytes = Vec::with_capacity(1 + payload.len());
    bytes.push(SNAPSHOT_VERSION);
    bytes.extend_from_slice(&payload);
    Ok(bytes)
}

/// Decodes a snapshot produced by [`encode`].
///
/// An empty input decodes to an empty snapshot.
///
/// # Errors
///
/// Returns [`CodecError::UnsupportedVersion`] for an unknown version byte,
/// or [`CodecError::Serialization`] if the payload is corrupt.
pub fn decode(bytes: &[u8]) -> Result<TaskSnapshot, CodecError> {
    let Some((&version, payload)) = bytes.split_first() else {
        return Ok(TaskSnapshot::default());
    };
    if version != SNAPSHOT_VERSION {
        return Err(CodecError::UnsupportedVersion { found: version });
    }
    postcard::from_bytes(payload).map_err(|e| CodecError::Serialization(e.to_string()))
}
