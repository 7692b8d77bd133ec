//! Wire envelope codec.
//!
//! The envelope is the compatibility contract between instances: a
//! self-describing three-field record carrying the logical key, the
//! packed DNS answer, and the origin identifier of the publishing
//! instance. The store holds only the packed answer; the envelope
//! travels on the broadcast channel.

use hickory_proto::op::Message;
use serde::{Deserialize, Serialize};

use crate::events::SyncError;

/// Wire-level record exchanged on the broadcast channel.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WireEnvelope {
    /// Logical cache key, unprefixed.
    pub key: String,
    /// Packed DNS answer (codec-opaque bytes).
    pub message: Vec<u8>,
    /// Origin identifier of the publishing instance.
    pub origin: Vec<u8>,
}

/// Pack an answer into its binary wire form.
pub fn pack_answer(message: &Message) -> Result<Vec<u8>, SyncError> {
    message
        .to_vec()
        .map_err(|e| SyncError::Encode(e.to_string()))
}

/// Unpack a binary payload read back from the store.
pub fn unpack_answer(payload: &[u8]) -> Result<Message, SyncError> {
    Message::from_vec(payload).map_err(|e| SyncError::Decode(e.to_string()))
}

/// Wrap an already-packed answer for the broadcast channel.
pub fn seal(key: &str, packed: Vec<u8>, origin: &[u8]) -> Result<Vec<u8>, SyncError> {
    let envelope = WireEnvelope {
        key: key.to_owned(),
        message: packed,
        origin: origin.to_vec(),
    };
    serde_json::to_vec(&envelope).map_err(|e| SyncError::Encode(e.to_string()))
}

/// Pack an answer and wrap it for the broadcast channel.
pub fn encode(key: &str, message: &Message, origin: &[u8]) -> Result<Vec<u8>, SyncError> {
    seal(key, pack_answer(message)?, origin)
}

/// Parse a wire envelope and unpack the inner answer.
///
/// A malformed envelope and an unpackable inner payload are the same
/// failure category: callers log and discard either.
pub fn decode(bytes: &[u8]) -> Result<(WireEnvelope, Message), SyncError> {
    let envelope: WireEnvelope =
        serde_json::from_slice(bytes).map_err(|e| SyncError::Decode(e.to_string()))?;
    let message = unpack_answer(&envelope.message)?;
    Ok((envelope, message))
}
