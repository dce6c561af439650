//! Codec trait and the JSON implementation.
//!
//! The room and session layers deal in typed messages; the codec is the only
//! place that turns them into bytes and back. Swapping the wire format means
//! swapping the codec, nothing else.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Encodes typed messages to bytes and decodes bytes back.
///
/// ## Bounds
///
/// - `Clone`: every player session's writer task owns its own copy, and
///   the connection handler keeps one for decoding.
/// - `Send + Sync + 'static`: the codec lives inside spawned Tokio tasks
///   that may run on any worker thread.
///
/// ## Generic methods
///
/// `encode` accepts anything `Serialize` and `decode` anything
/// `DeserializeOwned`, so one codec serves both [`GameMessage`]s going out
/// and [`PlayerMessage`]s coming in. `DeserializeOwned` keeps decoded
/// messages independent of the frame buffer they came from.
///
/// [`GameMessage`]: crate::GameMessage
/// [`PlayerMessage`]: crate::PlayerMessage
pub trait Codec: Clone + Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if the value cannot be represented
    /// in this format.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed or do not
    /// match the expected shape. Callers treat this as recoverable: the
    /// message is dropped and the connection stays open.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// Zero-sized, so cloning it into every session is free. Each message is
/// one JSON object per transport frame.
///
/// ```rust
/// use cardgrid_protocol::{Codec, GameMessage, JsonCodec};
///
/// let codec = JsonCodec;
/// let bytes = codec.encode(&GameMessage::error("not your turn")).unwrap();
/// assert_eq!(bytes, br#"{"type":"error","message":"not your turn"}"#);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
