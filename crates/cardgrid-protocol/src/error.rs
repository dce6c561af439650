//! Error types for the protocol layer.
//!
//! Every Cardgrid crate owns one error enum. A `ProtocolError` always means
//! the bytes on the wire could not be turned into (or produced from) a
//! typed message; networking and game rules report through their own
//! enums.

/// Errors that can occur while encoding or decoding wire messages.
///
/// A decode failure on an inbound message is the recoverable class: the
/// connection handler logs it at debug level, drops the message, and keeps
/// reading. Nothing about the player's room changes.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (a typed message could not become bytes).
    ///
    /// Outbound messages are plain data, so this points at a bug rather
    /// than at bad input. The session writer logs it at error level and
    /// skips the message.
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (bytes did not form a message).
    ///
    /// Typical causes are malformed JSON, a `play_card` action missing
    /// `card_name` or `target_slot`, or a slot that is not an integer. An
    /// unknown `action` tag is *not* an error: it decodes to
    /// `PlayerMessage::Unhandled`.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),
}
