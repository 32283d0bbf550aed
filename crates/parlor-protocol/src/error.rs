//! Error types for the protocol layer.

/// Errors that can occur while encoding or decoding events.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed.
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed — malformed JSON, an unknown `event` tag, or
    /// missing payload fields. A frame that fails here is dropped by the
    /// handler; it never tears down the connection or disturbs other rooms.
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The event is well-formed but invalid at the protocol level.
    #[error("invalid event: {0}")]
    InvalidEvent(String),
}
