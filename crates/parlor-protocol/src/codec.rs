//! Codec trait and the JSON implementation.
//!
//! The coordinator never serializes events inline — it goes through a
//! [`Codec`] so the wire format can be swapped without touching the
//! connection handler or the room actors.

use serde::{de::DeserializeOwned, Serialize};

use crate::ProtocolError;

/// Converts events to and from text frames.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into one frame.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Encode`] if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<String, ProtocolError>;

    /// Deserializes a frame back into a value.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Decode`] if the frame is malformed or does
    /// not match the expected event shape.
    fn decode<T: DeserializeOwned>(&self, data: &str) -> Result<T, ProtocolError>;
}

/// A [`Codec`] speaking JSON via `serde_json`.
///
/// Human-readable, which keeps browser DevTools useful while debugging the
/// client. The event shapes are defined in [`crate::types`].
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<String, ProtocolError> {
        serde_json::to_string(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &str) -> Result<T, ProtocolError> {
        serde_json::from_str(data).map_err(ProtocolError::Decode)
    }
}
