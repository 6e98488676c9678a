//! Codec trait and implementations for boundary messages.
//!
//! The engine and transport agree on types, not bytes; a codec turns
//! one into the other. JSON is the default, a binary codec can be
//! added later without touching anything else.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Converts boundary types to and from raw bytes.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Encode`] if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Decode`] if the bytes are malformed or
    /// don't match the expected type.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

/// A [`Codec`] that uses JSON via `serde_json`.
///
/// Human-readable, so intents and events can be inspected in logs and
/// browser devtools. Behind the `json` feature (enabled by default).
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

#[cfg(all(test, feature = "json"))]
mod tests {
    use super::*;
    use crate::{ClientIntent, ServerEvent};

    #[test]
    fn test_intent_round_trip_through_codec() {
        let codec = JsonCodec;
        let intent = ClientIntent::SendChat { text: "good evening".into() };
        let bytes = codec.encode(&intent).unwrap();
        let decoded: ClientIntent = codec.decode(&bytes).unwrap();
        assert_eq!(intent, decoded);
    }

    #[test]
    fn test_decode_garbage_is_error() {
        let codec = JsonCodec;
        let result: Result<ServerEvent, _> = codec.decode(b"not json at all");
        assert!(result.is_err());
    }
}
