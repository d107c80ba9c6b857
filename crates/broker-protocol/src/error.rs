use crate::Codec;
use thiserror::Error;

/// Errors from framing, codec negotiation, and message decoding/encoding.
///
/// None of these cross a connection boundary: the caller's job is to map
/// any variant here to a connection teardown, never to reply in-band.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("handshake does not name a known serializer: {0:?}")]
    UnknownSerializer(String),

    #[error("malformed handshake frame: {0}")]
    MalformedHandshake(String),

    #[error("failed to decode {codec:?} frame: {reason}")]
    Decode { codec: Codec, reason: String },

    #[error("failed to encode {codec:?} frame: {reason}")]
    Encode { codec: Codec, reason: String },
}
