use crate::error::CodecError;
use crate::Codec;
use serde::Deserialize;

/// The handshake record: `{"Serializer": "<name>"}`.
///
/// Always JSON regardless of the codec being negotiated. Unknown extra
/// fields (e.g. a stray `"method": "ACK"`) are ignored rather than
/// rejected.
#[derive(Debug, Clone, Deserialize)]
pub struct HandshakeFrame {
    #[serde(rename = "Serializer")]
    pub serializer: String,
}

/// Decodes a handshake frame and resolves it to the codec it names.
///
/// The handshake body is always JSON; only the *value* of `Serializer`
/// selects one of the three post-handshake codecs.
pub fn decode_handshake(bytes: &[u8]) -> Result<Codec, CodecError> {
    let handshake: HandshakeFrame = serde_json::from_slice(bytes)
        .map_err(|e| CodecError::MalformedHandshake(e.to_string()))?;
    Codec::from_serializer_name(&handshake.serializer)
        .ok_or(CodecError::UnknownSerializer(handshake.serializer))
}

/// Encodes a handshake frame naming `codec`. Used by test clients acting as
/// the wire peer of the broker; the broker itself never sends one.
pub fn encode_handshake(codec: Codec) -> Vec<u8> {
    let handshake = serde_json::json!({ "Serializer": codec.serializer_name() });
    serde_json::to_vec(&handshake).expect("handshake record always serializes")
}
