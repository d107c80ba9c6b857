use crate::error::CodecError;
use crate::frame::{Method, Payload, WireFrame};
use quick_xml::escape::escape;
use quick_xml::events::Event;
use quick_xml::Reader;

/// One of the three wire codecs a connection can negotiate at handshake
/// time. Bound to a connection for its whole lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Codec {
    Json,
    Xml,
    Binary,
}

impl Codec {
    /// Maps a handshake `Serializer` name to the codec it selects.
    pub fn from_serializer_name(name: &str) -> Option<Codec> {
        match name {
            "JSONQueue" => Some(Codec::Json),
            "XMLQueue" => Some(Codec::Xml),
            "PickleQueue" => Some(Codec::Binary),
            _ => None,
        }
    }

    pub const fn serializer_name(self) -> &'static str {
        match self {
            Codec::Json => "JSONQueue",
            Codec::Xml => "XMLQueue",
            Codec::Binary => "PickleQueue",
        }
    }

    /// Encodes a frame's payload bytes under this codec. Does not add the
    /// length prefix; that's the framing layer's job.
    pub fn encode(self, frame: &WireFrame) -> Result<Vec<u8>, CodecError> {
        match self {
            Codec::Json => serde_json::to_vec(frame).map_err(|e| CodecError::Encode {
                codec: self,
                reason: e.to_string(),
            }),
            Codec::Xml => encode_xml(frame).map_err(|e| CodecError::Encode {
                codec: self,
                reason: e,
            }),
            Codec::Binary => rmp_serde::to_vec(frame).map_err(|e| CodecError::Encode {
                codec: self,
                reason: e.to_string(),
            }),
        }
    }

    pub fn decode(self, bytes: &[u8]) -> Result<WireFrame, CodecError> {
        match self {
            Codec::Json => serde_json::from_slice(bytes).map_err(|e| CodecError::Decode {
                codec: self,
                reason: e.to_string(),
            }),
            Codec::Xml => decode_xml(bytes).map_err(|e| CodecError::Decode {
                codec: self,
                reason: e,
            }),
            Codec::Binary => rmp_serde::from_slice(bytes).map_err(|e| CodecError::Decode {
                codec: self,
                reason: e.to_string(),
            }),
        }
    }
}

/// Renders a payload as the string XML is allowed to carry. Scalars take
/// their natural text form; structured values take their JSON text rather
/// than silently truncating to nothing.
fn payload_to_text(payload: &Payload) -> String {
    match payload {
        Payload::Null => String::new(),
        Payload::String(s) => s.clone(),
        Payload::Bool(b) => b.to_string(),
        Payload::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

fn encode_xml(frame: &WireFrame) -> Result<Vec<u8>, String> {
    let msg_text = payload_to_text(&frame.msg);
    let mut out = String::from(r#"<?xml version="1.0"?>"#);
    out.push_str("<data method=\"");
    out.push_str(&escape(frame.method.as_wire_str()));
    out.push_str("\" topic=\"");
    out.push_str(&escape(frame.topic.as_str()));
    out.push_str("\"><msg>");
    out.push_str(&escape(msg_text.as_str()));
    out.push_str("</msg></data>");
    Ok(out.into_bytes())
}

fn decode_xml(bytes: &[u8]) -> Result<WireFrame, String> {
    let text = std::str::from_utf8(bytes).map_err(|e| format!("invalid utf-8: {e}"))?;
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut method: Option<String> = None;
    let mut topic: Option<String> = None;
    let mut msg = String::new();
    let mut in_msg = false;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| format!("malformed XML: {e}"))?;
        match event {
            Event::Start(tag) if tag.name().as_ref() == b"data" => {
                for attr in tag.attributes() {
                    let attr = attr.map_err(|e| format!("malformed attribute: {e}"))?;
                    let value = attr
                        .unescape_value()
                        .map_err(|e| format!("malformed attribute value: {e}"))?
                        .into_owned();
                    match attr.key.as_ref() {
                        b"method" => method = Some(value),
                        b"topic" => topic = Some(value),
                        _ => {}
                    }
                }
            }
            Event::Start(tag) if tag.name().as_ref() == b"msg" => in_msg = true,
            Event::End(tag) if tag.name().as_ref() == b"msg" => in_msg = false,
            Event::Text(text) if in_msg => {
                msg.push_str(
                    &text
                        .unescape()
                        .map_err(|e| format!("malformed text content: {e}"))?,
                );
            }
            Event::CData(cdata) if in_msg => {
                let raw = cdata.into_inner();
                msg.push_str(std::str::from_utf8(&raw).map_err(|e| e.to_string())?);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    let method = method.ok_or_else(|| "missing method attribute".to_owned())?;
    let topic = topic.ok_or_else(|| "missing topic attribute".to_owned())?;
    let method = Method::from_wire_token(method);

    Ok(WireFrame {
        method,
        topic,
        msg: Payload::String(msg),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_round_trips_arbitrary_payloads() {
        let frame = WireFrame::new(
            Method::Publish,
            "/weather/lisbon",
            serde_json::json!({"temp_c": 21.5, "sunny": true}),
        );
        let bytes = Codec::Json.encode(&frame).unwrap();
        let decoded = Codec::Json.decode(&bytes).unwrap();
        assert_eq!(decoded, frame);
    }

    #[test]
    fn binary_round_trips_arbitrary_payloads() {
        let frame = WireFrame::new(
            Method::Message,
            "/temp",
            serde_json::json!([1, 2, 3, "four"]),
        );
        let bytes = Codec::Binary.encode(&frame).unwrap();
        let decoded = Codec::Binary.decode(&bytes).unwrap();
        assert_eq!(decoded, frame);
    }

    #[test]
    fn xml_round_trips_string_payloads() {
        let frame = WireFrame::new(Method::Publish, "/temp", Payload::String("42".into()));
        let bytes = Codec::Xml.encode(&frame).unwrap();
        assert!(std::str::from_utf8(&bytes).unwrap().starts_with(r#"<?xml version="1.0"?>"#));
        let decoded = Codec::Xml.decode(&bytes).unwrap();
        assert_eq!(decoded, frame);
    }

    #[test]
    fn xml_degrades_scalar_payloads_to_their_text_form() {
        let frame = WireFrame::new(Method::Publish, "/temp", Payload::from(42));
        let bytes = Codec::Xml.encode(&frame).unwrap();
        let decoded = Codec::Xml.decode(&bytes).unwrap();
        assert_eq!(decoded.msg, Payload::String("42".into()));
    }

    #[test]
    fn xml_escapes_special_characters_in_topic_and_payload() {
        let frame = WireFrame::new(
            Method::Publish,
            "/a&b",
            Payload::String("<tag> & \"quote\"".into()),
        );
        let bytes = Codec::Xml.encode(&frame).unwrap();
        let decoded = Codec::Xml.decode(&bytes).unwrap();
        assert_eq!(decoded, frame);
    }

    #[test]
    fn xml_rejects_missing_method_attribute() {
        let bytes = br#"<?xml version="1.0"?><data topic="/t"><msg>x</msg></data>"#;
        assert!(Codec::Xml.decode(bytes).is_err());
    }

    #[test]
    fn xml_decodes_an_unrecognized_method_instead_of_erroring() {
        let bytes =
            br#"<?xml version="1.0"?><data method="FROBNICATE" topic="/t"><msg>x</msg></data>"#;
        let decoded = Codec::Xml.decode(bytes).unwrap();
        assert_eq!(decoded.method, Method::Unrecognized("FROBNICATE".to_owned()));
    }

    #[test]
    fn cross_codec_transparency_for_string_payloads() {
        // Same logical value, published under one codec and decoded under
        // another, must compare equal.
        let value = Payload::String("hello".into());
        let json_bytes = Codec::Json
            .encode(&WireFrame::new(Method::Message, "/t", value.clone()))
            .unwrap();
        let json_decoded = Codec::Json.decode(&json_bytes).unwrap();

        let binary_bytes = Codec::Binary
            .encode(&WireFrame::new(Method::Message, "/t", value.clone()))
            .unwrap();
        let binary_decoded = Codec::Binary.decode(&binary_bytes).unwrap();

        assert_eq!(json_decoded.msg, value);
        assert_eq!(binary_decoded.msg, value);
        assert_eq!(json_decoded.msg, binary_decoded.msg);
    }

    #[test]
    fn unknown_codec_name_is_rejected() {
        assert_eq!(Codec::from_serializer_name("EnumQueue"), None);
    }
}
