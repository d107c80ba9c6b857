use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Payload carried by a data message.
///
/// JSON and BINARY can represent any JSON-like value; XML can only carry
/// strings. Rather than model payload as a codec-specific type, the wire
/// layer standardizes on `serde_json::Value` as the codec-neutral
/// representation everywhere and lets the XML codec degrade non-string
/// values to their textual form on the way out.
pub type Payload = serde_json::Value;

/// One of the operations a data message can carry.
///
/// Serialization is hand-written rather than derived so the exact wire
/// tokens (`PUBLISH`, `LAST_MESSAGE`, ...) have a single source of truth
/// shared by every codec, including the hand-rolled XML one.
///
/// §7 separates a malformed frame body (a decode error, tears the
/// connection down) from a well-formed frame naming a method nobody
/// recognizes ("Unknown method: silently ignore — the frame has already
/// been consumed"). `Unrecognized` is how that second case stays
/// representable: decoding never fails just because the wire used a verb
/// this broker doesn't know, it just produces a frame the dispatcher is
/// expected to drop. The broker itself never constructs one for an
/// outbound frame.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Method {
    Publish,
    Subscribe,
    Cancel,
    List,
    Message,
    LastMessage,
    ListTopicsRep,
    Unrecognized(String),
}

impl Method {
    pub fn as_wire_str(&self) -> &str {
        match self {
            Method::Publish => "PUBLISH",
            Method::Subscribe => "SUBSCRIBE",
            Method::Cancel => "CANCEL",
            Method::List => "LIST",
            Method::Message => "MESSAGE",
            Method::LastMessage => "LAST_MESSAGE",
            Method::ListTopicsRep => "LIST_TOPICS_REP",
            Method::Unrecognized(token) => token.as_str(),
        }
    }

    /// Strict lookup: `None` for any token that isn't one of the seven
    /// wire methods §6.2.2 defines. Used where an unrecognized token
    /// really is an error (there is no such case left on the decode
    /// path — see [`Method::from_wire_token`] — but the strict mapping is
    /// still useful to callers that want to assert a token is a known
    /// method).
    pub fn from_wire_str(s: &str) -> Option<Method> {
        Some(match s {
            "PUBLISH" => Method::Publish,
            "SUBSCRIBE" => Method::Subscribe,
            "CANCEL" => Method::Cancel,
            "LIST" => Method::List,
            "MESSAGE" => Method::Message,
            "LAST_MESSAGE" => Method::LastMessage,
            "LIST_TOPICS_REP" => Method::ListTopicsRep,
            _ => return None,
        })
    }

    /// Total lookup used by every decode path: an unrecognized token
    /// becomes `Unrecognized(token)` rather than a decode failure, per
    /// §7's "Unknown method" taxonomy entry.
    pub fn from_wire_token(s: String) -> Method {
        match Method::from_wire_str(&s) {
            Some(method) => method,
            None => Method::Unrecognized(s),
        }
    }
}

impl Serialize for Method {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_wire_str())
    }
}

impl<'de> Deserialize<'de> for Method {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Method::from_wire_token(s))
    }
}

/// The logical record carried by every post-handshake frame:
/// `{method, topic, msg}`. One shape for both directions and all three
/// codecs; `topic` is meaningless for `LIST`/`CANCEL` replies and `msg`
/// carries the topic list for `LIST_TOPICS_REP`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireFrame {
    pub method: Method,
    pub topic: String,
    pub msg: Payload,
}

impl WireFrame {
    pub fn new(method: Method, topic: impl Into<String>, msg: Payload) -> Self {
        WireFrame {
            method,
            topic: topic.into(),
            msg,
        }
    }
}
