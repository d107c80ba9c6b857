//! Wire protocol for the broker: frame types, codec negotiation, the three
//! on-the-wire serializers, and the length-delimited framing they ride on.
//!
//! This crate has no notion of topics, subscriptions, or fan-out — it only
//! knows how to turn bytes into [`WireFrame`]s and back. Engine semantics
//! live in `broker-core`.

mod codec;
mod error;
mod frame;
mod framing;
mod handshake;

pub use codec::Codec;
pub use error::CodecError;
pub use frame::{Method, Payload, WireFrame};
pub use framing::{new_framed, MAX_FRAME_LEN};
pub use handshake::{decode_handshake, encode_handshake, HandshakeFrame};
