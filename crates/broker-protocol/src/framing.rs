use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::{Framed, LengthDelimitedCodec};

/// Frames carry a 3-byte little-endian length prefix ahead of the payload,
/// so the largest representable frame body is `2^24 - 1` bytes.
pub const MAX_FRAME_LEN: usize = (1 << 24) - 1;

/// Wraps a byte stream in the length-delimited framing every connection
/// speaks before and after the handshake: a 3-byte little-endian prefix
/// giving the byte length of the frame that follows, with no header/footer
/// padding of its own.
pub fn new_framed<T: AsyncRead + AsyncWrite>(io: T) -> Framed<T, LengthDelimitedCodec> {
    LengthDelimitedCodec::builder()
        .little_endian()
        .length_field_length(3)
        .max_frame_length(MAX_FRAME_LEN)
        .new_framed(io)
}
