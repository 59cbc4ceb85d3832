//! Wire-level pieces shared by the chat server and its clients: the frame
//! obfuscation codec, the JSON request/response types and protocol constants.

pub mod codec;
pub mod protocol;

pub use codec::{decode, encode, CodecError};
pub use protocol::{
    decode_request, decode_response, encode_request, encode_response, FrameError, ProtocolError,
    Request, RequestKind, Response, Status,
};

/// Shared obfuscation key used when none is configured
pub const DEFAULT_KEY: &str = "my_simple_key";
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 5050;

/// Bytes read per receive call; one read is one frame
pub const MAX_FRAME_SIZE: usize = 4096;

/// Colour used for operator announcements
pub const ANNOUNCEMENT_COLOR: &str = "yellow";
/// Colour a chat reply carries when the request names none
pub const DEFAULT_COLOR: &str = "reset";
