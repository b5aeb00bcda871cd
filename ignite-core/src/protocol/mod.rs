//! Ignite binary client protocol: framing, headers and handshake.

mod codec;
pub mod constants;
mod handshake;
mod message;
mod version;

pub use codec::MessageCodec;
pub use constants::*;
pub use handshake::{HandshakeRequest, HandshakeResponse};
pub use message::{next_request_id, Request, Response};
pub use version::ProtocolVersion;
